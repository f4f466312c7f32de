use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scheduling state of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Waiting for its first execution, or for a retry after a failure.
    Pending,
    /// Executed at least once and still scheduled.
    Active,
    /// Terminal.
    Cancelled,
}

impl LifecycleState {
    pub fn is_schedulable(&self) -> bool {
        !matches!(self, LifecycleState::Cancelled)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Pending => write!(f, "pending"),
            LifecycleState::Active => write!(f, "active"),
            LifecycleState::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for LifecycleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(LifecycleState::Pending),
            "active" | "success" => Ok(LifecycleState::Active),
            "cancelled" => Ok(LifecycleState::Cancelled),
            _ => Err(format!("Unknown lifecycle state: {s}")),
        }
    }
}

/// Result of the most recent economic execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptOutcome {
    Success,
    Failed,
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Success => write!(f, "success"),
            AttemptOutcome::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for AttemptOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(AttemptOutcome::Success),
            "failed" => Ok(AttemptOutcome::Failed),
            _ => Err(format!("Unknown attempt outcome: {s}")),
        }
    }
}
