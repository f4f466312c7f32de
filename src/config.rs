use crate::domain::error::DomainError;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "./autoinvest.db";
pub const DEFAULT_STALE_LOCK_MS: u64 = 300_000;
pub const DEFAULT_NOTIFICATION_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub db_path: String,
    /// Locks older than this are considered abandoned by a crashed run.
    pub stale_lock_threshold: Duration,
    pub notification_timeout: Duration,
    pub busy_timeout: Duration,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.into(),
            stale_lock_threshold: Duration::from_millis(DEFAULT_STALE_LOCK_MS),
            notification_timeout: Duration::from_millis(DEFAULT_NOTIFICATION_TIMEOUT_MS),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            log_level: "info".into(),
            log_json: false,
        }
    }
}

impl SchedulerConfig {
    /// Reads `AUTOINVEST_*` variables, falling back to defaults.
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DomainError> {
        let defaults = Self::default();
        let config = Self {
            db_path: lookup("AUTOINVEST_DB").unwrap_or(defaults.db_path),
            stale_lock_threshold: millis(&lookup, "AUTOINVEST_STALE_LOCK_MS")?
                .unwrap_or(defaults.stale_lock_threshold),
            notification_timeout: millis(&lookup, "AUTOINVEST_NOTIFY_TIMEOUT_MS")?
                .unwrap_or(defaults.notification_timeout),
            busy_timeout: millis(&lookup, "AUTOINVEST_BUSY_TIMEOUT_MS")?
                .unwrap_or(defaults.busy_timeout),
            log_level: lookup("AUTOINVEST_LOG").unwrap_or(defaults.log_level),
            log_json: lookup("AUTOINVEST_LOG_JSON")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.log_json),
        };
        config.validate()?;
        Ok(config)
    }

    /// A lease must outlive one attempt's blocking waits, otherwise a
    /// concurrent run treats a live lock as stale and executes the row twice.
    pub fn validate(&self) -> Result<(), DomainError> {
        let floor = self.notification_timeout + self.busy_timeout;
        if self.stale_lock_threshold <= floor {
            return Err(DomainError::InvalidInput(format!(
                "Stale lock threshold {}ms must exceed notification plus busy timeout ({}ms)",
                self.stale_lock_threshold.as_millis(),
                floor.as_millis()
            )));
        }
        Ok(())
    }

    pub fn with_db_path(mut self, db_path: impl Into<String>) -> Self {
        self.db_path = db_path.into();
        self
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>, DomainError> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| DomainError::InvalidInput(format!("{key}={raw}: {e}")))
        })
        .transpose()
}
