use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: String, available: String },

    #[error("Insufficient units: required {required}, held {held}")]
    InsufficientUnits { required: String, held: String },

    #[error("No valuation available for {0}")]
    ValuationUnavailable(String),

    #[error("Not supported: {0}")]
    Unsupported(String),

    #[error("Notification error: {0}")]
    Notification(String),
}

impl DomainError {
    /// Business-rule failures that a later run may succeed on.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::InsufficientBalance { .. }
                | DomainError::InsufficientUnits { .. }
                | DomainError::ValuationUnavailable(_)
                | DomainError::Database(_)
        )
    }
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Database(e.to_string())
    }
}

impl From<&str> for DomainError {
    fn from(s: &str) -> Self {
        DomainError::InvalidInput(s.to_string())
    }
}
