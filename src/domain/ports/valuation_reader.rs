use crate::domain::entities::valuation::Valuation;
use async_trait::async_trait;

/// Read-only access to externally ingested prices.
#[async_trait]
pub trait ValuationReader: Send + Sync {
    /// Latest known valuation, or `None` when the source has nothing usable.
    /// Implementations must not fail; unavailability is `None`.
    async fn latest_valuation(&self, security_code: &str) -> Option<Valuation>;
}
