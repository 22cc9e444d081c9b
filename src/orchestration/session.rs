//! Per-process query session: data sources, optional cache, and clock.

use crate::datasource::{CachedLedgerSource, CachedPriceSource, LedgerSource, PriceSource};
use crate::domain::TimeMs;
use std::sync::Arc;
use std::time::Duration;

/// Source of the query timestamp every calculation is projected to.
pub type Clock = fn() -> TimeMs;

/// Everything a query needs from the outside world.
///
/// A session is built once and handed to the querier. Dropping it drops its
/// cache; nothing is shared through globals.
#[derive(Debug, Clone)]
pub struct QuerySession {
    ledger: Arc<dyn LedgerSource>,
    prices: Arc<dyn PriceSource>,
    clock: Clock,
    cache_ttl: Option<Duration>,
}

impl QuerySession {
    pub fn new(ledger: Arc<dyn LedgerSource>, prices: Arc<dyn PriceSource>) -> Self {
        Self {
            ledger,
            prices,
            clock: TimeMs::now,
            cache_ttl: None,
        }
    }

    /// Put a read-through cache with the given TTL in front of both sources.
    /// A zero TTL leaves the session uncached.
    pub fn with_cache(mut self, ttl: Duration) -> Self {
        if ttl.is_zero() {
            return self;
        }
        self.ledger = Arc::new(CachedLedgerSource::new(self.ledger, ttl));
        self.prices = Arc::new(CachedPriceSource::new(self.prices, ttl));
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn ledger(&self) -> &dyn LedgerSource {
        self.ledger.as_ref()
    }

    pub fn prices(&self) -> &dyn PriceSource {
        self.prices.as_ref()
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl
    }

    pub fn now(&self) -> TimeMs {
        (self.clock)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockDataSource;

    fn fixed() -> TimeMs {
        TimeMs::new(42_000)
    }

    #[test]
    fn test_zero_ttl_keeps_session_uncached() {
        let mock = Arc::new(MockDataSource::new());
        let session = QuerySession::new(mock.clone(), mock).with_cache(Duration::ZERO);
        assert_eq!(session.cache_ttl(), None);
    }

    #[test]
    fn test_injected_clock() {
        let mock = Arc::new(MockDataSource::new());
        let session = QuerySession::new(mock.clone(), mock)
            .with_cache(Duration::from_millis(500))
            .with_clock(fixed);
        assert_eq!(session.now(), TimeMs::new(42_000));
        assert_eq!(session.cache_ttl(), Some(Duration::from_millis(500)));
    }
}
