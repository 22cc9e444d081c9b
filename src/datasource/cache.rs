//! Read-through TTL cache in front of the data sources.
//!
//! Concurrent identical requests share one in-flight fetch. Failed fetches are
//! evicted as soon as they resolve so the next caller retries. Expired entries
//! are swept on every miss, so keys that are never asked for again do not
//! accumulate.

use super::{DataSourceError, LedgerSource, PriceSource};
use crate::domain::{
    Address, CoinName, CoinPrices, ObligationId, RawIncentiveAccount, RawIncentivePool,
    RawMarketCollateral, RawMarketPool, RawObligation, RawSpool, RawStakeAccount, RawVeScaKey,
};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, DataSourceError>>>;

struct Entry<V: Clone> {
    created: Instant,
    fetch: SharedFetch<V>,
}

pub struct TtlCache<K, V: Clone> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V: Clone> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache").field("ttl", &self.ttl).finish()
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, or run `fetch` and cache its result.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<V, DataSourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, DataSourceError>> + Send + 'static,
    {
        let shared = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            match entries.get(&key) {
                Some(entry) if entry.created.elapsed() < self.ttl => entry.fetch.clone(),
                _ => {
                    let ttl = self.ttl;
                    entries.retain(|_, entry| entry.created.elapsed() < ttl);
                    let fetch = fetch().boxed().shared();
                    entries.insert(
                        key.clone(),
                        Entry {
                            created: Instant::now(),
                            fetch: fetch.clone(),
                        },
                    );
                    fetch
                }
            }
        };

        let result = shared.clone().await;
        if result.is_err() {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            if entries
                .get(&key)
                .is_some_and(|entry| entry.fetch.ptr_eq(&shared))
            {
                entries.remove(&key);
            }
        }
        result
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Caches the market-wide ledger objects; per-owner lookups pass through.
#[derive(Debug)]
pub struct CachedLedgerSource {
    inner: Arc<dyn LedgerSource>,
    pools: TtlCache<CoinName, RawMarketPool>,
    collaterals: TtlCache<CoinName, RawMarketCollateral>,
    obligations: TtlCache<ObligationId, RawObligation>,
    spools: TtlCache<CoinName, RawSpool>,
    incentive_pools: TtlCache<CoinName, RawIncentivePool>,
}

impl CachedLedgerSource {
    pub fn new(inner: Arc<dyn LedgerSource>, ttl: Duration) -> Self {
        Self {
            inner,
            pools: TtlCache::new(ttl),
            collaterals: TtlCache::new(ttl),
            obligations: TtlCache::new(ttl),
            spools: TtlCache::new(ttl),
            incentive_pools: TtlCache::new(ttl),
        }
    }
}

#[async_trait]
impl LedgerSource for CachedLedgerSource {
    async fn fetch_market_pool(&self, coin: &CoinName) -> Result<RawMarketPool, DataSourceError> {
        let (inner, key) = (self.inner.clone(), coin.clone());
        self.pools
            .get_or_fetch(coin.clone(), move || async move {
                inner.fetch_market_pool(&key).await
            })
            .await
    }

    async fn fetch_market_collateral(
        &self,
        coin: &CoinName,
    ) -> Result<RawMarketCollateral, DataSourceError> {
        let (inner, key) = (self.inner.clone(), coin.clone());
        self.collaterals
            .get_or_fetch(coin.clone(), move || async move {
                inner.fetch_market_collateral(&key).await
            })
            .await
    }

    async fn fetch_obligation(&self, id: &ObligationId) -> Result<RawObligation, DataSourceError> {
        let (inner, key) = (self.inner.clone(), id.clone());
        self.obligations
            .get_or_fetch(id.clone(), move || async move {
                inner.fetch_obligation(&key).await
            })
            .await
    }

    async fn fetch_obligation_ids(
        &self,
        owner: &Address,
    ) -> Result<Vec<ObligationId>, DataSourceError> {
        self.inner.fetch_obligation_ids(owner).await
    }

    async fn fetch_stake_accounts(
        &self,
        owner: &Address,
        coin: &CoinName,
    ) -> Result<Vec<RawStakeAccount>, DataSourceError> {
        self.inner.fetch_stake_accounts(owner, coin).await
    }

    async fn fetch_coin_balance(
        &self,
        owner: &Address,
        coin: &CoinName,
    ) -> Result<u64, DataSourceError> {
        self.inner.fetch_coin_balance(owner, coin).await
    }

    async fn fetch_spool(&self, coin: &CoinName) -> Result<RawSpool, DataSourceError> {
        let (inner, key) = (self.inner.clone(), coin.clone());
        self.spools
            .get_or_fetch(coin.clone(), move || async move {
                inner.fetch_spool(&key).await
            })
            .await
    }

    async fn fetch_borrow_incentive_pool(
        &self,
        coin: &CoinName,
    ) -> Result<RawIncentivePool, DataSourceError> {
        let (inner, key) = (self.inner.clone(), coin.clone());
        self.incentive_pools
            .get_or_fetch(coin.clone(), move || async move {
                inner.fetch_borrow_incentive_pool(&key).await
            })
            .await
    }

    async fn fetch_incentive_accounts(
        &self,
        obligation: &ObligationId,
    ) -> Result<Vec<RawIncentiveAccount>, DataSourceError> {
        self.inner.fetch_incentive_accounts(obligation).await
    }

    async fn fetch_ve_sca_keys(&self, owner: &Address) -> Result<Vec<String>, DataSourceError> {
        self.inner.fetch_ve_sca_keys(owner).await
    }

    async fn fetch_ve_sca(&self, key_id: &str) -> Result<RawVeScaKey, DataSourceError> {
        self.inner.fetch_ve_sca(key_id).await
    }
}

/// Caches price tables keyed by the sorted set of requested coins.
#[derive(Debug)]
pub struct CachedPriceSource {
    inner: Arc<dyn PriceSource>,
    prices: TtlCache<Vec<CoinName>, CoinPrices>,
}

impl CachedPriceSource {
    pub fn new(inner: Arc<dyn PriceSource>, ttl: Duration) -> Self {
        Self {
            inner,
            prices: TtlCache::new(ttl),
        }
    }
}

#[async_trait]
impl PriceSource for CachedPriceSource {
    async fn fetch_coin_prices(&self, coins: &[CoinName]) -> Result<CoinPrices, DataSourceError> {
        let mut key = coins.to_vec();
        key.sort();
        key.dedup();
        let (inner, request) = (self.inner.clone(), key.clone());
        self.prices
            .get_or_fetch(key, move || async move {
                inner.fetch_coin_prices(&request).await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockDataSource;
    use crate::domain::{Decimal, RawBalanceSheet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sui_pool() -> RawMarketPool {
        RawMarketPool {
            coin: "sui".into(),
            coin_type: "0x2::sui::SUI".to_string(),
            decimals: 9,
            balance_sheet: Some(RawBalanceSheet {
                cash: 1,
                debt: 0,
                revenue: 0,
                market_coin_supply: 1,
            }),
            interest_model: None,
            borrow_index: 1_000_000_000,
            last_updated_secs: 0,
            supply_limit: 0,
            borrow_limit: 0,
            is_isolated: false,
        }
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let mock = MockDataSource::new().with_pool(sui_pool());
        let cached = CachedLedgerSource::new(Arc::new(mock.clone()), Duration::from_secs(60));
        let coin = CoinName::new("sui");

        let (a, b) = tokio::join!(cached.fetch_market_pool(&coin), cached.fetch_market_pool(&coin));
        assert_eq!(a.unwrap(), b.unwrap());
        cached.fetch_market_pool(&coin).await.unwrap();
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_entries_refetch() {
        let mock = MockDataSource::new().with_pool(sui_pool());
        let cached = CachedLedgerSource::new(Arc::new(mock.clone()), Duration::ZERO);
        let coin = CoinName::new("sui");

        cached.fetch_market_pool(&coin).await.unwrap();
        cached.fetch_market_pool(&coin).await.unwrap();
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_evicted() {
        let cache: TtlCache<u32, u32> = TtlCache::new(Duration::from_secs(60));
        let attempts = Arc::new(AtomicUsize::new(0));

        for expected in [Err(DataSourceError::RateLimited), Ok(7)] {
            let attempts = attempts.clone();
            let result = cache
                .get_or_fetch(1, move || async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(DataSourceError::RateLimited)
                    } else {
                        Ok(7)
                    }
                })
                .await;
            assert_eq!(result, expected);
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_miss_sweeps_expired_entries() {
        let cache: TtlCache<u32, u32> = TtlCache::new(Duration::from_millis(1));
        for key in 0..1000 {
            cache.get_or_fetch(key, move || async move { Ok(key) }).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(cache.get_or_fetch(5000, || async { Ok(1) }).await, Ok(1));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_price_key_ignores_order() {
        let mock = MockDataSource::new()
            .with_price("sui", Decimal::one())
            .with_price("usdc", Decimal::one());
        let cached = CachedPriceSource::new(Arc::new(mock.clone()), Duration::from_secs(60));

        cached
            .fetch_coin_prices(&["sui".into(), "usdc".into()])
            .await
            .unwrap();
        cached
            .fetch_coin_prices(&["usdc".into(), "sui".into()])
            .await
            .unwrap();
        assert_eq!(mock.call_count(), 1);
    }
}
