//! Mock data source for testing without network calls.

use super::{DataSourceError, LedgerSource, PriceSource};
use crate::domain::{
    Address, CoinName, CoinPrices, Decimal, ObligationId, RawIncentiveAccount, RawIncentivePool,
    RawMarketCollateral, RawMarketPool, RawObligation, RawSpool, RawStakeAccount, RawVeScaKey,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock ledger and price source serving predefined records.
#[derive(Debug, Clone, Default)]
pub struct MockDataSource {
    pools: BTreeMap<CoinName, RawMarketPool>,
    collaterals: BTreeMap<CoinName, RawMarketCollateral>,
    obligations: BTreeMap<ObligationId, RawObligation>,
    owners: BTreeMap<Address, Vec<ObligationId>>,
    stake_accounts: BTreeMap<(Address, CoinName), Vec<RawStakeAccount>>,
    balances: BTreeMap<(Address, CoinName), u64>,
    spools: BTreeMap<CoinName, RawSpool>,
    incentive_pools: BTreeMap<CoinName, RawIncentivePool>,
    incentive_accounts: BTreeMap<ObligationId, Vec<RawIncentiveAccount>>,
    ve_sca_keys: BTreeMap<Address, Vec<RawVeScaKey>>,
    prices: CoinPrices,
    /// Coins whose pool, collateral and price fetches fail.
    failing: BTreeSet<CoinName>,
    /// Coins whose price fetch alone fails.
    failing_prices: BTreeSet<CoinName>,
    calls: Arc<AtomicUsize>,
}

impl MockDataSource {
    /// Create a new mock data source with empty data.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool(mut self, pool: RawMarketPool) -> Self {
        self.pools.insert(pool.coin.clone(), pool);
        self
    }

    pub fn with_collateral(mut self, collateral: RawMarketCollateral) -> Self {
        self.collaterals.insert(collateral.coin.clone(), collateral);
        self
    }

    /// Add an obligation owned by `owner`.
    pub fn with_obligation(mut self, owner: &Address, obligation: RawObligation) -> Self {
        self.owners
            .entry(owner.clone())
            .or_default()
            .push(obligation.id.clone());
        self.obligations.insert(obligation.id.clone(), obligation);
        self
    }

    pub fn with_stake_account(mut self, owner: &Address, account: RawStakeAccount) -> Self {
        self.stake_accounts
            .entry((owner.clone(), account.coin.clone()))
            .or_default()
            .push(account);
        self
    }

    pub fn with_balance(mut self, owner: &Address, coin: impl Into<CoinName>, amount: u64) -> Self {
        self.balances.insert((owner.clone(), coin.into()), amount);
        self
    }

    pub fn with_spool(mut self, spool: RawSpool) -> Self {
        self.spools.insert(spool.coin.clone(), spool);
        self
    }

    pub fn with_incentive_pool(mut self, pool: RawIncentivePool) -> Self {
        self.incentive_pools.insert(pool.coin.clone(), pool);
        self
    }

    pub fn with_incentive_account(
        mut self,
        obligation: &ObligationId,
        account: RawIncentiveAccount,
    ) -> Self {
        self.incentive_accounts
            .entry(obligation.clone())
            .or_default()
            .push(account);
        self
    }

    pub fn with_ve_sca_key(mut self, owner: &Address, key: RawVeScaKey) -> Self {
        self.ve_sca_keys.entry(owner.clone()).or_default().push(key);
        self
    }

    pub fn with_price(mut self, coin: impl Into<CoinName>, price: Decimal) -> Self {
        self.prices.insert(coin.into(), price);
        self
    }

    /// Make every fetch keyed by `coin` fail with a network error.
    pub fn with_failing_coin(mut self, coin: impl Into<CoinName>) -> Self {
        self.failing.insert(coin.into());
        self
    }

    /// Leave `coin` out of every price response.
    pub fn with_failing_price(mut self, coin: impl Into<CoinName>) -> Self {
        self.failing_prices.insert(coin.into());
        self
    }

    /// Number of fetches served so far, across clones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_coin(&self, coin: &CoinName) -> Result<(), DataSourceError> {
        if self.failing.contains(coin) {
            return Err(DataSourceError::NetworkError(format!(
                "simulated failure for {}",
                coin
            )));
        }
        Ok(())
    }
}

fn not_found<T>(what: &str, key: impl std::fmt::Display) -> Result<T, DataSourceError> {
    Err(DataSourceError::NotFound(format!("{} {}", what, key)))
}

#[async_trait]
impl LedgerSource for MockDataSource {
    async fn fetch_market_pool(&self, coin: &CoinName) -> Result<RawMarketPool, DataSourceError> {
        self.record_call();
        self.check_coin(coin)?;
        match self.pools.get(coin) {
            Some(pool) => Ok(pool.clone()),
            None => not_found("market pool", coin),
        }
    }

    async fn fetch_market_collateral(
        &self,
        coin: &CoinName,
    ) -> Result<RawMarketCollateral, DataSourceError> {
        self.record_call();
        self.check_coin(coin)?;
        match self.collaterals.get(coin) {
            Some(collateral) => Ok(collateral.clone()),
            None => not_found("market collateral", coin),
        }
    }

    async fn fetch_obligation(&self, id: &ObligationId) -> Result<RawObligation, DataSourceError> {
        self.record_call();
        match self.obligations.get(id) {
            Some(obligation) => Ok(obligation.clone()),
            None => not_found("obligation", id),
        }
    }

    async fn fetch_obligation_ids(
        &self,
        owner: &Address,
    ) -> Result<Vec<ObligationId>, DataSourceError> {
        self.record_call();
        Ok(self.owners.get(owner).cloned().unwrap_or_default())
    }

    async fn fetch_stake_accounts(
        &self,
        owner: &Address,
        coin: &CoinName,
    ) -> Result<Vec<RawStakeAccount>, DataSourceError> {
        self.record_call();
        self.check_coin(coin)?;
        Ok(self
            .stake_accounts
            .get(&(owner.clone(), coin.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_coin_balance(
        &self,
        owner: &Address,
        coin: &CoinName,
    ) -> Result<u64, DataSourceError> {
        self.record_call();
        self.check_coin(coin)?;
        Ok(self
            .balances
            .get(&(owner.clone(), coin.clone()))
            .copied()
            .unwrap_or(0))
    }

    async fn fetch_spool(&self, coin: &CoinName) -> Result<RawSpool, DataSourceError> {
        self.record_call();
        self.check_coin(coin)?;
        match self.spools.get(coin) {
            Some(spool) => Ok(spool.clone()),
            None => not_found("spool", coin),
        }
    }

    async fn fetch_borrow_incentive_pool(
        &self,
        coin: &CoinName,
    ) -> Result<RawIncentivePool, DataSourceError> {
        self.record_call();
        self.check_coin(coin)?;
        match self.incentive_pools.get(coin) {
            Some(pool) => Ok(pool.clone()),
            None => not_found("borrow incentive pool", coin),
        }
    }

    async fn fetch_incentive_accounts(
        &self,
        obligation: &ObligationId,
    ) -> Result<Vec<RawIncentiveAccount>, DataSourceError> {
        self.record_call();
        Ok(self
            .incentive_accounts
            .get(obligation)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_ve_sca_keys(&self, owner: &Address) -> Result<Vec<String>, DataSourceError> {
        self.record_call();
        Ok(self
            .ve_sca_keys
            .get(owner)
            .map(|keys| keys.iter().map(|k| k.key_id.clone()).collect())
            .unwrap_or_default())
    }

    async fn fetch_ve_sca(&self, key_id: &str) -> Result<RawVeScaKey, DataSourceError> {
        self.record_call();
        match self
            .ve_sca_keys
            .values()
            .flatten()
            .find(|k| k.key_id == key_id)
        {
            Some(key) => Ok(key.clone()),
            None => not_found("veSCA key", key_id),
        }
    }
}

#[async_trait]
impl PriceSource for MockDataSource {
    async fn fetch_coin_prices(&self, coins: &[CoinName]) -> Result<CoinPrices, DataSourceError> {
        self.record_call();
        Ok(coins
            .iter()
            .filter(|c| !self.failing.contains(*c) && !self.failing_prices.contains(*c))
            .filter_map(|c| self.prices.get(c).map(|p| (c.clone(), p)))
            .collect())
    }
}
