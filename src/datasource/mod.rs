//! Data source abstraction for fetching raw ledger records and coin prices.

use crate::domain::{
    Address, CoinName, CoinPrices, ObligationId, RawIncentiveAccount, RawIncentivePool,
    RawMarketCollateral, RawMarketPool, RawObligation, RawSpool, RawStakeAccount, RawVeScaKey,
};
use async_trait::async_trait;
use std::fmt;

pub mod cache;
pub mod fallback;
pub mod hermes;
pub mod indexer;
pub mod mock;

pub use cache::{CachedLedgerSource, CachedPriceSource, TtlCache};
pub use fallback::FallbackPriceSource;
pub use hermes::HermesPriceSource;
pub use indexer::IndexerDataSource;
pub use mock::MockDataSource;

/// Source of raw on-ledger records.
///
/// Implementations own retry/backoff; callers treat every error as final.
#[async_trait]
pub trait LedgerSource: Send + Sync + fmt::Debug {
    /// Fetch one lending pool. `NotFound` when the market has no such pool.
    async fn fetch_market_pool(&self, coin: &CoinName) -> Result<RawMarketPool, DataSourceError>;

    /// Fetch one collateral market. `NotFound` when the coin is not accepted as collateral.
    async fn fetch_market_collateral(
        &self,
        coin: &CoinName,
    ) -> Result<RawMarketCollateral, DataSourceError>;

    async fn fetch_obligation(&self, id: &ObligationId) -> Result<RawObligation, DataSourceError>;

    /// Ids of every obligation owned by `owner`.
    async fn fetch_obligation_ids(
        &self,
        owner: &Address,
    ) -> Result<Vec<ObligationId>, DataSourceError>;

    /// Stake accounts of `owner` in the spool of `coin`.
    async fn fetch_stake_accounts(
        &self,
        owner: &Address,
        coin: &CoinName,
    ) -> Result<Vec<RawStakeAccount>, DataSourceError>;

    /// Wallet balance in raw units; zero when the owner holds none.
    async fn fetch_coin_balance(
        &self,
        owner: &Address,
        coin: &CoinName,
    ) -> Result<u64, DataSourceError>;

    async fn fetch_spool(&self, coin: &CoinName) -> Result<RawSpool, DataSourceError>;

    async fn fetch_borrow_incentive_pool(
        &self,
        coin: &CoinName,
    ) -> Result<RawIncentivePool, DataSourceError>;

    /// Incentive accounts bound to one obligation.
    async fn fetch_incentive_accounts(
        &self,
        obligation: &ObligationId,
    ) -> Result<Vec<RawIncentiveAccount>, DataSourceError>;

    async fn fetch_ve_sca_keys(&self, owner: &Address) -> Result<Vec<String>, DataSourceError>;

    async fn fetch_ve_sca(&self, key_id: &str) -> Result<RawVeScaKey, DataSourceError>;
}

/// Source of USD coin prices.
#[async_trait]
pub trait PriceSource: Send + Sync + fmt::Debug {
    /// Prices of the requested coins. Coins the source cannot price are left
    /// out of the table rather than failing the request.
    async fn fetch_coin_prices(&self, coins: &[CoinName]) -> Result<CoinPrices, DataSourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded
    RateLimited,
    /// The requested object does not exist
    NotFound(String),
    /// Other error
    Other(String),
}

impl DataSourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataSourceError::NotFound(_))
    }
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::NotFound(what) => write!(f, "Not found: {}", what),
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}
