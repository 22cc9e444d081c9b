//! Query layer: fetches raw records through a [`QuerySession`] and runs them
//! through the engine.
//!
//! Each feature area has its own capability trait; [`MarketQuerier`]
//! implements all of them.

use crate::datasource::DataSourceError;
use crate::domain::{Address, CoinName, ObligationId, TimeMs};
use crate::engine::{
    CalcError, CollateralMetrics, IncentivePoolMetrics, Lending, ObligationAccount, PoolMetrics,
    Portfolio, SpoolMetrics, VeScaMetrics,
};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub mod querier;
pub mod session;

pub use querier::MarketQuerier;
pub use session::{Clock, QuerySession};

#[derive(Debug, Error)]
pub enum QueryError {
    /// A required object is missing. Terminal for the query.
    #[error("required object not found: {0}")]
    NotFound(String),
    #[error("price unavailable for {0}")]
    PriceUnavailable(CoinName),
    #[error(transparent)]
    DataSource(DataSourceError),
    #[error(transparent)]
    Calc(#[from] CalcError),
}

impl From<DataSourceError> for QueryError {
    fn from(err: DataSourceError) -> Self {
        match err {
            DataSourceError::NotFound(what) => QueryError::NotFound(what),
            other => QueryError::DataSource(other),
        }
    }
}

/// Valued pools and collaterals at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub as_of: TimeMs,
    pub pools: BTreeMap<CoinName, PoolMetrics>,
    pub collaterals: BTreeMap<CoinName, CollateralMetrics>,
}

#[async_trait]
pub trait CoreQueries {
    /// Value the given coins' pools and collaterals, or every configured
    /// market coin when `coins` is `None`. Coins that cannot be valued are
    /// left out.
    async fn get_market_pools(
        &self,
        coins: Option<&[CoinName]>,
    ) -> Result<MarketSnapshot, QueryError>;

    async fn get_obligation_account(
        &self,
        id: &ObligationId,
    ) -> Result<ObligationAccount, QueryError>;

    async fn get_lending(&self, coin: &CoinName, owner: &Address) -> Result<Lending, QueryError>;
}

#[async_trait]
pub trait SpoolQueries {
    async fn get_spool(&self, coin: &CoinName) -> Result<SpoolMetrics, QueryError>;
}

#[async_trait]
pub trait BorrowIncentiveQueries {
    async fn get_borrow_incentive_pool(
        &self,
        coin: &CoinName,
    ) -> Result<IncentivePoolMetrics, QueryError>;
}

#[async_trait]
pub trait VeScaQueries {
    async fn get_ve_sca(&self, key_id: &str) -> Result<VeScaMetrics, QueryError>;

    /// Every governance lock of `owner`; keys that fail to load are left out.
    async fn get_ve_scas(&self, owner: &Address) -> Result<Vec<VeScaMetrics>, QueryError>;
}

#[async_trait]
pub trait PortfolioQueries {
    async fn get_user_portfolio(&self, owner: &Address) -> Result<Portfolio, QueryError>;
}
