pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::{Config, MarketCoins};
pub use datasource::{
    DataSourceError, IndexerDataSource, LedgerSource, MockDataSource, PriceSource,
};
pub use domain::{Address, CoinName, CoinPrices, Decimal, ObligationId, TimeMs};
pub use engine::CalcError;
pub use error::AppError;
pub use orchestration::{MarketQuerier, QueryError, QuerySession};
