//! Domain types for the lending market metrics core.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Domain primitives: TimeMs, Address, CoinName, ObligationId
//! - Raw ledger records for pools, collaterals, positions, rewards and governance locks
//! - The per-query coin price table

pub mod decimal;
pub mod governance;
pub mod market;
pub mod obligation;
pub mod price;
pub mod primitives;
pub mod reward;

pub use decimal::Decimal;
pub use governance::{RawVeScaKey, MAX_LOCK_SECS};
pub use market::{
    InterestCurve, RawBalanceSheet, RawInterestModel, RawMarketCollateral, RawMarketPool,
    RawRiskModel,
};
pub use obligation::{RawDebt, RawObligation};
pub use price::CoinPrices;
pub use primitives::{Address, AddressParseError, CoinName, ObligationId, TimeMs};
pub use reward::{
    RawIncentiveAccount, RawIncentiveAccountPoint, RawIncentivePool, RawIncentivePoolPoint,
    RawRewardCoin, RawRewardSchedule, RawSpool, RawStakeAccount, INDEX_SCALE, WEIGHT_SCALE,
};
