//! Pure computation engine(s) for market, position and reward metrics.
//!
//! Nothing in here performs I/O or holds state between calls: every function
//! takes raw records plus prices and returns freshly built value objects.

use crate::domain::CoinName;
use thiserror::Error;

pub mod collateral_risk;
pub mod governance;
pub mod obligation_account;
pub mod pool_valuation;
pub mod portfolio;
pub mod reward_accrual;
pub mod reward_pool;
pub mod safety;

pub use collateral_risk::{assess_collateral, CollateralMetrics};
pub use governance::{value_ve_sca, VeScaMetrics};
pub use obligation_account::{
    build_obligation_account, ObligationAccount, ObligationCollateral, ObligationDebt,
    UnvaluedEntry,
};
pub use pool_valuation::{apr_to_apy, borrow_rate_per_sec, value_pool, PoolMetrics};
pub use portfolio::{
    build_borrowing, build_lending, summarize_portfolio, Borrowing, Lending, LendingStake,
    PendingRewards, Portfolio, RewardTotal,
};
pub use reward_accrual::{boost_value, claimable_points, project_index, ProjectedIndex};
pub use reward_pool::{
    incentive_account_rewards, stake_account_rewards, value_incentive_pool, value_spool,
    IncentivePoolMetrics, IncentiveRewardMetrics, PendingReward, SpoolMetrics,
};
pub use safety::{estimated_factor, Adjustment, EstimatedAmount};

/// Seconds in a 365-day year.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Errors raised by the calculators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("pool data unavailable for {coin}: missing {missing}")]
    PoolDataUnavailable { coin: CoinName, missing: &'static str },
    #[error("collateral data unavailable for {coin}: missing {missing}")]
    CollateralDataUnavailable { coin: CoinName, missing: &'static str },
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

/// Check a ledger invariant.
///
/// Fails a debug assertion in debug and test builds; release builds return
/// [`CalcError::InvariantViolation`] instead of clamping.
pub(crate) fn ensure_invariant(
    holds: bool,
    describe: impl FnOnce() -> String,
) -> Result<(), CalcError> {
    if holds {
        return Ok(());
    }
    let message = describe();
    debug_assert!(holds, "invariant violated: {}", message);
    Err(CalcError::InvariantViolation(message))
}
