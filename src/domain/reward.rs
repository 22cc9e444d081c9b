//! Raw reward records shared by staking pools (spools) and borrow incentive pools.

use crate::domain::{CoinName, TimeMs};
use serde::{Deserialize, Serialize};

/// Scale of every reward index.
pub const INDEX_SCALE: u64 = 1_000_000_000;

/// Scale of incentive weights (`base_weight` is expressed against it).
pub const WEIGHT_SCALE: u64 = 1_000_000_000_000;

/// Point distribution schedule driving one reward index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRewardSchedule {
    /// Global index as of `last_update_secs`, scaled by [`INDEX_SCALE`].
    pub index: u64,
    /// Points released every full period.
    pub point_per_period: u64,
    pub period_secs: u64,
    /// Total points the schedule will ever release.
    pub max_point: u64,
    /// Points released so far.
    pub distributed_point: u64,
    pub last_update_secs: i64,
}

impl RawRewardSchedule {
    pub fn last_update(&self) -> TimeMs {
        TimeMs::from_secs(self.last_update_secs)
    }

    /// Points that can still be released.
    pub fn remaining_points(&self) -> u64 {
        self.max_point.saturating_sub(self.distributed_point)
    }
}

/// Reward coin a schedule pays out in, and its points exchange rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRewardCoin {
    pub coin: CoinName,
    pub decimals: u32,
    /// Raw reward units per point = numerator / denominator.
    pub exchange_rate_numerator: u64,
    pub exchange_rate_denominator: u64,
}

/// Staking pool for one market coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSpool {
    /// Underlying coin of the staked market coin (e.g. `sui` for `ssui`).
    pub coin: CoinName,
    /// Total staked market coin, raw units.
    pub stakes: u64,
    #[serde(default)]
    pub max_stakes: u64,
    #[serde(flatten)]
    pub schedule: RawRewardSchedule,
    pub reward: RawRewardCoin,
}

/// One wallet stake account in a spool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStakeAccount {
    pub id: String,
    pub coin: CoinName,
    /// Staked market coin, raw units.
    pub staked: u64,
    /// Spool index at the account's last interaction.
    pub index: u64,
    /// Points accrued but not yet claimed.
    pub points: u64,
}

/// Borrow incentive pool attached to one lending pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIncentivePool {
    pub coin: CoinName,
    /// Total weighted debt staked into the program.
    pub stakes: u64,
    /// Weight of unboosted debt, against [`WEIGHT_SCALE`].
    pub base_weight: u64,
    pub points: Vec<RawIncentivePoolPoint>,
}

/// One reward stream of an incentive pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIncentivePoolPoint {
    #[serde(flatten)]
    pub schedule: RawRewardSchedule,
    pub reward: RawRewardCoin,
}

/// An obligation's stake in one incentive pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIncentiveAccount {
    pub coin: CoinName,
    /// Staked (unweighted) debt, raw units.
    pub debt_amount: u64,
    /// Debt after base weight and governance boost.
    pub weighted_amount: u64,
    pub points: Vec<RawIncentiveAccountPoint>,
    /// veSCA key bound to the obligation, if boosted.
    #[serde(default)]
    pub ve_sca_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIncentiveAccountPoint {
    pub reward_coin: CoinName,
    pub index: u64,
    pub points: u64,
}
