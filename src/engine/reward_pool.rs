//! Spool and borrow incentive pool metrics, and pending rewards of accounts.

use super::reward_accrual::{
    boost_value, claimable_points_scaled, points_per_sec, points_to_reward, project_index,
};
use super::{PoolMetrics, SECONDS_PER_YEAR};
use crate::domain::{
    CoinName, CoinPrices, Decimal, RawIncentiveAccount, RawIncentivePool, RawRewardCoin,
    RawSpool, RawStakeAccount, TimeMs, WEIGHT_SCALE,
};
use serde::Serialize;

/// Reward owed to an account in one reward coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReward {
    pub reward_coin: CoinName,
    pub points: Decimal,
    /// Raw reward-coin units.
    pub amount: Decimal,
    pub coin: Decimal,
    /// `None` when the reward coin has no price.
    pub value: Option<Decimal>,
}

impl PendingReward {
    fn new(reward: &RawRewardCoin, points: Decimal, price: Option<Decimal>) -> Self {
        let amount = points_to_reward(points, reward).floor();
        let coin = amount.shift(-(reward.decimals as i32));
        Self {
            reward_coin: reward.coin.clone(),
            points,
            amount,
            coin,
            value: price.map(|p| coin * p),
        }
    }
}

/// Derived metrics of one staking pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpoolMetrics {
    pub coin: CoinName,
    pub market_coin: CoinName,
    pub current_index: Decimal,
    /// Staked market coin, raw units.
    pub staked_amount: Decimal,
    pub staked_coin: Decimal,
    /// USD value of the underlying the staked market coin redeems for.
    pub staked_value: Decimal,
    pub max_staked_amount: Decimal,
    pub distributed_point: Decimal,
    pub max_point: Decimal,
    pub reward_coin: CoinName,
    pub reward_price: Option<Decimal>,
    /// Reward coin released per second, whole coins.
    pub reward_per_sec: Decimal,
    /// Annual reward value over staked value; zero without stakes or price.
    pub reward_apr: Decimal,
}

/// Value a spool as of `as_of`.
///
/// `pool` must be the lending pool of the spool's underlying coin; it
/// supplies the conversion rate and underlying price.
pub fn value_spool(
    spool: &RawSpool,
    pool: &PoolMetrics,
    reward_price: Option<Decimal>,
    as_of: TimeMs,
) -> SpoolMetrics {
    let projected = project_index(&spool.schedule, spool.stakes, as_of);
    let staked_amount = Decimal::from(spool.stakes);
    let staked_value = pool.to_value(pool.redeemable_amount(staked_amount));
    let reward_per_sec = points_to_reward(points_per_sec(&spool.schedule), &spool.reward)
        .shift(-(spool.reward.decimals as i32));

    SpoolMetrics {
        coin: spool.coin.clone(),
        market_coin: spool.coin.market_coin(),
        current_index: projected.index,
        staked_amount,
        staked_coin: pool.to_coin(staked_amount),
        staked_value,
        max_staked_amount: Decimal::from(spool.max_stakes),
        distributed_point: projected.distributed_point,
        max_point: Decimal::from(spool.schedule.max_point),
        reward_coin: spool.reward.coin.clone(),
        reward_price,
        reward_per_sec,
        reward_apr: annual_reward_apr(reward_per_sec, reward_price, staked_value),
    }
}

fn annual_reward_apr(
    reward_per_sec: Decimal,
    reward_price: Option<Decimal>,
    staked_value: Decimal,
) -> Decimal {
    let Some(price) = reward_price else {
        return Decimal::zero();
    };
    let annual_value = reward_per_sec * Decimal::from(SECONDS_PER_YEAR) * price;
    annual_value
        .checked_div(staked_value)
        .unwrap_or_else(Decimal::zero)
}

/// Pending spool reward of a stake account.
pub fn stake_account_rewards(
    account: &RawStakeAccount,
    spool: &RawSpool,
    reward_price: Option<Decimal>,
    as_of: TimeMs,
) -> PendingReward {
    let projected = project_index(&spool.schedule, spool.stakes, as_of);
    let points = claimable_points_scaled(account.staked, account.index, account.points, projected.index);
    PendingReward::new(&spool.reward, points, reward_price)
}

/// One reward stream of an incentive pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncentiveRewardMetrics {
    pub reward_coin: CoinName,
    pub current_index: Decimal,
    pub distributed_point: Decimal,
    pub max_point: Decimal,
    pub reward_price: Option<Decimal>,
    pub reward_per_sec: Decimal,
    pub reward_apr: Decimal,
}

/// Derived metrics of one borrow incentive pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncentivePoolMetrics {
    pub coin: CoinName,
    pub staked_amount: Decimal,
    pub staked_coin: Decimal,
    pub staked_value: Decimal,
    pub base_weight: Decimal,
    pub rewards: Vec<IncentiveRewardMetrics>,
}

/// Value a borrow incentive pool as of `as_of`.
///
/// `pool` is the lending pool whose debt is staked.
pub fn value_incentive_pool(
    incentive: &RawIncentivePool,
    pool: &PoolMetrics,
    prices: &CoinPrices,
    as_of: TimeMs,
) -> IncentivePoolMetrics {
    let staked_amount = Decimal::from(incentive.stakes);
    let staked_value = pool.to_value(staked_amount);
    let rewards = incentive
        .points
        .iter()
        .map(|point| {
            let projected = project_index(&point.schedule, incentive.stakes, as_of);
            let reward_price = prices.get(&point.reward.coin);
            let reward_per_sec = points_to_reward(points_per_sec(&point.schedule), &point.reward)
                .shift(-(point.reward.decimals as i32));
            IncentiveRewardMetrics {
                reward_coin: point.reward.coin.clone(),
                current_index: projected.index,
                distributed_point: projected.distributed_point,
                max_point: Decimal::from(point.schedule.max_point),
                reward_price,
                reward_per_sec,
                reward_apr: annual_reward_apr(reward_per_sec, reward_price, staked_value),
            }
        })
        .collect();

    IncentivePoolMetrics {
        coin: incentive.coin.clone(),
        staked_amount,
        staked_coin: pool.to_coin(staked_amount),
        staked_value,
        base_weight: Decimal::from(incentive.base_weight) / Decimal::from(WEIGHT_SCALE),
        rewards,
    }
}

/// Pending incentive rewards of an account plus its boost value.
///
/// Streams the account holds no point record for are skipped.
pub fn incentive_account_rewards(
    account: &RawIncentiveAccount,
    incentive: &RawIncentivePool,
    prices: &CoinPrices,
    as_of: TimeMs,
) -> (Vec<PendingReward>, Decimal) {
    let rewards = incentive
        .points
        .iter()
        .filter_map(|point| {
            let record = account
                .points
                .iter()
                .find(|p| p.reward_coin == point.reward.coin)?;
            let projected = project_index(&point.schedule, incentive.stakes, as_of);
            let points = claimable_points_scaled(
                account.weighted_amount,
                record.index,
                record.points,
                projected.index,
            );
            Some(PendingReward::new(
                &point.reward,
                points,
                prices.get(&point.reward.coin),
            ))
        })
        .collect();
    let boost = boost_value(account.weighted_amount, account.debt_amount, incentive.base_weight);
    (rewards, boost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        RawBalanceSheet, RawIncentiveAccountPoint, RawIncentivePoolPoint, RawInterestModel,
        RawMarketPool, RawRewardSchedule, INDEX_SCALE,
    };
    use crate::engine::value_pool;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    const T0: i64 = 1_700_000_000;

    fn sui_pool() -> PoolMetrics {
        let raw = RawMarketPool {
            coin: "sui".into(),
            coin_type: "0x2::sui::SUI".to_string(),
            decimals: 9,
            balance_sheet: Some(RawBalanceSheet {
                cash: 2_000_000_000_000,
                debt: 0,
                revenue: 0,
                market_coin_supply: 1_000_000_000_000,
            }),
            interest_model: Some(RawInterestModel {
                base_borrow_rate_per_sec: 0,
                borrow_rate_on_mid_kink: 0,
                mid_kink: 1 << 31,
                borrow_rate_on_high_kink: 0,
                high_kink: 3 << 30,
                max_borrow_rate: 0,
                interest_rate_scale: 1,
                reserve_factor: 0,
                borrow_weight: 1 << 32,
                borrow_fee_rate: 0,
                min_borrow_amount: 0,
            }),
            borrow_index: 1_000_000_000,
            last_updated_secs: T0,
            supply_limit: 0,
            borrow_limit: 0,
            is_isolated: false,
        };
        value_pool(&raw, d("2"), TimeMs::from_secs(T0)).unwrap()
    }

    fn schedule() -> RawRewardSchedule {
        RawRewardSchedule {
            index: 0,
            point_per_period: 1_000_000_000,
            period_secs: 1,
            max_point: u64::MAX,
            distributed_point: 0,
            last_update_secs: T0,
        }
    }

    fn reward() -> RawRewardCoin {
        RawRewardCoin {
            coin: "sui".into(),
            decimals: 9,
            exchange_rate_numerator: 1,
            exchange_rate_denominator: 1,
        }
    }

    fn spool() -> RawSpool {
        RawSpool {
            coin: "sui".into(),
            stakes: 10_000_000_000,
            max_stakes: 0,
            schedule: schedule(),
            reward: reward(),
        }
    }

    #[test]
    fn test_spool_staked_value_uses_conversion_rate() {
        // 10 ssui at a 2.0 conversion rate is 20 sui, worth $40.
        let m = value_spool(&spool(), &sui_pool(), Some(d("2")), TimeMs::from_secs(T0));
        assert_eq!(m.staked_coin, d("10"));
        assert_eq!(m.staked_value, d("40"));
        assert_eq!(m.market_coin.as_str(), "ssui");
        assert_eq!(m.reward_per_sec, d("1"));
        // 1 sui/sec * 31_536_000 * $2 / $40
        assert_eq!(m.reward_apr, d("1576800"));
    }

    #[test]
    fn test_spool_apr_zero_without_reward_price() {
        let m = value_spool(&spool(), &sui_pool(), None, TimeMs::from_secs(T0));
        assert_eq!(m.reward_apr, Decimal::zero());
    }

    #[test]
    fn test_stake_account_reward_accrues_with_time() {
        let account = RawStakeAccount {
            id: "0xstake".to_string(),
            coin: "sui".into(),
            staked: 5_000_000_000,
            index: 0,
            points: 0,
        };
        // 10 seconds release 1e10 points over 1e10 stakes: index +1e9.
        let r = stake_account_rewards(&account, &spool(), Some(d("2")), TimeMs::from_secs(T0 + 10));
        assert_eq!(r.points, Decimal::from(5_000_000_000u64));
        assert_eq!(r.coin, d("5"));
        assert_eq!(r.value, Some(d("10")));
    }

    #[test]
    fn test_incentive_rewards_and_boost() {
        let incentive = RawIncentivePool {
            coin: "sui".into(),
            stakes: 1_000,
            base_weight: WEIGHT_SCALE / 2,
            points: vec![RawIncentivePoolPoint {
                schedule: RawRewardSchedule {
                    index: INDEX_SCALE,
                    ..schedule()
                },
                reward: reward(),
            }],
        };
        let account = RawIncentiveAccount {
            coin: "sui".into(),
            debt_amount: 200,
            weighted_amount: 150,
            points: vec![RawIncentiveAccountPoint {
                reward_coin: "sui".into(),
                index: 0,
                points: 7,
            }],
            ve_sca_key: Some("0xkey".to_string()),
        };
        let mut prices = CoinPrices::new();
        prices.insert("sui".into(), d("2"));

        let (rewards, boost) =
            incentive_account_rewards(&account, &incentive, &prices, TimeMs::from_secs(T0));
        assert_eq!(rewards.len(), 1);
        assert_eq!(rewards[0].points, d("157"));
        assert_eq!(boost, d("1.5"));

        let metrics = value_incentive_pool(&incentive, &sui_pool(), &prices, TimeMs::from_secs(T0));
        assert_eq!(metrics.base_weight, d("0.5"));
        assert_eq!(metrics.rewards[0].current_index, Decimal::from(INDEX_SCALE));
    }

    #[test]
    fn test_incentive_stream_without_account_record_skipped() {
        let incentive = RawIncentivePool {
            coin: "sui".into(),
            stakes: 1_000,
            base_weight: WEIGHT_SCALE,
            points: vec![RawIncentivePoolPoint {
                schedule: schedule(),
                reward: reward(),
            }],
        };
        let account = RawIncentiveAccount {
            coin: "sui".into(),
            debt_amount: 10,
            weighted_amount: 10,
            points: vec![],
            ve_sca_key: None,
        };
        let (rewards, boost) =
            incentive_account_rewards(&account, &incentive, &CoinPrices::new(), TimeMs::from_secs(T0));
        assert!(rewards.is_empty());
        assert_eq!(boost, Decimal::one());
    }
}
