//! Per-coin lending and per-position borrowing records, and their reduction
//! into one wallet summary.

use super::reward_pool::{incentive_account_rewards, stake_account_rewards, value_spool};
use super::safety::{Adjustment, EstimatedAmount};
use super::{ObligationAccount, PendingReward, PoolMetrics, VeScaMetrics};
use crate::domain::{
    Address, CoinName, CoinPrices, Decimal, ObligationId, RawIncentiveAccount, RawIncentivePool,
    RawSpool, RawStakeAccount, TimeMs,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Staking state feeding a [`Lending`].
#[derive(Debug, Clone, Copy)]
pub struct LendingStake<'a> {
    pub spool: &'a RawSpool,
    pub accounts: &'a [RawStakeAccount],
    pub reward_price: Option<Decimal>,
}

/// A wallet's supply position in one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lending {
    pub coin: CoinName,
    pub market_coin: CoinName,
    pub decimals: u32,
    pub price: Decimal,
    pub supply_apr: Decimal,
    pub supply_apy: Decimal,
    /// Spool reward APR on top of supply APR; zero without a spool.
    pub reward_apr: Decimal,
    pub conversion_rate: Decimal,
    /// Market coin held in the wallet, raw units.
    pub market_coin_amount: Decimal,
    /// Market coin staked in the spool, raw units.
    pub staked_market_coin_amount: Decimal,
    /// Underlying redeemable for all market coin held or staked.
    pub supplied_amount: Decimal,
    pub supplied_coin: Decimal,
    pub supplied_value: Decimal,
    pub staked_amount: Decimal,
    pub staked_value: Decimal,
    /// Underlying coin sitting unsupplied in the wallet.
    pub wallet_amount: Decimal,
    pub wallet_coin: Decimal,
    pub wallet_value: Decimal,
    /// Underlying the wallet's unstaked market coin redeems for now, bounded
    /// by pool cash. Staked market coin must be unstaked first.
    pub available_withdraw: EstimatedAmount,
    pub pending_rewards: Vec<PendingReward>,
}

pub fn build_lending(
    pool: &PoolMetrics,
    market_coin_balance: u64,
    wallet_balance: u64,
    stake: Option<LendingStake<'_>>,
    as_of: TimeMs,
) -> Lending {
    let market_coin_amount = Decimal::from(market_coin_balance);
    let staked_market_coin_amount: Decimal = stake
        .map(|s| s.accounts.iter().map(|a| Decimal::from(a.staked)).sum())
        .unwrap_or_else(Decimal::zero);

    let supplied_amount = pool.redeemable_amount(market_coin_amount + staked_market_coin_amount);
    let staked_amount = pool.redeemable_amount(staked_market_coin_amount);
    let supplied_coin = pool.to_coin(supplied_amount);
    let wallet_amount = Decimal::from(wallet_balance);
    let wallet_coin = pool.to_coin(wallet_amount);

    let (reward_apr, pending_rewards) = match stake {
        Some(s) => {
            let metrics = value_spool(s.spool, pool, s.reward_price, as_of);
            let rewards = s
                .accounts
                .iter()
                .map(|a| stake_account_rewards(a, s.spool, s.reward_price, as_of))
                .collect();
            (metrics.reward_apr, rewards)
        }
        None => (Decimal::zero(), Vec::new()),
    };

    Lending {
        coin: pool.coin.clone(),
        market_coin: pool.coin.market_coin(),
        decimals: pool.decimals,
        price: pool.price,
        supply_apr: pool.supply_apr,
        supply_apy: pool.supply_apy,
        reward_apr,
        conversion_rate: pool.conversion_rate,
        market_coin_amount,
        staked_market_coin_amount,
        supplied_amount,
        supplied_coin,
        supplied_value: supplied_coin * pool.price,
        staked_amount,
        staked_value: pool.to_value(staked_amount),
        wallet_amount,
        wallet_coin,
        wallet_value: wallet_coin * pool.price,
        available_withdraw: EstimatedAmount::new(
            pool.redeemable_amount(market_coin_amount),
            &[pool.cash_amount],
            pool.price,
            pool.decimals,
            Adjustment::Decrease,
        ),
        pending_rewards,
    }
}

/// One borrower position with its incentive rewards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Borrowing {
    pub obligation_id: ObligationId,
    pub account: ObligationAccount,
    pub incentive_rewards: Vec<PendingReward>,
    /// Boost value per incentivized debt coin.
    pub boosts: BTreeMap<CoinName, Decimal>,
    pub ve_sca_key: Option<String>,
}

/// Attach incentive rewards to a built account.
///
/// Accounts whose pool is missing from `incentive_pools` are skipped.
pub fn build_borrowing(
    account: ObligationAccount,
    incentive_pools: &BTreeMap<CoinName, RawIncentivePool>,
    incentive_accounts: &[RawIncentiveAccount],
    prices: &CoinPrices,
    as_of: TimeMs,
) -> Borrowing {
    let mut incentive_rewards = Vec::new();
    let mut boosts = BTreeMap::new();
    for incentive_account in incentive_accounts {
        let Some(pool) = incentive_pools.get(&incentive_account.coin) else {
            continue;
        };
        let (rewards, boost) = incentive_account_rewards(incentive_account, pool, prices, as_of);
        incentive_rewards.extend(rewards);
        boosts.insert(incentive_account.coin.clone(), boost);
    }
    let ve_sca_key = incentive_accounts
        .iter()
        .find_map(|a| a.ve_sca_key.clone());

    Borrowing {
        obligation_id: account.obligation_id.clone(),
        account,
        incentive_rewards,
        boosts,
        ve_sca_key,
    }
}

/// Pending rewards summed per reward coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardTotal {
    pub reward_coin: CoinName,
    pub amount: Decimal,
    pub coin: Decimal,
    /// `None` when any contributing reward lacked a price.
    pub value: Option<Decimal>,
}

impl RewardTotal {
    fn empty(reward_coin: CoinName) -> Self {
        Self {
            reward_coin,
            amount: Decimal::zero(),
            coin: Decimal::zero(),
            value: Some(Decimal::zero()),
        }
    }

    fn add(&mut self, reward: &PendingReward) {
        self.amount += reward.amount;
        self.coin += reward.coin;
        self.value = self.value.zip(reward.value).map(|(a, b)| a + b);
    }
}

fn total_rewards<'a>(
    rewards: impl IntoIterator<Item = &'a PendingReward>,
) -> BTreeMap<CoinName, RewardTotal> {
    let mut totals = BTreeMap::new();
    for reward in rewards {
        totals
            .entry(reward.reward_coin.clone())
            .or_insert_with(|| RewardTotal::empty(reward.reward_coin.clone()))
            .add(reward);
    }
    totals
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRewards {
    pub staking: BTreeMap<CoinName, RewardTotal>,
    pub borrow_incentive: BTreeMap<CoinName, RewardTotal>,
}

/// Everything one wallet holds across the market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub owner: Address,
    pub as_of: TimeMs,
    pub lendings: Vec<Lending>,
    pub borrowings: Vec<Borrowing>,
    pub ve_scas: Vec<VeScaMetrics>,
    pub total_supply_value: Decimal,
    pub total_collateral_value: Decimal,
    pub total_debt_value: Decimal,
    pub total_locked_sca_value: Decimal,
    /// Supply plus collateral plus locked governance value, less debt.
    pub net_value: Decimal,
    pub pending_rewards: PendingRewards,
}

/// Reduce per-coin and per-position records into portfolio totals.
///
/// Unpriced governance locks contribute nothing to the locked value.
pub fn summarize_portfolio(
    owner: Address,
    as_of: TimeMs,
    lendings: Vec<Lending>,
    borrowings: Vec<Borrowing>,
    ve_scas: Vec<VeScaMetrics>,
) -> Portfolio {
    let total_supply_value: Decimal = lendings.iter().map(|l| l.supplied_value).sum();
    let total_collateral_value: Decimal = borrowings
        .iter()
        .map(|b| b.account.total_deposited_value)
        .sum();
    let total_debt_value: Decimal = borrowings
        .iter()
        .map(|b| b.account.total_borrowed_value)
        .sum();
    let total_locked_sca_value: Decimal = ve_scas.iter().filter_map(|v| v.locked_value).sum();

    let pending_rewards = PendingRewards {
        staking: total_rewards(lendings.iter().flat_map(|l| &l.pending_rewards)),
        borrow_incentive: total_rewards(borrowings.iter().flat_map(|b| &b.incentive_rewards)),
    };

    Portfolio {
        owner,
        as_of,
        net_value: total_supply_value + total_collateral_value + total_locked_sca_value
            - total_debt_value,
        lendings,
        borrowings,
        ve_scas,
        total_supply_value,
        total_collateral_value,
        total_debt_value,
        total_locked_sca_value,
        pending_rewards,
    }
}
