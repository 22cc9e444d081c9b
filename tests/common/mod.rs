#![allow(dead_code)]

use lendscope::domain::{
    RawBalanceSheet, RawIncentiveAccount, RawIncentiveAccountPoint, RawIncentivePool,
    RawIncentivePoolPoint, RawInterestModel, RawMarketCollateral, RawMarketPool, RawObligation,
    RawRewardCoin, RawRewardSchedule, RawRiskModel, RawSpool, RawStakeAccount, RawVeScaKey,
    INDEX_SCALE, MAX_LOCK_SECS, WEIGHT_SCALE,
};
use lendscope::{
    Address, CoinName, Decimal, MarketCoins, MarketQuerier, MockDataSource, ObligationId,
    QuerySession, TimeMs,
};
use std::str::FromStr;
use std::sync::Arc;

/// Query instant every fixture is anchored to.
pub const T0: i64 = 1_700_000_000;

pub fn fixed_clock() -> TimeMs {
    TimeMs::from_secs(T0)
}

pub fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

pub fn owner() -> Address {
    Address::from_str("0xa11ce").unwrap()
}

pub fn obligation_id() -> ObligationId {
    ObligationId::new("0x0b1")
}

pub const VE_SCA_KEY: &str = "0x5ca1";

/// Zero-rate pool holding `cash` with `market_coin_supply` shares outstanding.
pub fn pool(coin: &str, decimals: u32, cash: u64, market_coin_supply: u64) -> RawMarketPool {
    RawMarketPool {
        coin: coin.into(),
        coin_type: format!("0x2::{}::{}", coin, coin.to_uppercase()),
        decimals,
        balance_sheet: Some(RawBalanceSheet {
            cash,
            debt: 0,
            revenue: 0,
            market_coin_supply,
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
        borrow_index: INDEX_SCALE,
        last_updated_secs: T0,
        supply_limit: 0,
        borrow_limit: 0,
        is_isolated: false,
    }
}

/// cf = 0.5, lf = 0.75
pub fn collateral(coin: &str, decimals: u32) -> RawMarketCollateral {
    RawMarketCollateral {
        coin: coin.into(),
        coin_type: format!("0x2::{}::{}", coin, coin.to_uppercase()),
        decimals,
        risk_model: Some(RawRiskModel {
            collateral_factor: 1 << 31,
            liquidation_factor: 3 << 30,
            liquidation_penalty: 0,
            liquidation_discount: 0,
            liquidation_reserve_factor: 0,
            max_collateral_amount: u64::MAX,
        }),
        total_collateral_amount: 0,
    }
}

fn schedule(index: u64, point_per_period: u64) -> RawRewardSchedule {
    RawRewardSchedule {
        index,
        point_per_period,
        period_secs: 1,
        max_point: u64::MAX,
        distributed_point: 0,
        last_update_secs: T0,
    }
}

fn reward_coin(coin: &str) -> RawRewardCoin {
    RawRewardCoin {
        coin: coin.into(),
        decimals: 9,
        exchange_rate_numerator: 1,
        exchange_rate_denominator: 1,
    }
}

/// 1000 ssui staked, releasing one sui per second.
pub fn sui_spool() -> RawSpool {
    RawSpool {
        coin: "sui".into(),
        stakes: 1_000_000_000_000,
        max_stakes: 0,
        schedule: schedule(0, 1_000_000_000),
        reward: reward_coin("sui"),
    }
}

pub fn usdc_incentive_pool() -> RawIncentivePool {
    RawIncentivePool {
        coin: "usdc".into(),
        stakes: 3_000_000,
        base_weight: WEIGHT_SCALE / 2,
        points: vec![RawIncentivePoolPoint {
            schedule: schedule(INDEX_SCALE, 0),
            reward: reward_coin("sca"),
        }],
    }
}

pub fn market_coins() -> MarketCoins {
    MarketCoins {
        market: vec!["sui".into(), "usdc".into()],
        spool: vec!["sui".into()],
        borrow_incentive: vec!["usdc".into()],
        governance: CoinName::new("sca"),
        governance_decimals: 9,
    }
}

/// Market with sui ($2, one ssui redeems for two sui) and usdc ($1), plus a
/// wallet that supplies sui, borrows usdc against sui and holds one lock.
///
/// - 5 ssui in the wallet and 5 ssui staked: 20 sui supplied, $40
/// - obligation: 10 sui collateral ($20), 3 usdc debt ($3)
/// - veSCA: 100 sca locked for half the maximum, $50
pub fn standard_market() -> MockDataSource {
    let owner = owner();
    MockDataSource::new()
        .with_pool(pool("sui", 9, 2_000_000_000_000, 1_000_000_000_000))
        .with_pool(pool("usdc", 6, 1_000_000_000_000, 1_000_000_000_000))
        .with_collateral(collateral("sui", 9))
        .with_price("sui", d("2"))
        .with_price("usdc", d("1"))
        .with_price("sca", d("0.5"))
        .with_spool(sui_spool())
        .with_incentive_pool(usdc_incentive_pool())
        .with_balance(&owner, "ssui", 5_000_000_000)
        .with_balance(&owner, "usdc", 12_000_000)
        .with_stake_account(
            &owner,
            RawStakeAccount {
                id: "0x57a4e".to_string(),
                coin: "sui".into(),
                staked: 5_000_000_000,
                index: 0,
                points: 0,
            },
        )
        .with_obligation(
            &owner,
            RawObligation::new(obligation_id())
                .with_collateral("sui", 10_000_000_000)
                .with_debt("usdc", 3_000_000, INDEX_SCALE),
        )
        .with_incentive_account(
            &obligation_id(),
            RawIncentiveAccount {
                coin: "usdc".into(),
                debt_amount: 3_000_000,
                weighted_amount: 3_000_000,
                points: vec![RawIncentiveAccountPoint {
                    reward_coin: "sca".into(),
                    index: 0,
                    points: 0,
                }],
                ve_sca_key: Some(VE_SCA_KEY.to_string()),
            },
        )
        .with_ve_sca_key(
            &owner,
            RawVeScaKey {
                key_id: VE_SCA_KEY.to_string(),
                locked_amount: 100_000_000_000,
                unlock_at_secs: T0 + (MAX_LOCK_SECS / 2) as i64,
            },
        )
}

pub fn querier_over(source: MockDataSource, coins: MarketCoins) -> MarketQuerier {
    let source = Arc::new(source);
    let session = QuerySession::new(source.clone(), source).with_clock(fixed_clock);
    MarketQuerier::new(session, coins)
}

pub fn standard_querier() -> MarketQuerier {
    querier_over(standard_market(), market_coins())
}
