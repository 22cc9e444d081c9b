//! Raw market records: lending pools and collateral markets.
//!
//! These mirror what the fetch collaborator decodes from on-ledger objects.
//! Fractions (rates, kinks, factors, weights) are Move `FixedPoint32` raw
//! values; amounts are raw integer coin units.

use crate::domain::{CoinName, Decimal, TimeMs};
use serde::{Deserialize, Serialize};

/// One single-coin lending pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMarketPool {
    pub coin: CoinName,
    /// Fully qualified on-ledger coin type.
    pub coin_type: String,
    pub decimals: u32,
    /// Missing when the balance-sheet table entry could not be read.
    pub balance_sheet: Option<RawBalanceSheet>,
    /// Missing when the interest-model table entry could not be read.
    pub interest_model: Option<RawInterestModel>,
    pub borrow_index: u64,
    /// Seconds since epoch of the last on-ledger index update.
    pub last_updated_secs: i64,
    /// Maximum total supply in raw coin units (0 = uncapped).
    #[serde(default)]
    pub supply_limit: u64,
    /// Maximum total debt in raw coin units (0 = uncapped).
    #[serde(default)]
    pub borrow_limit: u64,
    #[serde(default)]
    pub is_isolated: bool,
}

impl RawMarketPool {
    pub fn last_updated(&self) -> TimeMs {
        TimeMs::from_secs(self.last_updated_secs)
    }
}

/// A pool's balance sheet in raw coin units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBalanceSheet {
    pub cash: u64,
    pub debt: u64,
    /// Protocol reserve (revenue) carved out of the pool's assets.
    pub revenue: u64,
    /// Total issued claim shares (market coins).
    pub market_coin_supply: u64,
}

/// Kinked interest curve and fee parameters, `FixedPoint32` encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInterestModel {
    pub base_borrow_rate_per_sec: u64,
    pub borrow_rate_on_mid_kink: u64,
    pub mid_kink: u64,
    pub borrow_rate_on_high_kink: u64,
    pub high_kink: u64,
    pub max_borrow_rate: u64,
    /// Extra divisor applied to the per-second rates.
    pub interest_rate_scale: u64,
    pub reserve_factor: u64,
    pub borrow_weight: u64,
    pub borrow_fee_rate: u64,
    /// Minimum borrow in raw coin units.
    #[serde(default)]
    pub min_borrow_amount: u64,
}

/// Decoded interest curve, every field a plain fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterestCurve {
    pub base_rate_per_sec: Decimal,
    pub rate_on_mid_kink: Decimal,
    pub mid_kink: Decimal,
    pub rate_on_high_kink: Decimal,
    pub high_kink: Decimal,
    pub max_rate: Decimal,
    pub reserve_factor: Decimal,
    pub borrow_weight: Decimal,
    pub borrow_fee_rate: Decimal,
}

impl RawInterestModel {
    /// Decode the fixed-point fields. Rates come out per second.
    pub fn decode(&self) -> InterestCurve {
        let scale = Decimal::from(self.interest_rate_scale.max(1));
        let rate = |raw: u64| Decimal::from_fixed_point32(raw) / scale;
        InterestCurve {
            base_rate_per_sec: rate(self.base_borrow_rate_per_sec),
            rate_on_mid_kink: rate(self.borrow_rate_on_mid_kink),
            mid_kink: Decimal::from_fixed_point32(self.mid_kink),
            rate_on_high_kink: rate(self.borrow_rate_on_high_kink),
            high_kink: Decimal::from_fixed_point32(self.high_kink),
            max_rate: rate(self.max_borrow_rate),
            reserve_factor: Decimal::from_fixed_point32(self.reserve_factor),
            borrow_weight: Decimal::from_fixed_point32(self.borrow_weight),
            borrow_fee_rate: Decimal::from_fixed_point32(self.borrow_fee_rate),
        }
    }
}

/// One collateral market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMarketCollateral {
    pub coin: CoinName,
    pub coin_type: String,
    pub decimals: u32,
    pub risk_model: Option<RawRiskModel>,
    /// Aggregate deposited collateral in raw coin units.
    pub total_collateral_amount: u64,
}

/// Collateral risk parameters, `FixedPoint32` encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRiskModel {
    pub collateral_factor: u64,
    pub liquidation_factor: u64,
    pub liquidation_penalty: u64,
    pub liquidation_discount: u64,
    pub liquidation_reserve_factor: u64,
    /// Deposit cap in raw coin units.
    pub max_collateral_amount: u64,
}
