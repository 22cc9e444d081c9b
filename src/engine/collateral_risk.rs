//! Collateral market risk parameters and deposit headroom.

use super::{ensure_invariant, CalcError};
use crate::domain::{CoinName, Decimal, RawMarketCollateral};
use serde::Serialize;

/// Derived metrics of one collateral market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollateralMetrics {
    pub coin: CoinName,
    pub coin_type: String,
    pub decimals: u32,
    pub price: Decimal,
    pub collateral_factor: Decimal,
    pub liquidation_factor: Decimal,
    pub liquidation_discount: Decimal,
    pub liquidation_penalty: Decimal,
    pub liquidation_reserve_factor: Decimal,
    pub deposit_amount: Decimal,
    pub deposit_coin: Decimal,
    pub deposit_value: Decimal,
    pub deposit_cap_amount: Decimal,
    pub deposit_cap_coin: Decimal,
    /// `max(0, cap - deposits)` in raw units.
    pub available_deposit_amount: Decimal,
    pub available_deposit_coin: Decimal,
    pub available_deposit_value: Decimal,
}

impl CollateralMetrics {
    pub fn to_coin(&self, raw: Decimal) -> Decimal {
        raw.shift(-(self.decimals as i32))
    }

    pub fn to_value(&self, raw: Decimal) -> Decimal {
        self.to_coin(raw).saturating_mul(self.price)
    }

    /// Raw amount worth `value` USD. `None` when the price is zero or the
    /// amount does not fit, as with dust-priced high-decimal coins.
    pub fn amount_for_value(&self, value: Decimal) -> Option<Decimal> {
        value
            .checked_div(self.price)
            .and_then(|coin| coin.checked_shift(self.decimals as i32))
    }
}

/// Scale a collateral market's on-ledger risk model into plain fractions and
/// compute its deposit headroom.
pub fn assess_collateral(
    raw: &RawMarketCollateral,
    price: Decimal,
) -> Result<CollateralMetrics, CalcError> {
    let model = raw
        .risk_model
        .ok_or_else(|| CalcError::CollateralDataUnavailable {
            coin: raw.coin.clone(),
            missing: "risk model",
        })?;

    let collateral_factor = Decimal::from_fixed_point32(model.collateral_factor);
    let liquidation_factor = Decimal::from_fixed_point32(model.liquidation_factor);
    let liquidation_discount = Decimal::from_fixed_point32(model.liquidation_discount);
    let liquidation_penalty = Decimal::from_fixed_point32(model.liquidation_penalty);
    let liquidation_reserve_factor = Decimal::from_fixed_point32(model.liquidation_reserve_factor);

    ensure_invariant(
        collateral_factor <= liquidation_factor && liquidation_factor <= Decimal::one(),
        || {
            format!(
                "{}: expected collateral factor {} <= liquidation factor {} <= 1",
                raw.coin, collateral_factor, liquidation_factor
            )
        },
    )?;
    for (name, value) in [
        ("liquidation discount", liquidation_discount),
        ("liquidation penalty", liquidation_penalty),
        ("liquidation reserve factor", liquidation_reserve_factor),
    ] {
        ensure_invariant(value <= Decimal::one(), || {
            format!("{}: {} above 1", raw.coin, name)
        })?;
    }
    ensure_invariant(!price.is_negative(), || {
        format!("{}: negative price", raw.coin)
    })?;

    let decimals = -(raw.decimals as i32);
    let deposit_amount = Decimal::from(raw.total_collateral_amount);
    let deposit_cap_amount = Decimal::from(model.max_collateral_amount);
    let available_deposit_amount = (deposit_cap_amount - deposit_amount).floor_at_zero();
    let deposit_coin = deposit_amount.shift(decimals);
    let available_deposit_coin = available_deposit_amount.shift(decimals);

    Ok(CollateralMetrics {
        coin: raw.coin.clone(),
        coin_type: raw.coin_type.clone(),
        decimals: raw.decimals,
        price,
        collateral_factor,
        liquidation_factor,
        liquidation_discount,
        liquidation_penalty,
        liquidation_reserve_factor,
        deposit_amount,
        deposit_coin,
        deposit_value: deposit_coin * price,
        deposit_cap_amount,
        deposit_cap_coin: deposit_cap_amount.shift(decimals),
        available_deposit_amount,
        available_deposit_coin,
        available_deposit_value: available_deposit_coin * price,
    })
}
