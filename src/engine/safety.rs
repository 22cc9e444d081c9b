//! Safety margins for estimated transaction amounts.
//!
//! Prices and indices move between the moment an amount is estimated and the
//! moment the transaction executes. Maximums (borrow, withdraw) are shaved
//! down and required amounts (full repay) are padded up, so that a follow-up
//! transaction built from the estimate is not rejected.
//!
//! Policy: the haircut grows with the USD value of the amount.
//!
//! | integer digits of USD value | haircut |
//! |-----------------------------|---------|
//! | 1..=3  (< $1,000)           | 10 bps  |
//! | 4..=6  (< $1,000,000)       | 20 bps  |
//! | 7+                          | 30 bps  |

use crate::domain::Decimal;
use serde::Serialize;

const BPS_DENOMINATOR: u32 = 10_000;

/// Direction in which an estimate must err.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// The estimate is a maximum; under-estimate it.
    Decrease,
    /// The estimate is a requirement; over-estimate it.
    Increase,
}

/// Haircut in basis points for an amount worth `value_usd`.
pub fn haircut_bps(value_usd: Decimal) -> u32 {
    match value_usd.integer_digits() {
        0..=3 => 10,
        4..=6 => 20,
        _ => 30,
    }
}

/// Multiplier applied to an amount worth `value_usd`.
pub fn estimated_factor(value_usd: Decimal, adjustment: Adjustment) -> Decimal {
    let haircut = Decimal::from(haircut_bps(value_usd)) / Decimal::from(BPS_DENOMINATOR);
    match adjustment {
        Adjustment::Decrease => Decimal::one() - haircut,
        Adjustment::Increase => Decimal::one() + haircut,
    }
}

/// An amount surfaced for building a transaction.
///
/// `theoretical_amount` is the unconstrained figure, `capped_amount` applies
/// pool and position hard caps, and `amount` is the safety-adjusted value in
/// whole raw units that callers should actually use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedAmount {
    pub theoretical_amount: Decimal,
    pub capped_amount: Decimal,
    pub amount: Decimal,
    pub coin: Decimal,
    pub value: Decimal,
    pub factor: Decimal,
}

impl EstimatedAmount {
    /// Build an estimate from raw amounts.
    ///
    /// `price` and `decimals` convert raw units to USD for the haircut tier.
    /// Decreasing estimates are floored to whole raw units; increasing ones are
    /// rounded up.
    pub fn new(
        theoretical_amount: Decimal,
        caps: &[Decimal],
        price: Decimal,
        decimals: u32,
        adjustment: Adjustment,
    ) -> Self {
        let theoretical_amount = theoretical_amount.floor_at_zero();
        let capped_amount = caps
            .iter()
            .fold(theoretical_amount, |acc, cap| acc.min(cap.floor_at_zero()));
        let to_coin = |raw: Decimal| raw.shift(-(decimals as i32));

        let factor = estimated_factor(to_coin(capped_amount).saturating_mul(price), adjustment);
        let adjusted = capped_amount.saturating_mul(factor);
        let amount = match adjustment {
            Adjustment::Decrease => adjusted.floor(),
            Adjustment::Increase => -((-adjusted).floor()),
        };
        let coin = to_coin(amount);

        Self {
            theoretical_amount,
            capped_amount,
            amount,
            coin,
            value: coin.saturating_mul(price),
            factor,
        }
    }

    pub fn zero() -> Self {
        Self {
            theoretical_amount: Decimal::zero(),
            capped_amount: Decimal::zero(),
            amount: Decimal::zero(),
            coin: Decimal::zero(),
            value: Decimal::zero(),
            factor: Decimal::one(),
        }
    }
}
