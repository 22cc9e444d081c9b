//! veSCA governance lock valuation.

use crate::domain::{Decimal, RawVeScaKey, TimeMs, MAX_LOCK_SECS};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VeScaMetrics {
    pub key_id: String,
    pub locked_amount: Decimal,
    pub locked_coin: Decimal,
    /// `None` when the governance coin has no price.
    pub locked_value: Option<Decimal>,
    /// Voting weight, raw governance-coin units.
    pub ve_sca_amount: Decimal,
    pub ve_sca_coin: Decimal,
    pub unlock_at: TimeMs,
    pub remaining_lock_secs: u64,
    pub is_expired: bool,
}

/// Value a lock key as of `as_of`.
///
/// Voting weight decays linearly: `locked * remaining / MAX_LOCK_SECS`.
pub fn value_ve_sca(
    key: &RawVeScaKey,
    decimals: u32,
    price: Option<Decimal>,
    as_of: TimeMs,
) -> VeScaMetrics {
    let remaining = key.unlock_at().secs_since(as_of).min(MAX_LOCK_SECS);
    let locked_amount = Decimal::from(key.locked_amount);
    let ve_sca_amount = locked_amount
        .mul_div(Decimal::from(remaining), Decimal::from(MAX_LOCK_SECS))
        .unwrap_or_else(Decimal::zero)
        .floor();
    let shift = -(decimals as i32);
    let locked_coin = locked_amount.shift(shift);

    VeScaMetrics {
        key_id: key.key_id.clone(),
        locked_amount,
        locked_coin,
        locked_value: price.map(|p| locked_coin * p),
        ve_sca_amount,
        ve_sca_coin: ve_sca_amount.shift(shift),
        unlock_at: key.unlock_at(),
        remaining_lock_secs: remaining,
        is_expired: remaining == 0,
    }
}
