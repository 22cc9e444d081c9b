//! Lending pool valuation: utilization, rates, conversion rate and limits.

use super::{ensure_invariant, CalcError, SECONDS_PER_YEAR};
use crate::domain::{CoinName, Decimal, InterestCurve, RawBalanceSheet, RawMarketPool, TimeMs};
use serde::Serialize;

/// Compounding periods per year used for APY.
pub const COMPOUNDING_PERIODS: u64 = 365;

/// Derived metrics of one lending pool.
///
/// Amount fields are raw coin units, `*_coin` fields are whole coins and
/// `*_value` fields are USD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMetrics {
    pub coin: CoinName,
    pub coin_type: String,
    pub decimals: u32,
    pub price: Decimal,
    pub utilization: Decimal,
    pub borrow_rate_per_sec: Decimal,
    pub borrow_apr: Decimal,
    pub borrow_apy: Decimal,
    pub supply_apr: Decimal,
    pub supply_apy: Decimal,
    pub max_borrow_apr: Decimal,
    /// Underlying redeemable per market coin.
    pub conversion_rate: Decimal,
    pub borrow_fee: Decimal,
    pub borrow_weight: Decimal,
    pub reserve_factor: Decimal,
    /// Borrow index projected to `as_of`.
    pub borrow_index: Decimal,
    pub as_of: TimeMs,
    pub cash_amount: Decimal,
    pub debt_amount: Decimal,
    pub reserve_amount: Decimal,
    pub market_coin_supply: Decimal,
    pub supply_amount: Decimal,
    pub supply_coin: Decimal,
    pub supply_value: Decimal,
    pub borrow_coin: Decimal,
    pub borrow_value: Decimal,
    pub min_borrow_amount: Decimal,
    /// Remaining supply room in raw units; `None` when uncapped.
    pub supply_headroom: Option<Decimal>,
    /// Remaining borrow room in raw units; `None` when uncapped.
    pub borrow_headroom: Option<Decimal>,
    pub is_isolated: bool,
}

impl PoolMetrics {
    /// Raw amount converted to whole coins.
    pub fn to_coin(&self, raw: Decimal) -> Decimal {
        raw.shift(-(self.decimals as i32))
    }

    /// Raw amount converted to USD.
    pub fn to_value(&self, raw: Decimal) -> Decimal {
        self.to_coin(raw).saturating_mul(self.price)
    }

    /// Raw underlying amount a raw market-coin amount redeems for.
    pub fn redeemable_amount(&self, market_coin_amount: Decimal) -> Decimal {
        market_coin_amount * self.conversion_rate
    }

    /// How much can be borrowed right now given cash and the borrow cap.
    pub fn borrowable_liquidity(&self) -> Decimal {
        match self.borrow_headroom {
            Some(headroom) => self.cash_amount.min(headroom),
            None => self.cash_amount,
        }
    }
}

/// Evaluate the kinked borrow-rate curve at `utilization`. Returns a
/// per-second rate.
pub fn borrow_rate_per_sec(curve: &InterestCurve, utilization: Decimal) -> Decimal {
    let u = utilization;
    if u <= curve.mid_kink {
        lerp(
            curve.base_rate_per_sec,
            curve.rate_on_mid_kink,
            u,
            curve.mid_kink,
        )
    } else if u <= curve.high_kink {
        lerp(
            curve.rate_on_mid_kink,
            curve.rate_on_high_kink,
            u - curve.mid_kink,
            curve.high_kink - curve.mid_kink,
        )
    } else {
        lerp(
            curve.rate_on_high_kink,
            curve.max_rate,
            u - curve.high_kink,
            Decimal::one() - curve.high_kink,
        )
    }
}

/// Linear segment from `from` to `to` over `span`, evaluated at `offset`.
fn lerp(from: Decimal, to: Decimal, offset: Decimal, span: Decimal) -> Decimal {
    match offset.checked_div(span) {
        Some(t) => from + (to - from) * t,
        None => to,
    }
}

/// `(1 + apr / 365)^365 - 1`.
pub fn apr_to_apy(apr: Decimal) -> Option<Decimal> {
    let periods = Decimal::from(COMPOUNDING_PERIODS);
    let per_period = Decimal::one() + apr / periods;
    per_period
        .checked_powu(COMPOUNDING_PERIODS)
        .map(|growth| growth - Decimal::one())
}

fn utilization(cash: Decimal, debt: Decimal) -> Decimal {
    debt.checked_div(cash + debt).unwrap_or_else(Decimal::zero)
}

/// Balance sheet with interest accrued since the last on-ledger update.
struct AccruedSheet {
    cash: Decimal,
    debt: Decimal,
    revenue: Decimal,
    borrow_index: Decimal,
}

fn accrue(
    sheet: &RawBalanceSheet,
    borrow_index: u64,
    curve: &InterestCurve,
    elapsed_secs: u64,
) -> AccruedSheet {
    let cash = Decimal::from(sheet.cash);
    let debt = Decimal::from(sheet.debt);
    let revenue = Decimal::from(sheet.revenue);
    let index = Decimal::from(borrow_index);
    if elapsed_secs == 0 {
        return AccruedSheet {
            cash,
            debt,
            revenue,
            borrow_index: index,
        };
    }

    let rate = borrow_rate_per_sec(curve, utilization(cash, debt));
    let growth = Decimal::one() + rate * Decimal::from(elapsed_secs);
    let accrued_debt = debt * growth;
    let interest = accrued_debt - debt;
    AccruedSheet {
        cash,
        debt: accrued_debt,
        revenue: revenue + interest * curve.reserve_factor,
        borrow_index: index * growth,
    }
}

/// Value a lending pool as of `as_of`.
///
/// Interest accrued between the pool's last on-ledger update and `as_of` is
/// projected with the current borrow rate, so the conversion rate and borrow
/// index match what the ledger will apply on the next interaction.
pub fn value_pool(
    pool: &RawMarketPool,
    price: Decimal,
    as_of: TimeMs,
) -> Result<PoolMetrics, CalcError> {
    let sheet = pool
        .balance_sheet
        .ok_or_else(|| CalcError::PoolDataUnavailable {
            coin: pool.coin.clone(),
            missing: "balance sheet",
        })?;
    let model = pool
        .interest_model
        .ok_or_else(|| CalcError::PoolDataUnavailable {
            coin: pool.coin.clone(),
            missing: "interest model",
        })?;
    let curve = model.decode();

    ensure_invariant(
        u128::from(sheet.cash) + u128::from(sheet.debt) >= u128::from(sheet.revenue),
        || format!("{}: reserve exceeds cash + debt", pool.coin),
    )?;
    ensure_invariant(
        curve.mid_kink <= curve.high_kink && curve.high_kink <= Decimal::one(),
        || format!("{}: kinks out of order", pool.coin),
    )?;
    ensure_invariant(curve.reserve_factor <= Decimal::one(), || {
        format!("{}: reserve factor above 1", pool.coin)
    })?;
    ensure_invariant(!price.is_negative(), || {
        format!("{}: negative price", pool.coin)
    })?;

    let elapsed = as_of.secs_since(pool.last_updated());
    let accrued = accrue(&sheet, pool.borrow_index, &curve, elapsed);

    let util = utilization(accrued.cash, accrued.debt);
    let rate = borrow_rate_per_sec(&curve, util);
    let year = Decimal::from(SECONDS_PER_YEAR);
    let borrow_apr = rate * year;
    let supply_apr = borrow_apr * util * (Decimal::one() - curve.reserve_factor);
    let borrow_apy = apr_to_apy(borrow_apr).ok_or(CalcError::Overflow("borrow apy"))?;
    let supply_apy = apr_to_apy(supply_apr).ok_or(CalcError::Overflow("supply apy"))?;

    let supply_amount = (accrued.cash + accrued.debt - accrued.revenue).floor_at_zero();
    let market_coin_supply = Decimal::from(sheet.market_coin_supply);
    let conversion_rate = if market_coin_supply.is_zero() {
        Decimal::one()
    } else {
        supply_amount / market_coin_supply
    };

    let headroom = |limit: u64, used: Decimal| {
        (limit > 0).then(|| (Decimal::from(limit) - used).floor_at_zero())
    };

    let decimals = -(pool.decimals as i32);
    let supply_coin = supply_amount.shift(decimals);
    let borrow_coin = accrued.debt.shift(decimals);

    Ok(PoolMetrics {
        coin: pool.coin.clone(),
        coin_type: pool.coin_type.clone(),
        decimals: pool.decimals,
        price,
        utilization: util,
        borrow_rate_per_sec: rate,
        borrow_apr,
        borrow_apy,
        supply_apr,
        supply_apy,
        max_borrow_apr: curve.max_rate * year,
        conversion_rate,
        borrow_fee: curve.borrow_fee_rate,
        borrow_weight: curve.borrow_weight,
        reserve_factor: curve.reserve_factor,
        borrow_index: accrued.borrow_index,
        as_of,
        cash_amount: accrued.cash,
        debt_amount: accrued.debt,
        reserve_amount: accrued.revenue,
        market_coin_supply,
        supply_amount,
        supply_coin,
        supply_value: supply_coin * price,
        borrow_coin,
        borrow_value: borrow_coin * price,
        min_borrow_amount: Decimal::from(model.min_borrow_amount),
        supply_headroom: headroom(pool.supply_limit, supply_amount),
        borrow_headroom: headroom(pool.borrow_limit, accrued.debt),
        is_isolated: pool.is_isolated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawInterestModel;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn fp32(s: &str) -> u64 {
        (d(s) * Decimal::from(1u64 << 32)).floor().to_canonical_string().parse().unwrap()
    }

    fn curve() -> InterestCurve {
        InterestCurve {
            base_rate_per_sec: d("0.01"),
            rate_on_mid_kink: d("0.1"),
            mid_kink: d("0.5"),
            rate_on_high_kink: d("0.3"),
            high_kink: d("0.8"),
            max_rate: d("1"),
            reserve_factor: d("0.2"),
            borrow_weight: d("1"),
            borrow_fee_rate: d("0"),
        }
    }

    fn pool(cash: u64, debt: u64, revenue: u64, supply: u64) -> RawMarketPool {
        RawMarketPool {
            coin: CoinName::new("usdc"),
            coin_type: "0x5d4b::coin::COIN".to_string(),
            decimals: 6,
            balance_sheet: Some(RawBalanceSheet {
                cash,
                debt,
                revenue,
                market_coin_supply: supply,
            }),
            interest_model: Some(RawInterestModel {
                base_borrow_rate_per_sec: 0,
                borrow_rate_on_mid_kink: fp32("0.1"),
                mid_kink: fp32("0.6"),
                borrow_rate_on_high_kink: fp32("0.2"),
                high_kink: fp32("0.9"),
                max_borrow_rate: fp32("1.5"),
                interest_rate_scale: SECONDS_PER_YEAR,
                reserve_factor: fp32("0.2"),
                borrow_weight: fp32("1.25"),
                borrow_fee_rate: 0,
                min_borrow_amount: 10_000,
            }),
            borrow_index: 1_000_000_000,
            last_updated_secs: 1_700_000_000,
            supply_limit: 0,
            borrow_limit: 0,
            is_isolated: false,
        }
    }

    fn at(secs: i64) -> TimeMs {
        TimeMs::from_secs(secs)
    }

    #[test]
    fn test_curve_segments() {
        let c = curve();
        assert_eq!(borrow_rate_per_sec(&c, Decimal::zero()), d("0.01"));
        assert_eq!(borrow_rate_per_sec(&c, d("0.25")), d("0.055"));
        assert_eq!(borrow_rate_per_sec(&c, d("0.5")), d("0.1"));
        assert_eq!(borrow_rate_per_sec(&c, d("0.65")), d("0.2"));
        assert_eq!(borrow_rate_per_sec(&c, d("0.8")), d("0.3"));
        assert_eq!(borrow_rate_per_sec(&c, d("0.9")), d("0.65"));
        assert_eq!(borrow_rate_per_sec(&c, Decimal::one()), d("1"));
    }

    #[test]
    fn test_curve_is_monotonic() {
        let c = curve();
        let mut prev = Decimal::zero();
        for step in 0..=100u64 {
            let u = Decimal::from(step) / Decimal::hundred();
            let rate = borrow_rate_per_sec(&c, u);
            assert!(rate >= prev, "rate dropped at utilization {}", u);
            prev = rate;
        }
    }

    #[test]
    fn test_apr_to_apy() {
        assert_eq!(apr_to_apy(Decimal::zero()), Some(Decimal::zero()));
        let apy = apr_to_apy(d("0.365")).unwrap();
        assert!(apy > d("0.4402") && apy < d("0.4403"), "apy = {}", apy);
    }

    #[test]
    fn test_value_pool_basic_metrics() {
        let metrics = value_pool(&pool(600_000, 400_000, 50_000, 900_000), d("1"), at(1_700_000_000)).unwrap();
        assert_eq!(metrics.utilization, d("0.4"));
        assert_eq!(metrics.supply_amount, Decimal::from(950_000u64));
        assert_eq!(metrics.conversion_rate, Decimal::from(950_000u64) / Decimal::from(900_000u64));
        assert_eq!(metrics.supply_coin, d("0.95"));
        assert_eq!(metrics.borrow_coin, d("0.4"));
        assert!(metrics.supply_apr < metrics.borrow_apr);
        assert!(metrics.borrow_apy >= metrics.borrow_apr);
        assert_eq!(
            metrics.supply_apr,
            metrics.borrow_apr * d("0.4") * (Decimal::one() - metrics.reserve_factor)
        );
        assert_eq!(metrics.borrow_headroom, None);
    }

    #[test]
    fn test_zero_share_supply_bootstraps_conversion_rate() {
        let metrics = value_pool(&pool(0, 0, 0, 0), d("1"), at(1_700_000_000)).unwrap();
        assert_eq!(metrics.conversion_rate, Decimal::one());
        assert_eq!(metrics.utilization, Decimal::zero());
    }

    #[test]
    fn test_missing_balance_sheet_is_explicit_error() {
        let mut raw = pool(1, 1, 0, 1);
        raw.balance_sheet = None;
        let err = value_pool(&raw, d("1"), at(1_700_000_000)).unwrap_err();
        assert!(matches!(err, CalcError::PoolDataUnavailable { missing: "balance sheet", .. }));
    }

    #[test]
    fn test_missing_interest_model_is_explicit_error() {
        let mut raw = pool(1, 1, 0, 1);
        raw.interest_model = None;
        let err = value_pool(&raw, d("1"), at(1_700_000_000)).unwrap_err();
        assert!(matches!(err, CalcError::PoolDataUnavailable { missing: "interest model", .. }));
    }

    #[test]
    fn test_conversion_rate_non_decreasing_as_interest_accrues() {
        // Interest of 10_000 accrues, a fifth of it goes to the reserve.
        let before = value_pool(&pool(600_000, 400_000, 50_000, 900_000), d("1"), at(1_700_000_000)).unwrap();
        let after = value_pool(&pool(600_000, 410_000, 52_000, 900_000), d("1"), at(1_700_000_000)).unwrap();
        assert!(after.conversion_rate >= before.conversion_rate);
    }

    #[test]
    fn test_projection_accrues_index_and_conversion_rate() {
        let raw = pool(600_000, 400_000, 50_000, 900_000);
        let now = value_pool(&raw, d("1"), at(1_700_000_000)).unwrap();
        let later = value_pool(&raw, d("1"), at(1_700_086_400)).unwrap();
        assert!(later.borrow_index > now.borrow_index);
        assert!(later.debt_amount > now.debt_amount);
        assert!(later.conversion_rate >= now.conversion_rate);
        assert_eq!(later.cash_amount, now.cash_amount);
    }

    #[test]
    fn test_query_before_last_update_does_not_accrue() {
        let raw = pool(600_000, 400_000, 50_000, 900_000);
        let metrics = value_pool(&raw, d("1"), at(1_600_000_000)).unwrap();
        assert_eq!(metrics.borrow_index, Decimal::from(1_000_000_000u64));
    }

    #[test]
    fn test_limits_headroom_floored_at_zero() {
        let mut raw = pool(600_000, 400_000, 0, 1_000_000);
        raw.supply_limit = 500_000;
        raw.borrow_limit = 500_000;
        let metrics = value_pool(&raw, d("1"), at(1_700_000_000)).unwrap();
        assert_eq!(metrics.supply_headroom, Some(Decimal::zero()));
        assert_eq!(metrics.borrow_headroom, Some(Decimal::from(100_000u64)));
        assert_eq!(metrics.borrowable_liquidity(), Decimal::from(100_000u64));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "invariant violated")]
    fn test_reserve_above_assets_is_invariant_violation() {
        let _ = value_pool(&pool(10, 10, 50, 10), d("1"), at(1_700_000_000));
    }
}
