//! Consolidated risk account of one borrower position.

use super::safety::{Adjustment, EstimatedAmount};
use super::{ensure_invariant, CalcError, CollateralMetrics, PoolMetrics};
use crate::domain::{CoinName, Decimal, ObligationId, RawDebt, RawObligation};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObligationCollateral {
    pub coin: CoinName,
    pub decimals: u32,
    pub price: Decimal,
    pub collateral_factor: Decimal,
    pub liquidation_factor: Decimal,
    pub deposit_amount: Decimal,
    pub deposit_coin: Decimal,
    pub deposit_value: Decimal,
    pub borrow_capacity_value: Decimal,
    pub required_collateral_value: Decimal,
    pub available_withdraw: EstimatedAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObligationDebt {
    pub coin: CoinName,
    pub decimals: u32,
    pub price: Decimal,
    pub borrow_weight: Decimal,
    /// Principal as recorded at the last interaction.
    pub raw_amount: Decimal,
    pub borrow_index_snapshot: Decimal,
    pub current_borrow_index: Decimal,
    /// Principal with interest accrued to the pool's current index.
    pub borrowed_amount: Decimal,
    pub borrowed_coin: Decimal,
    pub borrowed_value: Decimal,
    pub borrowed_value_with_weight: Decimal,
    /// Amount to send to repay the whole debt, padded for accrual until execution.
    pub required_repay: EstimatedAmount,
}

/// A position entry whose market metrics were unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnvaluedEntry {
    pub coin: CoinName,
    pub raw_amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObligationAccount {
    pub obligation_id: ObligationId,
    pub locked: bool,
    pub collaterals: BTreeMap<CoinName, ObligationCollateral>,
    pub debts: BTreeMap<CoinName, ObligationDebt>,
    /// Safety-adjusted maximum new borrow per known pool.
    pub available_borrows: BTreeMap<CoinName, EstimatedAmount>,
    pub unvalued_collaterals: Vec<UnvaluedEntry>,
    pub unvalued_debts: Vec<UnvaluedEntry>,
    pub total_deposited_value: Decimal,
    pub total_borrowed_value: Decimal,
    pub total_borrowed_value_with_weight: Decimal,
    pub total_borrow_capacity_value: Decimal,
    pub total_required_collateral_value: Decimal,
    /// Capacity left for new borrows, USD.
    pub total_available_collateral_value: Decimal,
    /// Weighted debt in excess of required collateral, USD.
    pub total_unhealthy_collateral_value: Decimal,
    pub total_risk_level: Decimal,
    pub total_deposited_pools: usize,
    pub total_borrowed_pools: usize,
}

impl ObligationAccount {
    /// True when the position is partially valued.
    pub fn is_incomplete(&self) -> bool {
        !self.unvalued_collaterals.is_empty() || !self.unvalued_debts.is_empty()
    }

    pub fn is_liquidatable(&self) -> bool {
        self.total_unhealthy_collateral_value.is_positive()
    }
}

/// `weighted / required`, capped at 1. With no required collateral any
/// weighted debt is bad debt (risk 1).
pub fn risk_level(weighted_borrow_value: Decimal, required_collateral_value: Decimal) -> Decimal {
    if required_collateral_value.is_zero() {
        return if weighted_borrow_value.is_positive() {
            Decimal::one()
        } else {
            Decimal::zero()
        };
    }
    (weighted_borrow_value / required_collateral_value).min(Decimal::one())
}

/// Debt principal brought forward to the pool's current borrow index.
pub fn accrue_debt(
    coin: &CoinName,
    debt: &RawDebt,
    current_borrow_index: Decimal,
) -> Result<Decimal, CalcError> {
    let snapshot = Decimal::from(debt.borrow_index);
    ensure_invariant(debt.borrow_index > 0, || {
        format!("{}: zero borrow index snapshot", coin)
    })?;
    ensure_invariant(current_borrow_index >= snapshot, || {
        format!(
            "{}: pool borrow index {} below debt snapshot {}",
            coin, current_borrow_index, snapshot
        )
    })?;
    Decimal::from(debt.amount)
        .mul_div(current_borrow_index, snapshot)
        .ok_or(CalcError::Overflow("accrued debt"))
}

/// Build the risk account of `obligation` from current market metrics.
///
/// Entries whose coin has no metrics are reported as unvalued and left out of
/// every aggregate. `pools` also drives `available_borrows`, so pass every
/// pool the caller may want to borrow from.
pub fn build_obligation_account(
    obligation: &RawObligation,
    pools: &BTreeMap<CoinName, PoolMetrics>,
    collaterals: &BTreeMap<CoinName, CollateralMetrics>,
) -> Result<ObligationAccount, CalcError> {
    let mut valued_collaterals = Vec::new();
    let mut unvalued_collaterals = Vec::new();
    for (coin, &amount) in &obligation.collaterals {
        match collaterals.get(coin) {
            Some(metrics) => valued_collaterals.push((metrics, Decimal::from(amount))),
            None => unvalued_collaterals.push(UnvaluedEntry {
                coin: coin.clone(),
                raw_amount: amount,
            }),
        }
    }

    let mut debts = BTreeMap::new();
    let mut unvalued_debts = Vec::new();
    for (coin, raw) in &obligation.debts {
        let Some(pool) = pools.get(coin) else {
            unvalued_debts.push(UnvaluedEntry {
                coin: coin.clone(),
                raw_amount: raw.amount,
            });
            continue;
        };
        let borrowed_amount = accrue_debt(coin, raw, pool.borrow_index)?;
        let borrowed_coin = pool.to_coin(borrowed_amount);
        let borrowed_value = borrowed_coin * pool.price;
        debts.insert(
            coin.clone(),
            ObligationDebt {
                coin: coin.clone(),
                decimals: pool.decimals,
                price: pool.price,
                borrow_weight: pool.borrow_weight,
                raw_amount: Decimal::from(raw.amount),
                borrow_index_snapshot: Decimal::from(raw.borrow_index),
                current_borrow_index: pool.borrow_index,
                borrowed_amount,
                borrowed_coin,
                borrowed_value,
                borrowed_value_with_weight: borrowed_value * pool.borrow_weight,
                required_repay: EstimatedAmount::new(
                    borrowed_amount,
                    &[],
                    pool.price,
                    pool.decimals,
                    Adjustment::Increase,
                ),
            },
        );
    }

    let total_borrowed_value: Decimal = debts.values().map(|d| d.borrowed_value).sum();
    let total_borrowed_value_with_weight: Decimal =
        debts.values().map(|d| d.borrowed_value_with_weight).sum();

    let mut total_deposited_value = Decimal::zero();
    let mut total_borrow_capacity_value = Decimal::zero();
    let mut total_required_collateral_value = Decimal::zero();
    for (metrics, amount) in &valued_collaterals {
        let value = metrics.to_value(*amount);
        total_deposited_value += value;
        total_borrow_capacity_value += value * metrics.collateral_factor;
        total_required_collateral_value += value * metrics.liquidation_factor;
    }

    let total_available_collateral_value =
        (total_borrow_capacity_value - total_borrowed_value_with_weight).floor_at_zero();
    let total_unhealthy_collateral_value =
        (total_borrowed_value_with_weight - total_required_collateral_value).floor_at_zero();

    let collaterals_out = valued_collaterals
        .into_iter()
        .map(|(metrics, amount)| {
            let deposit_value = metrics.to_value(amount);
            let theoretical = max_withdraw_amount(
                metrics,
                amount,
                total_available_collateral_value,
                total_borrowed_value_with_weight,
            );
            let entry = ObligationCollateral {
                coin: metrics.coin.clone(),
                decimals: metrics.decimals,
                price: metrics.price,
                collateral_factor: metrics.collateral_factor,
                liquidation_factor: metrics.liquidation_factor,
                deposit_amount: amount,
                deposit_coin: metrics.to_coin(amount),
                deposit_value,
                borrow_capacity_value: deposit_value * metrics.collateral_factor,
                required_collateral_value: deposit_value * metrics.liquidation_factor,
                available_withdraw: EstimatedAmount::new(
                    theoretical,
                    &[amount],
                    metrics.price,
                    metrics.decimals,
                    Adjustment::Decrease,
                ),
            };
            (metrics.coin.clone(), entry)
        })
        .collect::<BTreeMap<_, _>>();

    let available_borrows = pools
        .values()
        .map(|pool| {
            let theoretical = if borrow_allowed(pool, obligation, pools) {
                max_borrow_amount(pool, total_available_collateral_value)
            } else {
                Decimal::zero()
            };
            let estimate = EstimatedAmount::new(
                theoretical,
                &[pool.borrowable_liquidity()],
                pool.price,
                pool.decimals,
                Adjustment::Decrease,
            );
            (pool.coin.clone(), estimate)
        })
        .collect();

    let total_deposited_pools = collaterals_out
        .values()
        .filter(|c| c.deposit_amount.is_positive())
        .count();
    let total_borrowed_pools = debts
        .values()
        .filter(|d| d.borrowed_amount.is_positive())
        .count();

    Ok(ObligationAccount {
        obligation_id: obligation.id.clone(),
        locked: obligation.locked,
        collaterals: collaterals_out,
        debts,
        available_borrows,
        unvalued_collaterals,
        unvalued_debts,
        total_deposited_value,
        total_borrowed_value,
        total_borrowed_value_with_weight,
        total_borrow_capacity_value,
        total_required_collateral_value,
        total_available_collateral_value,
        total_unhealthy_collateral_value,
        total_risk_level: risk_level(
            total_borrowed_value_with_weight,
            total_required_collateral_value,
        ),
        total_deposited_pools,
        total_borrowed_pools,
    })
}

/// Raw amount of one collateral that can leave without pushing weighted debt
/// above borrow capacity. Unconstrained by the deposit itself, except that an
/// unpriced or unrepresentable amount falls back to the whole deposit.
fn max_withdraw_amount(
    metrics: &CollateralMetrics,
    deposit_amount: Decimal,
    available_collateral_value: Decimal,
    weighted_borrow_value: Decimal,
) -> Decimal {
    if weighted_borrow_value.is_zero() || metrics.collateral_factor.is_zero() {
        return deposit_amount;
    }
    available_collateral_value
        .checked_div(metrics.collateral_factor)
        .and_then(|value| metrics.amount_for_value(value))
        .unwrap_or(deposit_amount)
}

/// Raw amount of new debt the remaining capacity supports.
///
/// Zero for an unpriced pool. An amount too large to represent is unbounded
/// here and left to the liquidity cap.
fn max_borrow_amount(pool: &PoolMetrics, available_collateral_value: Decimal) -> Decimal {
    let Some(coin) = available_collateral_value
        .checked_div(pool.borrow_weight)
        .and_then(|value| value.checked_div(pool.price))
    else {
        return Decimal::zero();
    };
    coin.checked_shift(pool.decimals as i32)
        .unwrap_or_else(Decimal::max_value)
}

/// Isolated assets can only be borrowed alone: an isolated pool is closed to
/// positions holding other debt, and a position holding isolated debt cannot
/// borrow anything else.
fn borrow_allowed(
    pool: &PoolMetrics,
    obligation: &RawObligation,
    pools: &BTreeMap<CoinName, PoolMetrics>,
) -> bool {
    let open_debts = obligation
        .debts
        .iter()
        .filter(|(coin, debt)| debt.amount > 0 && **coin != pool.coin);
    let mut others = open_debts.map(|(coin, _)| pools.get(coin).is_some_and(|p| p.is_isolated));
    if pool.is_isolated {
        others.next().is_none()
    } else {
        !others.any(|isolated| isolated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawMarketCollateral, RawRiskModel, TimeMs};
    use crate::engine::assess_collateral;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn pool(coin: &str, price: &str, index: &str, weight: &str, isolated: bool) -> PoolMetrics {
        PoolMetrics {
            coin: coin.into(),
            coin_type: format!("0x::{}::COIN", coin),
            decimals: 6,
            price: d(price),
            utilization: Decimal::zero(),
            borrow_rate_per_sec: Decimal::zero(),
            borrow_apr: Decimal::zero(),
            borrow_apy: Decimal::zero(),
            supply_apr: Decimal::zero(),
            supply_apy: Decimal::zero(),
            max_borrow_apr: Decimal::zero(),
            conversion_rate: Decimal::one(),
            borrow_fee: Decimal::zero(),
            borrow_weight: d(weight),
            reserve_factor: Decimal::zero(),
            borrow_index: d(index),
            as_of: TimeMs::new(0),
            cash_amount: d("1000000000000"),
            debt_amount: Decimal::zero(),
            reserve_amount: Decimal::zero(),
            market_coin_supply: Decimal::zero(),
            supply_amount: Decimal::zero(),
            supply_coin: Decimal::zero(),
            supply_value: Decimal::zero(),
            borrow_coin: Decimal::zero(),
            borrow_value: Decimal::zero(),
            min_borrow_amount: Decimal::zero(),
            supply_headroom: None,
            borrow_headroom: None,
            is_isolated: isolated,
        }
    }

    fn collateral(coin: &str, price: &str, cf: u64, lf: u64) -> CollateralMetrics {
        assess_collateral(
            &RawMarketCollateral {
                coin: coin.into(),
                coin_type: format!("0x::{}::COIN", coin),
                decimals: 6,
                risk_model: Some(RawRiskModel {
                    collateral_factor: cf,
                    liquidation_factor: lf,
                    liquidation_penalty: 0,
                    liquidation_discount: 0,
                    liquidation_reserve_factor: 0,
                    max_collateral_amount: u64::MAX,
                }),
                total_collateral_amount: 0,
            },
            d(price),
        )
        .unwrap()
    }

    /// cf = 0.5, lf = 0.75
    fn market() -> (BTreeMap<CoinName, PoolMetrics>, BTreeMap<CoinName, CollateralMetrics>) {
        let pools = [
            pool("usdc", "1", "1050000000", "1", false),
            pool("sui", "2", "1000000000", "1.25", false),
        ]
        .into_iter()
        .map(|p| (p.coin.clone(), p))
        .collect();
        let collaterals = [collateral("sui", "2", 1 << 31, 3 << 30)]
            .into_iter()
            .map(|c| (c.coin.clone(), c))
            .collect();
        (pools, collaterals)
    }

    #[test]
    fn test_index_accrual_is_exact() {
        let (pools, collaterals) = market();
        let ob = RawObligation::new(ObligationId::new("0x1"))
            .with_collateral("sui", 10_000_000)
            .with_debt("usdc", 1_000_000, 1_000_000_000);
        let account = build_obligation_account(&ob, &pools, &collaterals).unwrap();
        let debt = &account.debts[&CoinName::new("usdc")];
        assert_eq!(debt.borrowed_amount, Decimal::from(1_050_000u64));
        assert_eq!(debt.borrowed_value, d("1.05"));
    }

    #[test]
    fn test_aggregates_and_risk_level() {
        let (pools, collaterals) = market();
        // 10 sui at $2 = $20 deposited, $10 capacity, $15 required.
        let ob = RawObligation::new(ObligationId::new("0x1"))
            .with_collateral("sui", 10_000_000)
            .with_debt("usdc", 3_000_000, 1_050_000_000);
        let account = build_obligation_account(&ob, &pools, &collaterals).unwrap();
        assert_eq!(account.total_deposited_value, d("20"));
        assert_eq!(account.total_borrow_capacity_value, d("10"));
        assert_eq!(account.total_required_collateral_value, d("15"));
        assert_eq!(account.total_borrowed_value, d("3"));
        assert_eq!(account.total_available_collateral_value, d("7"));
        assert_eq!(account.total_unhealthy_collateral_value, Decimal::zero());
        assert_eq!(account.total_risk_level, d("0.2"));
        assert_eq!(account.total_deposited_pools, 1);
        assert_eq!(account.total_borrowed_pools, 1);
        assert!(!account.is_liquidatable());
    }

    #[test]
    fn test_bad_debt_risk_is_one() {
        let (pools, collaterals) = market();
        let ob = RawObligation::new(ObligationId::new("0x1")).with_debt("usdc", 1, 1_000_000_000);
        let account = build_obligation_account(&ob, &pools, &collaterals).unwrap();
        assert_eq!(account.total_required_collateral_value, Decimal::zero());
        assert_eq!(account.total_risk_level, Decimal::one());
    }

    #[test]
    fn test_empty_position_risk_is_zero() {
        let (pools, collaterals) = market();
        let ob = RawObligation::new(ObligationId::new("0x1"));
        let account = build_obligation_account(&ob, &pools, &collaterals).unwrap();
        assert_eq!(account.total_risk_level, Decimal::zero());
    }

    #[test]
    fn test_risk_level_bounded() {
        let (pools, collaterals) = market();
        for debt in [0u64, 1, 1_000_000, 14_999_999, 15_000_000, 30_000_000, u32::MAX as u64] {
            let ob = RawObligation::new(ObligationId::new("0x1"))
                .with_collateral("sui", 10_000_000)
                .with_debt("usdc", debt, 1_050_000_000);
            let a = build_obligation_account(&ob, &pools, &collaterals).unwrap();
            assert!(a.total_risk_level >= Decimal::zero());
            assert!(a.total_risk_level <= Decimal::one());
            if a.total_risk_level == Decimal::one() {
                assert!(a.total_borrowed_value_with_weight >= a.total_required_collateral_value);
            }
        }
    }

    #[test]
    fn test_missing_metrics_leave_entry_unvalued() {
        let (pools, collaterals) = market();
        let ob = RawObligation::new(ObligationId::new("0x1"))
            .with_collateral("sui", 10_000_000)
            .with_collateral("weth", 5)
            .with_debt("usdt", 7, 1_000_000_000);
        let account = build_obligation_account(&ob, &pools, &collaterals).unwrap();
        assert!(account.is_incomplete());
        assert_eq!(account.unvalued_collaterals[0].coin.as_str(), "weth");
        assert_eq!(account.unvalued_debts[0].raw_amount, 7);
        assert_eq!(account.total_deposited_value, d("20"));
        assert_eq!(account.total_borrowed_value, Decimal::zero());
    }

    #[test]
    fn test_available_actions_are_conservative() {
        let (pools, collaterals) = market();
        let ob = RawObligation::new(ObligationId::new("0x1"))
            .with_collateral("sui", 10_000_000)
            .with_debt("usdc", 3_000_000, 1_050_000_000);
        let account = build_obligation_account(&ob, &pools, &collaterals).unwrap();

        // $7 of capacity left: 7 usdc, or 7 / 1.25 / 2 = 2.8 sui.
        let usdc = &account.available_borrows[&CoinName::new("usdc")];
        assert_eq!(usdc.theoretical_amount, Decimal::from(7_000_000u64));
        assert_eq!(usdc.amount, Decimal::from(6_993_000u64));
        let sui = &account.available_borrows[&CoinName::new("sui")];
        assert_eq!(sui.theoretical_amount, Decimal::from(2_800_000u64));

        // $7 / 0.5 = $14 of sui = 7 sui withdrawable.
        let withdraw = &account.collaterals[&CoinName::new("sui")].available_withdraw;
        assert_eq!(withdraw.theoretical_amount, Decimal::from(7_000_000u64));
        for est in account
            .available_borrows
            .values()
            .chain(account.collaterals.values().map(|c| &c.available_withdraw))
        {
            assert!(est.amount <= est.theoretical_amount);
        }

        let repay = &account.debts[&CoinName::new("usdc")].required_repay;
        assert!(repay.amount >= Decimal::from(3_000_000u64));
    }

    #[test]
    fn test_withdraw_all_without_debt() {
        let (pools, collaterals) = market();
        let ob = RawObligation::new(ObligationId::new("0x1")).with_collateral("sui", 10_000_000);
        let account = build_obligation_account(&ob, &pools, &collaterals).unwrap();
        let withdraw = &account.collaterals[&CoinName::new("sui")].available_withdraw;
        assert_eq!(withdraw.capped_amount, Decimal::from(10_000_000u64));
        assert_eq!(withdraw.amount, Decimal::from(9_990_000u64));
    }

    #[test]
    fn test_borrow_capped_by_pool_liquidity() {
        let (mut pools, collaterals) = market();
        pools.get_mut(&CoinName::new("usdc")).unwrap().cash_amount = d("500000");
        let ob = RawObligation::new(ObligationId::new("0x1")).with_collateral("sui", 10_000_000);
        let account = build_obligation_account(&ob, &pools, &collaterals).unwrap();
        let usdc = &account.available_borrows[&CoinName::new("usdc")];
        assert_eq!(usdc.capped_amount, Decimal::from(500_000u64));
        assert!(usdc.amount < usdc.capped_amount);
    }

    #[test]
    fn test_isolated_asset_rules() {
        let (mut pools, collaterals) = market();
        let iso = pool("cetus", "0.1", "1000000000", "1", true);
        pools.insert(iso.coin.clone(), iso);

        let with_usdc_debt = RawObligation::new(ObligationId::new("0x1"))
            .with_collateral("sui", 10_000_000)
            .with_debt("usdc", 1_000_000, 1_050_000_000);
        let a = build_obligation_account(&with_usdc_debt, &pools, &collaterals).unwrap();
        assert_eq!(a.available_borrows[&CoinName::new("cetus")].amount, Decimal::zero());

        let with_iso_debt = RawObligation::new(ObligationId::new("0x2"))
            .with_collateral("sui", 10_000_000)
            .with_debt("cetus", 1_000_000, 1_000_000_000);
        let b = build_obligation_account(&with_iso_debt, &pools, &collaterals).unwrap();
        assert_eq!(b.available_borrows[&CoinName::new("usdc")].amount, Decimal::zero());
        assert!(b.available_borrows[&CoinName::new("cetus")].amount.is_positive());
    }

    #[test]
    fn test_build_is_deterministic() {
        let (pools, collaterals) = market();
        let ob = RawObligation::new(ObligationId::new("0x1"))
            .with_collateral("sui", 12_345_678)
            .with_debt("usdc", 3_333_333, 1_000_000_007);
        let a = build_obligation_account(&ob, &pools, &collaterals).unwrap();
        let b = build_obligation_account(&ob, &pools, &collaterals).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    /// 18-decimal coin priced at $0.00000001, both as collateral and as a pool.
    fn with_dust_coin(
        pools: &mut BTreeMap<CoinName, PoolMetrics>,
        collaterals: &mut BTreeMap<CoinName, CollateralMetrics>,
    ) {
        let mut meme_pool = pool("meme", "0.00000001", "1000000000", "1", false);
        meme_pool.decimals = 18;
        pools.insert(meme_pool.coin.clone(), meme_pool);
        let mut meme = collateral("meme", "0.00000001", 1 << 31, 3 << 30);
        meme.decimals = 18;
        collaterals.insert(meme.coin.clone(), meme);
        let usdc = collateral("usdc", "1", 1 << 31, 3 << 30);
        collaterals.insert(usdc.coin.clone(), usdc);
    }

    #[test]
    fn test_dust_priced_high_decimal_coin() {
        let (mut pools, mut collaterals) = market();
        with_dust_coin(&mut pools, &mut collaterals);
        let ob = RawObligation::new(ObligationId::new("0x1"))
            .with_collateral("usdc", 20_000_000_000)
            .with_collateral("meme", 1)
            .with_debt("usdc", 1_000_000, 1_050_000_000);
        let account = build_obligation_account(&ob, &pools, &collaterals).unwrap();
        assert_eq!(account.total_borrowed_value, d("1"));
        assert!(account.total_risk_level < d("0.001"));

        // $9999 of capacity is far more meme than can be represented: the
        // withdraw estimate falls back to the deposit and the borrow estimate
        // to pool liquidity.
        let meme_withdraw = &account.collaterals[&CoinName::new("meme")].available_withdraw;
        assert_eq!(meme_withdraw.theoretical_amount, Decimal::one());
        assert_eq!(meme_withdraw.capped_amount, Decimal::one());
        assert_eq!(meme_withdraw.amount, Decimal::zero());

        let meme_borrow = &account.available_borrows[&CoinName::new("meme")];
        assert_eq!(meme_borrow.theoretical_amount, Decimal::max_value());
        assert_eq!(meme_borrow.capped_amount, d("1000000000000"));
        assert!(meme_borrow.amount < meme_borrow.capped_amount);

        let usdc_withdraw = &account.collaterals[&CoinName::new("usdc")].available_withdraw;
        assert_eq!(
            usdc_withdraw.theoretical_amount.floor(),
            Decimal::from(19_998_000_000u64)
        );
    }

    #[test]
    fn test_zero_priced_coin() {
        let (mut pools, mut collaterals) = market();
        let free_pool = pool("free", "0", "1000000000", "1", false);
        pools.insert(free_pool.coin.clone(), free_pool);
        let free = collateral("free", "0", 1 << 31, 3 << 30);
        collaterals.insert(free.coin.clone(), free);

        let ob = RawObligation::new(ObligationId::new("0x1"))
            .with_collateral("sui", 10_000_000)
            .with_collateral("free", 5_000_000)
            .with_debt("usdc", 1_000_000, 1_050_000_000);
        let account = build_obligation_account(&ob, &pools, &collaterals).unwrap();

        assert_eq!(account.total_deposited_value, d("20"));
        let free_collateral = &account.collaterals[&CoinName::new("free")];
        assert_eq!(free_collateral.deposit_value, Decimal::zero());
        assert_eq!(
            free_collateral.available_withdraw.capped_amount,
            Decimal::from(5_000_000u64)
        );
        let free_borrow = &account.available_borrows[&CoinName::new("free")];
        assert_eq!(free_borrow.amount, Decimal::zero());
        assert_eq!(free_borrow.value, Decimal::zero());
    }

    #[test]
    fn test_u64_max_amounts() {
        let (pools, collaterals) = market();
        let ob = RawObligation::new(ObligationId::new("0x1"))
            .with_collateral("sui", u64::MAX)
            .with_debt("usdc", u64::MAX, 1_000_000_000);
        let account = build_obligation_account(&ob, &pools, &collaterals).unwrap();

        assert_eq!(
            account.total_deposited_value,
            Decimal::from(u64::MAX).shift(-6) * d("2")
        );
        let debt = &account.debts[&CoinName::new("usdc")];
        assert_eq!(
            debt.borrowed_amount,
            Decimal::from(u64::MAX) * d("1.05")
        );
        assert!(debt.required_repay.amount >= debt.borrowed_amount);
        assert!(account.total_risk_level <= Decimal::one());
        for est in account.available_borrows.values() {
            assert!(est.amount <= est.theoretical_amount);
        }
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "zero borrow index snapshot")]
    fn test_zero_snapshot_is_invariant_violation() {
        let (pools, collaterals) = market();
        let ob = RawObligation::new(ObligationId::new("0x1")).with_debt("usdc", 1, 0);
        let _ = build_obligation_account(&ob, &pools, &collaterals);
    }
}
