//! Index-based reward accrual shared by spools and borrow incentive pools.
//!
//! A pool keeps one global index that rises by `points * INDEX_SCALE / stakes`
//! whenever points are released. An account snapshots the index on every
//! interaction, so its claimable points are its weighted stake times the index
//! delta since that snapshot, plus whatever it had already accrued.

use crate::domain::{Decimal, RawRewardCoin, RawRewardSchedule, TimeMs, INDEX_SCALE, WEIGHT_SCALE};

/// Points claimable by an account.
///
/// `weighted * max(0, current_index - snapshot_index) / index_scale + accumulated`
pub fn claimable_points(
    weighted_amount: Decimal,
    snapshot_index: Decimal,
    accumulated_points: Decimal,
    current_index: Decimal,
    index_scale: Decimal,
) -> Decimal {
    let delta = (current_index - snapshot_index).floor_at_zero();
    let earned = weighted_amount
        .mul_div(delta, index_scale)
        .unwrap_or_else(Decimal::zero);
    earned + accumulated_points
}

/// [`claimable_points`] with the standard index scale.
pub fn claimable_points_scaled(
    weighted_amount: u64,
    snapshot_index: u64,
    accumulated_points: u64,
    current_index: Decimal,
) -> Decimal {
    claimable_points(
        Decimal::from(weighted_amount),
        Decimal::from(snapshot_index),
        Decimal::from(accumulated_points),
        current_index,
        Decimal::from(INDEX_SCALE),
    )
}

/// A schedule's index brought forward to a query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectedIndex {
    pub index: Decimal,
    /// Points released up to the query time, including the projection.
    pub distributed_point: Decimal,
}

/// Advance a schedule's index to `as_of`.
///
/// Only whole periods release points, and the release is capped by the
/// schedule's remaining points. With no stakes the index stays put.
pub fn project_index(schedule: &RawRewardSchedule, stakes: u64, as_of: TimeMs) -> ProjectedIndex {
    let index = Decimal::from(schedule.index);
    let distributed = Decimal::from(schedule.distributed_point);
    if schedule.period_secs == 0 || stakes == 0 {
        return ProjectedIndex {
            index,
            distributed_point: distributed,
        };
    }

    let periods = as_of.secs_since(schedule.last_update()) / schedule.period_secs;
    let released = Decimal::from(periods)
        .checked_mul(Decimal::from(schedule.point_per_period))
        .unwrap_or_else(|| Decimal::from(schedule.remaining_points()))
        .min(Decimal::from(schedule.remaining_points()));

    let increment = released
        .mul_div(Decimal::from(INDEX_SCALE), Decimal::from(stakes))
        .unwrap_or_else(Decimal::zero);

    ProjectedIndex {
        index: index + increment,
        distributed_point: distributed + released,
    }
}

/// Convert points to raw reward-coin units via the schedule's exchange rate.
pub fn points_to_reward(points: Decimal, reward: &RawRewardCoin) -> Decimal {
    points
        .mul_div(
            Decimal::from(reward.exchange_rate_numerator),
            Decimal::from(reward.exchange_rate_denominator),
        )
        .unwrap_or_else(Decimal::zero)
}

/// Points released per second while the schedule still has points left.
pub fn points_per_sec(schedule: &RawRewardSchedule) -> Decimal {
    if schedule.remaining_points() == 0 {
        return Decimal::zero();
    }
    Decimal::from(schedule.point_per_period)
        .checked_div(Decimal::from(schedule.period_secs))
        .unwrap_or_else(Decimal::zero)
}

/// Governance boost of an incentive account.
///
/// `weighted / (debt * base_weight / WEIGHT_SCALE)`; 1 when the denominator is
/// zero.
pub fn boost_value(weighted_amount: u64, debt_amount: u64, base_weight: u64) -> Decimal {
    let base = Decimal::from(debt_amount)
        .mul_div(Decimal::from(base_weight), Decimal::from(WEIGHT_SCALE))
        .unwrap_or_else(Decimal::zero);
    Decimal::from(weighted_amount)
        .checked_div(base)
        .unwrap_or_else(Decimal::one)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn scale() -> Decimal {
        Decimal::from(INDEX_SCALE)
    }

    fn schedule(index: u64, last_update_secs: i64) -> RawRewardSchedule {
        RawRewardSchedule {
            index,
            point_per_period: 1_000,
            period_secs: 60,
            max_point: 10_000,
            distributed_point: 2_000,
            last_update_secs,
        }
    }

    #[test]
    fn test_claimable_reference_value() {
        let c = claimable_points(d("100"), d("0"), d("0"), d("2000000000"), scale());
        assert_eq!(c, d("200"));
    }

    #[test]
    fn test_claimable_linear_in_weight() {
        let one = claimable_points(d("7"), d("100"), d("0"), d("3000000100"), scale());
        for w in [2u64, 5, 1_000, 123_456_789] {
            let many = claimable_points(Decimal::from(w * 7), d("100"), d("0"), d("3000000100"), scale());
            assert_eq!(many, one * Decimal::from(w));
        }
    }

    #[test]
    fn test_claimable_adds_accumulated_points() {
        let c = claimable_points(d("100"), d("0"), d("5"), d("1000000000"), scale());
        assert_eq!(c, d("105"));
    }

    #[test]
    fn test_claimable_ignores_index_regression() {
        let c = claimable_points(d("100"), d("2000000000"), d("3"), d("1000000000"), scale());
        assert_eq!(c, d("3"));
    }

    #[test]
    fn test_project_index_whole_periods_only() {
        let s = schedule(0, 1_000);
        // 150 seconds = 2 whole periods = 2000 points over 1000 stakes.
        let p = project_index(&s, 1_000, TimeMs::from_secs(1_150));
        assert_eq!(p.index, Decimal::from(2 * INDEX_SCALE));
        assert_eq!(p.distributed_point, Decimal::from(4_000u64));
    }

    #[test]
    fn test_project_index_capped_by_remaining_points() {
        let s = schedule(0, 1_000);
        let p = project_index(&s, 1_000, TimeMs::from_secs(1_000 + 60 * 1_000));
        assert_eq!(p.distributed_point, Decimal::from(10_000u64));
        assert_eq!(p.index, Decimal::from(8 * INDEX_SCALE));
    }

    #[test]
    fn test_project_index_no_stakes() {
        let s = schedule(42, 1_000);
        let p = project_index(&s, 0, TimeMs::from_secs(5_000));
        assert_eq!(p.index, d("42"));
    }

    #[test]
    fn test_project_index_monotonic() {
        let s = schedule(10, 1_000);
        let mut prev = Decimal::zero();
        for t in (1_000..5_000).step_by(37) {
            let p = project_index(&s, 777, TimeMs::from_secs(t));
            assert!(p.index >= prev);
            prev = p.index;
        }
    }

    #[test]
    fn test_points_to_reward() {
        let reward = RawRewardCoin {
            coin: "sui".into(),
            decimals: 9,
            exchange_rate_numerator: 3,
            exchange_rate_denominator: 2,
        };
        assert_eq!(points_to_reward(d("200"), &reward), d("300"));
    }

    #[test]
    fn test_points_per_sec_zero_when_exhausted() {
        let mut s = schedule(0, 0);
        assert_eq!(points_per_sec(&s), Decimal::from(1_000u64) / Decimal::from(60u64));
        s.distributed_point = s.max_point;
        assert_eq!(points_per_sec(&s), Decimal::zero());
    }

    #[test]
    fn test_boost_value() {
        // base weight 0.4: 1000 debt weighs 400 unboosted; 1000 weighted is a 2.5x boost.
        let base_weight = WEIGHT_SCALE * 4 / 10;
        assert_eq!(boost_value(1_000, 1_000, base_weight), d("2.5"));
        assert_eq!(boost_value(400, 1_000, base_weight), Decimal::one());
    }

    #[test]
    fn test_boost_value_zero_debt_is_one() {
        assert_eq!(boost_value(0, 0, WEIGHT_SCALE), Decimal::one());
        assert_eq!(boost_value(10, 0, WEIGHT_SCALE), Decimal::one());
    }
}
