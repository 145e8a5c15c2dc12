//! User charges: short-term (daily), long-term (monthly) and mixed.
//!
//! All three share the same formulas with an annualisation multiplier `m`.
//! Short-term always bills daily and long-term always monthly, whatever the
//! category says; mixed honours each category's own `period`.

use rosra_core::entities::{ChargePeriod, NoAggregate, StreamKind, StreamSnapshot, UserChargeFields};
use rosra_core::variables::EngineParams;

use crate::engine::{GapStrategy, RawFigures};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserChargeStrategy {
    kind: StreamKind,
}

impl UserChargeStrategy {
    pub const SHORT_TERM: Self = Self { kind: StreamKind::ShortTermUserCharge };
    pub const LONG_TERM: Self = Self { kind: StreamKind::LongTermUserCharge };
    pub const MIXED: Self = Self { kind: StreamKind::MixedUserCharge };

    /// Strategy for a user-charge stream; `None` for property tax and licenses.
    pub fn for_stream(kind: StreamKind) -> Option<Self> {
        match kind {
            StreamKind::ShortTermUserCharge | StreamKind::LongTermUserCharge | StreamKind::MixedUserCharge => {
                Some(Self { kind })
            }
            StreamKind::PropertyTax | StreamKind::License => None,
        }
    }

    /// Billing period actually applied to a category of this stream.
    pub fn effective_period(&self, fields: &UserChargeFields) -> ChargePeriod {
        match self.kind {
            StreamKind::LongTermUserCharge => ChargePeriod::Monthly,
            StreamKind::MixedUserCharge => fields.period,
            _ => ChargePeriod::Daily,
        }
    }
}

impl GapStrategy for UserChargeStrategy {
    type Fields = UserChargeFields;
    type Aggregate = NoAggregate;

    fn kind(&self) -> StreamKind {
        self.kind
    }

    fn raw_figures(&self, snapshot: &StreamSnapshot<UserChargeFields>, params: &EngineParams) -> RawFigures {
        let mut raw = RawFigures::default();
        let mut compliance = 0.0;
        let mut rate = 0.0;
        for c in &snapshot.categories {
            let f = &c.fields;
            let m = params.multiplier(self.effective_period(f));
            raw.actual += f.actual_users * f.actual_rate * m;
            raw.potential += f.estimated_users * f.potential_rate * m;
            compliance += (f.estimated_users - f.actual_users) * f.actual_rate * m;
            rate += f.actual_users * (f.potential_rate - f.actual_rate) * m;
        }
        raw.compliance = Some(compliance);
        raw.rate = Some(rate);
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::compute_metrics;
    use rosra_core::entities::Category;
    use rosra_core::ids::CategoryId;

    fn cat(kind: StreamKind, est: f64, act: f64, pr: f64, ar: f64, period: ChargePeriod) -> Category<UserChargeFields> {
        Category::new(
            CategoryId::for_stream(kind, 1),
            "Charge",
            UserChargeFields {
                estimated_users: est,
                actual_users: act,
                potential_rate: pr,
                actual_rate: ar,
                period,
            },
        )
    }

    #[test]
    fn short_term_worked_example() {
        let k = StreamKind::ShortTermUserCharge;
        let s = StreamSnapshot::new(vec![cat(k, 600.0, 500.0, 100.0, 10.0, ChargePeriod::Daily)], NoAggregate {});
        let m = compute_metrics(&UserChargeStrategy::SHORT_TERM, &s, &EngineParams::default());
        assert_eq!(m.actual, 1_825_000.0);
        assert_eq!(m.potential, 21_900_000.0);
        assert_eq!(m.gap, 20_075_000.0);
        assert_eq!(m.gap_breakdown.compliance_gap, Some(365_000.0));
        assert_eq!(m.gap_breakdown.rate_gap, Some(16_425_000.0));
        assert_eq!(m.gap_breakdown.combined_gaps, 3_285_000.0);
        assert_eq!(m.gap_breakdown.registration_gap, None);
        assert_eq!(m.gap_breakdown.assessment_gap, None);
    }

    #[test]
    fn stream_forces_its_period() {
        // A monthly-tagged category still bills daily in the short-term stream.
        let k = StreamKind::ShortTermUserCharge;
        let s = StreamSnapshot::new(vec![cat(k, 1.0, 1.0, 1.0, 1.0, ChargePeriod::Monthly)], NoAggregate {});
        let m = compute_metrics(&UserChargeStrategy::SHORT_TERM, &s, &EngineParams::default());
        assert_eq!(m.actual, 365.0);

        let k = StreamKind::LongTermUserCharge;
        let s = StreamSnapshot::new(vec![cat(k, 1.0, 1.0, 1.0, 1.0, ChargePeriod::Daily)], NoAggregate {});
        let m = compute_metrics(&UserChargeStrategy::LONG_TERM, &s, &EngineParams::default());
        assert_eq!(m.actual, 12.0);
    }

    #[test]
    fn mixed_uses_each_category_period() {
        let k = StreamKind::MixedUserCharge;
        let s = StreamSnapshot::new(
            vec![
                cat(k, 2.0, 1.0, 10.0, 5.0, ChargePeriod::Daily),
                cat(k, 2.0, 1.0, 10.0, 5.0, ChargePeriod::Monthly),
            ],
            NoAggregate {},
        );
        let m = compute_metrics(&UserChargeStrategy::MIXED, &s, &EngineParams::default());
        assert_eq!(m.actual, 5.0 * 365.0 + 5.0 * 12.0);
        assert_eq!(m.potential, 20.0 * 365.0 + 20.0 * 12.0);
        assert!(m.breakdown_sums_to_gap(1e-9));
    }

    #[test]
    fn multipliers_come_from_params() {
        let k = StreamKind::ShortTermUserCharge;
        let s = StreamSnapshot::new(vec![cat(k, 1.0, 1.0, 2.0, 1.0, ChargePeriod::Daily)], NoAggregate {});
        let params = EngineParams { days_per_year: 360.0, ..Default::default() };
        let m = compute_metrics(&UserChargeStrategy::SHORT_TERM, &s, &params);
        assert_eq!(m.actual, 360.0);
    }

    #[test]
    fn only_user_charge_streams_have_a_strategy() {
        assert!(UserChargeStrategy::for_stream(StreamKind::PropertyTax).is_none());
        assert_eq!(
            UserChargeStrategy::for_stream(StreamKind::MixedUserCharge),
            Some(UserChargeStrategy::MIXED)
        );
    }
}
