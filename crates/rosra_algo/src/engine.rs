//! Shared metric engine.
//!
//! A `GapStrategy` only produces raw stream figures. `compute_metrics` owns
//! everything common to all streams: the finite-or-zero guard on every
//! published number, `gap = potential - actual`, the leverage percentage and
//! the `combined_gaps` residual that makes the breakdown sum to `gap`.

use rosra_core::entities::{AggregateInputs, CategoryFields, GapKind, StreamKind, StreamSnapshot};
use rosra_core::numeric::{approx_eq_rel, finite_or_zero, percent_of};
use rosra_core::variables::EngineParams;

/// Figures a strategy computes before the engine derives totals and residual.
/// Components the stream does not define stay `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawFigures {
    pub actual: f64,
    pub potential: f64,
    pub registration: Option<f64>,
    pub compliance: Option<f64>,
    pub assessment: Option<f64>,
    pub rate: Option<f64>,
    /// Published alongside the breakdown but never part of it.
    pub illustrative_rate_gap: Option<f64>,
}

/// Per-component decomposition of a stream's gap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GapBreakdown {
    pub registration_gap: Option<f64>,
    pub compliance_gap: Option<f64>,
    pub assessment_gap: Option<f64>,
    pub rate_gap: Option<f64>,
    /// Residual: `gap` minus every present named component.
    pub combined_gaps: f64,
}

impl GapBreakdown {
    pub fn get(&self, kind: GapKind) -> Option<f64> {
        match kind {
            GapKind::Registration => self.registration_gap,
            GapKind::Compliance => self.compliance_gap,
            GapKind::Assessment => self.assessment_gap,
            GapKind::Rate => self.rate_gap,
            GapKind::Combined => Some(self.combined_gaps),
        }
    }

    /// Sum of the present named components (excludes the residual).
    pub fn named_sum(&self) -> f64 {
        GapKind::NAMED.iter().filter_map(|k| self.get(*k)).sum()
    }

    /// Present named components in canonical order.
    pub fn named(&self) -> impl Iterator<Item = (GapKind, f64)> + '_ {
        GapKind::NAMED.into_iter().filter_map(|k| self.get(k).map(|v| (k, v)))
    }
}

/// Derived metrics of one stream. Never persisted as source of truth.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamMetrics {
    pub stream: StreamKind,
    pub actual: f64,
    pub potential: f64,
    pub gap: f64,
    /// `actual / potential × 100`, 0 when `potential <= 0`.
    pub potential_leveraged: f64,
    pub gap_breakdown: GapBreakdown,
    pub illustrative_rate_gap: Option<f64>,
}

impl StreamMetrics {
    /// Sum-to-total check: named components plus residual equal `gap`.
    ///
    /// Tolerance is relative to the largest magnitude involved, since
    /// components of opposite sign can be much larger than the gap itself.
    pub fn breakdown_sums_to_gap(&self, tol: f64) -> bool {
        let b = &self.gap_breakdown;
        let total = b.named_sum() + b.combined_gaps;
        let magnitude: f64 = b.named().map(|(_, v)| v.abs()).sum::<f64>() + b.combined_gaps.abs();
        approx_eq_rel(total, self.gap, tol) || (total - self.gap).abs() <= tol * magnitude
    }
}

/// One revenue stream's formulas.
pub trait GapStrategy {
    type Fields: CategoryFields;
    type Aggregate: AggregateInputs;

    fn kind(&self) -> StreamKind;

    fn raw_figures(
        &self,
        snapshot: &StreamSnapshot<Self::Fields, Self::Aggregate>,
        params: &EngineParams,
    ) -> RawFigures;
}

/// Run a strategy and derive the published metrics.
pub fn compute_metrics<S: GapStrategy>(
    strategy: &S,
    snapshot: &StreamSnapshot<S::Fields, S::Aggregate>,
    params: &EngineParams,
) -> StreamMetrics {
    let raw = strategy.raw_figures(snapshot, params);
    finish(strategy.kind(), raw)
}

fn finish(stream: StreamKind, raw: RawFigures) -> StreamMetrics {
    let guard = |o: Option<f64>| o.map(finite_or_zero);

    let actual = finite_or_zero(raw.actual);
    let potential = finite_or_zero(raw.potential);
    let gap = finite_or_zero(potential - actual);

    let mut gap_breakdown = GapBreakdown {
        registration_gap: guard(raw.registration),
        compliance_gap: guard(raw.compliance),
        assessment_gap: guard(raw.assessment),
        rate_gap: guard(raw.rate),
        combined_gaps: 0.0,
    };
    gap_breakdown.combined_gaps = finite_or_zero(gap - gap_breakdown.named_sum());

    StreamMetrics {
        stream,
        actual,
        potential,
        gap,
        potential_leveraged: percent_of(actual, potential),
        gap_breakdown,
        illustrative_rate_gap: guard(raw.illustrative_rate_gap),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residual_absorbs_the_difference() {
        let raw = RawFigures {
            actual: 100.0,
            potential: 400.0,
            compliance: Some(120.0),
            rate: Some(50.0),
            ..Default::default()
        };
        let m = finish(StreamKind::ShortTermUserCharge, raw);
        assert_eq!(m.gap, 300.0);
        assert_eq!(m.gap_breakdown.combined_gaps, 130.0);
        assert_eq!(m.potential_leveraged, 25.0);
        assert!(m.breakdown_sums_to_gap(1e-9));
    }

    #[test]
    fn non_finite_figures_are_zeroed() {
        let raw = RawFigures {
            actual: f64::NAN,
            potential: f64::INFINITY,
            registration: Some(f64::NEG_INFINITY),
            ..Default::default()
        };
        let m = finish(StreamKind::PropertyTax, raw);
        assert_eq!((m.actual, m.potential, m.gap), (0.0, 0.0, 0.0));
        assert_eq!(m.gap_breakdown.registration_gap, Some(0.0));
        assert_eq!(m.potential_leveraged, 0.0);
    }
}
