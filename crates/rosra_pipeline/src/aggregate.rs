//! AGGREGATE: roll the five stream metrics up into workbook totals.
//!
//! Component totals only sum streams that define the component (registration
//! and assessment come from property tax and licenses alone). The illustrative
//! property-tax rate gap is not a breakdown component and never reaches the
//! totals.
//!
//! `total_combined_gap` is the sum of every stream's total `gap`, not the sum
//! of the `combined_gaps` residuals; the residual sum is published separately
//! as `total_combined_residual`.

use rosra_algo::StreamMetrics;
use rosra_core::determinism::argmax_first_positive;
use rosra_core::entities::{GapKind, StreamKind};
use rosra_core::numeric::{finite_or_zero, percent_of};

use crate::compute::WorkbookMetrics;

/// Result of an arg-max ranking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Largest<K> {
    Gap { key: K, amount: f64 },
    /// Every candidate is ≤ 0 (or there are none).
    NoSignificantGap,
}

impl<K: Copy> Largest<K> {
    fn from_ranked(items: impl IntoIterator<Item = (K, f64)>) -> Self {
        match argmax_first_positive(items) {
            Some((key, amount)) => Largest::Gap { key, amount },
            None => Largest::NoSignificantGap,
        }
    }

    pub fn key(&self) -> Option<K> {
        match self {
            Largest::Gap { key, .. } => Some(*key),
            Largest::NoSignificantGap => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AggregateTotals {
    pub total_registration_gap: f64,
    pub total_compliance_gap: f64,
    pub total_assessment_gap: f64,
    pub total_rate_gap: f64,
    /// Σ stream `gap`.
    pub total_combined_gap: f64,
    /// Σ stream `combined_gaps`.
    pub total_combined_residual: f64,
    pub total_actual: f64,
    pub total_potential: f64,
    pub potential_leveraged: f64,
    pub largest_gap_by_stream: Largest<StreamKind>,
    pub largest_gap_by_type: Largest<GapKind>,
}

impl AggregateTotals {
    pub fn component_total(&self, kind: GapKind) -> f64 {
        match kind {
            GapKind::Registration => self.total_registration_gap,
            GapKind::Compliance => self.total_compliance_gap,
            GapKind::Assessment => self.total_assessment_gap,
            GapKind::Rate => self.total_rate_gap,
            GapKind::Combined => self.total_combined_gap,
        }
    }
}

fn component_sum(streams: &[StreamMetrics], kind: GapKind) -> f64 {
    let total: f64 = streams
        .iter()
        .filter(|m| m.stream.defines(kind))
        .filter_map(|m| m.gap_breakdown.get(kind))
        .sum();
    finite_or_zero(total)
}

pub fn analyze(metrics: &WorkbookMetrics) -> AggregateTotals {
    let streams = metrics.streams();
    let sum = |f: fn(&StreamMetrics) -> f64| finite_or_zero(streams.iter().map(f).sum());

    let total_actual = sum(|m| m.actual);
    let total_potential = sum(|m| m.potential);

    let mut totals = AggregateTotals {
        total_registration_gap: component_sum(streams, GapKind::Registration),
        total_compliance_gap: component_sum(streams, GapKind::Compliance),
        total_assessment_gap: component_sum(streams, GapKind::Assessment),
        total_rate_gap: component_sum(streams, GapKind::Rate),
        total_combined_gap: sum(|m| m.gap),
        total_combined_residual: sum(|m| m.gap_breakdown.combined_gaps),
        total_actual,
        total_potential,
        potential_leveraged: percent_of(total_actual, total_potential),
        largest_gap_by_stream: Largest::from_ranked(streams.iter().map(|m| (m.stream, m.gap))),
        largest_gap_by_type: Largest::NoSignificantGap,
    };
    totals.largest_gap_by_type =
        Largest::from_ranked(GapKind::NAMED.into_iter().map(|k| (k, totals.component_total(k))));

    tracing::debug!(
        total_gap = totals.total_combined_gap,
        by_stream = ?totals.largest_gap_by_stream.key(),
        by_type = ?totals.largest_gap_by_type.key(),
        "aggregate computed"
    );
    totals
}
