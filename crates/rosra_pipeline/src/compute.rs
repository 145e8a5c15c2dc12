//! COMPUTE: run every stream's strategy over a workbook.

use rosra_algo::{compute_metrics, LicenseStrategy, PropertyTaxStrategy, StreamMetrics, UserChargeStrategy};
use rosra_core::entities::{StreamKind, Workbook};
use rosra_core::variables::EngineParams;

/// Metrics of all five streams in canonical order.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkbookMetrics {
    streams: Vec<StreamMetrics>,
}

impl WorkbookMetrics {
    pub fn streams(&self) -> &[StreamMetrics] {
        &self.streams
    }

    pub fn get(&self, kind: StreamKind) -> Option<&StreamMetrics> {
        self.streams.iter().find(|m| m.stream == kind)
    }
}

pub fn compute_workbook(wb: &Workbook, params: &EngineParams) -> WorkbookMetrics {
    let streams = vec![
        compute_metrics(&PropertyTaxStrategy, &wb.property_tax, params),
        compute_metrics(&LicenseStrategy, &wb.license, params),
        compute_metrics(&UserChargeStrategy::SHORT_TERM, &wb.short_term, params),
        compute_metrics(&UserChargeStrategy::LONG_TERM, &wb.long_term, params),
        compute_metrics(&UserChargeStrategy::MIXED, &wb.mixed, params),
    ];
    for m in &streams {
        tracing::debug!(
            stream = m.stream.code(),
            actual = m.actual,
            potential = m.potential,
            gap = m.gap,
            "stream computed"
        );
    }
    WorkbookMetrics { streams }
}
