//! Property tax.
//!
//! The stream-level coverage ratio `registered_taxpayers / total_estimated_taxpayers`
//! scales registered-base figures up to the whole estimated tax base. If either
//! input is 0 the ratio is undefined and both `potential` and the registration
//! gap are reported as 0.
//!
//! Rate gap depends on `EngineParams::property_tax_rate_gap`:
//! - `illustrative`: share × mean(`estimated_land_value × tax_rate`) over the
//!   leading sample of categories, published outside the breakdown;
//! - `benchmark`: Σ(`compliant × actual_land_value × (benchmark − tax_rate)`),
//!   a real component. A benchmark of 0 falls back to the category's own rate.

use rosra_core::entities::{PropertyTaxAggregate, PropertyTaxFields, StreamKind, StreamSnapshot};
use rosra_core::numeric::mean;
use rosra_core::variables::{EngineParams, RateGapPolicy};

use crate::engine::{GapStrategy, RawFigures};

#[derive(Clone, Copy, Debug, Default)]
pub struct PropertyTaxStrategy;

impl PropertyTaxStrategy {
    /// Coverage ratio, or `None` when undefined.
    pub fn coverage_ratio(agg: &PropertyTaxAggregate) -> Option<f64> {
        if agg.registered_taxpayers == 0.0 || agg.total_estimated_taxpayers == 0.0 {
            return None;
        }
        let r = agg.registered_taxpayers / agg.total_estimated_taxpayers;
        (r.is_finite() && r != 0.0).then_some(r)
    }
}

impl GapStrategy for PropertyTaxStrategy {
    type Fields = PropertyTaxFields;
    type Aggregate = PropertyTaxAggregate;

    fn kind(&self) -> StreamKind {
        StreamKind::PropertyTax
    }

    fn raw_figures(
        &self,
        snapshot: &StreamSnapshot<PropertyTaxFields, PropertyTaxAggregate>,
        params: &EngineParams,
    ) -> RawFigures {
        let cats = snapshot.categories.iter().map(|c| &c.fields);

        let mut actual = 0.0;
        let mut registered_base = 0.0;
        let mut compliance = 0.0;
        let mut assessment = 0.0;
        let mut benchmark = 0.0;
        for f in cats {
            actual += f.compliant_taxpayers * f.actual_land_value * f.tax_rate;
            registered_base += f.registered_taxpayers * f.estimated_land_value * f.tax_rate;
            compliance += (f.registered_taxpayers - f.compliant_taxpayers) * f.actual_land_value * f.tax_rate;
            assessment += (f.estimated_land_value - f.actual_land_value) * f.compliant_taxpayers * f.tax_rate;
            let target = if f.benchmark_tax_rate > 0.0 { f.benchmark_tax_rate } else { f.tax_rate };
            benchmark += f.compliant_taxpayers * f.actual_land_value * (target - f.tax_rate);
        }

        let (potential, registration) = match Self::coverage_ratio(&snapshot.aggregate) {
            Some(ratio) => (registered_base / ratio, actual / ratio),
            None => (0.0, 0.0),
        };

        let (rate, illustrative_rate_gap) = match params.property_tax_rate_gap {
            RateGapPolicy::Benchmark => (Some(benchmark), None),
            RateGapPolicy::Illustrative => {
                let sample = snapshot
                    .categories
                    .iter()
                    .take(params.illustrative_sample as usize)
                    .map(|c| c.fields.estimated_land_value * c.fields.tax_rate);
                (None, Some(params.illustrative_rate_share * mean(sample)))
            }
        };

        RawFigures {
            actual,
            potential,
            registration: Some(registration),
            compliance: Some(compliance),
            assessment: Some(assessment),
            rate,
            illustrative_rate_gap,
        }
    }
}
