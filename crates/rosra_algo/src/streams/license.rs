//! Business licenses.
//!
//! Unregistered licensees are `total_estimated_licensees − Σ registered`. The
//! count is not clamped: a registry larger than the estimate yields a negative
//! registration gap, which the residual absorbs.

use rosra_core::entities::{LicenseAggregate, LicenseFields, StreamKind, StreamSnapshot};
use rosra_core::numeric::mean;
use rosra_core::variables::EngineParams;

use crate::engine::{GapStrategy, RawFigures};

#[derive(Clone, Copy, Debug, Default)]
pub struct LicenseStrategy;

impl GapStrategy for LicenseStrategy {
    type Fields = LicenseFields;
    type Aggregate = LicenseAggregate;

    fn kind(&self) -> StreamKind {
        StreamKind::License
    }

    fn raw_figures(
        &self,
        snapshot: &StreamSnapshot<LicenseFields, LicenseAggregate>,
        _params: &EngineParams,
    ) -> RawFigures {
        let fields: Vec<&LicenseFields> = snapshot.categories.iter().map(|c| &c.fields).collect();

        let registered: f64 = fields.iter().map(|f| f.registered_licensees).sum();
        let unregistered = snapshot.aggregate.total_estimated_licensees - registered;
        let average_license_fee = mean(fields.iter().map(|f| f.license_fee));

        let actual: f64 = fields.iter().map(|f| f.compliant_licensees * f.average_paid_license_fee).sum();
        let nominal: f64 = fields.iter().map(|f| f.estimated_licensees * f.license_fee).sum();
        let registration = unregistered * average_license_fee;

        let compliance: f64 = fields
            .iter()
            .map(|f| (f.registered_licensees - f.compliant_licensees) * f.average_paid_license_fee)
            .sum();
        let estimated_paid: f64 = fields.iter().map(|f| f.estimated_licensees * f.average_paid_license_fee).sum();
        let assessment = estimated_paid - actual - compliance;

        RawFigures {
            actual,
            potential: nominal + registration,
            registration: Some(registration),
            compliance: Some(compliance),
            assessment: Some(assessment),
            rate: None,
            illustrative_rate_gap: None,
        }
    }
}
