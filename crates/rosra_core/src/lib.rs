//! rosra_core: Core types, numeric guards, parameters and ordering helpers.
//!
//! This crate is **I/O-free**. It defines stable types/APIs used across the
//! engine (`rosra_algo`, `rosra_pipeline`, `rosra_io`, `rosra_report`, `rosra_cli`).
//!
//! - Tokens: `CategoryId`, `ReportId`; output IDs: `RES:`, `RUN:`
//! - Stream/gap kinds, category records, snapshots and the `Workbook`
//! - `f64` guards (`finite_or_zero`, boundary coercion, safe division)
//! - `EngineParams` with domain validation
//! - Deterministic ordering and first-wins arg-max
//!
//! Serialization derives are gated behind the `serde` feature.

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Debug, PartialEq)]
    pub enum CoreError {
        InvalidId(crate::ids::IdError),
        UnknownStream(String),
        DomainOutOfRange(String),
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidId(e) => write!(f, "invalid id: {e}"),
                CoreError::UnknownStream(s) => write!(f, "unknown stream: {s}"),
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
            }
        }
    }

    impl std::error::Error for CoreError {}

    impl From<crate::ids::IdError> for CoreError {
        fn from(e: crate::ids::IdError) -> Self { CoreError::InvalidId(e) }
    }

    impl From<crate::variables::VarsError> for CoreError {
        fn from(e: crate::variables::VarsError) -> Self {
            match e {
                crate::variables::VarsError::Domain(m) => CoreError::DomainOutOfRange(m),
            }
        }
    }
}

pub mod determinism;
pub mod entities;
pub mod ids;
pub mod numeric;
pub mod seeds;
pub mod variables;

pub use entities::{
    Category, CategoryFields, ChargePeriod, GapKind, LicenseAggregate, LicenseFields,
    PropertyTaxAggregate, PropertyTaxFields, StreamKind, StreamSnapshot, UserChargeFields, Workbook,
};
pub use errors::CoreError;
pub use ids::{CategoryId, ReportId, ResultId, RunId, Sha256};
pub use variables::{EngineParams, RateGapPolicy};
