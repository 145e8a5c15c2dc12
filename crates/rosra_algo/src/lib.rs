// crates/rosra_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Gap calculators: one `GapStrategy` per stream type behind a shared engine.
//!
//! Pure and synchronous; depends only on `rosra_core`.

pub use rosra_core::{
    entities::{GapKind, StreamKind},
    variables::EngineParams,
};

pub mod engine;

pub mod streams {
    pub mod license;
    pub mod property_tax;
    pub mod user_charge;

    pub use license::LicenseStrategy;
    pub use property_tax::PropertyTaxStrategy;
    pub use user_charge::UserChargeStrategy;
}

pub use engine::{compute_metrics, GapBreakdown, GapStrategy, RawFigures, StreamMetrics};
pub use streams::{LicenseStrategy, PropertyTaxStrategy, UserChargeStrategy};
