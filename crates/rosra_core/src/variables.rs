//! Engine parameters with safe defaults and domain validation.
//!
//! Every field has a default, so an empty params document (`{}`) is valid and
//! yields the standard engine behaviour.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entities::ChargePeriod;

/// Define an enum with explicit wire tokens.
macro_rules! wire_enum {
    ($(#[$m:meta])* $name:ident => { $($variant:ident = $token:expr),+ $(,)? }) => {
        $(#[$m])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub enum $name {
            $(
                #[cfg_attr(feature = "serde", serde(rename = $token))]
                $variant,
            )+
        }

        impl $name {
            pub fn token(self) -> &'static str {
                match self { $($name::$variant => $token,)+ }
            }
        }
    };
}

wire_enum!(
    /// How the property-tax rate gap is produced.
    RateGapPolicy => {
        Illustrative = "illustrative",
        Benchmark = "benchmark",
    }
);

impl Default for RateGapPolicy {
    fn default() -> Self { RateGapPolicy::Illustrative }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineParams {
    /// Multiplier for daily charges.
    pub days_per_year: f64,
    /// Multiplier for monthly charges.
    pub months_per_year: f64,
    pub property_tax_rate_gap: RateGapPolicy,
    /// Share of the mean sampled `estimated_land_value × tax_rate` reported as
    /// the illustrative rate gap.
    pub illustrative_rate_share: f64,
    /// Number of leading categories sampled for the illustrative rate gap.
    pub illustrative_sample: u32,
    /// Relative tolerance for the sum-to-total self-check.
    pub invariant_tolerance: f64,
    pub currency_symbol: String,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            days_per_year: 365.0,
            months_per_year: 12.0,
            property_tax_rate_gap: RateGapPolicy::Illustrative,
            illustrative_rate_share: 0.2,
            illustrative_sample: 3,
            invariant_tolerance: 1e-6,
            currency_symbol: "$".to_string(),
        }
    }
}

/// Domain violation found by `validate_domains`.
#[derive(Debug, Clone, PartialEq)]
pub enum VarsError {
    Domain(String),
}

impl fmt::Display for VarsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarsError::Domain(m) => write!(f, "parameter domain: {m}"),
        }
    }
}

pub type VarsResult<T> = Result<T, VarsError>;

impl EngineParams {
    /// Annualisation factor for a charge period.
    #[inline]
    pub fn multiplier(&self, period: ChargePeriod) -> f64 {
        match period {
            ChargePeriod::Daily => self.days_per_year,
            ChargePeriod::Monthly => self.months_per_year,
        }
    }

    pub fn validate_domains(&self) -> VarsResult<()> {
        for (k, v) in [("days_per_year", self.days_per_year), ("months_per_year", self.months_per_year)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(VarsError::Domain(format!("{k} must be finite and > 0, got {v}")));
            }
        }
        if !self.illustrative_rate_share.is_finite()
            || !(0.0..=1.0).contains(&self.illustrative_rate_share)
        {
            return Err(VarsError::Domain(format!(
                "illustrative_rate_share must be finite in [0.0,1.0], got {}",
                self.illustrative_rate_share
            )));
        }
        if self.illustrative_sample == 0 {
            return Err(VarsError::Domain("illustrative_sample must be >= 1".into()));
        }
        if !self.invariant_tolerance.is_finite() || self.invariant_tolerance <= 0.0 || self.invariant_tolerance > 0.01 {
            return Err(VarsError::Domain(format!(
                "invariant_tolerance must be in (0, 0.01], got {}",
                self.invariant_tolerance
            )));
        }
        if self.currency_symbol.chars().count() > 8 {
            return Err(VarsError::Domain("currency_symbol longer than 8 chars".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let p = EngineParams::default();
        assert!(p.validate_domains().is_ok());
        assert_eq!(p.multiplier(ChargePeriod::Daily), 365.0);
        assert_eq!(p.multiplier(ChargePeriod::Monthly), 12.0);
        assert_eq!(p.property_tax_rate_gap.token(), "illustrative");
    }

    #[test]
    fn rejects_out_of_domain() {
        let p = EngineParams { days_per_year: 0.0, ..Default::default() };
        assert!(p.validate_domains().is_err());
        let p = EngineParams { illustrative_rate_share: 1.5, ..Default::default() };
        assert!(p.validate_domains().is_err());
        let p = EngineParams { illustrative_sample: 0, ..Default::default() };
        assert!(p.validate_domains().is_err());
        let p = EngineParams { invariant_tolerance: f64::NAN, ..Default::default() };
        assert!(p.validate_domains().is_err());
    }
}
