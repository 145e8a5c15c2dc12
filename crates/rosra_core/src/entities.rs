//! Domain entities: revenue streams, gap kinds, category records and snapshots.
//!
//! A `Category<F>` carries only what calculators may read: id, name and the
//! stream's numeric field record `F`. Presentation state (expanded/collapsed
//! rows) lives in the category store, never here.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::CategoryId;
use crate::numeric::{coerce_input, coerce_raw};

/* -------------------------------------------------------------------------- */
/*                               Kinds & periods                              */
/* -------------------------------------------------------------------------- */

/// The five revenue streams, in canonical (display and tie-break) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StreamKind {
    PropertyTax,
    License,
    ShortTermUserCharge,
    LongTermUserCharge,
    MixedUserCharge,
}

impl StreamKind {
    pub const ALL: [StreamKind; 5] = [
        StreamKind::PropertyTax,
        StreamKind::License,
        StreamKind::ShortTermUserCharge,
        StreamKind::LongTermUserCharge,
        StreamKind::MixedUserCharge,
    ];

    /// Position in canonical order.
    pub fn order_index(self) -> u8 {
        match self {
            StreamKind::PropertyTax => 0,
            StreamKind::License => 1,
            StreamKind::ShortTermUserCharge => 2,
            StreamKind::LongTermUserCharge => 3,
            StreamKind::MixedUserCharge => 4,
        }
    }

    /// Wire token (matches the serde name).
    pub fn code(self) -> &'static str {
        match self {
            StreamKind::PropertyTax => "property_tax",
            StreamKind::License => "license",
            StreamKind::ShortTermUserCharge => "short_term_user_charge",
            StreamKind::LongTermUserCharge => "long_term_user_charge",
            StreamKind::MixedUserCharge => "mixed_user_charge",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StreamKind::PropertyTax => "Property Tax",
            StreamKind::License => "License",
            StreamKind::ShortTermUserCharge => "Short-term User Charge",
            StreamKind::LongTermUserCharge => "Long-term User Charge",
            StreamKind::MixedUserCharge => "Mixed User Charge",
        }
    }

    /// Key of this stream's snapshot inside a workbook document.
    pub fn workbook_key(self) -> &'static str {
        match self {
            StreamKind::PropertyTax => "property_tax",
            StreamKind::License => "license",
            StreamKind::ShortTermUserCharge => "short_term",
            StreamKind::LongTermUserCharge => "long_term",
            StreamKind::MixedUserCharge => "mixed",
        }
    }

    /// Prefix for store-assigned category ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            StreamKind::PropertyTax => "PT",
            StreamKind::License => "LIC",
            StreamKind::ShortTermUserCharge => "STC",
            StreamKind::LongTermUserCharge => "LTC",
            StreamKind::MixedUserCharge => "MXC",
        }
    }

    /// Whether this stream has a notion of the given gap component at all.
    /// The property-tax rate gap depends on policy and is decided by the calculator.
    pub fn defines(self, gap: GapKind) -> bool {
        match gap {
            GapKind::Registration | GapKind::Assessment => {
                matches!(self, StreamKind::PropertyTax | StreamKind::License)
            }
            GapKind::Compliance | GapKind::Combined => true,
            GapKind::Rate => !matches!(self, StreamKind::License),
        }
    }

    pub fn from_code(s: &str) -> Option<StreamKind> {
        StreamKind::ALL.into_iter().find(|k| k.code() == s)
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Named gap components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GapKind {
    Registration,
    Compliance,
    Assessment,
    Rate,
    Combined,
}

impl GapKind {
    /// The four named components ranked by the aggregate analyzer (Combined is a residual).
    pub const NAMED: [GapKind; 4] = [
        GapKind::Registration,
        GapKind::Compliance,
        GapKind::Assessment,
        GapKind::Rate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GapKind::Registration => "Registration",
            GapKind::Compliance => "Compliance",
            GapKind::Assessment => "Assessment",
            GapKind::Rate => "Rate",
            GapKind::Combined => "Combined",
        }
    }
}

impl fmt::Display for GapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Billing period of a user charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChargePeriod {
    #[default]
    Daily,
    Monthly,
}

impl ChargePeriod {
    pub fn parse(raw: &str) -> Option<ChargePeriod> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" | "d" => Some(ChargePeriod::Daily),
            "monthly" | "month" | "m" => Some(ChargePeriod::Monthly),
            _ => None,
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                              Category records                              */
/* -------------------------------------------------------------------------- */

/// Field schema of one stream's category record.
///
/// `set`/`set_raw` return `false` for unknown field names; callers treat that
/// as a no-op, never as an error.
pub trait CategoryFields: Clone + fmt::Debug + PartialEq {
    /// Numeric field names in declaration order.
    fn field_names() -> &'static [&'static str];
    fn get(&self, field: &str) -> Option<f64>;
    fn set(&mut self, field: &str, value: f64) -> bool;

    /// Set from user-typed text; numeric fields go through `coerce_raw`.
    fn set_raw(&mut self, field: &str, raw: &str) -> bool {
        self.set(field, coerce_raw(raw))
    }

    /// Coerce every numeric field in place; returns the names that changed.
    fn coerce_all(&mut self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        for &name in Self::field_names() {
            if let Some(v) = self.get(name) {
                let c = coerce_input(v);
                if c.to_bits() != v.to_bits() {
                    self.set(name, c);
                    changed.push(name);
                }
            }
        }
        changed
    }
}

macro_rules! numeric_fields {
    ($(#[$m:meta])* $name:ident { $($(#[$fm:meta])* $field:ident),+ $(,)? }) => {
        $(#[$m])*
        #[derive(Debug, Clone, PartialEq, Default)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(default))]
        pub struct $name {
            $($(#[$fm])* pub $field: f64,)+
        }

        impl $name {
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];
        }

        impl CategoryFields for $name {
            fn field_names() -> &'static [&'static str] { Self::FIELDS }

            fn get(&self, field: &str) -> Option<f64> {
                match field {
                    $(stringify!($field) => Some(self.$field),)+
                    _ => None,
                }
            }

            fn set(&mut self, field: &str, value: f64) -> bool {
                match field {
                    $(stringify!($field) => { self.$field = value; true })+
                    _ => false,
                }
            }
        }
    };
}

numeric_fields!(
    /// Property-tax category: counts of taxpayers and land values.
    PropertyTaxFields {
        registered_taxpayers,
        compliant_taxpayers,
        /// Assessed value used for billing.
        actual_land_value,
        /// Market value estimate.
        estimated_land_value,
        tax_rate,
        /// Target rate for the benchmark rate-gap policy; 0 means "not set".
        benchmark_tax_rate,
    }
);

numeric_fields!(
    /// License category: licensee counts and fees.
    LicenseFields {
        estimated_licensees,
        registered_licensees,
        compliant_licensees,
        /// Nominal fee.
        license_fee,
        average_paid_license_fee,
    }
);

/// User-charge category (short-term, long-term and mixed streams).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UserChargeFields {
    #[cfg_attr(feature = "serde", serde(alias = "estimated_daily_fees", alias = "estimated_leases"))]
    pub estimated_users: f64,
    #[cfg_attr(feature = "serde", serde(alias = "actual_daily_fees", alias = "registered_leases"))]
    pub actual_users: f64,
    pub potential_rate: f64,
    pub actual_rate: f64,
    pub period: ChargePeriod,
}

impl UserChargeFields {
    const FIELDS: &'static [&'static str] =
        &["estimated_users", "actual_users", "potential_rate", "actual_rate"];

    fn canonical_name(field: &str) -> &str {
        match field {
            "estimated_daily_fees" | "estimated_leases" => "estimated_users",
            "actual_daily_fees" | "registered_leases" => "actual_users",
            other => other,
        }
    }
}

impl CategoryFields for UserChargeFields {
    fn field_names() -> &'static [&'static str] { Self::FIELDS }

    fn get(&self, field: &str) -> Option<f64> {
        match Self::canonical_name(field) {
            "estimated_users" => Some(self.estimated_users),
            "actual_users" => Some(self.actual_users),
            "potential_rate" => Some(self.potential_rate),
            "actual_rate" => Some(self.actual_rate),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: f64) -> bool {
        let slot = match Self::canonical_name(field) {
            "estimated_users" => &mut self.estimated_users,
            "actual_users" => &mut self.actual_users,
            "potential_rate" => &mut self.potential_rate,
            "actual_rate" => &mut self.actual_rate,
            _ => return false,
        };
        *slot = value;
        true
    }

    fn set_raw(&mut self, field: &str, raw: &str) -> bool {
        if field == "period" {
            return match ChargePeriod::parse(raw) {
                Some(p) => {
                    self.period = p;
                    true
                }
                None => false,
            };
        }
        self.set(field, coerce_raw(raw))
    }
}

/// One revenue sub-source within a stream.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Category<F> {
    pub id: CategoryId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub fields: F,
}

impl<F> Category<F> {
    pub fn new(id: CategoryId, name: impl Into<String>, fields: F) -> Self {
        Self { id, name: name.into(), fields }
    }
}

/* -------------------------------------------------------------------------- */
/*                         Stream-level aggregate inputs                      */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PropertyTaxAggregate {
    pub total_estimated_taxpayers: f64,
    pub registered_taxpayers: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LicenseAggregate {
    pub total_estimated_licensees: f64,
}

/// User-charge streams compute purely from category sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NoAggregate {}

/// Numeric view over stream-level inputs, used for boundary coercion.
pub trait AggregateInputs: Clone + fmt::Debug + PartialEq + Default {
    /// Coerce in place; returns `(name, original)` for every changed value.
    fn coerce_all(&mut self) -> Vec<(&'static str, f64)>;
}

fn coerce_slot(name: &'static str, slot: &mut f64, changed: &mut Vec<(&'static str, f64)>) {
    let c = coerce_input(*slot);
    if c.to_bits() != slot.to_bits() {
        changed.push((name, *slot));
        *slot = c;
    }
}

impl AggregateInputs for PropertyTaxAggregate {
    fn coerce_all(&mut self) -> Vec<(&'static str, f64)> {
        let mut changed = Vec::new();
        coerce_slot("total_estimated_taxpayers", &mut self.total_estimated_taxpayers, &mut changed);
        coerce_slot("registered_taxpayers", &mut self.registered_taxpayers, &mut changed);
        changed
    }
}

impl AggregateInputs for LicenseAggregate {
    fn coerce_all(&mut self) -> Vec<(&'static str, f64)> {
        let mut changed = Vec::new();
        coerce_slot("total_estimated_licensees", &mut self.total_estimated_licensees, &mut changed);
        changed
    }
}

impl AggregateInputs for NoAggregate {
    fn coerce_all(&mut self) -> Vec<(&'static str, f64)> { Vec::new() }
}

/* -------------------------------------------------------------------------- */
/*                            Snapshots & workbook                            */
/* -------------------------------------------------------------------------- */

/// Durable input of one stream: ordered categories plus stream-level scalars.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StreamSnapshot<F, A = NoAggregate> {
    pub categories: Vec<Category<F>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub aggregate: A,
}

impl<F, A: Default> Default for StreamSnapshot<F, A> {
    fn default() -> Self {
        Self { categories: Vec::new(), aggregate: A::default() }
    }
}

impl<F, A> StreamSnapshot<F, A> {
    pub fn new(categories: Vec<Category<F>>, aggregate: A) -> Self {
        Self { categories, aggregate }
    }
}

pub type PropertyTaxSnapshot = StreamSnapshot<PropertyTaxFields, PropertyTaxAggregate>;
pub type LicenseSnapshot = StreamSnapshot<LicenseFields, LicenseAggregate>;
pub type UserChargeSnapshot = StreamSnapshot<UserChargeFields>;

/// Everything a saved report persists: the five stream snapshots plus labels.
/// Metrics are never stored here; they are recomputed from these inputs.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Workbook {
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
    /// Free-text reporting period, e.g. "FY 2024/25".
    #[cfg_attr(feature = "serde", serde(default))]
    pub period_label: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub property_tax: PropertyTaxSnapshot,
    #[cfg_attr(feature = "serde", serde(default))]
    pub license: LicenseSnapshot,
    #[cfg_attr(feature = "serde", serde(default))]
    pub short_term: UserChargeSnapshot,
    #[cfg_attr(feature = "serde", serde(default))]
    pub long_term: UserChargeSnapshot,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mixed: UserChargeSnapshot,
}

impl Workbook {
    /// Number of categories per stream, in canonical order.
    pub fn category_counts(&self) -> [(StreamKind, usize); 5] {
        [
            (StreamKind::PropertyTax, self.property_tax.categories.len()),
            (StreamKind::License, self.license.categories.len()),
            (StreamKind::ShortTermUserCharge, self.short_term.categories.len()),
            (StreamKind::LongTermUserCharge, self.long_term.categories.len()),
            (StreamKind::MixedUserCharge, self.mixed.categories.len()),
        ]
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;
    use crate::seeds::seed_workbook;

    #[test]
    fn workbook_round_trips_through_json() {
        let wb = seed_workbook();
        let s = serde_json::to_string(&wb).unwrap();
        let back: Workbook = serde_json::from_str(&s).unwrap();
        assert_eq!(back, wb);
    }

    #[test]
    fn user_charge_wire_aliases() {
        let raw = r#"{"id":"STC-9","name":"Stalls","estimated_daily_fees":600,"actual_daily_fees":500,"potential_rate":100,"actual_rate":10}"#;
        let c: Category<UserChargeFields> = serde_json::from_str(raw).unwrap();
        assert_eq!(c.fields.estimated_users, 600.0);
        assert_eq!(c.fields.actual_users, 500.0);
        assert_eq!(c.fields.period, ChargePeriod::Daily);
    }

    #[test]
    fn missing_aggregate_defaults() {
        let raw = r#"{"categories":[]}"#;
        let s: LicenseSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(s.aggregate.total_estimated_licensees, 0.0);
    }
}
