//! Seed workbook used before any report is loaded, plus new-category templates.

use crate::entities::{
    Category, ChargePeriod, LicenseAggregate, LicenseFields, LicenseSnapshot, PropertyTaxAggregate,
    PropertyTaxFields, PropertyTaxSnapshot, StreamKind, UserChargeFields, UserChargeSnapshot,
    Workbook,
};
use crate::ids::CategoryId;

fn pt(seq: u64, name: &str, reg: f64, comp: f64, act_lv: f64, est_lv: f64, rate: f64) -> Category<PropertyTaxFields> {
    Category::new(
        CategoryId::for_stream(StreamKind::PropertyTax, seq),
        name,
        PropertyTaxFields {
            registered_taxpayers: reg,
            compliant_taxpayers: comp,
            actual_land_value: act_lv,
            estimated_land_value: est_lv,
            tax_rate: rate,
            benchmark_tax_rate: 0.0,
        },
    )
}

fn lic(seq: u64, name: &str, est: f64, reg: f64, comp: f64, fee: f64, paid: f64) -> Category<LicenseFields> {
    Category::new(
        CategoryId::for_stream(StreamKind::License, seq),
        name,
        LicenseFields {
            estimated_licensees: est,
            registered_licensees: reg,
            compliant_licensees: comp,
            license_fee: fee,
            average_paid_license_fee: paid,
        },
    )
}

fn uc(
    kind: StreamKind,
    seq: u64,
    name: &str,
    (estimated_users, actual_users): (f64, f64),
    (potential_rate, actual_rate): (f64, f64),
    period: ChargePeriod,
) -> Category<UserChargeFields> {
    Category::new(
        CategoryId::for_stream(kind, seq),
        name,
        UserChargeFields { estimated_users, actual_users, potential_rate, actual_rate, period },
    )
}

pub fn seed_property_tax() -> PropertyTaxSnapshot {
    PropertyTaxSnapshot::new(
        vec![
            pt(1, "Residential", 30_000.0, 20_000.0, 10_000.0, 30_000.0, 0.007),
            pt(2, "Commercial", 5_000.0, 3_500.0, 40_000.0, 60_000.0, 0.01),
            pt(3, "Industrial", 800.0, 600.0, 120_000.0, 150_000.0, 0.012),
        ],
        PropertyTaxAggregate { total_estimated_taxpayers: 70_000.0, registered_taxpayers: 50_000.0 },
    )
}

pub fn seed_license() -> LicenseSnapshot {
    LicenseSnapshot::new(
        vec![
            lic(1, "General Business Permits", 1_200.0, 900.0, 700.0, 150.0, 120.0),
            lic(2, "Liquor Licenses", 150.0, 120.0, 100.0, 500.0, 450.0),
            lic(3, "Transport Operator Licenses", 400.0, 250.0, 180.0, 200.0, 160.0),
        ],
        LicenseAggregate { total_estimated_licensees: 2_000.0 },
    )
}

pub fn seed_short_term() -> UserChargeSnapshot {
    let k = StreamKind::ShortTermUserCharge;
    UserChargeSnapshot::new(
        vec![
            uc(k, 1, "Market Stall Fees", (600.0, 500.0), (100.0, 10.0), ChargePeriod::Daily),
            uc(k, 2, "Parking Fees", (300.0, 220.0), (50.0, 30.0), ChargePeriod::Daily),
        ],
        Default::default(),
    )
}

pub fn seed_long_term() -> UserChargeSnapshot {
    let k = StreamKind::LongTermUserCharge;
    UserChargeSnapshot::new(
        vec![
            uc(k, 1, "Municipal Housing Rent", (400.0, 320.0), (250.0, 180.0), ChargePeriod::Monthly),
            uc(k, 2, "Commercial Property Leases", (60.0, 45.0), (1_200.0, 900.0), ChargePeriod::Monthly),
        ],
        Default::default(),
    )
}

pub fn seed_mixed() -> UserChargeSnapshot {
    let k = StreamKind::MixedUserCharge;
    UserChargeSnapshot::new(
        vec![
            uc(k, 1, "Bus Terminal Charges", (150.0, 120.0), (20.0, 15.0), ChargePeriod::Daily),
            uc(k, 2, "Kiosk Rentals", (80.0, 60.0), (300.0, 220.0), ChargePeriod::Monthly),
        ],
        Default::default(),
    )
}

/// The full seed workbook.
pub fn seed_workbook() -> Workbook {
    Workbook {
        title: "Own-Source Revenue Gap Analysis".to_string(),
        period_label: String::new(),
        property_tax: seed_property_tax(),
        license: seed_license(),
        short_term: seed_short_term(),
        long_term: seed_long_term(),
        mixed: seed_mixed(),
    }
}

/// Field values given to a freshly added user-charge category.
pub fn user_charge_template(kind: StreamKind) -> UserChargeFields {
    let period = match kind {
        StreamKind::LongTermUserCharge => ChargePeriod::Monthly,
        _ => ChargePeriod::Daily,
    };
    UserChargeFields { period, ..Default::default() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_ids_follow_stream_prefixes() {
        let wb = seed_workbook();
        assert_eq!(wb.property_tax.categories[0].id.as_str(), "PT-1");
        assert_eq!(wb.license.categories[2].id.as_str(), "LIC-3");
        assert_eq!(wb.mixed.categories[1].id.as_str(), "MXC-2");
        assert_eq!(wb.mixed.categories[1].fields.period, ChargePeriod::Monthly);
    }

    #[test]
    fn templates_pick_stream_period() {
        assert_eq!(user_charge_template(StreamKind::LongTermUserCharge).period, ChargePeriod::Monthly);
        assert_eq!(user_charge_template(StreamKind::MixedUserCharge).period, ChargePeriod::Daily);
    }
}
