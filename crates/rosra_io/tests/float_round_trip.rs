//! Saved reports reload with bit-identical numbers.

use proptest::prelude::*;

use rosra_core::ids::ReportId;
use rosra_core::seeds::seed_workbook;
use rosra_io::gateway::{FileGateway, MemoryGateway, ReportGateway};

fn finite_non_negative() -> impl Strategy<Value = f64> {
    prop::num::f64::POSITIVE | prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO
}

fn rid() -> ReportId {
    "roundtrip".parse().unwrap()
}

proptest! {
    #[test]
    fn memory_gateway_preserves_float_bits(
        fee in finite_non_negative(),
        tax_rate in finite_non_negative(),
        actual_rate in finite_non_negative(),
        taxpayers in finite_non_negative(),
    ) {
        let mut wb = seed_workbook();
        wb.license.categories[0].fields.license_fee = fee;
        wb.property_tax.categories[1].fields.tax_rate = tax_rate;
        wb.mixed.categories[0].fields.actual_rate = actual_rate;
        wb.property_tax.aggregate.total_estimated_taxpayers = taxpayers;

        let mut gw = MemoryGateway::new();
        gw.save(&rid(), &wb).unwrap();
        let loaded = gw.load(&rid()).unwrap().workbook;

        prop_assert_eq!(loaded.license.categories[0].fields.license_fee.to_bits(), fee.to_bits());
        prop_assert_eq!(loaded.property_tax.categories[1].fields.tax_rate.to_bits(), tax_rate.to_bits());
        prop_assert_eq!(loaded.mixed.categories[0].fields.actual_rate.to_bits(), actual_rate.to_bits());
        prop_assert_eq!(loaded.property_tax.aggregate.total_estimated_taxpayers.to_bits(), taxpayers.to_bits());
    }
}

#[test]
fn file_gateway_preserves_hard_to_parse_values() {
    let dir = tempfile::tempdir().unwrap();
    let mut gw = FileGateway::new(dir.path()).unwrap();
    let values = [394_301.338_356_336_75, 0.1 + 0.2, 5e-324, f64::MAX, 1e21];
    for v in values {
        let mut wb = seed_workbook();
        wb.license.categories[0].fields.license_fee = v;
        gw.save(&rid(), &wb).unwrap();
        let got = gw.load(&rid()).unwrap().workbook.license.categories[0].fields.license_fee;
        assert_eq!(got.to_bits(), v.to_bits(), "{v:e} came back as {got:e}");
    }
}
