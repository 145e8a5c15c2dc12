//! BUILD_RESULT: compose the `result.json` document from computed stages.
//!
//! Deterministic assembly only. The document is built without an id; the
//! caller hashes its canonical bytes and assigns `RES:<hex>` afterwards.

use serde::{Deserialize, Serialize};

use rosra_algo::StreamMetrics;
use rosra_core::entities::{GapKind, StreamKind, Workbook};
use rosra_core::variables::EngineParams;

use crate::aggregate::{AggregateTotals, Largest};
use crate::compute::WorkbookMetrics;
use crate::narrative;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDoc {
    /// "RES:<hex64>"; absent while the id is being computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub period_label: String,
    pub currency_symbol: String,
    pub rate_gap_policy: String,
    pub streams: Vec<StreamBlock>,
    pub totals: TotalsBlock,
    pub narrative: NarrativeBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamBlock {
    pub stream: String,
    pub label: String,
    pub category_count: usize,
    pub actual: f64,
    pub potential: f64,
    pub gap: f64,
    pub potential_leveraged: f64,
    pub band: String,
    pub breakdown: BreakdownBlock,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illustrative_rate_gap: Option<f64>,
    pub narrative: String,
}

/// Components a stream does not define are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_gap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_gap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_gap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_gap: Option<f64>,
    pub combined_gaps: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsBlock {
    pub total_registration_gap: f64,
    pub total_compliance_gap: f64,
    pub total_assessment_gap: f64,
    pub total_rate_gap: f64,
    pub total_combined_gap: f64,
    pub total_combined_residual: f64,
    pub total_actual: f64,
    pub total_potential: f64,
    pub potential_leveraged: f64,
    pub band: String,
    pub largest_gap_by_stream: LargestBlock,
    pub largest_gap_by_type: LargestBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LargestBlock {
    Gap { key: String, label: String, amount: f64 },
    NoSignificantGap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeBlock {
    pub overall: String,
    pub largest_stream: String,
    pub largest_gap_type: String,
}

fn breakdown_block(m: &StreamMetrics) -> BreakdownBlock {
    let b = &m.gap_breakdown;
    BreakdownBlock {
        registration_gap: b.registration_gap,
        compliance_gap: b.compliance_gap,
        assessment_gap: b.assessment_gap,
        rate_gap: b.rate_gap,
        combined_gaps: b.combined_gaps,
    }
}

fn largest_stream_block(l: &Largest<StreamKind>) -> LargestBlock {
    match *l {
        Largest::Gap { key, amount } => {
            LargestBlock::Gap { key: key.code().to_string(), label: key.label().to_string(), amount }
        }
        Largest::NoSignificantGap => LargestBlock::NoSignificantGap,
    }
}

fn largest_type_block(l: &Largest<GapKind>) -> LargestBlock {
    match *l {
        Largest::Gap { key, amount } => LargestBlock::Gap {
            key: key.label().to_lowercase(),
            label: key.label().to_string(),
            amount,
        },
        Largest::NoSignificantGap => LargestBlock::NoSignificantGap,
    }
}

/// Per-stream blocks in canonical stream order.
pub fn write_stream_blocks(wb: &Workbook, metrics: &WorkbookMetrics, symbol: &str) -> Vec<StreamBlock> {
    let counts = wb.category_counts();
    metrics
        .streams()
        .iter()
        .map(|m| StreamBlock {
            stream: m.stream.code().to_string(),
            label: m.stream.label().to_string(),
            category_count: counts
                .iter()
                .find(|(k, _)| *k == m.stream)
                .map_or(0, |(_, n)| *n),
            actual: m.actual,
            potential: m.potential,
            gap: m.gap,
            potential_leveraged: m.potential_leveraged,
            band: narrative::performance_band(m.potential_leveraged).code().to_string(),
            breakdown: breakdown_block(m),
            illustrative_rate_gap: m.illustrative_rate_gap,
            narrative: narrative::stream_narrative(m, symbol),
        })
        .collect()
}

pub fn write_totals(t: &AggregateTotals) -> TotalsBlock {
    TotalsBlock {
        total_registration_gap: t.total_registration_gap,
        total_compliance_gap: t.total_compliance_gap,
        total_assessment_gap: t.total_assessment_gap,
        total_rate_gap: t.total_rate_gap,
        total_combined_gap: t.total_combined_gap,
        total_combined_residual: t.total_combined_residual,
        total_actual: t.total_actual,
        total_potential: t.total_potential,
        potential_leveraged: t.potential_leveraged,
        band: narrative::performance_band(t.potential_leveraged).code().to_string(),
        largest_gap_by_stream: largest_stream_block(&t.largest_gap_by_stream),
        largest_gap_by_type: largest_type_block(&t.largest_gap_by_type),
    }
}

/// Compose a result without its id.
pub fn build_result(
    wb: &Workbook,
    metrics: &WorkbookMetrics,
    totals: &AggregateTotals,
    params: &EngineParams,
) -> ResultDoc {
    let symbol = params.currency_symbol.as_str();
    let title = if wb.title.trim().is_empty() { "Untitled report".to_string() } else { wb.title.clone() };
    ResultDoc {
        id: None,
        title,
        period_label: wb.period_label.clone(),
        currency_symbol: params.currency_symbol.clone(),
        rate_gap_policy: params.property_tax_rate_gap.token().to_string(),
        streams: write_stream_blocks(wb, metrics, symbol),
        totals: write_totals(totals),
        narrative: NarrativeBlock {
            overall: narrative::leverage_sentence("Overall, the local government", totals.potential_leveraged),
            largest_stream: narrative::stream_message(&totals.largest_gap_by_stream, symbol),
            largest_gap_type: narrative::gap_type_message(&totals.largest_gap_by_type, totals, symbol),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::analyze;
    use crate::compute::compute_workbook;
    use rosra_core::seeds::seed_workbook;

    #[test]
    fn undefined_components_are_omitted() {
        let wb = seed_workbook();
        let p = EngineParams::default();
        let m = compute_workbook(&wb, &p);
        let doc = build_result(&wb, &m, &analyze(&m), &p);
        let v = serde_json::to_value(&doc).unwrap();

        assert!(v.get("id").is_none());
        let license = &v["streams"][1]["breakdown"];
        assert!(license.get("rate_gap").is_none());
        assert!(license.get("registration_gap").is_some());
        let short = &v["streams"][2]["breakdown"];
        assert!(short.get("registration_gap").is_none());
        assert!(short.get("assessment_gap").is_none());
        assert!(v["streams"][0].get("illustrative_rate_gap").is_some());
        assert_eq!(v["totals"]["largest_gap_by_type"]["kind"], "gap");
        assert_eq!(v["totals"]["largest_gap_by_type"]["key"], "rate");
        assert_eq!(v["streams"][0]["category_count"], 3);
    }

    #[test]
    fn empty_workbook_gets_fallbacks() {
        let wb = Workbook::default();
        let p = EngineParams::default();
        let m = compute_workbook(&wb, &p);
        let doc = build_result(&wb, &m, &analyze(&m), &p);
        assert_eq!(doc.title, "Untitled report");
        assert_eq!(doc.totals.largest_gap_by_stream, LargestBlock::NoSignificantGap);
        assert_eq!(doc.totals.band, "significant_challenge");
        assert!(doc.narrative.largest_gap_type.contains("balanced"));
    }
}
