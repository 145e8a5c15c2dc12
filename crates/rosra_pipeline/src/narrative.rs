//! NARRATIVE: map ratios and arg-max identities to fixed message templates.
//!
//! Pure lookups. Degenerate inputs (non-finite percentages, no positive gap)
//! have their own fallback messages, so every figure gets a sentence.

use rosra_algo::StreamMetrics;
use rosra_core::determinism::argmax_first_positive;
use rosra_core::entities::{GapKind, StreamKind};
use rosra_core::numeric::{format_currency, percent_1dp, percent_of};

use crate::aggregate::{AggregateTotals, Largest};

/// Lower edge of the moderate band (inclusive).
pub const MODERATE_FROM: f64 = 30.0;
/// Lower edge of the strong band (inclusive).
pub const STRONG_FROM: f64 = 70.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerformanceBand {
    SignificantChallenge,
    Moderate,
    Strong,
    Undetermined,
}

impl PerformanceBand {
    pub fn code(self) -> &'static str {
        match self {
            PerformanceBand::SignificantChallenge => "significant_challenge",
            PerformanceBand::Moderate => "moderate",
            PerformanceBand::Strong => "strong",
            PerformanceBand::Undetermined => "undetermined",
        }
    }

    pub fn phrase(self) -> &'static str {
        match self {
            PerformanceBand::SignificantChallenge => "a significant challenge",
            PerformanceBand::Moderate => "moderate performance",
            PerformanceBand::Strong => "strong performance",
            PerformanceBand::Undetermined => "performance that cannot be determined from the inputs",
        }
    }
}

/// `< 30` significant challenge, `[30, 70)` moderate, `>= 70` strong.
pub fn performance_band(pct: f64) -> PerformanceBand {
    if !pct.is_finite() {
        PerformanceBand::Undetermined
    } else if pct < MODERATE_FROM {
        PerformanceBand::SignificantChallenge
    } else if pct < STRONG_FROM {
        PerformanceBand::Moderate
    } else {
        PerformanceBand::Strong
    }
}

/// Sentence naming the dominant gap component across all streams.
pub fn gap_type_message(largest: &Largest<GapKind>, totals: &AggregateTotals, symbol: &str) -> String {
    let Largest::Gap { key, amount } = *largest else {
        return "No single gap component stands out; the revenue gaps are balanced across components."
            .to_string();
    };
    let amt = format_currency(symbol, amount);
    let share = percent_1dp(percent_of(amount, totals.total_combined_gap));
    match key {
        GapKind::Registration => format!(
            "Registration is the largest gap component at {amt} ({share} of the total gap): many potential payers are not yet on the register. Expanding registration coverage should be the priority."
        ),
        GapKind::Compliance => format!(
            "Compliance is the largest gap component at {amt} ({share} of the total gap): registered payers are not paying what they owe. Strengthening collection and enforcement should be the priority."
        ),
        GapKind::Assessment => format!(
            "Assessment is the largest gap component at {amt} ({share} of the total gap): assessed values lag behind estimated values. Updating valuations should be the priority."
        ),
        GapKind::Rate => format!(
            "Rate is the largest gap component at {amt} ({share} of the total gap): charged rates sit below their potential. Reviewing tariffs should be the priority."
        ),
        GapKind::Combined => format!(
            "Combined effects are the largest gap component at {amt} ({share} of the total gap): several weaknesses compound each other."
        ),
    }
}

/// Sentence naming the stream with the largest total gap.
pub fn stream_message(largest: &Largest<StreamKind>, symbol: &str) -> String {
    match *largest {
        Largest::Gap { key, amount } => format!(
            "{} has the largest revenue gap at {}.",
            key.label(),
            format_currency(symbol, amount)
        ),
        Largest::NoSignificantGap => "No revenue stream shows a positive gap.".to_string(),
    }
}

/// Overall sentence for a leverage percentage.
pub fn leverage_sentence(subject: &str, pct: f64) -> String {
    let band = performance_band(pct);
    match band {
        PerformanceBand::Undetermined => format!("{subject} shows {}.", band.phrase()),
        _ => format!("{subject} realises {} of its potential revenue, {}.", band_percent(pct, band), band.phrase()),
    }
}

/// Percentage text that reads as inside `band`. One decimal unless rounding
/// would carry the value over a band edge, then as many as it takes.
fn band_percent(pct: f64, band: PerformanceBand) -> String {
    let shown = percent_1dp(pct);
    if shown.trim_end_matches('%').parse::<f64>().map(performance_band) == Ok(band) {
        return shown;
    }
    (2..=9)
        .map(|p| format!("{pct:.p$}"))
        .find(|s| s.parse::<f64>().map(performance_band) == Ok(band))
        .unwrap_or_else(|| pct.to_string())
        + "%"
}

/// Band sentence plus the dominant component of one stream.
pub fn stream_narrative(m: &StreamMetrics, symbol: &str) -> String {
    let lead = leverage_sentence(m.stream.label(), m.potential_leveraged);
    match argmax_first_positive(m.gap_breakdown.named()) {
        Some((kind, amount)) => format!(
            "{lead} Its largest gap component is {} at {}.",
            kind.label().to_lowercase(),
            format_currency(symbol, amount)
        ),
        None => format!("{lead} No named gap component is positive."),
    }
}
