//! Numeric guards shared by every calculator and by the input boundary.
//!
//! Calculators work in `f64`. Two rules apply everywhere:
//! - inputs are coerced once at the boundary (negative, missing, non-finite → 0);
//! - every published figure passes `finite_or_zero`, so NaN/Infinity never leave the engine.

/// Map NaN/±Infinity to 0.
#[inline]
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

/// Boundary coercion for numeric inputs: negative or non-finite values become 0.
#[inline]
pub fn coerce_input(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 { x } else { 0.0 }
}

/// Parse a raw field value as typed by a user.
///
/// Accepts surrounding whitespace and `,`/`_` digit grouping. Anything that does
/// not parse is treated as missing and coerced to 0.
pub fn coerce_raw(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_'))
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    cleaned.parse::<f64>().map(coerce_input).unwrap_or(0.0)
}

/// `num / den`, or 0 when the denominator is 0 or the quotient is not finite.
#[inline]
pub fn safe_div(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        return 0.0;
    }
    finite_or_zero(num / den)
}

/// `part / whole × 100`, or 0 when `whole <= 0`.
#[inline]
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole.is_nan() || whole <= 0.0 {
        return 0.0;
    }
    finite_or_zero(part / whole * 100.0)
}

/// Arithmetic mean; 0 for an empty iterator.
pub fn mean<I: IntoIterator<Item = f64>>(xs: I) -> f64 {
    let (sum, n) = xs.into_iter().fold((0.0_f64, 0_u32), |(s, n), x| (s + x, n + 1));
    if n == 0 { 0.0 } else { finite_or_zero(sum / f64::from(n)) }
}

/// Relative comparison: `|a - b| <= tol * max(1, |a|, |b|)`.
#[inline]
pub fn approx_eq_rel(a: f64, b: f64, tol: f64) -> bool {
    let scale = 1.0_f64.max(a.abs()).max(b.abs());
    (a - b).abs() <= tol * scale
}

/// Whole-unit amount with `,` thousands grouping, e.g. `-1,234,568`.
pub fn format_amount(x: f64) -> String {
    let rounded = finite_or_zero(x).round();
    // `as` saturates for out-of-range floats.
    let n = rounded as i128;
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    let lead = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Amount prefixed with a currency symbol; the sign goes before the symbol.
pub fn format_currency(symbol: &str, x: f64) -> String {
    let body = format_amount(x);
    match body.strip_prefix('-') {
        Some(abs) => format!("-{symbol}{abs}"),
        None => format!("{symbol}{body}"),
    }
}

/// Percentage (already ×100) with one decimal, half away from zero.
pub fn percent_1dp(pct: f64) -> String {
    if !pct.is_finite() {
        return "—".to_string();
    }
    let tenths = (pct * 10.0).round() / 10.0;
    format!("{tenths:.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards() {
        assert_eq!(finite_or_zero(f64::NAN), 0.0);
        assert_eq!(finite_or_zero(f64::INFINITY), 0.0);
        assert_eq!(safe_div(1.0, 0.0), 0.0);
        assert_eq!(safe_div(1.0, 4.0), 0.25);
        assert_eq!(percent_of(5.0, 0.0), 0.0);
        assert_eq!(percent_of(5.0, -3.0), 0.0);
        assert_eq!(percent_of(25.0, 100.0), 25.0);
        assert_eq!(mean(Vec::<f64>::new()), 0.0);
        assert_eq!(mean([2.0, 4.0]), 3.0);
    }

    #[test]
    fn boundary_coercion() {
        assert_eq!(coerce_input(-4.0), 0.0);
        assert_eq!(coerce_input(f64::NAN), 0.0);
        assert_eq!(coerce_input(12.5), 12.5);
        assert_eq!(coerce_raw(" 1,250.5 "), 1250.5);
        assert_eq!(coerce_raw(""), 0.0);
        assert_eq!(coerce_raw("abc"), 0.0);
        assert_eq!(coerce_raw("-7"), 0.0);
    }

    #[test]
    fn amounts_are_grouped() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.4), "999");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(7_420_000.0), "7,420,000");
        assert_eq!(format_amount(-1_234_567.6), "-1,234,568");
        assert_eq!(format_currency("$", -2500.0), "-$2,500");
        assert_eq!(format_currency("KES ", 1_825_000.0), "KES 1,825,000");
    }

    #[test]
    fn percents() {
        assert_eq!(percent_1dp(15.873), "15.9%");
        assert_eq!(percent_1dp(70.0), "70.0%");
        assert_eq!(percent_1dp(f64::NAN), "—");
    }

    #[test]
    fn relative_tolerance() {
        assert!(approx_eq_rel(1e9, 1e9 + 1.0, 1e-6));
        assert!(!approx_eq_rel(1.0, 1.1, 1e-6));
    }
}
