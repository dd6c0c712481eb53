/// Normalize a decimal written with either separator: every comma becomes a
/// period, then the result is parsed as f64. Empty, non-numeric, or
/// non-finite input normalizes to zero.
pub fn parse_decimal(input: &str) -> f64 {
    input
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}
