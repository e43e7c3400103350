// Number formatting helpers for console output.
//
// Everything here is presentation-only; the aggregation layer works on raw
// f64/i64 values and formatting happens at the last moment.
use num_format::{Locale, ToFormattedString};

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values. This is used
    // for counts in console messages (e.g., `9,855 rows`).
    n.to_formatted_string(&Locale::en)
}

/// Compact headline figure: divide by a power of ten and attach a unit
/// suffix, e.g. `format_scaled(59_100_000_000.0, 1e9, "B")` -> `"59.1B"`.
pub fn format_scaled(n: f64, divisor: f64, suffix: &str) -> String {
    format!("{:.1}{}", n / divisor, suffix)
}
