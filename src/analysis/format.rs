//! Fixed-precision display formatting for report fields.
//!
//! The wire contract serializes every non-count statistic as a decimal
//! string; percentages and ratios carry their unit suffix.

/// Two-decimal money/statistic string.
pub(crate) fn money(value: f64) -> String {
    format!("{value:.2}")
}

/// One-decimal rate string.
pub(crate) fn decimal1(value: f64) -> String {
    format!("{value:.1}")
}

/// Whole-number percentage, e.g. `"23%"`.
pub(crate) fn percent0(value: f64) -> String {
    format!("{value:.0}%")
}

/// One-decimal percentage, e.g. `"23.4%"`.
pub(crate) fn percent1(value: f64) -> String {
    format!("{value:.1}%")
}

/// Two-decimal multiplier, e.g. `"1.40x"`.
pub(crate) fn ratio(value: f64) -> String {
    format!("{value:.2}x")
}
