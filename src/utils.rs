//! Numeric helpers shared by the extractor and the legacy analyzer.

/// Round `value` to `places` decimal places, resolving ties to the even neighbour.
///
/// Stored ratios and measurements have always been rounded this way, so a
/// ratio of `0.0625` becomes `0.062` at three places.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round_ties_even() / factor
}

/// Round to the nearest integer, ties to even.
#[must_use]
pub fn round_score(value: f64) -> i32 {
    value.round_ties_even() as i32
}

/// Divide, returning `fallback` when the denominator is not positive.
#[must_use]
pub fn ratio_or(numerator: f64, denominator: f64, fallback: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        fallback
    }
}
