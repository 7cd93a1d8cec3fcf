//! Two-bar crossing tests on consecutive samples.

/// `a` moved from strictly below `b` to strictly above it.
pub fn crossed_above(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    prev_a < prev_b && a > b
}

/// `a` moved from strictly above `b` to strictly below it.
pub fn crossed_below(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    crossed_above(prev_b, prev_a, b, a)
}
