use nalgebra as na;

/// Backward finite difference `(curr - prev) / dt`.
#[inline]
pub fn backward_diff(curr: na::Vector2<f64>, prev: na::Vector2<f64>, dt: f64) -> na::Vector2<f64> {
    (curr - prev) / dt
}

/// Rounds to `places` decimals, ties to even.
#[inline]
pub fn round_to(v: f64, places: i32) -> f64 {
    let k = 10f64.powi(places);
    let r = (v * k).round_ties_even() / k;

    // keeps "-0.0" out of the table
    if r == 0.0 {
        0.0
    } else {
        r
    }
}
