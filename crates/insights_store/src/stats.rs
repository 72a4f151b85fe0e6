//! Numeric finishing steps for backends without native STDDEV_POP,
//! PERCENTILE_CONT or CORR. The database supplies aggregate moments; the
//! formulas below turn them into the final statistics.

/// Zero-based offset of the first middle row and how many rows to read
/// (one for an odd count, two for an even count).
pub(crate) fn median_window(count: u64) -> Option<(u64, u64)> {
    if count == 0 {
        return None;
    }
    let offset = (count - 1) / 2;
    let take = if count % 2 == 0 { 2 } else { 1 };
    Some((offset, take))
}

/// Continuous 50th percentile from the middle row(s) returned for
/// [`median_window`].
pub(crate) fn interpolate_median(middle: &[i32]) -> Option<f64> {
    match middle {
        [only] => Some(f64::from(*only)),
        [lower, upper] => Some((f64::from(*lower) + f64::from(*upper)) / 2.0),
        _ => None,
    }
}

/// Population standard deviation from `E[x]` and `E[x^2]`.
pub(crate) fn population_stddev(mean: Option<f64>, mean_of_squares: Option<f64>) -> Option<f64> {
    let (mean, mean_of_squares) = (mean?, mean_of_squares?);
    // Cancellation can leave a tiny negative variance for constant series.
    let variance = (mean_of_squares - mean * mean).max(0.0);
    Some(variance.sqrt())
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Moments {
    pub n: i64,
    pub sum_x: f64,
    pub sum_y: f64,
    pub sum_xx: f64,
    pub sum_yy: f64,
    pub sum_xy: f64,
}

/// Pearson correlation. `None` for fewer than two pairs or a constant series,
/// matching SQL `CORR`.
pub(crate) fn pearson(moments: &Moments) -> Option<f64> {
    if moments.n < 2 {
        return None;
    }
    let n = moments.n as f64;
    let cov = n * moments.sum_xy - moments.sum_x * moments.sum_y;
    let var_x = n * moments.sum_xx - moments.sum_x * moments.sum_x;
    let var_y = n * moments.sum_yy - moments.sum_y * moments.sum_y;
    if is_degenerate(var_x, n * moments.sum_xx) || is_degenerate(var_y, n * moments.sum_yy) {
        return None;
    }
    finite_or_none(Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)))
}

// Rounding in large sums can leave a constant series with a tiny positive
// spread; treat anything below relative precision as zero variance.
fn is_degenerate(spread: f64, scale: f64) -> bool {
    spread <= scale.abs() * 1e-12
}

pub(crate) fn finite_or_none(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite())
}
