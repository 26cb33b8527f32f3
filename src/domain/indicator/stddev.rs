//! Sample standard deviation of a window of closes.
//!
//! STDDEV = sqrt(sum((C[j] - mean)^2) / (n - 1)) over the n values of the
//! window. Bollinger bands are built on it.

/// Mean and sample standard deviation of a window of at least two values.
pub(crate) fn mean_and_sample_stddev(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let sum_sq: f64 = window.iter().map(|v| (v - mean) * (v - mean)).sum();
    // Rounding can push a constant window's sum slightly below zero.
    let variance = (sum_sq / (n - 1.0)).max(0.0);
    (mean, variance.sqrt())
}
