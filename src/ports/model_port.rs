//! Regression model port used by the enhanced strategy.

use crate::domain::error::ForestError;

/// A regressor mapping a feature row to the next-day WMA change.
pub trait TrendModel {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<(), ForestError>;

    /// One prediction per row. Fails if called before `fit`.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ForestError>;
}
