//! Random forest trend model backed by `smartcore`.

use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::debug;

use crate::domain::error::ForestError;
use crate::domain::run_config::ForestParams;
use crate::ports::model_port::TrendModel;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

pub struct RandomForestModel {
    params: ForestParams,
    model: Option<Forest>,
    n_features: usize,
}

impl RandomForestModel {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            model: None,
            n_features: 0,
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    fn parameters(&self, n_features: usize) -> RandomForestRegressorParameters {
        let mut parameters = RandomForestRegressorParameters::default()
            .with_n_trees(self.params.n_trees)
            .with_min_samples_split(self.params.min_samples_split)
            .with_min_samples_leaf(self.params.min_samples_leaf)
            // every split considers all features
            .with_m(n_features)
            .with_seed(self.params.seed);
        if let Some(depth) = self.params.max_depth {
            parameters = parameters.with_max_depth(depth);
        }
        parameters
    }
}

fn model_err(reason: String) -> ForestError {
    ForestError::Model { reason }
}

fn to_matrix(features: &[Vec<f64>]) -> Result<DenseMatrix<f64>, ForestError> {
    DenseMatrix::from_2d_vec(&features.to_vec())
        .map_err(|e| model_err(format!("failed to build feature matrix: {e:?}")))
}

impl TrendModel for RandomForestModel {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<(), ForestError> {
        if features.is_empty() {
            return Err(model_err("cannot fit on an empty training set".to_string()));
        }
        if features.len() != targets.len() {
            return Err(model_err(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }
        let n_features = features[0].len();
        if n_features == 0 || features.iter().any(|row| row.len() != n_features) {
            return Err(model_err("feature rows must share a non-zero width".to_string()));
        }

        let x = to_matrix(features)?;
        let y = targets.to_vec();

        debug!(
            samples = features.len(),
            features = n_features,
            trees = self.params.n_trees,
            "fitting random forest"
        );

        let model = Forest::fit(&x, &y, self.parameters(n_features))
            .map_err(|e| model_err(format!("training failed: {e:?}")))?;

        self.model = Some(model);
        self.n_features = n_features;
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ForestError> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| model_err("model has not been fitted".to_string()))?;

        if features.is_empty() {
            return Ok(Vec::new());
        }
        if features.iter().any(|row| row.len() != self.n_features) {
            return Err(model_err(format!(
                "expected {} features per row",
                self.n_features
            )));
        }

        let x = to_matrix(features)?;
        model
            .predict(&x)
            .map_err(|e| model_err(format!("prediction failed: {e:?}")))
    }
}
