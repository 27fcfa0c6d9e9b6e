//! Spend -> purchases regression model
//!
//! The forest itself comes from `smartcore`; this module only adapts it to the
//! single-feature [`Regressor`] capability the rest of the crate depends on.

use serde::{Deserialize, Serialize};
use smartcore::{
    ensemble::random_forest_regressor::{
        RandomForestRegressor, RandomForestRegressorParameters,
    },
    linalg::basic::matrix::DenseMatrix,
};

use crate::error::{ForecastError, Result};

/// A fitted single-feature regression model
///
/// Implementations are read-only after construction and shared across
/// request handlers.
pub trait Regressor: Send + Sync {
    /// Predict purchases for each spend value
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::ModelError`] if inference fails.
    fn predict_batch(&self, spends: &[f64]) -> Result<Vec<f64>>;

    /// Predict purchases for a single spend value
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::ModelError`] if inference fails.
    fn predict(&self, spend: f64) -> Result<f64> {
        self.predict_batch(&[spend])?
            .into_iter()
            .next()
            .ok_or_else(|| ForecastError::ModelError {
                operation: "predict".to_string(),
                reason: "model returned no prediction".to_string(),
            })
    }

    /// Short model family name for diagnostics
    fn name(&self) -> &'static str;
}

/// Random forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub n_estimators: usize,
    /// Minimum samples required to split an internal node
    pub min_samples_split: usize,
    /// Minimum samples required at a leaf
    pub min_samples_leaf: usize,
    /// Seed for bootstrap sampling
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            min_samples_split: 5,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

impl ForestConfig {
    /// Set the number of trees
    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Set the bootstrap seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check that the hyperparameters are usable
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::InvalidConfiguration`] for zero-sized values.
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ForecastError::InvalidConfiguration(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ForecastError::InvalidConfiguration(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ForecastError::InvalidConfiguration(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        Ok(())
    }

    fn to_parameters(self) -> RandomForestRegressorParameters {
        RandomForestRegressorParameters::default()
            .with_n_trees(self.n_estimators)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_seed(self.seed)
    }
}

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Random forest over the single `spend` feature
pub struct SpendForest {
    forest: Forest,
    config: ForestConfig,
}

impl std::fmt::Debug for SpendForest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpendForest")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SpendForest {
    /// Fit a forest on (spend, purchases) pairs
    ///
    /// # Errors
    ///
    /// - [`ForecastError::InvalidConfiguration`] for unusable hyperparameters
    /// - [`ForecastError::InsufficientData`] if there are no samples
    /// - [`ForecastError::ModelError`] if the lengths differ or fitting fails
    pub fn fit(spends: &[f64], purchases: &[f64], config: ForestConfig) -> Result<Self> {
        config.validate()?;
        if spends.is_empty() {
            return Err(ForecastError::InsufficientData {
                required: 1,
                found: 0,
            });
        }
        if spends.len() != purchases.len() {
            return Err(ForecastError::ModelError {
                operation: "fit".to_string(),
                reason: format!(
                    "feature/target length mismatch: {} vs {}",
                    spends.len(),
                    purchases.len()
                ),
            });
        }

        let x = feature_matrix(spends);
        let y = purchases.to_vec();
        let forest = Forest::fit(&x, &y, config.to_parameters()).map_err(|e| {
            ForecastError::ModelError {
                operation: "fit".to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self { forest, config })
    }

    /// Hyperparameters the forest was fitted with
    #[must_use]
    pub fn config(&self) -> ForestConfig {
        self.config
    }
}

impl Regressor for SpendForest {
    fn predict_batch(&self, spends: &[f64]) -> Result<Vec<f64>> {
        if spends.is_empty() {
            return Ok(Vec::new());
        }
        let x = feature_matrix(spends);
        self.forest
            .predict(&x)
            .map_err(|e| ForecastError::ModelError {
                operation: "predict".to_string(),
                reason: e.to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "RandomForestRegressor"
    }
}

/// n x 1 design matrix
fn feature_matrix(spends: &[f64]) -> DenseMatrix<f64> {
    DenseMatrix::new(spends.len(), 1, spends.to_vec(), true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data(n: usize) -> (Vec<f64>, Vec<f64>) {
        let spends: Vec<f64> = (0..n).map(|i| 100.0 * i as f64).collect();
        let purchases: Vec<f64> = spends.iter().map(|s| s / 50.0).collect();
        (spends, purchases)
    }

    #[test]
    fn test_default_config_matches_boot_parameters() {
        let config = ForestConfig::default();
        assert_eq!(config.n_estimators, 100);
        assert_eq!(config.min_samples_split, 5);
        assert_eq!(config.min_samples_leaf, 1);
        assert_eq!(config.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ForestConfig::default().with_n_estimators(0);
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_fit_and_predict_tracks_trend() {
        let (spends, purchases) = linear_data(40);
        let forest = SpendForest::fit(&spends, &purchases, ForestConfig::default().with_n_estimators(20))
            .expect("fit");
        let low = forest.predict(200.0).expect("predict");
        let high = forest.predict(3500.0).expect("predict");
        assert!(high > low, "expected monotone trend, got {low} vs {high}");
        assert!(low >= 0.0);
    }

    #[test]
    fn test_predictions_are_deterministic() {
        let (spends, purchases) = linear_data(30);
        let config = ForestConfig::default().with_n_estimators(10);
        let a = SpendForest::fit(&spends, &purchases, config).expect("fit");
        let b = SpendForest::fit(&spends, &purchases, config).expect("fit");
        let probe = [150.0, 1234.0, 2900.0];
        assert_eq!(
            a.predict_batch(&probe).expect("predict"),
            b.predict_batch(&probe).expect("predict")
        );
    }

    #[test]
    fn test_fit_rejects_empty() {
        let err = SpendForest::fit(&[], &[], ForestConfig::default()).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { .. }));
    }

    #[test]
    fn test_fit_rejects_length_mismatch() {
        let err = SpendForest::fit(&[1.0, 2.0], &[1.0], ForestConfig::default()).unwrap_err();
        assert!(matches!(err, ForecastError::ModelError { .. }));
    }

    #[test]
    fn test_predict_batch_empty() {
        let (spends, purchases) = linear_data(10);
        let forest = SpendForest::fit(&spends, &purchases, ForestConfig::default().with_n_estimators(5))
            .expect("fit");
        assert!(forest.predict_batch(&[]).expect("predict").is_empty());
        assert_eq!(forest.name(), "RandomForestRegressor");
    }
}
