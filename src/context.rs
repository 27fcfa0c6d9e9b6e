//! Boot-time state shared by every request
//!
//! Built once before the listener accepts connections and never mutated
//! afterwards, so handlers read it through an `Arc` without locking.

use std::path::Path;
use std::sync::Arc;

use crate::{
    dataset::Dataset,
    error::Result,
    forecast::{self, Forecast},
    model::Regressor,
    train::{self, TrainingConfig, TrainingReport},
};

/// Dataset, fitted model and floored MAE
#[derive(Clone)]
pub struct ForecastContext {
    dataset: Arc<Dataset>,
    model: Arc<dyn Regressor>,
    mae: u64,
    report: Option<Arc<TrainingReport>>,
}

impl std::fmt::Debug for ForecastContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastContext")
            .field("rows", &self.dataset.len())
            .field("model", &self.model.name())
            .field("mae", &self.mae)
            .finish_non_exhaustive()
    }
}

impl ForecastContext {
    /// Load the CSV at `path` and train on it
    ///
    /// # Errors
    ///
    /// Any dataset or training error; all are fatal at boot.
    pub fn bootstrap(path: impl AsRef<Path>, config: &TrainingConfig) -> Result<Self> {
        let dataset = Dataset::from_path(path)?;
        Self::train(dataset, config)
    }

    /// Train on an already loaded dataset
    ///
    /// # Errors
    ///
    /// Split, fit or evaluation failure.
    pub fn train(dataset: Dataset, config: &TrainingConfig) -> Result<Self> {
        let trained = train::train(&dataset, config)?;
        Ok(Self {
            dataset: Arc::new(dataset),
            mae: trained.report.mae,
            model: Arc::new(trained.model),
            report: Some(Arc::new(trained.report)),
        })
    }

    /// Assemble a context from parts, skipping training
    ///
    /// Used to serve a model fitted elsewhere, or a stub in tests.
    pub fn from_parts(dataset: Dataset, model: Arc<dyn Regressor>, mae: u64) -> Self {
        Self {
            dataset: Arc::new(dataset),
            model,
            mae,
            report: None,
        }
    }

    /// Historical observations
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The fitted regressor
    #[must_use]
    pub fn model(&self) -> &dyn Regressor {
        self.model.as_ref()
    }

    /// Floored held-out MAE
    #[must_use]
    pub fn mae(&self) -> u64 {
        self.mae
    }

    /// Training summary, absent for contexts built with [`Self::from_parts`]
    #[must_use]
    pub fn report(&self) -> Option<&TrainingReport> {
        self.report.as_deref()
    }

    /// Forecast for one spend value using this context's model and MAE
    ///
    /// # Errors
    ///
    /// See [`forecast::forecast`].
    pub fn forecast(&self, spend: f64) -> Result<Forecast> {
        forecast::forecast(self.model(), self.mae, spend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dataset::Observation,
        error::ForecastError,
        model::ForestConfig,
    };
    use std::io::Write;

    struct Linear;

    impl Regressor for Linear {
        fn predict_batch(&self, spends: &[f64]) -> Result<Vec<f64>> {
            Ok(spends.iter().map(|s| s / 25.0).collect())
        }

        fn name(&self) -> &'static str {
            "Linear"
        }
    }

    fn small_training() -> TrainingConfig {
        TrainingConfig::default().with_forest(ForestConfig::default().with_n_estimators(8))
    }

    #[test]
    fn test_from_parts() {
        let dataset = Dataset::from_observations(vec![Observation::new("2023-01", 100.0, 4.0)]);
        let ctx = ForecastContext::from_parts(dataset, Arc::new(Linear), 2);
        assert_eq!(ctx.mae(), 2);
        assert_eq!(ctx.dataset().len(), 1);
        assert!(ctx.report().is_none());

        let forecast = ctx.forecast(1000.0).expect("forecast");
        assert_eq!(forecast.predicted_purchases, 40);
        assert_eq!(forecast.mae, 2);
    }

    #[test]
    fn test_bootstrap_from_csv() {
        let mut file = tempfile::NamedTempFile::new().expect("test");
        writeln!(file, "date,spend,purchases,clicks").expect("test");
        for i in 0..20 {
            let spend = 300.0 + 100.0 * f64::from(i);
            writeln!(file, "2021-{:02}-01,{spend},{},7", i % 12 + 1, spend / 20.0).expect("test");
        }
        file.flush().expect("test");

        let ctx = ForecastContext::bootstrap(file.path(), &small_training()).expect("boot");
        assert_eq!(ctx.dataset().len(), 20);
        let report = ctx.report().expect("report");
        assert_eq!(report.mae, ctx.mae());
        assert_eq!(ctx.model().name(), "RandomForestRegressor");
    }

    #[test]
    fn test_bootstrap_missing_file() {
        let err = ForecastContext::bootstrap("/nonexistent/bg_data_mth.csv", &small_training())
            .unwrap_err();
        assert!(matches!(err, ForecastError::DatasetUnavailable { .. }));
    }

    #[test]
    fn test_debug_is_compact() {
        let ctx = ForecastContext::from_parts(Dataset::default(), Arc::new(Linear), 0);
        let text = format!("{ctx:?}");
        assert!(text.contains("Linear"));
        assert!(text.contains("rows: 0"));
    }
}
