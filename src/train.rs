//! Boot-time training pipeline
//!
//! Seeded 80/20 train/test split, forest fit on the training partition, and a
//! floored mean absolute error measured on the held-out partition.

use std::time::{Duration, Instant};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    dataset::Dataset,
    error::{ForecastError, Result},
    model::{ForestConfig, Regressor, SpendForest},
};

/// Fraction of rows held out for evaluation
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Seed for the train/test permutation
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Indices of the train and test partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    /// Row indices used for fitting
    pub train: Vec<usize>,
    /// Row indices held out for evaluation
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    /// Partition `n` rows with a seeded permutation
    ///
    /// The test partition holds `ceil(test_fraction * n)` rows; the first
    /// `n_test` permuted indices go to test and the rest to train.
    ///
    /// # Errors
    ///
    /// - [`ForecastError::InvalidConfiguration`] if `test_fraction` is not in (0, 1)
    /// - [`ForecastError::InsufficientData`] if either partition would be empty
    pub fn new(n: usize, test_fraction: f64, seed: u64) -> Result<Self> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(ForecastError::InvalidConfiguration(format!(
                "test fraction must be in (0, 1), got {test_fraction}"
            )));
        }
        let n_test = (test_fraction * n as f64).ceil() as usize;
        if n < 2 || n_test >= n {
            return Err(ForecastError::InsufficientData {
                required: 2,
                found: n,
            });
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
        let train = indices.split_off(n_test);

        Ok(Self {
            train,
            test: indices,
        })
    }
}

/// Mean absolute error between targets and predictions
///
/// Returns 0.0 for empty input.
#[must_use]
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    total / n as f64
}

/// Summary of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Rows in the dataset
    pub total_rows: usize,
    /// Rows used for fitting
    pub train_rows: usize,
    /// Rows held out for evaluation
    pub test_rows: usize,
    /// Unrounded mean absolute error on the test partition
    pub raw_mae: f64,
    /// Floored mean absolute error used for forecast bands
    pub mae: u64,
    /// Forest hyperparameters
    pub forest: ForestConfig,
    /// Wall-clock time spent fitting and evaluating
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// Absolute error of each held-out prediction
    #[serde(skip)]
    pub test_errors: Vec<f64>,
}

impl std::fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  rows:      {}", self.total_rows)?;
        writeln!(f, "  train:     {}", self.train_rows)?;
        writeln!(f, "  test:      {}", self.test_rows)?;
        writeln!(f, "  trees:     {}", self.forest.n_estimators)?;
        writeln!(f, "  raw mae:   {:.4}", self.raw_mae)?;
        writeln!(f, "  mae:       {}", self.mae)?;
        write!(f, "  duration:  {:.1} ms", self.duration.as_secs_f64() * 1000.0)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(ms.max(0.0) / 1000.0))
    }
}

/// Training options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    /// Forest hyperparameters
    pub forest: ForestConfig,
    /// Held-out fraction
    pub test_fraction: f64,
    /// Seed for the split permutation
    pub split_seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            forest: ForestConfig::default(),
            test_fraction: DEFAULT_TEST_FRACTION,
            split_seed: DEFAULT_SPLIT_SEED,
        }
    }
}

impl TrainingConfig {
    /// Replace the forest hyperparameters
    #[must_use]
    pub fn with_forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }
}

/// Fitted model plus its evaluation
#[derive(Debug)]
pub struct TrainedModel {
    /// The fitted forest
    pub model: SpendForest,
    /// Evaluation summary
    pub report: TrainingReport,
}

/// Fit the forest on the training partition and evaluate on the test partition
///
/// # Errors
///
/// Propagates split, fit and predict failures.
pub fn train(dataset: &Dataset, config: &TrainingConfig) -> Result<TrainedModel> {
    let start = Instant::now();
    let split = TrainTestSplit::new(dataset.len(), config.test_fraction, config.split_seed)?;

    let spends = dataset.spends();
    let purchases = dataset.purchases();
    let gather = |column: &[f64], idx: &[usize]| -> Vec<f64> {
        idx.iter().map(|&i| column[i]).collect()
    };

    let train_x = gather(&spends, &split.train);
    let train_y = gather(&purchases, &split.train);
    let test_x = gather(&spends, &split.test);
    let test_y = gather(&purchases, &split.test);

    let model = SpendForest::fit(&train_x, &train_y, config.forest)?;
    let test_pred = model.predict_batch(&test_x)?;
    let raw_mae = mean_absolute_error(&test_y, &test_pred);
    let test_errors = test_y
        .iter()
        .zip(&test_pred)
        .map(|(a, p)| (a - p).abs())
        .collect();

    let report = TrainingReport {
        total_rows: dataset.len(),
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        raw_mae,
        mae: raw_mae.floor() as u64,
        forest: config.forest,
        duration: start.elapsed(),
        test_errors,
    };

    tracing::info!(
        train_rows = report.train_rows,
        test_rows = report.test_rows,
        raw_mae = report.raw_mae,
        mae = report.mae,
        "Trained {}",
        model.name()
    );

    Ok(TrainedModel { model, report })
}
