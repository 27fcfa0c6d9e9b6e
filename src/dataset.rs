//! Historical spend/purchases dataset
//!
//! Loaded once at boot from a CSV file. Only the `date`, `spend` and
//! `purchases` columns are kept; column order and any extra columns are
//! irrelevant.

use std::{fs::File, io::Read, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Columns that must be present in the dataset header
pub const REQUIRED_COLUMNS: [&str; 3] = ["date", "spend", "purchases"];

/// One historical row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Period label as written in the source file
    pub date: String,
    /// Advertising spend for the period
    pub spend: f64,
    /// Purchases attributed to the spend
    pub purchases: f64,
}

impl Observation {
    /// Create an observation
    pub fn new(date: impl Into<String>, spend: f64, purchases: f64) -> Self {
        Self {
            date: date.into(),
            spend,
            purchases,
        }
    }
}

/// Immutable in-memory table of observations
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    observations: Vec<Observation>,
}

impl Dataset {
    /// Wrap already-parsed observations
    #[must_use]
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    /// Load a dataset from a CSV file on disk
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::DatasetUnavailable`] if the file cannot be
    /// opened, and the errors of [`Dataset::from_reader`] otherwise.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ForecastError::DatasetUnavailable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let dataset = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            rows = dataset.len(),
            "Loaded dataset"
        );
        Ok(dataset)
    }

    /// Parse a dataset from any CSV source
    ///
    /// # Errors
    ///
    /// - [`ForecastError::MissingColumn`] if a required header is absent
    /// - [`ForecastError::MalformedRow`] if a `spend` or `purchases` cell is
    ///   not a number
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| ForecastError::MalformedRow {
                line: 1,
                reason: format!("unreadable header: {e}"),
            })?
            .clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(ForecastError::MissingColumn {
                    column: column.to_string(),
                });
            }
        }

        let mut observations = Vec::new();
        for row in csv_reader.deserialize::<Observation>() {
            let observation = row.map_err(|e| ForecastError::MalformedRow {
                line: e.position().map_or(0, csv::Position::line),
                reason: e.to_string(),
            })?;
            if !observation.spend.is_finite() || !observation.purchases.is_finite() {
                return Err(ForecastError::MalformedRow {
                    line: observations.len() as u64 + 2,
                    reason: "spend and purchases must be finite numbers".to_string(),
                });
            }
            observations.push(observation);
        }

        Ok(Self { observations })
    }

    /// All observations in file order
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// True when no rows were loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Feature column (spend)
    #[must_use]
    pub fn spends(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.spend).collect()
    }

    /// Target column (purchases)
    #[must_use]
    pub fn purchases(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.purchases).collect()
    }
}
