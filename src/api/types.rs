//! API request and response types

use serde::{Deserialize, Serialize};

use crate::{
    error::{ForecastError, Result},
    train::TrainingReport,
};

/// Spend as sent by the page: a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpendValue {
    /// `{"spend_value": 1000}`
    Number(f64),
    /// `{"spend_value": "1000"}`
    Text(String),
}

impl SpendValue {
    /// Parse into a float
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::InvalidInput`] if the text is not a number.
    pub fn to_f64(&self) -> Result<f64> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                ForecastError::invalid_input(format!("spend_value '{s}' is not a number"))
            }),
        }
    }
}

/// Body of `POST /calculate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateRequest {
    /// Requested spend
    #[serde(default)]
    pub spend_value: Option<SpendValue>,
}

impl CalculateRequest {
    /// Extract the spend as a float
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::InvalidInput`] if the field is missing or not
    /// numeric.
    pub fn spend(&self) -> Result<f64> {
        self.spend_value
            .as_ref()
            .ok_or_else(|| ForecastError::invalid_input("spend_value is required"))?
            .to_f64()
    }
}

/// Successful forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateResponse {
    /// Forecast sentence
    pub result_text: String,
    /// Base64-encoded PNG chart
    pub plot_url: String,
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error kind identifier (`invalid_input`, `invalid_computation`, `internal`)
    pub kind: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Whether a fitted model is being served
    pub model_loaded: bool,
}

/// `GET /model` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Model family
    pub model: String,
    /// Rows in the historical dataset
    pub rows: usize,
    /// Floored held-out MAE used for forecast bands
    pub mae: u64,
    /// Training summary, when the model was trained in-process
    pub training: Option<TrainingReport>,
}
