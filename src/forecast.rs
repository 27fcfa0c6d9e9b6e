//! Forecast arithmetic and result formatting
//!
//! For a spend value `S`, predicted purchases `P = ceil(model(S))` and the
//! floored error estimate `M`, the forecast band is `P ± M` purchases and the
//! cost-per-acquisition range is `S / (P + M)` to `S / (P - M)`.

use serde::{Deserialize, Serialize};

use crate::{
    error::{ForecastError, Result},
    model::Regressor,
};

/// A computed forecast for one spend value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Spend the forecast was requested for
    pub spend: f64,
    /// Ceiling of the model prediction
    pub predicted_purchases: u64,
    /// Error band half-width
    pub mae: u64,
    /// `spend / (predicted + mae)`
    pub cpa_low: f64,
    /// `spend / (predicted - mae)`
    pub cpa_high: f64,
}

impl Forecast {
    /// Derive the CPA band from a prediction
    ///
    /// # Errors
    ///
    /// - [`ForecastError::InvalidInput`] if `spend` is negative or not finite
    /// - [`ForecastError::InvalidComputation`] if `predicted <= mae`, where the
    ///   upper CPA bound would divide by zero or go negative
    pub fn from_prediction(spend: f64, predicted_purchases: u64, mae: u64) -> Result<Self> {
        validate_spend(spend)?;
        if predicted_purchases <= mae {
            return Err(ForecastError::InvalidComputation {
                reason: format!(
                    "predicted purchases ({predicted_purchases}) must exceed the error estimate ({mae}) \
                     to bound the CPA for a spend of ${}",
                    format_thousands(spend)
                ),
            });
        }

        let upper = predicted_purchases
            .checked_add(mae)
            .ok_or_else(|| ForecastError::InvalidComputation {
                reason: format!(
                    "purchase band {predicted_purchases} + {mae} overflows a purchase count"
                ),
            })? as f64;
        let lower = (predicted_purchases - mae) as f64;
        Ok(Self {
            spend,
            predicted_purchases,
            mae,
            cpa_low: spend / upper,
            cpa_high: spend / lower,
        })
    }

    /// Human-readable forecast sentence
    #[must_use]
    pub fn result_text(&self) -> String {
        format!(
            "{} ± {} purchases and a CPA between ${:.1} - ${:.1} are forecast for a spend of ${}",
            self.predicted_purchases,
            self.mae,
            self.cpa_low,
            self.cpa_high,
            format_thousands(self.spend)
        )
    }
}

/// Largest spend a forecast is computed for
pub const MAX_SPEND: f64 = 1e15;

/// Reject spend values that are negative, NaN, infinite or above [`MAX_SPEND`]
///
/// # Errors
///
/// Returns [`ForecastError::InvalidInput`] describing the rejected value.
pub fn validate_spend(spend: f64) -> Result<()> {
    if !spend.is_finite() {
        return Err(ForecastError::invalid_input(format!(
            "spend_value must be a finite number, got {spend}"
        )));
    }
    if spend < 0.0 {
        return Err(ForecastError::invalid_input(format!(
            "spend_value must be non-negative, got {spend}"
        )));
    }
    if spend > MAX_SPEND {
        return Err(ForecastError::invalid_input(format!(
            "spend_value must not exceed {}, got {spend}",
            format_thousands(MAX_SPEND)
        )));
    }
    Ok(())
}

/// Round a raw model output up to a whole, non-negative purchase count
///
/// # Errors
///
/// Returns [`ForecastError::ModelError`] if the model produced NaN or infinity.
pub fn ceil_purchases(raw: f64) -> Result<u64> {
    if !raw.is_finite() {
        return Err(ForecastError::ModelError {
            operation: "predict".to_string(),
            reason: format!("non-finite prediction {raw}"),
        });
    }
    Ok(raw.max(0.0).ceil() as u64)
}

/// Run the model and build the forecast for one spend value
///
/// # Errors
///
/// Propagates input validation, model, and CPA-band errors.
pub fn forecast(model: &dyn Regressor, mae: u64, spend: f64) -> Result<Forecast> {
    validate_spend(spend)?;
    let raw = model.predict(spend)?;
    let predicted = ceil_purchases(raw)?;
    Forecast::from_prediction(spend, predicted, mae)
}

/// Format a value rounded to whole units with comma thousands separators
///
/// `1000.0` -> `"1,000"`, `1234567.6` -> `"1,234,568"`.
#[must_use]
pub fn format_thousands(value: f64) -> String {
    let rounded = format!("{value:.0}");
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if sign == "-" && grouped.chars().all(|c| c == '0' || c == ',') {
        return grouped;
    }
    format!("{sign}{grouped}")
}
