//! # Pronosticar
//!
//! Purchases and cost-per-acquisition forecasting from advertising spend.
//!
//! Pronosticar (Spanish: "to forecast") loads a table of historical monthly
//! (spend, purchases) observations, fits a random forest regressor on a seeded
//! 80/20 split, and measures the floored mean absolute error on the held-out
//! rows. A small HTTP service then answers "what happens if we spend X?" with
//! a forecast band, a CPA range, and a scatter chart of the history with the
//! forecast highlighted.
//!
//! ## Example
//!
//! ```rust
//! use pronosticar::{forecast::Forecast, forecast::format_thousands};
//!
//! let forecast = Forecast::from_prediction(1000.0, 38, 5).unwrap();
//! assert_eq!(
//!     forecast.result_text(),
//!     "38 ± 5 purchases and a CPA between $23.3 - $30.3 are forecast for a spend of $1,000"
//! );
//! assert_eq!(format_thousands(1_234_567.0), "1,234,567");
//! ```
//!
//! ## Serving
//!
//! ```rust,ignore
//! use pronosticar::{api::{create_router, AppState}, ForecastContext, TrainingConfig};
//!
//! let context = ForecastContext::bootstrap("bg_data_mth.csv", &TrainingConfig::default())?;
//! let app = create_router(AppState::new(context));
//! axum::serve(listener, app).await?;
//! ```
//!
//! ## Architecture
//!
//! Boot is linear: [`dataset`] -> [`train`] (using [`model`]) -> [`context`].
//! Requests flow through [`api`] into [`forecast`] and [`viz`]. All boot-time
//! state is immutable once the listener starts.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
// Clippy allows (MUST come after deny/warn to override them)
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)] // counts -> f64 for averages
#![allow(clippy::cast_possible_truncation)] // u128 micros -> u64 for metrics
#![allow(clippy::cast_sign_loss)] // ceil of a clamped non-negative prediction
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::float_cmp)] // exact comparisons in tests

#[cfg(feature = "server")]
pub mod api;
/// Server configuration and defaults
pub mod config;
/// Immutable boot-time state shared by request handlers
pub mod context;
pub mod dataset;
pub mod error;
pub mod forecast;
#[cfg(feature = "server")]
pub mod metrics;
pub mod model;
pub mod train;
pub mod viz;

// Re-exports for convenience
pub use context::ForecastContext;
pub use error::{ErrorKind, ForecastError, Result};
pub use train::TrainingConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
