//! HTTP API for spend forecasts
//!
//! ## Endpoints
//!
//! - `GET /` - Forecast page
//! - `POST /calculate` - Forecast purchases and CPA for a spend value
//! - `GET /health` - Health check
//! - `GET /metrics` - Prometheus-formatted metrics
//! - `GET /model` - Training summary
//!
//! ## Example
//!
//! ```rust,ignore
//! use pronosticar::api::{create_router, AppState};
//!
//! let context = ForecastContext::bootstrap("bg_data_mth.csv", &TrainingConfig::default())?;
//! let app = create_router(AppState::new(context));
//! axum::serve(listener, app).await?;
//! ```

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use tokio::sync::Semaphore;

use crate::{
    config::default_render_concurrency,
    context::ForecastContext,
    error::{ErrorKind, ForecastError, Result},
    metrics::MetricsCollector,
    viz::{encode_base64, ChartRenderer, ForecastPoint, ScatterRenderer},
};

pub mod types;
pub use types::*;

/// Forecast page served at `/`
pub const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Dataset, model and MAE fixed at boot
    context: ForecastContext,
    /// Chart backend
    renderer: Arc<dyn ChartRenderer>,
    /// Bounds concurrent renders on the blocking pool
    render_permits: Arc<Semaphore>,
    /// Request counters
    metrics: MetricsCollector,
}

impl AppState {
    /// State with the default renderer and one render permit per core
    #[must_use]
    pub fn new(context: ForecastContext) -> Self {
        Self {
            context,
            renderer: Arc::new(ScatterRenderer::new()),
            render_permits: Arc::new(Semaphore::new(default_render_concurrency())),
            metrics: MetricsCollector::new(),
        }
    }

    /// Replace the chart backend
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn ChartRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Set how many charts may render at once (minimum 1)
    #[must_use]
    pub fn with_render_concurrency(mut self, permits: usize) -> Self {
        self.render_permits = Arc::new(Semaphore::new(permits.max(1)));
        self
    }

    /// Boot-time context
    #[must_use]
    pub fn context(&self) -> &ForecastContext {
        &self.context
    }

    /// Request metrics
    #[must_use]
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/calculate", post(calculate_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/model", get(model_handler))
        .with_state(state)
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// HTTP status for an error kind
#[must_use]
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidComputation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Internal | ErrorKind::Boot => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &ForecastError) -> ApiError {
    let kind = match err.kind() {
        ErrorKind::Boot => ErrorKind::Internal,
        kind => kind,
    };
    (
        status_for(kind),
        Json(ErrorResponse {
            error: err.to_string(),
            kind: kind.as_str().to_string(),
        }),
    )
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        model_loaded: !state.context.dataset().is_empty(),
    })
}

async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.to_prometheus()
}

async fn model_handler(State(state): State<AppState>) -> Json<ModelResponse> {
    let context = &state.context;
    Json(ModelResponse {
        model: context.model().name().to_string(),
        rows: context.dataset().len(),
        mae: context.mae(),
        training: context.report().cloned(),
    })
}

/// Forecast handler
///
/// Malformed JSON is reported as `invalid_input` rather than axum's default
/// rejection so every failure carries the same error body.
async fn calculate_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CalculateRequest>, JsonRejection>,
) -> std::result::Result<Json<CalculateResponse>, ApiError> {
    match calculate(&state, payload).await {
        Ok((response, prediction, render)) => {
            state.metrics.record_success(prediction, render);
            Ok(Json(response))
        },
        Err(e) => {
            let kind = e.kind();
            state.metrics.record_failure(kind);
            if kind == ErrorKind::InvalidInput || kind == ErrorKind::InvalidComputation {
                tracing::debug!(%kind, error = %e, "Forecast rejected");
            } else {
                tracing::error!(%kind, error = %e, "Forecast failed");
            }
            Err(error_response(&e))
        },
    }
}

async fn calculate(
    state: &AppState,
    payload: std::result::Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<(CalculateResponse, Duration, Duration)> {
    let Json(request) = payload
        .map_err(|e| ForecastError::invalid_input(format!("invalid request body: {e}")))?;
    let spend = request.spend()?;
    tracing::debug!(spend, "Forecast requested");

    let start = Instant::now();
    let forecast = state.context.forecast(spend)?;
    let prediction = start.elapsed();

    let start = Instant::now();
    let png = {
        let _permit = state
            .render_permits
            .acquire()
            .await
            .map_err(|e| ForecastError::render(format!("render pool closed: {e}")))?;
        let renderer = Arc::clone(&state.renderer);
        let context = state.context.clone();
        #[allow(clippy::cast_precision_loss)]
        let point = ForecastPoint {
            spend,
            purchases: forecast.predicted_purchases as f64,
        };
        tokio::task::spawn_blocking(move || {
            renderer.render(context.dataset().observations(), point)
        })
        .await
        .map_err(|e| ForecastError::render(format!("render task failed: {e}")))??
    };
    let render = start.elapsed();

    let response = CalculateResponse {
        result_text: forecast.result_text(),
        plot_url: encode_base64(&png),
    };
    Ok((response, prediction, render))
}

#[cfg(test)]
pub(crate) mod test_helpers;

#[cfg(test)]
mod tests;
