//! Shared fixtures for api tests

use super::*;
use crate::{
    dataset::{Dataset, Observation},
    model::Regressor,
    viz::encode_png,
};
use axum::Router;
use image::{Rgb, RgbImage};

/// Predicts `spend / 25`
pub struct LinearStub;

impl Regressor for LinearStub {
    fn predict_batch(&self, spends: &[f64]) -> Result<Vec<f64>> {
        Ok(spends.iter().map(|s| s / 25.0).collect())
    }

    fn name(&self) -> &'static str {
        "LinearStub"
    }
}

/// Always fails to predict
pub struct BrokenModel;

impl Regressor for BrokenModel {
    fn predict_batch(&self, _spends: &[f64]) -> Result<Vec<f64>> {
        Err(ForecastError::ModelError {
            operation: "predict".to_string(),
            reason: "model unavailable".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "BrokenModel"
    }
}

/// Returns a 2x2 white PNG
pub struct TinyRenderer;

impl ChartRenderer for TinyRenderer {
    fn render(&self, _observations: &[Observation], _point: ForecastPoint) -> Result<Vec<u8>> {
        encode_png(&RgbImage::from_pixel(2, 2, Rgb([255, 255, 255])))
    }
}

/// Always fails to render
pub struct FailingRenderer;

impl ChartRenderer for FailingRenderer {
    fn render(&self, _observations: &[Observation], _point: ForecastPoint) -> Result<Vec<u8>> {
        Err(ForecastError::render("no canvas"))
    }
}

/// Twelve months on the `spend / 25` line
pub fn sample_dataset() -> Dataset {
    Dataset::from_observations(
        (1..=12)
            .map(|m| {
                let spend = 500.0 * f64::from(m);
                Observation::new(format!("2023-{m:02}-01"), spend, spend / 25.0)
            })
            .collect(),
    )
}

/// State over [`LinearStub`] with MAE 2 and the given renderer
pub fn stub_state(renderer: Arc<dyn ChartRenderer>) -> AppState {
    let context = ForecastContext::from_parts(sample_dataset(), Arc::new(LinearStub), 2);
    AppState::new(context)
        .with_renderer(renderer)
        .with_render_concurrency(2)
}

/// Router over [`stub_state`] with [`TinyRenderer`]
pub fn create_test_app() -> Router {
    create_router(stub_state(Arc::new(TinyRenderer)))
}
