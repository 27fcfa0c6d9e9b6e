//! Forecast chart rendering
//!
//! Draws every historical (spend, purchases) observation as a scatter plot and
//! overlays the forecast point in a distinct color, then encodes the result as
//! PNG for transport as base64.
//!
//! Rendering is exposed through the [`ChartRenderer`] capability so handlers
//! can be tested with a stub. The default [`ScatterRenderer`] lays the chart
//! out with `plotters` into a per-call RGB buffer, so it holds no shared
//! mutable state.

pub mod terminal;

use std::{fmt::Display, io::Cursor, ops::Range};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;

use crate::{
    dataset::Observation,
    error::{ForecastError, Result},
    forecast::format_thousands,
};

/// Smallest image the chart layout fits in
pub const MIN_WIDTH: u32 = 200;
/// Smallest image height the chart layout fits in
pub const MIN_HEIGHT: u32 = 150;

/// The single highlighted point drawn over the historical data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    /// Requested spend
    pub spend: f64,
    /// Predicted purchases for that spend
    pub purchases: f64,
}

/// Capability to turn observations plus a forecast point into PNG bytes
pub trait ChartRenderer: Send + Sync {
    /// Render a chart and return the encoded PNG
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::RenderError`] if drawing or encoding fails.
    fn render(&self, observations: &[Observation], point: ForecastPoint) -> Result<Vec<u8>>;
}

/// Base64 (standard alphabet, padded) encoding of image bytes
#[must_use]
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Encode an RGB image as PNG
///
/// # Errors
///
/// Returns [`ForecastError::RenderError`] if the encoder fails.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ForecastError::render(format!("PNG encoding failed: {e}")))?;
    Ok(out.into_inner())
}

/// Visual parameters of the scatter chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Chart title
    pub title: String,
    /// X axis label
    pub x_label: String,
    /// Y axis label
    pub y_label: String,
    /// Legend entry for historical points
    pub data_label: String,
    /// Historical point color
    pub data_color: RGBColor,
    /// Forecast point color
    pub forecast_color: RGBColor,
    /// Historical marker radius in pixels
    pub data_radius: u32,
    /// Forecast marker radius in pixels
    pub forecast_radius: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 600,
            height: 380,
            title: "Spend vs Purchases with Prediction".to_string(),
            x_label: "Spend ($)".to_string(),
            y_label: "Purchases".to_string(),
            data_label: "Actual Data".to_string(),
            data_color: RGBColor(31, 119, 180),
            forecast_color: RGBColor(214, 39, 40),
            data_radius: 4,
            forecast_radius: 7,
        }
    }
}

/// Default renderer backed by the `plotters` bitmap backend
#[derive(Debug, Clone, Default)]
pub struct ScatterRenderer {
    style: ChartStyle,
}

impl ScatterRenderer {
    /// Renderer with the default 600x380 layout
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer with a custom style
    #[must_use]
    pub fn with_style(style: ChartStyle) -> Self {
        Self { style }
    }

    /// Current style
    #[must_use]
    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    /// Draw the chart into an RGB image without encoding it
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::RenderError`] for non-finite coordinates, an
    /// axis range that overflows, an image smaller than [`MIN_WIDTH`] x
    /// [`MIN_HEIGHT`], or a backend failure (for example no usable font).
    pub fn draw(&self, observations: &[Observation], point: ForecastPoint) -> Result<RgbImage> {
        let style = &self.style;
        if style.width < MIN_WIDTH || style.height < MIN_HEIGHT {
            return Err(ForecastError::render(format!(
                "image {}x{} is smaller than the {MIN_WIDTH}x{MIN_HEIGHT} chart layout",
                style.width, style.height
            )));
        }
        if !point.spend.is_finite() || !point.purchases.is_finite() {
            return Err(ForecastError::render("forecast point is not finite"));
        }

        let x_range = padded_range(observations.iter().map(|o| o.spend).chain([point.spend]))?;
        let y_range =
            padded_range(observations.iter().map(|o| o.purchases).chain([point.purchases]))?;

        let mut buffer = vec![255u8; style.width as usize * style.height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
                .into_drawing_area();
            root.fill(&WHITE).map_err(backend_error)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(&style.title, ("sans-serif", 18))
                .margin(12)
                .x_label_area_size(40)
                .y_label_area_size(56)
                .build_cartesian_2d(x_range, y_range)
                .map_err(backend_error)?;

            chart
                .configure_mesh()
                .x_desc(style.x_label.as_str())
                .y_desc(style.y_label.as_str())
                .x_label_formatter(&|v: &f64| format_thousands(*v))
                .light_line_style(RGBColor(240, 240, 240))
                .draw()
                .map_err(backend_error)?;

            let data_style = style.data_color.filled();
            let data_radius = style.data_radius;
            chart
                .draw_series(
                    observations
                        .iter()
                        .map(|o| Circle::new((o.spend, o.purchases), data_radius, data_style)),
                )
                .map_err(backend_error)?
                .label(style.data_label.as_str())
                .legend(move |(x, y)| Circle::new((x, y), data_radius, data_style));

            let forecast_style = style.forecast_color.filled();
            let forecast_radius = style.forecast_radius;
            chart
                .draw_series(std::iter::once(Circle::new(
                    (point.spend, point.purchases),
                    forecast_radius,
                    forecast_style,
                )))
                .map_err(backend_error)?
                .label(format!("Predicted for Spend=${}", format_thousands(point.spend)))
                .legend(move |(x, y)| {
                    Circle::new((x, y), forecast_radius.saturating_sub(2), forecast_style)
                });

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.9))
                .border_style(RGBColor(204, 204, 204))
                .draw()
                .map_err(backend_error)?;

            root.present().map_err(backend_error)?;
        }

        RgbImage::from_raw(style.width, style.height, buffer)
            .ok_or_else(|| ForecastError::render("chart buffer does not match image size"))
    }
}

impl ChartRenderer for ScatterRenderer {
    fn render(&self, observations: &[Observation], point: ForecastPoint) -> Result<Vec<u8>> {
        encode_png(&self.draw(observations, point)?)
    }
}

fn backend_error(err: impl Display) -> ForecastError {
    ForecastError::render(err.to_string())
}

/// Value range with 5% padding on both sides
fn padded_range(values: impl Iterator<Item = f64>) -> Result<Range<f64>> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        if !v.is_finite() {
            return Err(ForecastError::render(format!("cannot plot non-finite value {v}")));
        }
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo > hi {
        return Ok(0.0..1.0);
    }

    let span = hi - lo;
    let pad = if span > 0.0 {
        span * 0.05
    } else {
        (lo.abs() * 0.05).max(1.0)
    };
    let (min, max) = (lo - pad, hi + pad);
    if !min.is_finite() || !max.is_finite() {
        return Err(ForecastError::render(format!(
            "axis range {lo}..{hi} is too wide to plot"
        )));
    }
    Ok(min..max)
}
