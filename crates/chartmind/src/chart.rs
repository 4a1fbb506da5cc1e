//! Candlestick chart figure and PNG rendering
//!
//! [`ChartFigure`] is a plain description of what gets drawn: one candle per
//! bar plus one dashed overlay per indicator trace. [`ChartRenderer`] lays
//! figures out at a fixed size and [`PngRasterizer`] turns them into PNG bytes
//! with `plotters`, going through a scratch file that does not outlive the call.

use crate::error::{ChartMindError, Result};
use crate::indicators::IndicatorTrace;
use crate::series::PriceSeries;
use chrono::{DateTime, Utc};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, instrument};

/// Mime type of every rendered chart
pub const PNG_MIME_TYPE: &str = "image/png";

pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 700;

const DASH_SIZE: u32 = 6;
const DASH_SPACING: u32 = 4;
const LINE_WIDTH: u32 = 2;

/// Overlay colours, assigned in overlay order
const PALETTE: [(u8, u8, u8); 6] = [
    (31, 119, 180),
    (255, 127, 14),
    (148, 103, 189),
    (23, 190, 207),
    (140, 86, 75),
    (227, 119, 194),
];

/// One candlestick glyph
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// A dashed line drawn over the candles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub label: String,
    pub color: (u8, u8, u8),
    /// One value per candle; `None` leaves a gap
    pub values: Vec<Option<f64>>,
}

impl Overlay {
    /// Runs of consecutive defined points as `(candle index, value)`
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (i, value) in self.values.iter().enumerate() {
            match value {
                Some(v) => current.push((i as f64, *v)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

/// Everything needed to draw one ticker's chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFigure {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub candles: Vec<Candle>,
    pub overlays: Vec<Overlay>,
}

impl ChartFigure {
    /// Price axis bounds covering candles and overlays, padded by 5%
    pub fn y_range(&self) -> Option<(f64, f64)> {
        let candle_bounds = self.candles.iter().map(|c| (c.low, c.high));
        let overlay_bounds = self
            .overlays
            .iter()
            .flat_map(|o| o.values.iter().flatten().map(|&v| (v, v)));

        let (lo, hi) = candle_bounds
            .chain(overlay_bounds)
            .filter(|(lo, hi)| lo.is_finite() && hi.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, (lo, hi)| match acc {
                None => Some((lo, hi)),
                Some((a, b)) => Some((a.min(lo), b.max(hi))),
            })?;

        let pad = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1.0) * 0.05 };
        Some((lo - pad, hi + pad))
    }

    fn date_label(&self, x: f64) -> String {
        let index = x.round();
        if index < 0.0 {
            return String::new();
        }
        self.candles
            .get(index as usize)
            .map(|c| c.timestamp.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

/// PNG bytes of a rendered chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl RenderedChart {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: PNG_MIME_TYPE,
        }
    }
}

/// Lays out candlestick charts at a fixed pixel size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartRenderer {
    width: u32,
    height: u32,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl ChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Describe the chart for a ticker; the same inputs give the same figure
    pub fn figure(&self, ticker: &str, series: &PriceSeries, traces: &[IndicatorTrace]) -> ChartFigure {
        let candles = series
            .bars()
            .iter()
            .map(|b| Candle {
                timestamp: b.timestamp,
                open: b.open,
                high: b.high,
                low: b.low,
                close: b.close,
            })
            .collect();

        let overlays = traces
            .iter()
            .enumerate()
            .map(|(i, trace)| Overlay {
                label: trace.label.clone(),
                color: PALETTE[i % PALETTE.len()],
                values: trace.values(),
            })
            .collect();

        ChartFigure {
            title: format!("{ticker} Daily Candlestick"),
            width: self.width,
            height: self.height,
            candles,
            overlays,
        }
    }
}

/// Turns a figure into image bytes
#[cfg_attr(test, mockall::automock)]
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, figure: &ChartFigure) -> Result<RenderedChart>;
}

/// `plotters` bitmap rasterizer
///
/// The image goes through a temporary file that is removed before
/// [`Rasterizer::rasterize`] returns, whether or not drawing succeeded.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngRasterizer;

impl PngRasterizer {
    fn render_in(figure: &ChartFigure, dir: &Path) -> Result<RenderedChart> {
        if figure.candles.is_empty() {
            return Err(ChartMindError::Chart(format!(
                "{}: no bars to draw",
                figure.title
            )));
        }

        let scratch = tempfile::Builder::new()
            .prefix("chartmind-")
            .suffix(".png")
            .tempfile_in(dir)?;

        draw(figure, scratch.path())?;
        let bytes = std::fs::read(scratch.path())?;

        debug!(bytes = bytes.len(), "Rendered chart");
        Ok(RenderedChart::png(bytes))
    }
}

impl Rasterizer for PngRasterizer {
    #[instrument(skip(self, figure), fields(title = %figure.title))]
    fn rasterize(&self, figure: &ChartFigure) -> Result<RenderedChart> {
        Self::render_in(figure, &std::env::temp_dir())
    }
}

fn chart_error(e: impl std::fmt::Display) -> ChartMindError {
    ChartMindError::Chart(e.to_string())
}

fn draw(figure: &ChartFigure, path: &Path) -> Result<()> {
    let (y_min, y_max) = figure
        .y_range()
        .ok_or_else(|| ChartMindError::Chart("no finite prices to draw".to_string()))?;
    let n = figure.candles.len() as f64;

    let root = BitMapBackend::new(path, (figure.width, figure.height)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&figure.title, ("sans-serif", 24).into_font())
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(64)
        .build_cartesian_2d(-1f64..n, y_min..y_max)
        .map_err(chart_error)?;

    let date_label = |x: &f64| figure.date_label(*x);
    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&date_label)
        .y_desc("Price")
        .draw()
        .map_err(chart_error)?;

    let candle_width = (f64::from(figure.width) * 0.7 / n).clamp(1.0, 12.0) as u32;
    chart
        .draw_series(figure.candles.iter().enumerate().map(|(i, c)| {
            CandleStick::new(
                i as f64,
                c.open,
                c.high,
                c.low,
                c.close,
                GREEN.filled(),
                RED.filled(),
                candle_width,
            )
        }))
        .map_err(chart_error)?;

    for overlay in &figure.overlays {
        let color = RGBColor(overlay.color.0, overlay.color.1, overlay.color.2);
        let style = color.stroke_width(LINE_WIDTH);
        let mut segments = overlay.segments().into_iter();

        // the first (possibly empty) segment carries the legend entry
        chart
            .draw_series(DashedLineSeries::new(
                segments.next().unwrap_or_default(),
                DASH_SIZE,
                DASH_SPACING,
                style,
            ))
            .map_err(chart_error)?
            .label(overlay.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(LINE_WIDTH)));

        for segment in segments {
            chart
                .draw_series(DashedLineSeries::new(segment, DASH_SIZE, DASH_SPACING, style))
                .map_err(chart_error)?;
        }
    }

    if !figure.overlays.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(chart_error)?;
    }

    root.present().map_err(chart_error)?;
    Ok(())
}
