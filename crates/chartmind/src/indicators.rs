//! Technical indicators overlaid on the candlestick chart
//!
//! Every indicator is a pure function of the closing prices (and, for VWAP,
//! the volumes) of a [`PriceSeries`]. Outputs are aligned index-for-index
//! with the input; `None` marks points where the indicator is undefined,
//! e.g. before a rolling window is full.
//!
//! All four indicators use the same window of [`DEFAULT_WINDOW`] bars:
//!
//! - SMA: mean of the trailing window
//! - EMA: exponentially weighted mean with span = window, α = 2/(span+1).
//!   Weights are normalised over the available history, so the first point
//!   equals the first close and every point is defined.
//! - Bollinger Bands: SMA ± 2 population standard deviations
//! - VWAP: cumulative Σ(close·volume) / Σvolume from the first bar

use crate::series::PriceSeries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ta::Next;
use ta::indicators::{BollingerBands, SimpleMovingAverage};
use thiserror::Error;

/// Window length shared by all indicators
pub const DEFAULT_WINDOW: usize = 20;

/// Band width of the Bollinger Bands, in standard deviations
pub const BOLLINGER_STD_DEVS: f64 = 2.0;

/// Indicator computation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    /// No bar carried any volume, so VWAP divides by zero everywhere
    #[error("VWAP is undefined: total traded volume is zero")]
    ZeroVolume,

    /// Rolling windows need at least one bar
    #[error("Invalid window length: {0}")]
    InvalidWindow(usize),

    /// Identifier does not name a supported indicator
    #[error("Unknown indicator: {0}. Supported: SMA20, EMA20, BB20, VWAP")]
    Unknown(String),
}

/// The fixed set of chart indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Sma20,
    Ema20,
    BollingerBands20,
    Vwap,
}

impl Indicator {
    pub const ALL: [Indicator; 4] = [
        Indicator::Sma20,
        Indicator::Ema20,
        Indicator::BollingerBands20,
        Indicator::Vwap,
    ];

    /// Name shown in selection lists
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Sma20 => "20-Day SMA",
            Self::Ema20 => "20-Day EMA",
            Self::BollingerBands20 => "20-Day Bollinger Bands",
            Self::Vwap => "VWAP",
        }
    }

    /// Short identifier accepted on the command line
    pub fn id(&self) -> &'static str {
        match self {
            Self::Sma20 => "sma20",
            Self::Ema20 => "ema20",
            Self::BollingerBands20 => "bb20",
            Self::Vwap => "vwap",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Indicator {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "sma" | "sma20" | "20daysma" => Ok(Self::Sma20),
            "ema" | "ema20" | "20dayema" => Ok(Self::Ema20),
            "bb" | "bb20" | "bollinger" | "bollingerbands" | "bollinger20"
            | "20daybollingerbands" => Ok(Self::BollingerBands20),
            "vwap" => Ok(Self::Vwap),
            _ => Err(IndicatorError::Unknown(s.trim().to_string())),
        }
    }
}

/// Ordered, duplicate-free selection of indicators
///
/// The order is the order the user picked them in; overlays are drawn and
/// labelled in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSelection(Vec<Indicator>);

impl IndicatorSelection {
    pub fn new(indicators: impl IntoIterator<Item = Indicator>) -> Self {
        let mut selected = Vec::new();
        for indicator in indicators {
            if !selected.contains(&indicator) {
                selected.push(indicator);
            }
        }
        Self(selected)
    }

    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Parse a comma-separated list such as `sma20,vwap`
    pub fn parse_list(input: &str) -> Result<Self, IndicatorError> {
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = Indicator> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, indicator: Indicator) -> bool {
        self.0.contains(&indicator)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for IndicatorSelection {
    fn default() -> Self {
        Self(vec![Indicator::Sma20])
    }
}

impl fmt::Display for IndicatorSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.0.iter().map(Indicator::display_name).collect();
        f.write_str(&names.join(", "))
    }
}

/// One point of a trace, aligned with a bar of the series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TracePoint {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

/// A line overlay derived from a price series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorTrace {
    pub indicator: Indicator,
    /// Legend label, e.g. `SMA (20)` or `BB Upper (20)`
    pub label: String,
    pub points: Vec<TracePoint>,
}

impl IndicatorTrace {
    fn new(
        indicator: Indicator,
        label: impl Into<String>,
        series: &PriceSeries,
        values: Vec<Option<f64>>,
    ) -> Self {
        let points = series
            .bars()
            .iter()
            .zip(values)
            .map(|(bar, value)| TracePoint {
                timestamp: bar.timestamp,
                value,
            })
            .collect();
        Self {
            indicator,
            label: label.into(),
            points,
        }
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Number of points with a defined value
    pub fn defined_count(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_some()).count()
    }
}

/// Traces computed for a selection, plus the indicators that could not be
/// computed for this series
#[derive(Debug, Clone, Default)]
pub struct IndicatorSet {
    pub traces: Vec<IndicatorTrace>,
    pub failures: Vec<(Indicator, IndicatorError)>,
}

/// Compute the traces of a single indicator
///
/// Bollinger Bands yield two traces (upper, lower); the others yield one.
pub fn compute(series: &PriceSeries, indicator: Indicator) -> Result<Vec<IndicatorTrace>, IndicatorError> {
    let closes = series.closes();
    let window = DEFAULT_WINDOW;

    let traces = match indicator {
        Indicator::Sma20 => vec![IndicatorTrace::new(
            indicator,
            format!("SMA ({window})"),
            series,
            sma(&closes, window)?,
        )],
        Indicator::Ema20 => vec![IndicatorTrace::new(
            indicator,
            format!("EMA ({window})"),
            series,
            ema(&closes, window)?,
        )],
        Indicator::BollingerBands20 => {
            let bands = bollinger_bands(&closes, window, BOLLINGER_STD_DEVS)?;
            vec![
                IndicatorTrace::new(indicator, format!("BB Upper ({window})"), series, bands.upper),
                IndicatorTrace::new(indicator, format!("BB Lower ({window})"), series, bands.lower),
            ]
        }
        Indicator::Vwap => vec![IndicatorTrace::new(
            indicator,
            "VWAP",
            series,
            vwap(&closes, &series.volumes())?,
        )],
    };

    Ok(traces)
}

/// Compute every selected indicator, in selection order
pub fn compute_all(series: &PriceSeries, selection: &IndicatorSelection) -> IndicatorSet {
    let mut set = IndicatorSet::default();
    for indicator in selection.iter() {
        match compute(series, indicator) {
            Ok(traces) => set.traces.extend(traces),
            Err(e) => set.failures.push((indicator, e)),
        }
    }
    set
}

/// Feed closes through a streaming `ta` indicator, masking the points before
/// its window is full
fn windowed<I, O>(closes: &[f64], window: usize, mut indicator: I) -> Vec<Option<O>>
where
    I: Next<f64, Output = O>,
{
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let value = indicator.next(close);
            (i + 1 >= window).then_some(value)
        })
        .collect()
}

/// Simple moving average; undefined for the first `window - 1` points
pub fn sma(closes: &[f64], window: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    let indicator =
        SimpleMovingAverage::new(window).map_err(|_| IndicatorError::InvalidWindow(window))?;
    Ok(windowed(closes, window, indicator))
}

/// Exponential moving average with the given span
///
/// Weights (1-α)^k are normalised over the history seen so far rather than
/// seeded with a separate starting value, so every point is defined.
pub fn ema(closes: &[f64], span: usize) -> Result<Vec<Option<f64>>, IndicatorError> {
    if span == 0 {
        return Err(IndicatorError::InvalidWindow(span));
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    Ok(closes
        .iter()
        .map(|&close| {
            weighted_sum = close + decay * weighted_sum;
            weight_total = 1.0 + decay * weight_total;
            Some(weighted_sum / weight_total)
        })
        .collect())
}

/// Upper, middle and lower Bollinger band
#[derive(Debug, Clone, PartialEq)]
pub struct Bands {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Bollinger Bands with population standard deviation
pub fn bollinger_bands(closes: &[f64], window: usize, std_devs: f64) -> Result<Bands, IndicatorError> {
    let indicator = BollingerBands::new(window, std_devs)
        .map_err(|_| IndicatorError::InvalidWindow(window))?;

    let mut bands = Bands {
        upper: Vec::with_capacity(closes.len()),
        middle: Vec::with_capacity(closes.len()),
        lower: Vec::with_capacity(closes.len()),
    };
    for output in windowed(closes, window, indicator) {
        bands.upper.push(output.as_ref().map(|o| o.upper));
        bands.middle.push(output.as_ref().map(|o| o.average));
        bands.lower.push(output.map(|o| o.lower));
    }

    Ok(bands)
}

/// Running volume-weighted average price from the first bar
///
/// Points before the first traded volume are undefined. A series without any
/// volume is an error rather than a line of zeros.
pub fn vwap(closes: &[f64], volumes: &[f64]) -> Result<Vec<Option<f64>>, IndicatorError> {
    if !volumes.iter().any(|&v| v > 0.0) {
        return Err(IndicatorError::ZeroVolume);
    }

    let mut cum_pv = 0.0;
    let mut cum_volume = 0.0;
    let mut low = f64::INFINITY;
    let mut high = f64::NEG_INFINITY;

    Ok(closes
        .iter()
        .zip(volumes)
        .map(|(&close, &volume)| {
            cum_pv += close * volume;
            cum_volume += volume;
            low = low.min(close);
            high = high.max(close);

            // rounding can push the ratio one ulp outside the closes it averages
            (cum_volume > 0.0).then(|| (cum_pv / cum_volume).clamp(low, high))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::test_support::series_from_closes;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn test_parse_indicator() {
        assert_eq!("sma20".parse::<Indicator>().unwrap(), Indicator::Sma20);
        assert_eq!("20-Day EMA".parse::<Indicator>().unwrap(), Indicator::Ema20);
        assert_eq!(
            "20-Day Bollinger Bands".parse::<Indicator>().unwrap(),
            Indicator::BollingerBands20
        );
        assert_eq!("BB".parse::<Indicator>().unwrap(), Indicator::BollingerBands20);
        assert_eq!("VWAP".parse::<Indicator>().unwrap(), Indicator::Vwap);
        assert!(matches!(
            "rsi".parse::<Indicator>(),
            Err(IndicatorError::Unknown(s)) if s == "rsi"
        ));
    }

    #[test]
    fn test_selection_keeps_order_and_drops_duplicates() {
        let selection = IndicatorSelection::parse_list("vwap, sma20,,VWAP,bb20").unwrap();
        let picked: Vec<_> = selection.iter().collect();
        assert_eq!(
            picked,
            vec![Indicator::Vwap, Indicator::Sma20, Indicator::BollingerBands20]
        );
        assert_eq!(selection.to_string(), "VWAP, 20-Day SMA, 20-Day Bollinger Bands");
        assert_eq!(IndicatorSelection::default().iter().collect::<Vec<_>>(), vec![Indicator::Sma20]);
    }

    #[test]
    fn test_sma_undefined_until_window_full() {
        let values = sma(&ramp(25), 20).unwrap();
        assert!(values[..19].iter().all(Option::is_none));
        // mean of 100..=119
        assert_eq!(values[19], Some(109.5));
        assert_eq!(values[24], Some(114.5));
    }

    #[test]
    fn test_short_series_sma_and_bands_fully_undefined() {
        for len in [0, 1, 5, 19] {
            let series = series_from_closes(&ramp(len), 1_000);
            for indicator in [Indicator::Sma20, Indicator::BollingerBands20] {
                for trace in compute(&series, indicator).unwrap() {
                    assert_eq!(trace.points.len(), len);
                    assert_eq!(trace.defined_count(), 0, "{} at len {len}", trace.label);
                }
            }

            let ema_trace = &compute(&series, Indicator::Ema20).unwrap()[0];
            assert_eq!(ema_trace.defined_count(), len);
        }
    }

    #[test]
    fn test_ema_matches_normalised_weights() {
        let values = ema(&[10.0, 20.0, 30.0], 3).unwrap();
        // alpha = 0.5: (20 + 0.5*10) / 1.5 and (30 + 0.5*20 + 0.25*10) / 1.75
        assert_eq!(values[0], Some(10.0));
        assert!((values[1].unwrap() - 25.0 / 1.5).abs() < 1e-12);
        assert!((values[2].unwrap() - 42.5 / 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_constant_series_collapses_bands() {
        let closes = vec![42.37; 30];
        let bands = bollinger_bands(&closes, DEFAULT_WINDOW, BOLLINGER_STD_DEVS).unwrap();
        let middle = sma(&closes, DEFAULT_WINDOW).unwrap();

        for i in DEFAULT_WINDOW - 1..closes.len() {
            assert_eq!(bands.upper[i], Some(42.37));
            assert_eq!(bands.lower[i], Some(42.37));
            assert_eq!(middle[i], Some(42.37));
            assert_eq!(bands.middle[i], middle[i]);
        }
    }

    #[test]
    fn test_sma_and_middle_band_match_trailing_mean() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + (i as f64 * 0.37).sin() * 8.0).collect();
        let averages = sma(&closes, DEFAULT_WINDOW).unwrap();
        let bands = bollinger_bands(&closes, DEFAULT_WINDOW, BOLLINGER_STD_DEVS).unwrap();

        for i in DEFAULT_WINDOW - 1..closes.len() {
            let slice = &closes[i + 1 - DEFAULT_WINDOW..=i];
            let mean = slice.iter().sum::<f64>() / DEFAULT_WINDOW as f64;
            let std = (slice.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / DEFAULT_WINDOW as f64).sqrt();

            assert!((averages[i].unwrap() - mean).abs() < 1e-9);
            assert!((bands.middle[i].unwrap() - mean).abs() < 1e-9);
            assert!((bands.upper[i].unwrap() - (mean + 2.0 * std)).abs() < 1e-9);
            assert!((bands.lower[i].unwrap() - (mean - 2.0 * std)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bands_use_population_std() {
        // window [1, 3]: mean 2, population std 1
        let bands = bollinger_bands(&[1.0, 3.0], 2, 2.0).unwrap();
        assert_eq!(bands.upper[1], Some(4.0));
        assert_eq!(bands.lower[1], Some(0.0));
        assert_eq!(bands.upper[0], None);
    }

    #[test]
    fn test_vwap_is_cumulative() {
        let values = vwap(&[10.0, 20.0, 40.0], &[100.0, 300.0, 0.0]).unwrap();
        assert_eq!(values[0], Some(10.0));
        assert_eq!(values[1], Some(17.5));
        assert_eq!(values[2], Some(17.5));
    }

    #[test]
    fn test_vwap_leading_zero_volume_is_undefined() {
        let values = vwap(&[10.0, 20.0], &[0.0, 50.0]).unwrap();
        assert_eq!(values, vec![None, Some(20.0)]);
    }

    #[test]
    fn test_vwap_all_zero_volume_is_error() {
        assert_eq!(vwap(&[10.0, 11.0], &[0.0, 0.0]), Err(IndicatorError::ZeroVolume));

        let series = series_from_closes(&ramp(30), 0);
        let set = compute_all(&series, &IndicatorSelection::new([Indicator::Vwap, Indicator::Sma20]));
        assert_eq!(set.traces.len(), 1);
        assert_eq!(set.traces[0].label, "SMA (20)");
        assert_eq!(set.failures, vec![(Indicator::Vwap, IndicatorError::ZeroVolume)]);
    }

    #[test]
    fn test_vwap_bounded_by_closes() {
        let closes: Vec<f64> = (0..200)
            .map(|i| 50.0 + ((i * 37) % 23) as f64 * 0.73 + (i as f64 * 0.01).sin())
            .collect();
        let volumes: Vec<f64> = (0..200).map(|i| ((i * 7919) % 1000) as f64 + 1.0).collect();
        let min = closes.iter().copied().fold(f64::INFINITY, f64::min);
        let max = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        for value in vwap(&closes, &volumes).unwrap() {
            let v = value.unwrap();
            assert!(v >= min && v <= max, "{v} outside [{min}, {max}]");
        }
    }

    #[test]
    fn test_compute_all_is_deterministic() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.7).cos() * 5.0).collect();
        let series = series_from_closes(&closes, 12_345);
        let selection = IndicatorSelection::new(Indicator::ALL);

        let first = compute_all(&series, &selection);
        let second = compute_all(&series, &selection);

        assert_eq!(first.traces.len(), 5);
        assert_eq!(first.traces, second.traces);
        let labels: Vec<_> = first.traces.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["SMA (20)", "EMA (20)", "BB Upper (20)", "BB Lower (20)", "VWAP"]
        );
        assert_eq!(first.traces[0].points[5].timestamp, series.bars()[5].timestamp);
    }

    #[test]
    fn test_zero_window_rejected() {
        assert_eq!(sma(&[1.0], 0), Err(IndicatorError::InvalidWindow(0)));
        assert_eq!(ema(&[1.0], 0), Err(IndicatorError::InvalidWindow(0)));
        assert!(bollinger_bands(&[1.0], 0, 2.0).is_err());
    }
}
