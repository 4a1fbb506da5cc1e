//! Daily OHLCV price series and the date range they are fetched for

use crate::error::{ChartMindError, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One daily OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Bars ordered by strictly increasing timestamp
///
/// The series is immutable once built; a new fetch produces a new series.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series, rejecting unordered or duplicate timestamps
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        if let Some(pair) = bars.windows(2).find(|w| w[0].timestamp >= w[1].timestamp) {
            return Err(ChartMindError::InvalidSeries(format!(
                "timestamp {} is not after {}",
                pair[1].timestamp.to_rfc3339(),
                pair[0].timestamp.to_rfc3339()
            )));
        }
        Ok(Self { bars })
    }

    /// Build a series from provider output that may be unsorted or repeat a day
    ///
    /// Bars are sorted by timestamp; for repeated timestamps the last bar
    /// received wins.
    pub fn from_unordered(mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self { bars: deduped }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Closing prices in series order
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Volumes in series order
    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }
}

/// Calendar range of a fetch: start inclusive, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Days covered by [`DateRange::default_until`]
    pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start >= end {
            return Err(ChartMindError::InvalidDateRange(format!(
                "start {start} must be before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The year of history ending at `today`
    pub fn default_until(today: NaiveDate) -> Self {
        Self {
            start: today - Duration::days(Self::DEFAULT_LOOKBACK_DAYS),
            end: today,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Midnight UTC of the start date
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// Midnight UTC of the (exclusive) end date
    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Bar, PriceSeries};
    use chrono::{Duration, TimeZone, Utc};

    /// Daily series with the given closes; open/high/low hug the close
    pub fn series_from_closes(closes: &[f64], volume: u64) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 100,
        }
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let result = PriceSeries::new(vec![bar(1, 10.0), bar(1, 11.0)]);
        assert!(matches!(result, Err(ChartMindError::InvalidSeries(_))));

        let result = PriceSeries::new(vec![bar(2, 10.0), bar(1, 11.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_unordered_sorts_and_keeps_last() {
        let series = PriceSeries::from_unordered(vec![bar(3, 30.0), bar(1, 10.0), bar(3, 31.0)]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![10.0, 31.0]);
    }

    #[test]
    fn test_date_range_validation() {
        let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        assert!(DateRange::new(d(1, 1), d(6, 1)).is_ok());
        assert!(matches!(
            DateRange::new(d(6, 1), d(6, 1)),
            Err(ChartMindError::InvalidDateRange(_))
        ));
    }

    #[test]
    fn test_default_range_is_one_year() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let range = DateRange::default_until(today);
        assert_eq!(range.start(), NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        assert_eq!(range.end(), today);
        assert_eq!(range.to_string(), "2024-06-30 to 2025-06-30");
        assert_eq!(range.end_utc().timestamp(), 1_751_241_600);
    }
}
