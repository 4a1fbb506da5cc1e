//! Yahoo Finance API client

use super::MarketDataSource;
use crate::error::{ChartMindError, Result};
use crate::series::{Bar, DateRange, PriceSeries};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use time::OffsetDateTime;
use tracing::{debug, instrument, warn};
use yahoo_finance_api as yahoo;

/// Yahoo Finance daily history client
#[derive(Debug, Clone, Default)]
pub struct YahooFinanceClient {}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Self {
        Self {}
    }

    fn to_offset(symbol: &str, at: DateTime<Utc>) -> Result<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(at.timestamp()).map_err(|e| {
            ChartMindError::MarketData {
                symbol: symbol.to_string(),
                reason: format!("Invalid timestamp {at}: {e}"),
            }
        })
    }
}

/// Whether Yahoo answered without data rather than failing to answer
///
/// Unknown or delisted symbols come back as an API error body; an empty
/// window comes back without quotes. Transport, auth and rate-limit failures
/// are real errors.
fn is_no_data(error: &yahoo::YahooError) -> bool {
    matches!(
        error,
        yahoo::YahooError::ApiError(_)
            | yahoo::YahooError::NoResult
            | yahoo::YahooError::NoQuotes
            | yahoo::YahooError::DataInconsistency
    )
}

#[async_trait]
impl MarketDataSource for YahooFinanceClient {
    #[instrument(skip(self, range), fields(range = %range))]
    async fn fetch_history(&self, ticker: &str, range: &DateRange) -> Result<PriceSeries> {
        let market_error = |e: yahoo::YahooError| ChartMindError::MarketData {
            symbol: ticker.to_string(),
            reason: e.to_string(),
        };

        let provider = yahoo::YahooConnector::new().map_err(market_error)?;

        let start = Self::to_offset(ticker, range.start_utc())?;
        let end = Self::to_offset(ticker, range.end_utc())?;

        let quotes = match provider
            .get_quote_history(ticker, start, end)
            .await
            .and_then(|response| response.quotes())
        {
            Ok(quotes) => quotes,
            Err(e) if is_no_data(&e) => {
                warn!(ticker, error = %e, "No quotes in Yahoo response");
                return Ok(PriceSeries::default());
            }
            Err(e) => return Err(market_error(e)),
        };

        let end_utc = range.end_utc();
        let bars: Vec<Bar> = quotes
            .iter()
            .filter_map(|q| {
                let timestamp = DateTime::from_timestamp(q.timestamp as i64, 0)?;
                (timestamp < end_utc).then_some(Bar {
                    timestamp,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .collect();

        debug!(ticker, bars = bars.len(), "Fetched daily history");
        Ok(PriceSeries::from_unordered(bars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_offset_conversion() {
        let at = range((2024, 1, 1), (2024, 2, 1)).start_utc();
        let odt = YahooFinanceClient::to_offset("AAPL", at).unwrap();
        assert_eq!(odt.unix_timestamp(), 1_704_067_200);
    }

    #[test]
    fn test_no_data_errors_are_not_failures() {
        let not_found = yahoo::YahooError::ApiError(
            serde_json::from_str(r#"{"code":"Not Found","description":"No data found, symbol may be delisted"}"#)
                .unwrap(),
        );
        assert!(is_no_data(&not_found));
        assert!(is_no_data(&yahoo::YahooError::NoResult));
        assert!(is_no_data(&yahoo::YahooError::NoQuotes));
        assert!(is_no_data(&yahoo::YahooError::DataInconsistency));

        assert!(!is_no_data(&yahoo::YahooError::FetchFailed("503".to_string())));
        assert!(!is_no_data(&yahoo::YahooError::TooManyRequests("chart".to_string())));
        assert!(!is_no_data(&yahoo::YahooError::Unauthorized));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_history() {
        let client = YahooFinanceClient::new();
        let series = client
            .fetch_history("AAPL", &range((2024, 1, 1), (2024, 3, 1)))
            .await
            .unwrap();

        assert!(series.len() > 30);
        assert!(series.bars().iter().all(|b| b.close > 0.0));
        assert!(series.bars().last().unwrap().timestamp < range((2024, 1, 1), (2024, 3, 1)).end_utc());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_unknown_symbol_is_empty() {
        let client = YahooFinanceClient::new();
        let series = client
            .fetch_history("NOSUCHTICKERZZZ", &range((2024, 1, 1), (2024, 2, 1)))
            .await
            .unwrap();
        assert!(series.is_empty());
    }
}
