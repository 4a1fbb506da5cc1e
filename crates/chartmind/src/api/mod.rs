//! Market data sources

pub mod yahoo;

pub use yahoo::YahooFinanceClient;

use crate::error::Result;
use crate::series::{DateRange, PriceSeries};
use async_trait::async_trait;

/// Source of daily OHLCV history
///
/// An unknown ticker or a range with no trading days yields an empty series,
/// not an error. Errors are reserved for provider or transport failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch daily bars for `ticker` within `range` (end exclusive)
    async fn fetch_history(&self, ticker: &str, range: &DateRange) -> Result<PriceSeries>;
}
