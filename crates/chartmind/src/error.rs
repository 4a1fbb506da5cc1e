//! Error types for chart analysis operations

use crate::indicators::IndicatorError;
use thiserror::Error;

/// Chart analysis specific errors
#[derive(Debug, Error)]
pub enum ChartMindError {
    /// Market data provider failed for a symbol
    #[error("Market data error for {symbol}: {reason}")]
    MarketData { symbol: String, reason: String },

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Start date does not precede end date
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    /// Bars violate the price series ordering rules
    #[error("Invalid price series: {0}")]
    InvalidSeries(String),

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    /// Chart rendering or image export failed
    #[error("Chart rendering error: {0}")]
    Chart(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Language model provider error
    #[error("LLM error: {0}")]
    Llm(#[from] chartmind_llm::LLMError),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Analysis requested before any data was fetched
    #[error("Please fetch stock data first")]
    NoSessionData,
}

/// Result type alias for chart analysis operations
pub type Result<T> = std::result::Result<T, ChartMindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChartMindError::InvalidSymbol("".to_string());
        assert_eq!(err.to_string(), "Invalid symbol: ");

        let err = ChartMindError::MarketData {
            symbol: "AAPL".to_string(),
            reason: "connection reset".to_string(),
        };
        assert_eq!(err.to_string(), "Market data error for AAPL: connection reset");
    }

    #[test]
    fn test_error_conversion() {
        let err: ChartMindError = IndicatorError::ZeroVolume.into();
        assert!(matches!(err, ChartMindError::Indicator(IndicatorError::ZeroVolume)));

        let err: ChartMindError = chartmind_llm::LLMError::AuthenticationFailed.into();
        assert!(err.to_string().starts_with("LLM error:"));
    }
}
