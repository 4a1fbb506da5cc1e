//! Visual technical analysis of stock charts with a multimodal LLM
//!
//! This crate fetches daily price history, draws candlestick charts with
//! technical indicator overlays, and asks a language model to read each chart
//! and return a trading recommendation. It includes:
//!
//! - Daily OHLCV history from Yahoo Finance
//! - Indicators: 20-day SMA, 20-day EMA, 20-day Bollinger Bands, VWAP
//! - Candlestick PNG rendering with dashed indicator overlays
//! - A fixed analysis prompt and lenient parsing of the model's JSON reply
//! - A session that fetches once and analyzes every loaded ticker in order
//!
//! # Example
//!
//! ```rust,ignore
//! use chartmind::{ChartMindConfig, DateRange, FetchRequest, IndicatorSelection, Session, YahooFinanceClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ChartMindConfig::default().with_env()?.with_api_key_from_env();
//!     let mut session = Session::new(Arc::new(YahooFinanceClient::new()), config.build_requester()?)
//!         .with_layout(config.chart_layout());
//!
//!     let range = DateRange::default_until(chrono::Utc::now().date_naive());
//!     let request = FetchRequest::parse("AAPL,MSFT", range, IndicatorSelection::default())?;
//!     println!("{}", session.fetch(&request).await?.success_message());
//!
//!     for (ticker, action) in session.analyze().await?.summary() {
//!         println!("{ticker}: {action}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod error;
pub mod indicators;
pub mod prompts;
pub mod recommendation;
pub mod report;
pub mod series;
pub mod session;

// Re-export main types
pub use api::{MarketDataSource, YahooFinanceClient};
pub use chart::{ChartFigure, ChartRenderer, PngRasterizer, Rasterizer, RenderedChart};
pub use config::{ChartMindConfig, ModelProvider};
pub use error::{ChartMindError, Result};
pub use indicators::{Indicator, IndicatorError, IndicatorSelection, IndicatorTrace};
pub use recommendation::{AnalysisResult, RecommendationRequester, RequestBuilder, parse_response};
pub use report::{Formatter, JsonFormatter, TerminalFormatter};
pub use series::{Bar, DateRange, PriceSeries};
pub use session::{FetchOutcome, FetchRequest, Session, SessionReport, SessionState, TickerReport};
