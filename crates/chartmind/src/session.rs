//! Interactive session: fetch once, analyze every loaded ticker in order
//!
//! A [`Session`] owns the current [`SessionState`]. Each successful fetch
//! replaces the state wholesale and bumps its generation; every analysis run
//! reads one state, so a report never mixes data from two fetches.

use crate::api::MarketDataSource;
use crate::chart::{ChartFigure, ChartRenderer, PngRasterizer, Rasterizer, RenderedChart};
use crate::error::{ChartMindError, Result};
use crate::indicators::{IndicatorSelection, compute_all};
use crate::recommendation::{AnalysisResult, RecommendationRequester};
use crate::series::{DateRange, PriceSeries};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Split a comma-separated ticker list
///
/// Entries are trimmed and upper-cased; blanks are dropped and repeats keep
/// their first position.
pub fn parse_tickers(input: &str) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for ticker in input.split(',').map(|t| t.trim().to_uppercase()) {
        if !ticker.is_empty() && !tickers.contains(&ticker) {
            tickers.push(ticker);
        }
    }
    tickers
}

/// What to load on the next fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub tickers: Vec<String>,
    pub range: DateRange,
    pub indicators: IndicatorSelection,
}

impl FetchRequest {
    /// Build a request from a raw comma-separated ticker list
    pub fn parse(tickers: &str, range: DateRange, indicators: IndicatorSelection) -> Result<Self> {
        let tickers = parse_tickers(tickers);
        if tickers.is_empty() {
            return Err(ChartMindError::InvalidSymbol(
                "no ticker symbols given".to_string(),
            ));
        }
        Ok(Self {
            tickers,
            range,
            indicators,
        })
    }
}

/// Price data of one fetch
#[derive(Debug, Clone)]
pub struct SessionState {
    generation: u64,
    range: DateRange,
    indicators: IndicatorSelection,
    series: Vec<(String, PriceSeries)>,
    warnings: Vec<String>,
}

impl SessionState {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    pub fn indicators(&self) -> &IndicatorSelection {
        &self.indicators
    }

    /// Loaded tickers in request order
    pub fn tickers(&self) -> Vec<&str> {
        self.series.iter().map(|(t, _)| t.as_str()).collect()
    }

    pub fn series(&self, ticker: &str) -> Option<&PriceSeries> {
        self.series.iter().find(|(t, _)| t == ticker).map(|(_, s)| s)
    }

    /// Warnings raised while fetching, e.g. tickers without data
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Result of a fetch, for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub generation: u64,
    pub loaded: Vec<String>,
    pub warnings: Vec<String>,
}

impl FetchOutcome {
    pub fn success_message(&self) -> String {
        format!("Stock data loaded successfully for: {}", self.loaded.join(", "))
    }
}

/// Everything produced for one ticker in an analysis run
#[derive(Debug, Clone)]
pub struct TickerReport {
    pub ticker: String,
    pub figure: ChartFigure,
    pub chart: RenderedChart,
    pub result: AnalysisResult,
    /// Indicators that could not be drawn for this ticker
    pub warnings: Vec<String>,
}

/// One analysis run over a session state
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub generation: u64,
    pub range: DateRange,
    pub indicators: IndicatorSelection,
    pub fetch_warnings: Vec<String>,
    pub reports: Vec<TickerReport>,
}

impl SessionReport {
    /// `(ticker, action)` rows in ticker order
    pub fn summary(&self) -> Vec<(&str, &str)> {
        self.reports
            .iter()
            .map(|r| (r.ticker.as_str(), r.result.action.as_str()))
            .collect()
    }
}

/// Fetch-then-analyze pipeline over a market data source and a model
pub struct Session {
    market: Arc<dyn MarketDataSource>,
    requester: RecommendationRequester,
    layout: ChartRenderer,
    rasterizer: Arc<dyn Rasterizer>,
    state: Option<SessionState>,
    fetches: u64,
}

impl Session {
    pub fn new(market: Arc<dyn MarketDataSource>, requester: RecommendationRequester) -> Self {
        Self {
            market,
            requester,
            layout: ChartRenderer::default(),
            rasterizer: Arc::new(PngRasterizer),
            state: None,
            fetches: 0,
        }
    }

    pub fn with_layout(mut self, layout: ChartRenderer) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    /// Load every requested ticker and replace the session state
    ///
    /// Tickers without data are skipped with a warning. If the provider
    /// fails, the error is returned and the previous state stays in place.
    #[instrument(skip(self, request), fields(tickers = request.tickers.len(), range = %request.range))]
    pub async fn fetch(&mut self, request: &FetchRequest) -> Result<FetchOutcome> {
        let mut series = Vec::with_capacity(request.tickers.len());
        let mut warnings = Vec::new();

        for ticker in &request.tickers {
            let history = self.market.fetch_history(ticker, &request.range).await?;
            if history.is_empty() {
                warn!(ticker, "No data returned");
                warnings.push(format!("No data found for {ticker}."));
            } else {
                info!(ticker, bars = history.len(), "Loaded price history");
                series.push((ticker.clone(), history));
            }
        }

        self.fetches += 1;
        let state = SessionState {
            generation: self.fetches,
            range: request.range,
            indicators: request.indicators.clone(),
            series,
            warnings,
        };

        let outcome = FetchOutcome {
            generation: state.generation,
            loaded: state.tickers().into_iter().map(String::from).collect(),
            warnings: state.warnings.clone(),
        };
        self.state = Some(state);
        Ok(outcome)
    }

    /// Analyze every loaded ticker, one at a time, in fetch order
    pub async fn analyze(&self) -> Result<SessionReport> {
        let state = self
            .state
            .as_ref()
            .filter(|s| !s.is_empty())
            .ok_or(ChartMindError::NoSessionData)?;

        let mut reports = Vec::with_capacity(state.series.len());
        for (ticker, series) in &state.series {
            reports.push(self.analyze_ticker(ticker, series, &state.indicators).await?);
        }

        Ok(SessionReport {
            generation: state.generation,
            range: state.range,
            indicators: state.indicators.clone(),
            fetch_warnings: state.warnings.clone(),
            reports,
        })
    }

    #[instrument(skip(self, series, indicators), fields(bars = series.len()))]
    async fn analyze_ticker(
        &self,
        ticker: &str,
        series: &PriceSeries,
        indicators: &IndicatorSelection,
    ) -> Result<TickerReport> {
        let computed = compute_all(series, indicators);
        let warnings: Vec<String> = computed
            .failures
            .iter()
            .map(|(indicator, e)| format!("{indicator} not shown for {ticker}: {e}"))
            .collect();
        for warning in &warnings {
            warn!("{warning}");
        }

        let figure = self.layout.figure(ticker, series, &computed.traces);
        let chart = self.rasterizer.rasterize(&figure)?;
        let result = self.requester.request(ticker, &chart).await?;

        Ok(TickerReport {
            ticker: ticker.to_string(),
            figure,
            chart,
            result,
            warnings,
        })
    }
}
