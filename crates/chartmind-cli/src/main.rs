//! Command-line interface for chartmind
//!
//! # Usage
//!
//! ```bash
//! export GEMINI_API_KEY="..."
//!
//! # One-shot analysis, charts written next to the report
//! chartmind analyze --tickers AAPL,MSFT --indicator sma20 --indicator vwap --output-dir charts
//!
//! # Interactive session
//! chartmind repl
//! ```

mod repl;

use anyhow::Context;
use chartmind::{
    ChartMindConfig, DateRange, FetchRequest, Formatter, Indicator, IndicatorSelection,
    JsonFormatter, ModelProvider, Session, SessionReport, TerminalFormatter, YahooFinanceClient,
};
use chartmind_utils::{LogFormat, logging::DEFAULT_DIRECTIVE};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "chartmind", version)]
#[command(about = "Candlestick chart analysis with a multimodal LLM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model provider: gemini, openai or anthropic
    #[arg(long, global = true)]
    provider: Option<ModelProvider>,

    /// Model identifier
    #[arg(long, global = true)]
    model: Option<String>,

    /// Log output format: pretty or json
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch, chart and analyze a list of tickers once
    Analyze(AnalyzeArgs),
    /// Start an interactive session
    Repl {
        /// Directory to write each analyzed chart to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Comma-separated ticker symbols
    #[arg(short, long, default_value = "AAPL,MSFT,GOOG")]
    tickers: String,

    /// First day of history (YYYY-MM-DD); defaults to one year before the end
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Day after the last day of history (YYYY-MM-DD); defaults to today
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Indicator to overlay (sma20, ema20, bb20, vwap); repeatable
    #[arg(short, long = "indicator", value_name = "INDICATOR")]
    indicators: Vec<Indicator>,

    /// Directory to write each chart to as <TICKER>.png
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

/// Date range from optional CLI bounds, ending today by default
pub(crate) fn resolve_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> chartmind::Result<DateRange> {
    let end = end.unwrap_or(today);
    match start {
        Some(start) => DateRange::new(start, end),
        None => Ok(DateRange::default_until(end)),
    }
}

/// Write each ticker's chart as `<dir>/<TICKER>.png`
pub(crate) fn write_charts(dir: &Path, report: &SessionReport) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    report
        .reports
        .iter()
        .map(|ticker| {
            let path = dir.join(format!("{}.png", ticker.ticker));
            std::fs::write(&path, &ticker.chart.bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Ok(path)
        })
        .collect()
}

fn load_config(cli: &Cli) -> anyhow::Result<ChartMindConfig> {
    load_config_with(cli, |name| std::env::var(name).ok())
}

/// File, then `CHARTMIND_*` variables, then flags; the API key is looked up
/// last so it matches the final provider
fn load_config_with(cli: &Cli, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<ChartMindConfig> {
    let base = match &cli.config {
        Some(path) => ChartMindConfig::from_file(path)?,
        None => ChartMindConfig::default(),
    };

    let mut builder = ChartMindConfig::builder().base(base.with_env_from(&lookup)?);
    if let Some(provider) = cli.provider {
        builder = builder.provider(provider);
    }
    if let Some(model) = &cli.model {
        builder = builder.model(model);
    }
    Ok(builder.build()?.with_api_key_from(&lookup))
}

fn build_session(config: &ChartMindConfig) -> anyhow::Result<Session> {
    let requester = config.build_requester()?;
    Ok(Session::new(Arc::new(YahooFinanceClient::new()), requester).with_layout(config.chart_layout()))
}

async fn run_analyze(args: AnalyzeArgs, config: &ChartMindConfig) -> anyhow::Result<()> {
    let mut session = build_session(config)?;

    let range = resolve_range(args.start, args.end, chrono::Local::now().date_naive())?;
    let indicators = if args.indicators.is_empty() {
        IndicatorSelection::default()
    } else {
        IndicatorSelection::new(args.indicators)
    };
    let request = FetchRequest::parse(&args.tickers, range, indicators)?;

    let formatter: Box<dyn Formatter> = if args.json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TerminalFormatter)
    };

    let outcome = session.fetch(&request).await?;
    if !args.json {
        println!("{}\n", formatter.format_fetch(&outcome));
    }

    let report = session.analyze().await?;
    if let Some(dir) = &args.output_dir {
        for path in write_charts(dir, &report)? {
            info!("Wrote {}", path.display());
        }
    }

    println!("{}", formatter.format_report(&report));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    chartmind_utils::init_tracing_with(cli.log_format, DEFAULT_DIRECTIVE)?;

    let config = load_config(&cli)?;
    info!(provider = %config.provider, model = %config.model, "Starting chartmind");

    match cli.command {
        Commands::Analyze(args) => run_analyze(args, &config).await,
        Commands::Repl { output_dir } => {
            let session = build_session(&config)?;
            repl::Repl::new(session, output_dir).run().await
        }
    }
}
