//! Interactive session loop
//!
//! Each `/fetch` replaces the session data; `/indicators` changes what the
//! next fetch will draw.

use crate::{resolve_range, write_charts};
use anyhow::{Context, Result, anyhow, bail};
use chartmind::{FetchRequest, Formatter, IndicatorSelection, Session, TerminalFormatter};
use chrono::NaiveDate;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const HELP: &str = "\
ChartMind commands:
  /fetch <TICKERS> [START] [END]  - Load price history, e.g. /fetch AAPL,MSFT 2024-01-01
  /indicators <LIST>              - Indicators for the next fetch: sma20, ema20, bb20, vwap
  /analyze                        - Chart and analyze every loaded ticker
  /status                         - Show loaded tickers, range and indicators
  /help                           - Show help
  /exit                           - Exit";

/// Parsed REPL command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Fetch {
        tickers: String,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    Indicators(IndicatorSelection),
    Analyze,
    Status,
    Help,
    Exit,
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| anyhow!("Invalid date '{s}': {e}"))
}

impl Command {
    /// Parse a command from user input
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let Some(body) = input.strip_prefix('/') else {
            bail!("Commands start with '/'. Type /help for a list.");
        };

        let (cmd, rest) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
        let rest = rest.trim();

        match cmd.to_lowercase().as_str() {
            "fetch" | "f" => {
                let mut args = rest.split_whitespace();
                let tickers = args
                    .next()
                    .ok_or_else(|| anyhow!("Missing tickers for fetch command"))?
                    .to_string();
                let start = args.next().map(parse_date).transpose()?;
                let end = args.next().map(parse_date).transpose()?;
                Ok(Command::Fetch {
                    tickers,
                    start,
                    end,
                })
            }
            "indicators" | "ind" | "i" => {
                if rest.is_empty() {
                    bail!("Missing indicator list, e.g. /indicators sma20,vwap");
                }
                if rest.eq_ignore_ascii_case("none") {
                    return Ok(Command::Indicators(IndicatorSelection::none()));
                }
                Ok(Command::Indicators(IndicatorSelection::parse_list(rest)?))
            }
            "analyze" | "a" => Ok(Command::Analyze),
            "status" | "s" => Ok(Command::Status),
            "help" | "h" | "?" => Ok(Command::Help),
            "exit" | "quit" | "q" => Ok(Command::Exit),
            other => bail!("Unknown command: {other}"),
        }
    }
}

pub struct Repl {
    session: Session,
    indicators: IndicatorSelection,
    output_dir: Option<PathBuf>,
    formatter: TerminalFormatter,
}

impl Repl {
    pub fn new(session: Session, output_dir: Option<PathBuf>) -> Self {
        Self {
            session,
            indicators: IndicatorSelection::default(),
            output_dir,
            formatter: TerminalFormatter,
        }
    }

    fn status(&self) -> String {
        let pending = format!("Indicators for next fetch: {}", self.indicators);
        match self.session.state() {
            Some(state) => format!(
                "Session #{}: {} | {} | Indicators: {}\n{pending}",
                state.generation(),
                if state.is_empty() { "no data".to_string() } else { state.tickers().join(", ") },
                state.range(),
                state.indicators(),
            ),
            None => format!("No data fetched yet.\n{pending}"),
        }
    }

    /// Run one command; `None` means the user asked to exit
    pub async fn handle(&mut self, command: Command) -> Result<Option<String>> {
        let output = match command {
            Command::Fetch { tickers, start, end } => {
                let range = resolve_range(start, end, chrono::Local::now().date_naive())?;
                let request = FetchRequest::parse(&tickers, range, self.indicators.clone())?;
                let outcome = self.session.fetch(&request).await?;
                self.formatter.format_fetch(&outcome)
            }
            Command::Indicators(selection) => {
                self.indicators = selection;
                format!("Indicators for next fetch: {}", self.indicators)
            }
            Command::Analyze => {
                let report = self.session.analyze().await?;
                let mut output = self.formatter.format_report(&report);
                if let Some(dir) = &self.output_dir {
                    let written = write_charts(dir, &report)?;
                    output.push_str(&format!("\nCharts written: {}", written.len()));
                }
                output
            }
            Command::Status => self.status(),
            Command::Help => HELP.to_string(),
            Command::Exit => return Ok(None),
        };
        Ok(Some(output))
    }

    pub async fn run(self) -> Result<()> {
        self.run_with(io::stdin().lock(), io::stdout()).await
    }

    /// Read commands from `input` until `/exit` or end of input
    pub async fn run_with(mut self, mut input: impl BufRead, mut out: impl Write) -> Result<()> {
        writeln!(out, "ChartMind: AI-powered visual stock analysis\n{HELP}\n")?;

        loop {
            write!(out, "chartmind> ")?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line).context("Error reading input")? == 0 {
                writeln!(out, "\nGoodbye!")?;
                break;
            }

            if line.trim().is_empty() {
                continue;
            }

            let result = match Command::parse(&line) {
                Ok(command) => self.handle(command).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(Some(output)) => writeln!(out, "{output}\n")?,
                Ok(None) => {
                    writeln!(out, "Goodbye!")?;
                    break;
                }
                Err(e) => eprintln!("{}\n", self.formatter.format_error(&e.to_string())),
            }
        }

        Ok(())
    }
}
