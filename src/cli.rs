//! CLI definition, configuration merging and the evaluation pipeline.

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_cache_adapter::CsvCacheAdapter;
use crate::adapters::evaluation_report::EvaluationReport;
use crate::adapters::evaluation_report::tables::format_summary_table;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::forest_model::RandomForestModel;
use crate::adapters::yahoo_adapter::YahooAdapter;
use crate::domain::comparison::TickerSummary;
use crate::domain::config_validation::validate_run_config;
use crate::domain::error::ForestError;
use crate::domain::evaluation::evaluate_ticker;
use crate::domain::run_config::RunConfig;
use crate::domain::ticker::parse_tickers;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::model_port::TrendModel;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug, Default)]
#[command(
    name = "bandforest",
    about = "Backtest classical and random-forest-enhanced Bollinger Band strategies"
)]
pub struct Cli {
    /// Tickers to evaluate (space or comma separated)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub tickers: Option<Vec<String>>,

    /// First date to fetch (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last date to fetch, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// First date of the test period (YYYY-MM-DD)
    #[arg(long)]
    pub split: Option<NaiveDate>,

    /// Optional INI configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for cached price CSVs
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory for plots and result tables
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Use cached prices only
    #[arg(long)]
    pub offline: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    let file_config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            match FileConfigAdapter::from_file(path) {
                Ok(adapter) => Some(adapter),
                Err(e) => return fail(&e),
            }
        }
        None => None,
    };

    let config = match build_run_config(&cli, file_config.as_ref().map(|c| c as &dyn ConfigPort))
        .and_then(|config| validate_run_config(&config).map(|()| config))
    {
        Ok(config) => config,
        Err(e) => return fail(&e),
    };

    let yahoo = match YahooAdapter::new() {
        Ok(adapter) => adapter,
        Err(e) => return fail(&e),
    };
    let data_port = CsvCacheAdapter::new(config.data_dir.clone(), yahoo).offline(config.offline);
    let report = EvaluationReport::new(config.output_dir.clone());
    let forest = config.forest;
    let make_model = move || -> Box<dyn TrendModel> { Box::new(RandomForestModel::new(forest)) };

    run_pipeline(&data_port, &make_model, &report, &config)
}

fn fail(err: &ForestError) -> ExitCode {
    error!("{err}");
    err.into()
}

/// Evaluate every ticker in turn. A ticker that fails is logged and
/// skipped; the run fails only when none succeeds, with the exit code of the
/// last failure.
pub fn run_pipeline(
    data_port: &dyn DataPort,
    make_model: &dyn Fn() -> Box<dyn TrendModel>,
    report: &dyn ReportPort,
    config: &RunConfig,
) -> ExitCode {
    info!(
        tickers = config.tickers.len(),
        start = %config.start_date,
        end = %config.end_date,
        split = %config.split_date,
        "starting evaluation"
    );

    let mut summaries: Vec<TickerSummary> = Vec::with_capacity(config.tickers.len());
    let mut last_error: Option<ForestError> = None;

    for ticker in &config.tickers {
        info!(ticker = %ticker, "processing");

        let bars = match data_port.fetch_ohlcv(ticker, config.start_date, config.end_date) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(ticker = %ticker, "skipping: {e}");
                last_error = Some(e);
                continue;
            }
        };

        let mut model = make_model();
        let ticker_report = match evaluate_ticker(ticker, &bars, config, model.as_mut()) {
            Ok(r) => r,
            Err(e) => {
                warn!(ticker = %ticker, "skipping: {e}");
                last_error = Some(e);
                continue;
            }
        };

        if let Err(e) = report.write_ticker(&ticker_report) {
            return fail(&e);
        }

        let s = &ticker_report.summary;
        info!(
            ticker = %ticker,
            classical = s.classical_return_pct,
            enhanced = s.enhanced_return_pct,
            buy_and_hold = s.buy_and_hold_return_pct,
            "returns (%)"
        );
        summaries.push(ticker_report.summary);
    }

    if summaries.is_empty() {
        error!("no ticker produced results");
        return match last_error {
            Some(e) => (&e).into(),
            None => ExitCode::from(5),
        };
    }

    if let Err(e) = report.write_summary(&summaries) {
        return fail(&e);
    }

    println!("\n=== Final Results ===");
    print!("{}", format_summary_table(&summaries));

    ExitCode::SUCCESS
}

fn invalid(section: &str, key: &str, reason: String) -> ForestError {
    ForestError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn ini_date(
    config: Option<&dyn ConfigPort>,
    key: &str,
) -> Result<Option<NaiveDate>, ForestError> {
    let Some(raw) = config.and_then(|c| c.get_string("backtest", key)) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|_| invalid("backtest", key, "invalid date format (expected YYYY-MM-DD)".into()))
}

fn ini_usize(
    config: Option<&dyn ConfigPort>,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ForestError> {
    let Some(c) = config else {
        return Ok(default);
    };
    let value = c.get_int(section, key, default as i64)?;
    usize::try_from(value).map_err(|_| invalid(section, key, format!("{key} must be non-negative")))
}

fn ini_f64(
    config: Option<&dyn ConfigPort>,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, ForestError> {
    config.map_or(Ok(default), |c| c.get_double(section, key, default))
}

fn ini_path(config: Option<&dyn ConfigPort>, section: &str, key: &str) -> Option<PathBuf> {
    config
        .and_then(|c| c.get_string(section, key))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

fn ini_max_depth(
    config: Option<&dyn ConfigPort>,
    default: Option<u16>,
) -> Result<Option<u16>, ForestError> {
    let Some(raw) = config.and_then(|c| c.get_string("forest", "max_depth")) else {
        return Ok(default);
    };
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    raw.parse::<u16>().map(Some).map_err(|_| {
        invalid(
            "forest",
            "max_depth",
            format!("expected a depth or none, got {raw:?}"),
        )
    })
}

/// Merge CLI flags over the INI file over built-in defaults.
pub fn build_run_config(
    cli: &Cli,
    config: Option<&dyn ConfigPort>,
) -> Result<RunConfig, ForestError> {
    let defaults = RunConfig::default();

    let tickers = match (&cli.tickers, config.and_then(|c| c.get_string("backtest", "tickers"))) {
        (Some(list), _) => parse_tickers(&list.join(","))?,
        (None, Some(list)) => parse_tickers(&list)?,
        (None, None) => defaults.tickers.clone(),
    };

    let start_date = match cli.start {
        Some(d) => d,
        None => ini_date(config, "start_date")?.unwrap_or(defaults.start_date),
    };
    let end_date = match cli.end {
        Some(d) => d,
        None => ini_date(config, "end_date")?.unwrap_or(defaults.end_date),
    };
    let split_date = match cli.split {
        Some(d) => d,
        None => ini_date(config, "split_date")?.unwrap_or(defaults.split_date),
    };

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| ini_path(config, "data", "cache_dir"))
        .unwrap_or(defaults.data_dir);
    let output_dir = cli
        .output_dir
        .clone()
        .or_else(|| ini_path(config, "report", "output_dir"))
        .unwrap_or(defaults.output_dir);
    let offline = cli.offline
        || config.map_or(Ok(false), |c| c.get_bool("data", "offline", false))?;

    let mut backtest = defaults.backtest;
    backtest.initial_capital =
        ini_f64(config, "backtest", "initial_capital", backtest.initial_capital)?;
    backtest.risk_free_rate =
        ini_f64(config, "backtest", "risk_free_rate", backtest.risk_free_rate)?;
    backtest.execution.commission_pct =
        ini_f64(config, "backtest", "commission_pct", backtest.execution.commission_pct)?;
    backtest.execution.slippage_pct =
        ini_f64(config, "backtest", "slippage_pct", backtest.execution.slippage_pct)?;

    let mut bollinger = defaults.bollinger;
    bollinger.period = ini_usize(config, "bollinger", "period", bollinger.period)?;
    bollinger.multiplier = ini_f64(config, "bollinger", "multiplier", bollinger.multiplier)?;

    let mut enhanced = defaults.enhanced;
    enhanced.atr_period = ini_usize(config, "enhanced", "atr_period", enhanced.atr_period)?;
    enhanced.stop_atr_multiple =
        ini_f64(config, "enhanced", "stop_atr_multiple", enhanced.stop_atr_multiple)?;
    enhanced.wma_period = ini_usize(config, "enhanced", "wma_period", enhanced.wma_period)?;
    enhanced.lags = ini_usize(config, "enhanced", "lags", enhanced.lags)?;

    let mut forest = defaults.forest;
    forest.n_trees = ini_usize(config, "forest", "n_trees", forest.n_trees)?;
    forest.max_depth = ini_max_depth(config, forest.max_depth)?;
    forest.min_samples_split =
        ini_usize(config, "forest", "min_samples_split", forest.min_samples_split)?;
    forest.min_samples_leaf =
        ini_usize(config, "forest", "min_samples_leaf", forest.min_samples_leaf)?;
    forest.seed = ini_usize(config, "forest", "seed", forest.seed as usize)? as u64;

    Ok(RunConfig {
        tickers,
        start_date,
        end_date,
        split_date,
        data_dir,
        output_dir,
        offline,
        backtest,
        bollinger,
        enhanced,
        forest,
    })
}
