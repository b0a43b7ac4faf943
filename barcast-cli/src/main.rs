//! Barcast CLI: analyze one instrument's daily bars for selected years.
//!
//! Commands:
//! - `analyze`: clean, summarize and forecast one or more calendar years
//! - `show`: re-render a saved analysis from its artifact directory

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use barcast_core::data::{DataProvider, FileProvider, SyntheticProvider, YahooProvider};
use barcast_core::forecast::FitMethod;
use barcast_runner::{
    load_artifacts, render_markdown, render_text, run_analysis, save_artifacts, AnalysisConfig,
    AnalysisResult,
};

#[derive(Parser)]
#[command(
    name = "barcast",
    about = "Barcast CLI: daily bar analytics and ARIMA close forecasts"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a symbol for one or more calendar years.
    Analyze {
        /// Symbol (defaults to the config file's, else SPY).
        #[arg(long)]
        symbol: Option<String>,

        /// Calendar year to analyze; repeat for several years.
        #[arg(long = "year", required = true)]
        years: Vec<i32>,

        /// Read bars from a CSV or Parquet file instead of Yahoo Finance.
        #[arg(long, conflicts_with = "synthetic")]
        input: Option<PathBuf>,

        /// Use deterministic synthetic bars (results are tagged).
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Forecast horizon in business days.
        #[arg(long)]
        horizon: Option<usize>,

        /// Estimation method: exact or css.
        #[arg(long)]
        method: Option<FitMethod>,

        /// Write artifacts (CSV, JSON, Markdown) under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print results as JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Render a saved analysis.
    Show {
        /// Artifact directory containing result.json.
        dir: PathBuf,

        /// Render Markdown instead of text.
        #[arg(long, default_value_t = false)]
        markdown: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            symbol,
            years,
            input,
            synthetic,
            config,
            horizon,
            method,
            output_dir,
            json,
        } => run_analyze_cmd(AnalyzeArgs {
            symbol,
            years,
            input,
            synthetic,
            config,
            horizon,
            method,
            output_dir,
            json,
        }),
        Commands::Show { dir, markdown } => run_show(&dir, markdown),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

struct AnalyzeArgs {
    symbol: Option<String>,
    years: Vec<i32>,
    input: Option<PathBuf>,
    synthetic: bool,
    config: Option<PathBuf>,
    horizon: Option<usize>,
    method: Option<FitMethod>,
    output_dir: Option<PathBuf>,
    json: bool,
}

fn run_analyze_cmd(args: AnalyzeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(symbol) = args.symbol {
        config.analysis.symbol = symbol;
    }
    if let Some(horizon) = args.horizon {
        config.forecast.horizon = horizon;
    }
    if let Some(method) = args.method {
        config.forecast.method = method;
    }
    config.validate()?;

    let current_year = chrono::Local::now().year();
    for &year in &args.years {
        config.check_year(year, current_year)?;
    }

    let provider = build_provider(args.input.as_deref(), args.synthetic)?;
    let symbol = config.analysis.symbol.clone();

    let outcomes: Vec<(i32, Result<AnalysisResult, _>)> = args
        .years
        .par_iter()
        .map(|&year| (year, run_analysis(provider.as_ref(), &symbol, year, &config)))
        .collect();

    let mut failures = 0usize;
    let mut results = Vec::new();
    for (year, outcome) in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                failures += 1;
                eprintln!("Error for {symbol} {year}: {e}");
            }
        }
    }

    if args.json {
        let json = serde_json::to_string_pretty(&results).context("failed to serialize results")?;
        println!("{json}");
    } else {
        for (i, result) in results.iter().enumerate() {
            if i > 0 {
                println!();
            }
            print!("{}", render_text(result));
        }
    }

    if let Some(dir) = &args.output_dir {
        for result in &results {
            let run_dir = save_artifacts(result, dir)?;
            eprintln!("Artifacts saved to: {}", run_dir.display());
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn build_provider(input: Option<&Path>, synthetic: bool) -> Result<Box<dyn DataProvider>> {
    if synthetic {
        return Ok(Box::new(SyntheticProvider::new()));
    }
    if let Some(path) = input {
        if !path.exists() {
            bail!("input file not found: {}", path.display());
        }
        return Ok(Box::new(FileProvider::new(path)));
    }
    let provider = YahooProvider::new().context("failed to initialize Yahoo Finance provider")?;
    Ok(Box::new(provider))
}

fn run_show(dir: &Path, markdown: bool) -> Result<()> {
    let result = load_artifacts(dir)?;
    if markdown {
        print!("{}", render_markdown(&result));
    } else {
        print!("{}", render_text(&result));
    }
    Ok(())
}
