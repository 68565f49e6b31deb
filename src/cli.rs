//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::{summarize, CsvReportAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::aggregate::{AggregateReport, MultiPeriodAggregator, RunOutcome};
use crate::domain::backtest::{BacktestConfig, BiasMode};
use crate::domain::config_validation::{
    build_backtest_config, validate_backtest_config, validate_data_config,
};
use crate::domain::error::MemeindexError;
use crate::domain::series::SeriesStore;
use crate::domain::universe::select_universe;
use crate::domain::window::is_valid;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_OUTPUT_DIR: &str = "report";

#[derive(Parser, Debug)]
#[command(
    name = "memeindex",
    about = "Bias-aware backtester for an equal-weight index of new high-volume tokens"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the privileged and honest backtests over every period
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Restrict the run to these periods (repeatable)
        #[arg(long)]
        period: Vec<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// List the periods available under the data directory
    ListPeriods {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the ranked universe of one period
    Universe {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        period: String,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            period,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, output.as_deref(), &period)
            } else {
                run_backtest(&config, output.as_deref(), &period)
            }
        }
        Command::ListPeriods { config } => run_list_periods(&config),
        Command::Universe { config, period } => run_universe(&config, &period),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Loads and validates the config, returning the adapter, the backtest
/// parameters and the data port.
fn prepare(
    config_path: &Path,
) -> Result<(FileConfigAdapter, BacktestConfig, CsvAdapter), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;

    let checked = validate_data_config(&adapter)
        .and_then(|()| validate_backtest_config(&adapter))
        .and_then(|()| build_backtest_config(&adapter));
    let bt_config = checked.map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;

    let data_port = CsvAdapter::new(base_path(&adapter));
    Ok((adapter, bt_config, data_port))
}

fn base_path(config: &dyn ConfigPort) -> PathBuf {
    PathBuf::from(config.get_string("data", "base_path").unwrap_or_default())
}

fn run_backtest(config_path: &Path, output: Option<&Path>, period_overrides: &[String]) -> ExitCode {
    let (adapter, bt_config, data_port) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let periods = match resolve_periods(period_overrides, &adapter, &data_port) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let output_dir = resolve_output_dir(output, &adapter);
    let show_periods = adapter.get_bool("report", "show_periods", true);

    run_backtest_pipeline(
        &data_port,
        &CsvReportAdapter,
        &bt_config,
        &periods,
        &output_dir,
        show_periods,
    )
}

/// Loads each period in order and feeds it to the aggregator. A period that
/// fails to load is recorded with an empty store so it shows up as skipped.
pub fn collect_report(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    periods: &[String],
) -> AggregateReport {
    let mut aggregator = MultiPeriodAggregator::new(bt_config);
    for period in periods {
        let store = match data_port.load_period(period) {
            Ok(store) => store,
            Err(e) => {
                warn!(period = %period, error = %e, "failed to load period");
                eprintln!("warning: period {} could not be loaded ({})", period, e);
                SeriesStore::new()
            }
        };
        aggregator.process_period(period, &store);
    }
    aggregator.finish()
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    bt_config: &BacktestConfig,
    periods: &[String],
    output_dir: &Path,
    show_periods: bool,
) -> ExitCode {
    if periods.is_empty() {
        eprintln!("error: no periods to backtest");
        return ExitCode::from(5);
    }

    eprintln!(
        "Running backtest: {} periods, top {} tokens, privileged {}, honest {}",
        periods.len(),
        bt_config.top_n,
        bt_config.privileged_window,
        bt_config.honest_window,
    );
    info!(
        periods = periods.len(),
        top_n = bt_config.top_n,
        "starting backtest"
    );

    let report = collect_report(data_port, bt_config, periods);

    if show_periods {
        print_period_table(&report);
    }

    eprintln!("\n=== Combined Results ===");
    for bias in BiasMode::ALL {
        eprintln!("  {}", summarize(report.combined(bias)));
    }
    if !report.skipped.is_empty() {
        eprintln!("  {} runs skipped", report.skipped.len());
    }

    if report.completed_runs() == 0 {
        eprintln!("error: no run completed in any period");
        return ExitCode::from(5);
    }

    match report_port.write(&report, output_dir) {
        Ok(()) => {
            eprintln!("\nReport written to: {}", output_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write report: {e}");
            (&e).into()
        }
    }
}

fn print_period_table(report: &AggregateReport) {
    eprintln!("\n=== Per-Period Results ===");
    for period in &report.periods {
        for bias in BiasMode::ALL {
            match period.outcome(bias) {
                RunOutcome::Completed(run) => eprintln!(
                    "  {} {:<10}  {} tokens, total {:.2}%, max dd {:.2}%",
                    period.period,
                    bias.label(),
                    run.tokens.len(),
                    run.metrics.total_return * 100.0,
                    run.metrics.max_drawdown * 100.0,
                ),
                RunOutcome::Skipped(err) => {
                    eprintln!("  {} {:<10}  skipped: {}", period.period, bias.label(), err)
                }
            }
        }
    }
}

/// Periods named on the command line win, then `[backtest] periods`, then
/// every period found in the data directory.
pub fn resolve_periods(
    overrides: &[String],
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, MemeindexError> {
    if !overrides.is_empty() {
        return Ok(overrides.to_vec());
    }
    let configured = config.get_list("backtest", "periods");
    if !configured.is_empty() {
        return Ok(configured);
    }
    data_port.list_periods()
}

pub fn resolve_output_dir(output: Option<&Path>, config: &dyn ConfigPort) -> PathBuf {
    output
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "output_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

pub fn run_dry_run(
    config_path: &Path,
    output: Option<&Path>,
    period_overrides: &[String],
) -> ExitCode {
    let (adapter, bt_config, data_port) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };
    eprintln!("Config validated successfully");
    print_parameters(&bt_config);

    eprintln!("\nPeriods:");
    match resolve_periods(period_overrides, &adapter, &data_port) {
        Ok(periods) if periods.is_empty() => eprintln!("  (none found)"),
        Ok(periods) => eprintln!("  {}", periods.join(", ")),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    eprintln!(
        "\nOutput: {}",
        resolve_output_dir(output, &adapter).display()
    );
    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn print_parameters(bt_config: &BacktestConfig) {
    eprintln!("\nParameters:");
    eprintln!("  top_n:             {}", bt_config.top_n);
    eprintln!("  min_tokens:        {}", bt_config.min_tokens);
    eprintln!("  ranking window:    {}", bt_config.ranking_window);
    eprintln!("  privileged window: {}", bt_config.privileged_window);
    eprintln!("  honest window:     {}", bt_config.honest_window);
}

fn run_list_periods(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_data_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let data_port = CsvAdapter::new(base_path(&config));
    match data_port.list_periods() {
        Ok(periods) => {
            for period in &periods {
                println!("{}", period);
            }
            eprintln!("{} periods found", periods.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_universe(config_path: &Path, period: &str) -> ExitCode {
    let (_, bt_config, data_port) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let store = match data_port.load_period(period) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let universe = match select_universe(&store, bt_config.ranking_window, bt_config.top_n) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("error: {}: {}", period, e);
            return ExitCode::from(5);
        }
    };

    eprintln!(
        "{}: top {} of {} tokens by volume over {}",
        period,
        universe.count(),
        store.len(),
        universe.ranking_window,
    );
    println!("rank,token,total_volume,privileged,honest");
    for (rank, member) in universe.members.iter().enumerate() {
        let valid = |bias: BiasMode| is_valid(&store, &member.token, bt_config.window_for(bias));
        println!(
            "{},{},{},{},{}",
            rank + 1,
            member.token,
            member.total_volume,
            valid(BiasMode::Privileged),
            valid(BiasMode::Honest),
        );
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let (adapter, bt_config, _) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    print_parameters(&bt_config);
    eprintln!("\nData:");
    eprintln!("  base_path: {}", base_path(&adapter).display());
    let configured = adapter.get_list("backtest", "periods");
    if !configured.is_empty() {
        eprintln!("  periods:   {}", configured.join(", "));
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
