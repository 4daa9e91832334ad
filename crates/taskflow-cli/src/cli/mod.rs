//! CLI entry and dispatch.

use std::io::IsTerminal;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use clap::builder::RangedI64ValueParser;
use taskflow_core::config::{
    INNER_RANGE, MIDDLE_RANGE, OUTER_RANGE, RawRunConfig, RunConfiguration, SLEEP_RANGE,
};
use taskflow_core::core::interrupt;
use taskflow_core::core::summary::RunSummary;
use taskflow_core::core::viewport::{MIN_HEIGHT, MIN_WIDTH, Viewport};
use taskflow_core::logging;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::modes;

pub const APP_NAME: &str = "TaskFlow";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const TAGLINE: &str = "Full-Screen Task Runner";

fn ranged(range: RangeInclusive<u32>) -> RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(i64::from(*range.start())..=i64::from(*range.end()))
}

fn parse_sleep(value: &str) -> Result<f64, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number"))?;
    if SLEEP_RANGE.contains(&secs) {
        Ok(secs)
    } else {
        Err(format!(
            "{secs} is not in {}..={}",
            SLEEP_RANGE.start(),
            SLEEP_RANGE.end()
        ))
    }
}

#[derive(Parser, Debug)]
#[command(name = "taskflow")]
#[command(version)]
#[command(about = "TaskFlow - A full-screen CLI task runner")]
#[command(after_help = "Examples:\n  \
    taskflow                     Run with defaults\n  \
    taskflow -o 50 -m 3 -i 15    Custom iteration counts\n  \
    taskflow -s 0.1              Slower execution for visibility\n  \
    taskflow --headless          Print log lines instead of the full-screen view")]
struct Cli {
    /// Number of outer loop iterations (1-1000) [default: 100]
    #[arg(short, long, env = "TASKFLOW_OUTER", value_parser = ranged(OUTER_RANGE))]
    outer: Option<u32>,

    /// Number of middle loop iterations per outer (1-10) [default: 5]
    #[arg(short, long, env = "TASKFLOW_MIDDLE", value_parser = ranged(MIDDLE_RANGE))]
    middle: Option<u32>,

    /// Maximum inner loop iterations per middle (1-20) [default: 10]
    #[arg(short, long, env = "TASKFLOW_INNER", value_parser = ranged(INNER_RANGE))]
    inner: Option<u32>,

    /// Base sleep per inner step in seconds (0.01-1.0) [default: 0.05]
    #[arg(short, long, env = "TASKFLOW_SLEEP", value_parser = parse_sleep)]
    sleep: Option<f64>,

    /// Chance (0-1) that an inner loop exits early after each step
    #[arg(long, env = "TASKFLOW_EARLY_EXIT_PROBABILITY", value_name = "P")]
    early_exit_probability: Option<f64>,

    /// Seed for reproducible runs
    #[arg(long, env = "TASKFLOW_SEED")]
    seed: Option<u64>,

    /// How long the splash screen stays up, in milliseconds
    #[arg(long, env = "TASKFLOW_SPLASH_MS", value_name = "MS")]
    splash_ms: Option<u64>,

    /// TOML file with run settings (flags take precedence)
    #[arg(long, env = "TASKFLOW_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write diagnostics to this file
    #[arg(long, env = "TASKFLOW_LOG", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print log lines instead of the full-screen display
    #[arg(long)]
    headless: bool,
}

impl Cli {
    fn flag_layer(&self) -> RawRunConfig {
        RawRunConfig {
            outer: self.outer,
            middle: self.middle,
            inner: self.inner,
            sleep: self.sleep,
            early_exit_probability: self.early_exit_probability,
            seed: self.seed,
            splash_ms: self.splash_ms,
            ..RawRunConfig::default()
        }
    }

    fn resolve_config(&self) -> Result<RunConfiguration> {
        let file = match &self.config {
            Some(path) => RawRunConfig::load(path)?,
            None => RawRunConfig::default(),
        };
        let config = file
            .merge(self.flag_layer())
            .validate()
            .context("invalid configuration")?;
        Ok(config)
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init(cli.log_file.as_deref()).context("init logging")?;
    let config = cli.resolve_config()?;

    interrupt::init()?;

    let headless = cli.headless || !std::io::stdout().is_terminal();
    print_banner(&config, headless);

    // Single-threaded: the driver is the only task doing real work.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("create tokio runtime")?;

    let summary = rt.block_on(async move { dispatch(config, headless).await })?;

    if summary.cancelled {
        eprintln!("Interrupted by user");
        return Err(interrupt::InterruptedError.into());
    }
    println!("{APP_NAME} completed successfully!");
    Ok(())
}

async fn dispatch(config: RunConfiguration, headless: bool) -> Result<RunSummary> {
    info!(
        headless,
        outer = config.outer_count(),
        middle = config.middle_count(),
        inner = config.inner_max(),
        "starting run"
    );
    let cancel = CancellationToken::new();
    let bridge = interrupt::spawn_cancel_bridge(cancel.clone());

    let result = if headless {
        modes::headless::run(config, cancel).await
    } else {
        modes::run_tui(config, cancel).await
    };

    bridge.abort();
    if let Ok(summary) = &result {
        info!(
            cancelled = summary.cancelled,
            outer = summary.outer_iterations_completed,
            "run finished"
        );
    }
    result
}

fn print_banner(config: &RunConfiguration, headless: bool) {
    eprintln!("{APP_NAME} v{APP_VERSION}");
    eprintln!(
        "Configuration: outer={}, middle={}, inner={}, sleep={}s",
        config.outer_count(),
        config.middle_count(),
        config.inner_max(),
        config.base_sleep().as_secs_f64()
    );
    if headless {
        return;
    }
    let (width, height) = crossterm::terminal::size().unwrap_or((MIN_WIDTH, MIN_HEIGHT));
    if Viewport::new(width, height).is_below_minimum() {
        eprintln!(
            "Warning: terminal is {width}x{height}; at least {MIN_WIDTH}x{MIN_HEIGHT} is recommended."
        );
    }
}
