//! RSSAC-047 Report Generator
//!
//! Evaluates one reporting window and writes the report to disk.
//!
//! # Flow
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────────┐   ┌──────────┐   ┌──────────┐
//! │  Config  │──▶│  Window  │──▶│ Record files │──▶│  Engine  │──▶│  Report  │
//! │ Registry │   │ (now)    │   │ (JSON lines) │   │          │   │  file    │
//! └──────────┘   └──────────┘   └──────────────┘   └──────────┘   └──────────┘
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rssac047::adapters::{render_json, render_text, JsonLinesSource, PrometheusExporter};
use rssac047::schedule::{parse_test_date, ReportWindow, WindowKind};
use rssac047::{DeploymentConfig, Engine, Result, VantagePointRegistry};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
    Prometheus,
}

impl ReportFormat {
    fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Prometheus => "prom",
        }
    }
}

/// RSSAC-047 report generator - root server system service metrics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Deployment configuration (YAML); the 13-operator defaults if omitted
    #[arg(long, env = "RSSAC047_CONFIG")]
    config: Option<PathBuf>,

    /// Vantage-point list, one host name per line
    #[arg(long, env = "RSSAC047_VANTAGE_POINTS")]
    vantage_points: PathBuf,

    /// Query-attempt records (JSON lines)
    #[arg(long, env = "RSSAC047_QUERY_RECORDS")]
    query_records: PathBuf,

    /// Correctness records (JSON lines)
    #[arg(long, env = "RSSAC047_CORRECTNESS_RECORDS")]
    correctness_records: PathBuf,

    /// Directory holding the Monthly/ and Weekly/ report folders
    #[arg(long, env = "RSSAC047_OUTPUT_DIR", default_value = "reports")]
    output_dir: PathBuf,

    /// Report format
    #[arg(long, env = "RSSAC047_FORMAT", value_enum, default_value = "text")]
    format: ReportFormat,

    /// Report on the last seven days instead of the previous month
    #[arg(long, env = "RSSAC047_WEEK")]
    week: bool,

    /// Pretend "now" is this instant (YY-MM-DD-HH-MM-SS)
    #[arg(long, env = "RSSAC047_TEST_DATE")]
    test_date: Option<String>,

    /// Recreate a monthly report that already exists
    #[arg(long, env = "RSSAC047_FORCE")]
    force: bool,

    /// Append collated values and the figures behind them to the text report
    #[arg(long, env = "RSSAC047_DEBUG")]
    debug: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_core() => {
            error!(error = %e, "Window could not be evaluated; no report written");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "Report generation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => DeploymentConfig::from_yaml_file(path)?,
        None => DeploymentConfig::default(),
    };
    let registry = VantagePointRegistry::from_file(&args.vantage_points)?;

    info!("Starting RSSAC-047 report");
    info!("  Operators: {}", config.operator_count());
    info!("  Vantage points: {}", registry.len());
    info!("  k: {}", config.rss_k());

    let now = match &args.test_date {
        Some(value) => parse_test_date(value)?,
        None => Utc::now(),
    };
    let window = if args.week {
        ReportWindow::week_ending(now)
    } else {
        ReportWindow::previous_month(now)?
    };

    let report_path = window.report_path(&args.output_dir, args.format.extension());
    if window.kind == WindowKind::Monthly && report_path.exists() {
        if !args.force {
            info!(path = %report_path.display(), "Report already exists, nothing to do");
            return Ok(());
        }
        warn!(path = %report_path.display(), "Report already exists, recreating it");
    }

    info!(window = %window, path = %report_path.display(), "Creating report");

    let engine = Engine::new(config, registry)?;
    let source = JsonLinesSource::new(&args.query_records, &args.correctness_records);
    let report = engine.evaluate_source(&source, window)?;

    if !report.all_passed() {
        info!(
            failures = report.failures().count(),
            "Some metrics did not meet their thresholds"
        );
    }

    write_report(args, &report, &report_path)?;

    info!(path = %report_path.display(), "Finished report");
    Ok(())
}

fn write_report(args: &Args, report: &rssac047::MetricReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match args.format {
        ReportFormat::Text => std::fs::write(path, render_text(report, args.debug))?,
        ReportFormat::Json => std::fs::write(path, render_json(report)?)?,
        ReportFormat::Prometheus => PrometheusExporter::new()?.write_textfile(report, path)?,
    }

    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
