//! CLI entry point for the bus arrival fitting tool.
//!
//! Provides subcommands for fitting candidate distributions to per-stop
//! inter-arrival times and for preparing the input table from raw datagram
//! dumps (single-day reformat and multi-day aggregation).

use anyhow::{Context, Result};
use bus_arrival_fit::analysis::{FitConfig, run_fit};
use bus_arrival_fit::etl::{DATE_FORMAT, TimeWindow, aggregate::aggregate, reformat::reformat};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bus_arrival_fit")]
#[command(about = "A tool to fit arrival-time distributions to bus telemetry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank candidate distributions against per-stop inter-arrival times
    Fit {
        /// CSV table with stop_id and Ai columns
        #[arg(short, long, default_value = "interarrival_times.csv")]
        input: String,

        /// Stop identifiers to analyze
        #[arg(short, long, value_delimiter = ',', default_value = "500200")]
        stops: Vec<i64>,

        /// Number of percentile points for the chi-squared binning
        #[arg(short, long, default_value_t = 5)]
        bins: usize,

        /// How many best-fitting distributions to re-fit and report
        #[arg(short = 'n', long, default_value_t = 2)]
        top_n: usize,

        /// CSV file to append ranking rows to
        #[arg(short, long, default_value = "rankings.csv")]
        output: String,
    },
    /// Filter one raw datagram dump by line id and time window
    Reformat {
        /// Headerless datagram dump to read
        #[arg(value_name = "FILE")]
        input: String,

        #[arg(short, long, default_value = "datagrams_generated.csv")]
        output: String,

        /// Line identifiers to keep
        #[arg(short, long, value_delimiter = ',', default_value = "131")]
        lines: Vec<i64>,

        /// Window lower bound, "YYYY-MM-DD HH:MM" (exclusive)
        #[arg(long, default_value = "2019-04-02 05:00")]
        lower: String,

        /// Window upper bound, "YYYY-MM-DD HH:MM" (exclusive)
        #[arg(long, default_value = "2019-04-02 11:00")]
        upper: String,
    },
    /// Merge daily datagram dumps into one sorted, window-filtered CSV
    Aggregate {
        /// Headerless datagram dumps to merge
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<String>,

        #[arg(short, long, default_value = "datagrams_aggregated_generated.csv")]
        output: String,

        /// Line identifiers to keep
        #[arg(short, long, value_delimiter = ',', default_value = "131")]
        lines: Vec<i64>,

        /// Date stamped onto the merged rows (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Window start time of day, "HH:MM" (exclusive)
        #[arg(long, default_value = "05:00")]
        start: String,

        /// Window end time of day, "HH:MM" (exclusive)
        #[arg(long, default_value = "11:00")]
        end: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bus_arrival_fit.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bus_arrival_fit.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fit {
            input,
            stops,
            bins,
            top_n,
            output,
        } => {
            let config = FitConfig {
                input,
                stop_ids: stops,
                bins,
                top_n,
            };
            run_fit(&config, &output)?;
        }
        Commands::Reformat {
            input,
            output,
            lines,
            lower,
            upper,
        } => {
            let window = TimeWindow {
                lower: parse_bound(&lower)?,
                upper: parse_bound(&upper)?,
            };
            reformat(&input, &output, &lines, &window)?;
        }
        Commands::Aggregate {
            inputs,
            output,
            lines,
            date,
            start,
            end,
        } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let window = (parse_time(&start)?, parse_time(&end)?);
            aggregate(&inputs, &output, &lines, date, window)?;
        }
    }

    Ok(())
}

/// Parses a window bound given as "YYYY-MM-DD HH:MM" or with seconds.
fn parse_bound(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, DATE_FORMAT))
        .with_context(|| format!("parsing window bound `{value}`"))
}

/// Parses a time of day given as "HH:MM" or with seconds.
fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .with_context(|| format!("parsing time of day `{value}`"))
}
