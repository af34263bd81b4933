//! Output formatting and persistence for stop reports.
//!
//! Supports pretty-printing, JSON serialization, and CSV append of the
//! ranking table.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::StopReport;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// One CSV row of the persisted ranking table.
#[derive(Debug, Serialize)]
struct RankingRow<'a> {
    stop_id: i64,
    distribution: &'a str,
    chi_square: f64,
    p_value: f64,
}

/// Logs a stop report using Rust's debug pretty-print format.
pub fn print_pretty(report: &StopReport) {
    debug!("{:#?}", report);
}

/// Logs a stop report as pretty-printed JSON.
pub fn print_json(report: &StopReport) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Appends the ranking of a [`StopReport`] as rows to a CSV file, best fit
/// first.
///
/// Creates the file with headers if it does not already exist.
pub fn append_ranking(path: &str, report: &StopReport) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending ranking rows");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for fit in &report.ranking {
        writer.serialize(RankingRow {
            stop_id: report.stop_id,
            distribution: fit.distribution,
            chi_square: fit.chi_square,
            p_value: fit.p_value,
        })?;
    }
    writer.flush()?;

    Ok(())
}
