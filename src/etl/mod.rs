//! Upstream data preparation for raw bus telemetry dumps.
//!
//! Datagram dumps arrive as headerless CSV, one row per vehicle position
//! report. `reformat` filters a single dump by line id and time window into
//! the canonical column order; `aggregate` merges several daily dumps into
//! one time-of-day-sorted table under a single date.

pub mod aggregate;
pub mod reformat;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp format used across the datagram CSVs.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One raw telemetry datagram, in the column order of the upstream dumps.
#[derive(Debug, Clone, Deserialize)]
pub struct Datagram {
    pub event_type: i64,
    pub short_datagram_date: String,
    pub stop_id: i64,
    pub odometer: i64,
    pub latitude: i64,
    pub longitude: i64,
    pub task_id: i64,
    pub line_id: i64,
    pub trip_id: i64,
    pub unknown1: i64,
    pub datagram_date: String,
    pub bus_id: i64,
}

/// A datagram projected to the canonical output column order.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalRow {
    pub datagram_date: String,
    pub bus_id: i64,
    pub stop_id: i64,
    pub odometer: i64,
    pub longitude: i64,
    pub latitude: i64,
    pub task_id: i64,
    pub line_id: i64,
    pub trip_id: i64,
    pub event_type: i64,
}

impl CanonicalRow {
    pub fn from_datagram(d: &Datagram, datagram_date: String) -> Self {
        CanonicalRow {
            datagram_date,
            bus_id: d.bus_id,
            stop_id: d.stop_id,
            odometer: d.odometer,
            longitude: d.longitude,
            latitude: d.latitude,
            task_id: d.task_id,
            line_id: d.line_id,
            trip_id: d.trip_id,
            event_type: d.event_type,
        }
    }
}

/// Exclusive datetime bounds for row filtering.
#[derive(Debug, Clone, Copy)]
pub struct TimeWindow {
    pub lower: NaiveDateTime,
    pub upper: NaiveDateTime,
}

impl TimeWindow {
    /// Strict containment on both ends, matching the upstream filters.
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        t > self.lower && t < self.upper
    }
}

/// Reads all datagrams from a headerless CSV dump.
pub fn read_datagrams(path: &str) -> anyhow::Result<Vec<Datagram>> {
    let file = std::fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("opening datagram dump {path}: {e}"))?;
    let mut rdr = csv::ReaderBuilder::new().has_headers(false).from_reader(file);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: Datagram = result?;
        rows.push(record);
    }
    Ok(rows)
}
