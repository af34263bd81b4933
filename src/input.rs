//! CSV input for the inter-arrival-time table.
//!
//! The table is produced upstream by the `reformat`/`aggregate` ETL steps
//! and carries at least a `stop_id` column (integer) and an `Ai` column
//! (inter-arrival time in seconds). Extra columns are ignored.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;

/// One observed arrival event.
#[derive(Debug, Clone, Deserialize)]
pub struct ArrivalRow {
    pub stop_id: i64,
    #[serde(rename = "Ai")]
    pub ai: f64,
}

/// Reads the full inter-arrival table into memory.
pub fn load_arrivals(path: &str) -> Result<Vec<ArrivalRow>> {
    let file = File::open(path).with_context(|| format!("opening arrival table {path}"))?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: ArrivalRow = result?;
        rows.push(record);
    }

    Ok(rows)
}

/// Human-readable labels for the stops of the reference corridor (line T31).
pub fn stop_label(stop_id: i64) -> Option<&'static str> {
    match stop_id {
        500200 => Some("Chiminangos_A2"),
        500300 => Some("Salomia_A"),
        500301 => Some("Salomia_B"),
        500350 => Some("Popular_A"),
        500353 => Some("Popular_B"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_load_arrivals_reads_rows() {
        let path = temp_path("bus_arrival_fit_test_load.csv");
        fs::write(&path, "stop_id,Ai\n500200,120.0\n500200,340.5\n500300,88.0\n").unwrap();

        let rows = load_arrivals(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].stop_id, 500200);
        assert_eq!(rows[1].ai, 340.5);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_arrivals_ignores_extra_columns() {
        let path = temp_path("bus_arrival_fit_test_extra.csv");
        fs::write(&path, "stop_id,Ai,bus_id\n500200,60.0,9001\n").unwrap();

        let rows = load_arrivals(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ai, 60.0);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_arrivals_missing_file_errors() {
        assert!(load_arrivals("/nonexistent/interarrival_times.csv").is_err());
    }

    #[test]
    fn test_stop_label_known_and_unknown() {
        assert_eq!(stop_label(500200), Some("Chiminangos_A2"));
        assert_eq!(stop_label(1), None);
    }
}
