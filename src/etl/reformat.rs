//! Filters one raw datagram dump by line id and time window.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::info;

use super::{CanonicalRow, DATE_FORMAT, TimeWindow, read_datagrams};

/// Reads `input`, keeps rows whose line id is in `lines` and whose timestamp
/// lies strictly inside `window`, and writes them in canonical column order
/// with headers. Returns the number of rows written.
pub fn reformat(input: &str, output: &str, lines: &[i64], window: &TimeWindow) -> Result<usize> {
    let datagrams = read_datagrams(input)?;
    info!(rows = datagrams.len(), input, "Datagram dump loaded");

    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("creating output file {output}"))?;

    let mut kept = 0;
    for d in datagrams.iter().filter(|d| lines.contains(&d.line_id)) {
        let t = NaiveDateTime::parse_from_str(&d.datagram_date, DATE_FORMAT)
            .with_context(|| format!("parsing datagram date `{}`", d.datagram_date))?;

        if !window.contains(t) {
            continue;
        }

        writer.serialize(CanonicalRow::from_datagram(
            d,
            t.format(DATE_FORMAT).to_string(),
        ))?;
        kept += 1;
    }
    writer.flush()?;

    info!(kept, output, "Reformat complete");
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::tests::{SAMPLE_DUMP, write_temp};
    use std::fs;

    fn window() -> TimeWindow {
        TimeWindow {
            lower: NaiveDateTime::parse_from_str("2019-04-02 05:00:00", DATE_FORMAT).unwrap(),
            upper: NaiveDateTime::parse_from_str("2019-04-02 11:00:00", DATE_FORMAT).unwrap(),
        }
    }

    #[test]
    fn test_reformat_filters_line_and_window() {
        let input = write_temp("bus_arrival_fit_test_reformat_in.csv", SAMPLE_DUMP);
        let output = write_temp("bus_arrival_fit_test_reformat_out.csv", "");

        // line 131 only; the 12:10 row falls outside the window and the
        // line-205 row is filtered out
        let kept = reformat(&input, &output, &[131], &window()).unwrap();
        assert_eq!(kept, 2);

        let content = fs::read_to_string(&output).unwrap();
        let mut lines_iter = content.lines();
        assert_eq!(
            lines_iter.next().unwrap(),
            "datagram_date,bus_id,stop_id,odometer,longitude,latitude,task_id,line_id,trip_id,event_type"
        );
        assert!(content.contains("2019-04-02 06:45:10,3301"));
        assert!(content.contains("2019-04-02 05:30:00,3302"));
        assert!(!content.contains("3303"));
        assert!(!content.contains("3304"));

        fs::remove_file(&input).unwrap();
        fs::remove_file(&output).unwrap();
    }

    #[test]
    fn test_reformat_reorders_columns() {
        let input = write_temp("bus_arrival_fit_test_reorder_in.csv", SAMPLE_DUMP);
        let output = write_temp("bus_arrival_fit_test_reorder_out.csv", "");

        reformat(&input, &output, &[131], &window()).unwrap();

        let content = fs::read_to_string(&output).unwrap();
        // longitude comes before latitude in the canonical order
        let data_line = content.lines().nth(1).unwrap();
        assert_eq!(data_line, "2019-04-02 06:45:10,3301,500200,12000,-765,342,7,131,901,1");

        fs::remove_file(&input).unwrap();
        fs::remove_file(&output).unwrap();
    }
}
