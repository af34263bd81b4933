//! Merges several daily datagram dumps into one sorted table.
//!
//! Each dump covers a different service day of the same line. Rows are
//! filtered by line id, reduced to their time of day, re-stamped onto a
//! single target date, sorted ascending by timestamp, and window-filtered,
//! so the merged table reads as one synthetic service day.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::info;

use super::{CanonicalRow, DATE_FORMAT, TimeWindow, read_datagrams};

/// Aggregates `inputs` into `output` under `date`. `window` bounds the time
/// of day (exclusive on both ends). Returns the number of rows written.
pub fn aggregate(
    inputs: &[String],
    output: &str,
    lines: &[i64],
    date: NaiveDate,
    window: (NaiveTime, NaiveTime),
) -> Result<usize> {
    let mut stamped: Vec<(NaiveDateTime, CanonicalRow)> = Vec::new();

    for input in inputs {
        let datagrams = read_datagrams(input)?;
        info!(rows = datagrams.len(), input, "Datagram dump loaded");

        for d in datagrams.iter().filter(|d| lines.contains(&d.line_id)) {
            let t = NaiveDateTime::parse_from_str(&d.datagram_date, DATE_FORMAT)
                .with_context(|| format!("parsing datagram date `{}`", d.datagram_date))?;

            // keep the time of day, re-stamp onto the target date
            let restamped = NaiveDateTime::new(date, t.time());
            stamped.push((
                restamped,
                CanonicalRow::from_datagram(d, restamped.format(DATE_FORMAT).to_string()),
            ));
        }
    }

    stamped.sort_by_key(|(t, _)| *t);

    let bounds = TimeWindow {
        lower: NaiveDateTime::new(date, window.0),
        upper: NaiveDateTime::new(date, window.1),
    };

    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("creating output file {output}"))?;

    let mut kept = 0;
    for (t, row) in stamped {
        if !bounds.contains(t) {
            continue;
        }
        writer.serialize(row)?;
        kept += 1;
    }
    writer.flush()?;

    info!(kept, output, "Aggregation complete");
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::tests::write_temp;
    use std::fs;

    const DAY_ONE: &str = "\
1,06:45:10,500200,12000,342,-765,7,131,901,0,2019-04-02 06:45:10,3301
1,04:30:00,500200,11000,342,-765,7,131,902,0,2019-04-02 04:30:00,3302
";

    const DAY_TWO: &str = "\
1,05:15:00,500200,11500,342,-765,7,131,905,0,2019-04-09 05:15:00,3305
1,06:20:00,500200,11800,342,-765,7,205,906,0,2019-04-09 06:20:00,3306
";

    #[test]
    fn test_aggregate_merges_sorts_and_restamps() {
        let in1 = write_temp("bus_arrival_fit_test_agg1.csv", DAY_ONE);
        let in2 = write_temp("bus_arrival_fit_test_agg2.csv", DAY_TWO);
        let output = write_temp("bus_arrival_fit_test_agg_out.csv", "");

        let date = NaiveDate::from_ymd_opt(2019, 4, 30).unwrap();
        let window = (
            NaiveTime::from_hms_opt(5, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        );

        // the 04:30 row falls outside the window, the line-205 row is dropped
        let kept = aggregate(
            &[in1.clone(), in2.clone()],
            &output,
            &[131],
            date,
            window,
        )
        .unwrap();
        assert_eq!(kept, 2);

        let content = fs::read_to_string(&output).unwrap();
        let data: Vec<&str> = content.lines().skip(1).collect();
        // sorted by time of day, all under the target date
        assert!(data[0].starts_with("2019-04-30 05:15:00,3305"));
        assert!(data[1].starts_with("2019-04-30 06:45:10,3301"));

        fs::remove_file(&in1).unwrap();
        fs::remove_file(&in2).unwrap();
        fs::remove_file(&output).unwrap();
    }
}
