use crate::error::{AnalyzerError, Result};
use crate::models::DataPoint;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Rejects series whose timestamps are not strictly increasing.
/// Every downstream computation assumes ordered, duplicate-free input.
pub fn ensure_strictly_increasing(name: &str, series: &[DataPoint]) -> Result<()> {
    for pair in series.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(AnalyzerError::InvalidInput(format!(
                "{} series is not strictly increasing at {}",
                name,
                pair[1].timestamp.format("%Y-%m-%d")
            )));
        }
    }
    Ok(())
}

/// Aligns two series of different frequencies by forward-filling the
/// slower one under the master's timestamps (e.g. quarterly GDP under a
/// daily index). Master dates before the slow series starts are dropped,
/// so the result is an inner join on the overlapping span.
///
/// Returns (timestamp, master_value, slow_value) tuples.
pub fn align_ffill(master: &[DataPoint], slow: &[DataPoint]) -> Vec<(DateTime<Utc>, f64, f64)> {
    let slow_map: BTreeMap<DateTime<Utc>, f64> =
        slow.iter().map(|dp| (dp.timestamp, dp.value)).collect();

    let mut result = Vec::with_capacity(master.len());
    let mut last_slow: Option<f64> = None;
    let mut slow_iter = slow_map.iter().peekable();

    for dp in master {
        // Advance the slow iterator up to the master date; the last
        // consumed value is the one in effect at that date.
        while let Some((slow_date, slow_val)) = slow_iter.peek() {
            if **slow_date <= dp.timestamp {
                last_slow = Some(**slow_val);
                slow_iter.next();
            } else {
                break;
            }
        }

        if let Some(slow_val) = last_slow {
            result.push((dp.timestamp, dp.value, slow_val));
        }
    }

    result
}

/// Keeps only the points whose date falls inside [start, end].
pub fn clip_range(series: Vec<DataPoint>, start: NaiveDate, end: NaiveDate) -> Vec<DataPoint> {
    series
        .into_iter()
        .filter(|dp| {
            let date = dp.timestamp.date_naive();
            date >= start && date <= end
        })
        .collect()
}
