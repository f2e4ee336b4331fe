use crate::error::{AnalyzerError, Result};
use crate::models::{DataPoint, DistancePoint};
use std::collections::HashMap;

/// Percent deviation of the actual series from its ideal trajectory,
/// `(actual - ideal) / ideal * 100` pointwise over the ideal's index.
///
/// The actual series is looked up by calendar date (intraday stamps and
/// start-of-day stamps land on the same point). A point is undefined
/// (`None`) where the ideal value is zero or the actual value is missing;
/// it is never coerced to zero or infinity.
pub fn pct_distance(actual: &[DataPoint], ideal: &[DataPoint]) -> Result<Vec<DistancePoint>> {
    if ideal.is_empty() {
        return Err(AnalyzerError::EmptyResult(
            "ideal series is empty".to_string(),
        ));
    }

    let actual_map: HashMap<chrono::NaiveDate, f64> = actual
        .iter()
        .map(|dp| (dp.timestamp.date_naive(), dp.value))
        .collect();

    Ok(ideal
        .iter()
        .map(|ip| {
            let value = match actual_map.get(&ip.timestamp.date_naive()) {
                Some(&a) if ip.value != 0.0 => Some((a - ip.value) / ip.value * 100.0),
                _ => None,
            };
            DistancePoint {
                timestamp: ip.timestamp,
                value,
            }
        })
        .collect())
}

/// Last defined point of a distance series; what the summary panel shows
/// as the current deviation.
pub fn latest_defined(series: &[DistancePoint]) -> Option<DistancePoint> {
    series.iter().rev().find(|dp| dp.value.is_some()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series(values: &[f64]) -> Vec<DataPoint> {
        let day0 = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| DataPoint {
                timestamp: (day0 + Duration::days(i as i64))
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    .and_utc(),
                value,
            })
            .collect()
    }

    #[test]
    fn test_identical_series_is_zero_everywhere() {
        let actual = series(&[100.0, 105.0, 110.0]);
        let dist = pct_distance(&actual, &actual).unwrap();

        assert_eq!(dist.len(), 3);
        for dp in dist {
            assert_eq!(dp.value, Some(0.0));
        }
    }

    #[test]
    fn test_single_point_ten_percent() {
        let actual = series(&[110.0]);
        let ideal = series(&[100.0]);

        let dist = pct_distance(&actual, &ideal).unwrap();
        assert_eq!(dist[0].value, Some(10.0));
    }

    #[test]
    fn test_zero_ideal_is_undefined_not_infinite() {
        let actual = series(&[110.0, 120.0]);
        let ideal = series(&[100.0, 0.0]);

        let dist = pct_distance(&actual, &ideal).unwrap();
        assert_eq!(dist[0].value, Some(10.0));
        assert_eq!(dist[1].value, None);
    }

    #[test]
    fn test_missing_actual_is_undefined_not_zero() {
        let actual = series(&[110.0]); // one day only
        let ideal = series(&[100.0, 100.0]); // two days

        let dist = pct_distance(&actual, &ideal).unwrap();
        assert_eq!(dist.len(), 2);
        assert_eq!(dist[0].value, Some(10.0));
        assert_eq!(dist[1].value, None);
    }

    #[test]
    fn test_empty_ideal_fails() {
        let actual = series(&[110.0]);
        assert!(pct_distance(&actual, &[]).is_err());
    }

    #[test]
    fn test_latest_defined_skips_trailing_undefined() {
        let actual = series(&[110.0]);
        let ideal = series(&[100.0, 100.0]);

        let dist = pct_distance(&actual, &ideal).unwrap();
        let latest = latest_defined(&dist).unwrap();
        assert_eq!(latest.value, Some(10.0));
        assert_eq!(latest.timestamp, ideal[0].timestamp);

        assert!(latest_defined(&[]).is_none());
    }
}
