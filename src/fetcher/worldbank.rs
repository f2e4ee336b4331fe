use crate::core::timeseries::clip_range;
use crate::error::{AnalyzerError, Result};
use crate::models::DataPoint;
use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// Market capitalization of listed domestic companies, % of GDP, yearly.
/// This is the precomputed ratio the resolver falls back to.
pub const MARKET_CAP_GDP_INDICATOR: &str = "CM.MKT.LCAP.GD.ZS";

pub struct WorldBankFetcher {
    client: Client,
}

impl WorldBankFetcher {
    pub fn new() -> Self {
        let client = Client::builder().build().unwrap_or_else(|_| Client::new());
        Self { client }
    }

    /// Fetch the precomputed valuation ratio, clipped to [start, end].
    pub async fn fetch_ratio(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DataPoint>> {
        let url = format!(
            "https://api.worldbank.org/v2/country/US/indicator/{}?format=json&per_page=1000",
            MARKET_CAP_GDP_INDICATOR
        );

        debug!(%url, "World Bank fetch");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AnalyzerError::UpstreamUnavailable {
                upstream: "worldbank",
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(AnalyzerError::UpstreamUnavailable {
                upstream: "worldbank",
                reason: format!("status {}", resp.status()),
            });
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| AnalyzerError::UpstreamUnavailable {
                upstream: "worldbank",
                reason: e.to_string(),
            })?;

        let all = Self::parse_observations(&json)?;
        let clipped = clip_range(all, start, end);

        if clipped.is_empty() {
            return Err(AnalyzerError::EmptyResult(format!(
                "no precomputed ratio observations between {} and {}",
                start, end
            )));
        }

        Ok(clipped)
    }

    fn parse_observations(json: &Value) -> Result<Vec<DataPoint>> {
        // World Bank responses are [metadata, [observations...]]; the
        // data sits in the second element.
        let data_array = json
            .as_array()
            .and_then(|arr| arr.get(1))
            .and_then(|val| val.as_array())
            .ok_or_else(|| AnalyzerError::UpstreamUnavailable {
                upstream: "worldbank",
                reason: "unexpected response envelope".to_string(),
            })?;

        let mut data_points = Vec::new();

        for obs in data_array {
            // "date": "2023", "value": 123.45 (or a string, or null for
            // missing years; nulls are skipped, never zeroed)
            let date_str = match obs["date"].as_str() {
                Some(d) => d,
                None => continue,
            };
            let value = match &obs["value"] {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.parse::<f64>().ok(),
                _ => None,
            };

            if let Some(value) = value {
                // Yearly observations land on Jan 1.
                let full_date = format!("{}-01-01", date_str);
                if let Ok(naive_date) = NaiveDate::parse_from_str(&full_date, "%Y-%m-%d") {
                    let timestamp =
                        Utc.from_utc_datetime(&naive_date.and_hms_opt(0, 0, 0).unwrap());
                    data_points.push(DataPoint { timestamp, value });
                }
            }
        }

        // API returns newest first; sort ascending.
        data_points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        Ok(data_points)
    }
}

impl Default for WorldBankFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_wb_response() {
        let json_data = json!([
            { "page": 1, "pages": 1, "per_page": 50, "total": 2 },
            [
                { "indicator": { "id": "CM.MKT.LCAP.GD.ZS" }, "country": { "id": "US" }, "date": "2023", "value": 158.0 },
                { "indicator": { "id": "CM.MKT.LCAP.GD.ZS" }, "country": { "id": "US" }, "date": "2022", "value": 141.5 }
            ]
        ]);

        let points = WorldBankFetcher::parse_observations(&json_data).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, 141.5); // 2022 first after ASC sort
        assert_eq!(points[1].value, 158.0);
    }

    #[test]
    fn test_parse_skips_null_years() {
        let json_data = json!([
            { "page": 1 },
            [
                { "date": "2024", "value": null },
                { "date": "2023", "value": "158.0" }
            ]
        ]);

        let points = WorldBankFetcher::parse_observations(&json_data).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 158.0);
    }

    #[test]
    fn test_parse_bad_envelope() {
        let json_data = json!({ "message": "invalid indicator" });
        assert!(WorldBankFetcher::parse_observations(&json_data).is_err());
    }
}
