use crate::error::{AnalyzerError, Result};
use crate::models::DataPoint;
use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

/// Wilshire 5000 full-cap index; scaled so one index point is one billion
/// dollars of market value.
pub const WILSHIRE_SERIES: &str = "WILL5000PRFC";
/// Nominal GDP, billions of dollars, quarterly.
pub const GDP_SERIES: &str = "GDP";

pub struct FredFetcher {
    api_key: String,
    client: Client,
}

impl FredFetcher {
    pub fn new(api_key: String) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("TrajectoryAnalyzer/1.0"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { api_key, client }
    }

    /// Fetch one FRED series restricted to [start, end].
    pub async fn fetch_series(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DataPoint>> {
        // FRED keys are 32 lowercase hex chars; normalize before use and
        // never log the key itself.
        let sanitized_key = self.api_key.trim().to_lowercase();
        debug!(series_id, key_len = sanitized_key.len(), "FRED fetch");

        if sanitized_key.is_empty() {
            return Err(AnalyzerError::UpstreamUnavailable {
                upstream: "fred",
                reason: "FRED API key is empty or missing".to_string(),
            });
        }
        if sanitized_key.len() != 32 {
            warn!(
                key_len = sanitized_key.len(),
                "FRED API key length is not 32; the request will likely fail"
            );
        }

        let url = format!(
            "https://api.stlouisfed.org/fred/series/observations?series_id={}&api_key={}&file_type=json&observation_start={}&observation_end={}",
            series_id,
            sanitized_key,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AnalyzerError::UpstreamUnavailable {
                upstream: "fred",
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(AnalyzerError::UpstreamUnavailable {
                upstream: "fred",
                reason: format!("{} - {}", status, error_text),
            });
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| AnalyzerError::UpstreamUnavailable {
                upstream: "fred",
                reason: e.to_string(),
            })?;

        Self::parse_observations(&json)
    }

    fn parse_observations(json: &Value) -> Result<Vec<DataPoint>> {
        let observations = json["observations"].as_array().ok_or_else(|| {
            AnalyzerError::UpstreamUnavailable {
                upstream: "fred",
                reason: "no observations in response".to_string(),
            }
        })?;

        let mut data_points = Vec::new();

        for obs in observations {
            // "date": "2023-01-01", "value": "123.45"
            if let (Some(date_str), Some(value_str)) = (obs["date"].as_str(), obs["value"].as_str())
            {
                // FRED marks missing observations with "."; skip them
                // rather than coercing to zero.
                if value_str == "." {
                    continue;
                }

                if let Ok(value) = value_str.parse::<f64>() {
                    let naive_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                        .map_err(|e| AnalyzerError::UpstreamUnavailable {
                            upstream: "fred",
                            reason: format!("bad observation date '{}': {}", date_str, e),
                        })?;
                    let timestamp =
                        Utc.from_utc_datetime(&naive_date.and_hms_opt(0, 0, 0).unwrap());

                    data_points.push(DataPoint { timestamp, value });
                }
            }
        }

        Ok(data_points)
    }
}
