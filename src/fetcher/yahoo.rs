use crate::error::{AnalyzerError, Result};
use crate::models::DataPoint;
use chrono::{NaiveDate, TimeZone, Utc};
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

pub struct YahooFetcher;

impl YahooFetcher {
    pub fn new() -> Self {
        YahooFetcher
    }

    /// Daily closing prices for a ticker over [start, end], ascending,
    /// one point per calendar day.
    pub async fn fetch_closing_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DataPoint>> {
        let provider =
            yahoo::YahooConnector::new().map_err(|e| AnalyzerError::UpstreamUnavailable {
                upstream: "yahoo",
                reason: format!("failed to init connector: {}", e),
            })?;

        // The Yahoo client speaks the 'time' crate; convert the chrono
        // bounds through unix seconds.
        let range_start = to_offset(start, false)?;
        let range_end = to_offset(end, true)?;

        debug!(ticker, %start, %end, "yahoo quote history fetch");

        let resp = provider
            .get_quote_history(ticker, range_start, range_end)
            .await
            .map_err(|e| AnalyzerError::NotFound(format!("{}: {}", ticker, e)))?;

        let quotes = resp
            .quotes()
            .map_err(|e| AnalyzerError::UpstreamUnavailable {
                upstream: "yahoo",
                reason: format!("failed to parse quotes: {}", e),
            })?;

        let mut data_points = Vec::with_capacity(quotes.len());
        for quote in quotes {
            // Quote timestamps are unix seconds somewhere inside the
            // trading day; normalize to start of day UTC.
            let day = Utc
                .timestamp_opt(quote.timestamp as i64, 0)
                .single()
                .ok_or_else(|| AnalyzerError::UpstreamUnavailable {
                    upstream: "yahoo",
                    reason: format!("invalid quote timestamp {}", quote.timestamp),
                })?
                .date_naive();

            data_points.push(DataPoint {
                timestamp: Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).unwrap()),
                value: quote.close,
            });
        }

        if data_points.is_empty() {
            return Err(AnalyzerError::EmptyResult(format!(
                "no quotes for {} between {} and {}",
                ticker, start, end
            )));
        }

        // Ascending, at most one point per day.
        data_points.sort_by_key(|dp| dp.timestamp);
        data_points.dedup_by_key(|dp| dp.timestamp);

        Ok(data_points)
    }
}

impl Default for YahooFetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn to_offset(date: NaiveDate, end_of_day: bool) -> Result<OffsetDateTime> {
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    let secs = time.unwrap().and_utc().timestamp();

    OffsetDateTime::from_unix_timestamp(secs).map_err(|e| {
        AnalyzerError::InvalidInput(format!("date {} out of unix range: {}", date, e))
    })
}
