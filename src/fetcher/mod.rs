use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::Config;
use crate::core::rate_limiter::RateLimiter;
use crate::error::Result;
use crate::models::DataPoint;

pub mod fred;
pub mod worldbank;
pub mod yahoo;

/// The three data paths the analysis pipeline consumes. Implementations
/// block until complete or error; no retries are expected here.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Closing prices for one security over [start, end].
    /// `NotFound` for an unknown ticker, `EmptyResult` when the range
    /// holds no quotes.
    async fn fetch_security_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DataPoint>>;

    /// Broad-market index level and nominal GDP over [start, end].
    /// `UpstreamUnavailable` on a source outage.
    async fn fetch_index_and_gdp(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(Vec<DataPoint>, Vec<DataPoint>)>;

    /// Precomputed market-value/GDP ratio over [start, end].
    /// `UpstreamUnavailable` on a source outage.
    async fn fetch_precomputed_ratio(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DataPoint>>;
}

/// Live wiring of the concrete sources: Yahoo for quotes, FRED for the
/// index/GDP pair, World Bank for the precomputed ratio.
pub struct LiveProvider {
    yahoo: yahoo::YahooFetcher,
    fred: fred::FredFetcher,
    worldbank: worldbank::WorldBankFetcher,
}

impl LiveProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            yahoo: yahoo::YahooFetcher::new(),
            fred: fred::FredFetcher::new(config.fred_api_key.clone()),
            worldbank: worldbank::WorldBankFetcher::new(),
        }
    }
}

#[async_trait]
impl DataProvider for LiveProvider {
    async fn fetch_security_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DataPoint>> {
        RateLimiter::wait("yahoo").await;
        self.yahoo.fetch_closing_prices(ticker, start, end).await
    }

    async fn fetch_index_and_gdp(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(Vec<DataPoint>, Vec<DataPoint>)> {
        RateLimiter::wait("fred").await;
        let index = self
            .fred
            .fetch_series(fred::WILSHIRE_SERIES, start, end)
            .await?;

        RateLimiter::wait("fred").await;
        let gdp = self.fred.fetch_series(fred::GDP_SERIES, start, end).await?;

        Ok((index, gdp))
    }

    async fn fetch_precomputed_ratio(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DataPoint>> {
        RateLimiter::wait("worldbank").await;
        self.worldbank.fetch_ratio(start, end).await
    }
}
