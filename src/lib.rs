pub mod analysis;
pub mod config;
pub mod core;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod valuation;

pub use config::Config;
pub use error::AnalyzerError;
pub use models::{AnalysisReport, AnalysisRequest, TrendMethod};

use crate::analysis::{distance, trend};
use crate::core::cache::{CacheKey, CachedFetch, RequestCache};
use crate::core::timeseries;
use crate::fetcher::DataProvider;
use crate::valuation::FallbackResolver;
use tracing::{debug, info};

/// Run one full analysis request: fetch (or reuse cached) data, fit the
/// requested trend, measure the distance from it and resolve the
/// valuation gauge.
///
/// Price-fetch failures are terminal; a missing valuation is not -- the
/// report then carries an empty series tagged `Unavailable`.
pub async fn run_analysis(
    provider: &dyn DataProvider,
    cache: &RequestCache,
    config: &Config,
    request: &AnalysisRequest,
) -> Result<AnalysisReport, AnalyzerError> {
    if request.ticker.trim().is_empty() {
        return Err(AnalyzerError::InvalidInput("ticker is empty".to_string()));
    }
    if request.start >= request.end {
        return Err(AnalyzerError::InvalidInput(format!(
            "start {} is not before end {}",
            request.start, request.end
        )));
    }

    // 1. Fetch through the cache; one entry per exact input tuple.
    let key = CacheKey {
        ticker: request.ticker.clone(),
        start: request.start,
        end: request.end,
    };

    let fetched = match cache.get(&key) {
        Some(hit) => {
            debug!(ticker = %request.ticker, "cache hit");
            hit
        }
        None => {
            let prices = provider
                .fetch_security_prices(&request.ticker, request.start, request.end)
                .await?;
            timeseries::ensure_strictly_increasing("price", &prices)?;

            let valuation = FallbackResolver::new(provider)
                .resolve(request.start, request.end)
                .await;

            let bundle = CachedFetch { prices, valuation };
            cache.put(key, bundle.clone());
            bundle
        }
    };

    // 2. Fit the ideal trajectory over the prices in hand.
    let trend_series = match request.method {
        TrendMethod::LogLinear => trend::log_linear_trend(&fetched.prices)?,
        TrendMethod::Smoothed => trend::smoothed_log_trend(
            &fetched.prices,
            request.smoothing_window,
            request.polyorder,
        )?,
    };

    // 3. Distance from the ideal; the last defined point is the headline.
    let distance_series = distance::pct_distance(&fetched.prices, &trend_series)?;
    let latest_distance_pct = distance::latest_defined(&distance_series).and_then(|dp| dp.value);

    let assessment = valuation::assess(&fetched.valuation, config.valuation_band);

    info!(
        ticker = %request.ticker,
        points = fetched.prices.len(),
        valuation_source = ?fetched.valuation.source,
        "analysis complete"
    );

    Ok(AnalysisReport {
        request: request.clone(),
        prices: fetched.prices,
        trend: trend_series,
        distance: distance_series,
        latest_distance_pct,
        valuation: fetched.valuation,
        assessment,
    })
}
