use crate::core::timeseries::align_ffill;
use crate::error::{AnalyzerError, Result};
use crate::fetcher::DataProvider;
use crate::models::{
    DataPoint, MarketVerdict, ValuationAssessment, ValuationSeries, ValuationSource,
};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Resolver progress. Each data path is attempted at most once per
/// request; the machine always terminates in `Resolved`.
#[derive(Debug)]
enum ResolverState {
    TryPrimary,
    TryFallback,
    Resolved(ValuationSeries),
}

/// Two-tier retrieval of the market-value/GDP ratio: compose it live from
/// index + GDP first, fall back to the precomputed series on any failure.
/// Valuation is supplementary, so the resolver never surfaces an error --
/// the worst outcome is an empty series tagged `Unavailable`.
pub struct FallbackResolver<'a> {
    provider: &'a dyn DataProvider,
}

impl<'a> FallbackResolver<'a> {
    pub fn new(provider: &'a dyn DataProvider) -> Self {
        Self { provider }
    }

    pub async fn resolve(&self, start: NaiveDate, end: NaiveDate) -> ValuationSeries {
        let mut state = ResolverState::TryPrimary;
        loop {
            state = match state {
                ResolverState::TryPrimary => match self.try_primary(start, end).await {
                    Ok(series) => ResolverState::Resolved(series),
                    Err(err) => {
                        warn!("primary valuation path failed: {err}");
                        ResolverState::TryFallback
                    }
                },
                ResolverState::TryFallback => match self.try_fallback(start, end).await {
                    Ok(series) => ResolverState::Resolved(series),
                    Err(err) => {
                        warn!("fallback valuation path failed: {err}");
                        ResolverState::Resolved(ValuationSeries::unavailable())
                    }
                },
                ResolverState::Resolved(series) => {
                    debug!(source = ?series.source, points = series.points.len(), "valuation resolved");
                    return series;
                }
            };
        }
    }

    async fn try_primary(&self, start: NaiveDate, end: NaiveDate) -> Result<ValuationSeries> {
        let (index, gdp) = self.provider.fetch_index_and_gdp(start, end).await?;
        let points = compose_ratio(&index, &gdp)?;
        Ok(ValuationSeries {
            source: ValuationSource::Primary,
            points,
        })
    }

    async fn try_fallback(&self, start: NaiveDate, end: NaiveDate) -> Result<ValuationSeries> {
        let points = self.provider.fetch_precomputed_ratio(start, end).await?;
        if points.is_empty() {
            return Err(AnalyzerError::EmptyResult(
                "precomputed ratio source returned no points".to_string(),
            ));
        }
        Ok(ValuationSeries {
            source: ValuationSource::Fallback,
            points,
        })
    }
}

/// Compose the valuation ratio from a full-cap index level and nominal
/// GDP. The index is scaled so one point is one billion dollars and GDP
/// is reported in billions, so the quotient is dimensionless; stored as a
/// percentage. Quarterly GDP is forward-filled under the daily index.
/// Zero-GDP points are undefined and dropped rather than turned into
/// infinities.
pub fn compose_ratio(index: &[DataPoint], gdp: &[DataPoint]) -> Result<Vec<DataPoint>> {
    if index.is_empty() || gdp.is_empty() {
        return Err(AnalyzerError::EmptyResult(
            "index or GDP series is empty".to_string(),
        ));
    }

    let aligned = align_ffill(index, gdp);
    if aligned.is_empty() {
        return Err(AnalyzerError::EmptyResult(
            "index and GDP series have no overlapping dates".to_string(),
        ));
    }

    let points: Vec<DataPoint> = aligned
        .into_iter()
        .filter_map(|(timestamp, market_value, gdp_value)| {
            if gdp_value == 0.0 {
                return None;
            }
            Some(DataPoint {
                timestamp,
                value: market_value / gdp_value * 100.0,
            })
        })
        .collect();

    if points.is_empty() {
        return Err(AnalyzerError::Division(
            "valuation ratio: GDP is zero at every aligned point".to_string(),
        ));
    }

    Ok(points)
}

/// Latest ratio against the historical median with a configurable band:
/// below `median * (1 - band)` reads cheap, above `median * (1 + band)`
/// expensive. Returns None for an empty series.
pub fn assess(series: &ValuationSeries, band: f64) -> Option<ValuationAssessment> {
    let last = series.points.last()?;
    let latest_pct = last.value;
    let median_pct = median(series.points.iter().map(|dp| dp.value).collect());

    let verdict = if latest_pct < median_pct * (1.0 - band) {
        MarketVerdict::Cheap
    } else if latest_pct > median_pct * (1.0 + band) {
        MarketVerdict::Expensive
    } else {
        MarketVerdict::NearMedian
    };

    Some(ValuationAssessment {
        latest_pct,
        median_pct,
        verdict,
    })
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
