use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};

/// One observation in a time series. Timestamps are start-of-day UTC;
/// series are kept strictly increasing with no duplicate timestamps.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Trend-fitting method selected by the presentation layer.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TrendMethod {
    #[serde(rename = "log-linear")]
    LogLinear,
    #[serde(rename = "smoothed")]
    Smoothed,
}

/// Which data path produced a valuation series.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValuationSource {
    /// Composed live from index level and GDP.
    Primary,
    /// Loaded from the precomputed ratio source.
    Fallback,
    /// Both paths failed; the series is empty.
    Unavailable,
}

/// Market-value/GDP ratio series, tagged with its provenance so consumers
/// never have to guess where the numbers came from.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ValuationSeries {
    pub source: ValuationSource,
    pub points: Vec<DataPoint>,
}

impl ValuationSeries {
    pub fn unavailable() -> Self {
        Self {
            source: ValuationSource::Unavailable,
            points: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Percent deviation at one timestamp. `None` marks an undefined point
/// (zero denominator or missing actual value), never a computed zero.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct DistancePoint {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

/// Verdict of the latest valuation ratio against its historical median.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum MarketVerdict {
    Cheap,
    NearMedian,
    Expensive,
}

/// Latest ratio vs historical median, both in percent of GDP.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ValuationAssessment {
    pub latest_pct: f64,
    pub median_pct: f64,
    pub verdict: MarketVerdict,
}

/// One user request: ticker, date range and trend parameters.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub ticker: String,
    #[serde(rename = "start_date")]
    pub start: NaiveDate,
    #[serde(rename = "end_date")]
    pub end: NaiveDate,
    #[serde(rename = "trend_method")]
    pub method: TrendMethod,
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
    #[serde(default = "default_polyorder")]
    pub polyorder: usize,
}

fn default_smoothing_window() -> usize {
    63
}

fn default_polyorder() -> usize {
    2
}

impl AnalysisRequest {
    pub fn new(ticker: &str, start: NaiveDate, end: NaiveDate, method: TrendMethod) -> Self {
        Self {
            ticker: ticker.to_string(),
            start,
            end,
            method,
            smoothing_window: default_smoothing_window(),
            polyorder: default_polyorder(),
        }
    }
}

/// Everything the presentation layer needs to render one request.
/// Immutable once produced; discarded when the request completes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AnalysisReport {
    pub request: AnalysisRequest,
    pub prices: Vec<DataPoint>,
    pub trend: Vec<DataPoint>,
    pub distance: Vec<DistancePoint>,
    /// Last defined point of the distance series ("current deviation").
    pub latest_distance_pct: Option<f64>,
    pub valuation: ValuationSeries,
    pub assessment: Option<ValuationAssessment>,
}
