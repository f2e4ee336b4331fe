use std::env;
use std::time::Duration;

const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_VALUATION_BAND: f64 = 0.10;

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// FRED API key (32 hex chars). Empty means the primary valuation
    /// path will fail fast and the resolver falls back.
    pub fred_api_key: String,
    /// Expiry for the request cache.
    pub cache_ttl: Duration,
    /// Half-width of the "near median" band used by the valuation
    /// assessment, as a fraction of the median (0.10 = ±10%).
    pub valuation_band: f64,
}

impl Config {
    pub fn from_env() -> Self {
        // Load .env if present; real environment variables win.
        dotenvy::dotenv().ok();

        let fred_api_key = env::var("FRED_API_KEY").unwrap_or_default();

        let cache_ttl = env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_CACHE_TTL_SECS));

        let valuation_band = env::var("VALUATION_BAND")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|b| *b >= 0.0)
            .unwrap_or(DEFAULT_VALUATION_BAND);

        Self {
            fred_api_key,
            cache_ttl,
            valuation_band,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fred_api_key: String::new(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            valuation_band: DEFAULT_VALUATION_BAND,
        }
    }
}
