use anyhow::Result;
use chrono::{Duration, Utc};
use trajectory_analyzer::core::cache::RequestCache;
use trajectory_analyzer::fetcher::LiveProvider;
use trajectory_analyzer::models::ValuationSource;
use trajectory_analyzer::{run_analysis, AnalysisRequest, Config, TrendMethod};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    let provider = LiveProvider::new(&config);
    let cache = RequestCache::new(config.cache_ttl);

    let end = Utc::now().date_naive();
    let start = end - Duration::days(365 * 3);

    println!("🔍 Trajectory check - {} to {}", start, end);
    println!(
        "\n{:<8} | {:>10} | {:>10} | {:>8}",
        "Ticker", "Last", "Trend", "Dist %"
    );
    println!("{}", "-".repeat(46));

    let mut valuation_shown = false;

    for ticker in ["AAPL", "MSFT", "SPY"] {
        let request = AnalysisRequest::new(ticker, start, end, TrendMethod::LogLinear);

        match run_analysis(&provider, &cache, &config, &request).await {
            Ok(report) => {
                let last_price = report.prices.last().map(|dp| dp.value).unwrap_or(f64::NAN);
                let last_trend = report.trend.last().map(|dp| dp.value).unwrap_or(f64::NAN);
                let dist = report
                    .latest_distance_pct
                    .map(|d| format!("{:+.2}", d))
                    .unwrap_or_else(|| "-".to_string());

                println!(
                    "{:<8} | {:>10.2} | {:>10.2} | {:>8}",
                    ticker, last_price, last_trend, dist
                );

                if !valuation_shown {
                    valuation_shown = true;
                    match report.valuation.source {
                        ValuationSource::Unavailable => {
                            println!("\nValuation gauge: not available (both paths failed)");
                        }
                        source => {
                            if let Some(a) = report.assessment {
                                println!(
                                    "\nValuation gauge ({:?}): latest {:.1}% vs median {:.1}% -> {:?}",
                                    source, a.latest_pct, a.median_pct, a.verdict
                                );
                            }
                        }
                    }
                }
            }
            Err(err) => {
                println!("{:<8} | fetch failed: {}", ticker, err);
            }
        }
    }

    println!("\nDone.");
    Ok(())
}
