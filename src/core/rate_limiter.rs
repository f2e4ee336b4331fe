use std::time::Duration;
use tokio::time::sleep;
use rand::Rng;

pub struct RateLimiter;

impl RateLimiter {
    /// Wait appropriate duration before hitting the given data source.
    /// One delay per request; retry/backoff stays with the caller.
    pub async fn wait(source: &str) {
        match source {
            "fred" => {
                // FRED fronts a WAF that tars identical request cadences;
                // jitter the delay.
                let delay = {
                    let mut rng = rand::thread_rng();
                    rng.gen_range(1500..3000)
                };
                sleep(Duration::from_millis(delay)).await;
            }
            "worldbank" => {
                // Public API, generous limits. Small fixed delay.
                sleep(Duration::from_millis(250)).await;
            }
            _ => {
                // Default minimal safe delay (Yahoo quote history etc.)
                sleep(Duration::from_millis(100)).await;
            }
        }
    }
}
