use rand::Rng;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::sleep;

/// Identifies the scraper honestly unless rotation is switched on.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Educational Web Scraper)";

/// User agent pool used when rotation is enabled
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
];

pub fn get_random_user_agent() -> &'static str {
    let mut rng = rand::rng();
    let index = rng.random_range(0..USER_AGENTS.len());
    USER_AGENTS[index]
}

/// Politeness delay between consecutive requests.
///
/// `wait` returns a guard; holding it for the duration of a request keeps
/// a single request in flight.
pub struct RateLimiter {
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: Mutex::new(None),
        }
    }

    /// Negative or NaN delays mean no delay; delays too large for a
    /// `Duration` saturate.
    pub fn from_secs_f64(delay_secs: f64) -> Self {
        Self::new(Duration::try_from_secs_f64(delay_secs.max(0.0)).unwrap_or(Duration::MAX))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn wait(&self) -> MutexGuard<'_, Option<Instant>> {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.delay {
                sleep(self.delay - elapsed).await;
            }
        }

        *last = Some(Instant::now());
        last
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}
