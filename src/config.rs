use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::utils::DEFAULT_USER_AGENT;

pub const QUOTES_BASE_URL: &str = "http://quotes.toscrape.com";
pub const BOOKS_BASE_URL: &str = "http://books.toscrape.com";

/// Settings for one [`crate::WebScraper`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub base_url: String,
    /// Minimum seconds between consecutive requests.
    pub delay_secs: f64,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Pick a browser user agent at random for every request instead of
    /// `user_agent`.
    pub rotate_user_agents: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self::for_site(QUOTES_BASE_URL)
    }
}

impl ScraperConfig {
    pub fn for_site(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            delay_secs: 0.5,
            timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            rotate_user_agents: false,
        }
    }

    pub fn validate(&self) -> Result<Url> {
        if !self.delay_secs.is_finite() || self.delay_secs < 0.0 {
            return Err(ScrapeError::Config(format!(
                "delay_secs must be a non-negative number, got {}",
                self.delay_secs
            )));
        }

        Duration::try_from_secs_f64(self.delay_secs).map_err(|e| {
            ScrapeError::Config(format!("delay_secs {} is out of range: {}", self.delay_secs, e))
        })?;

        if self.timeout_secs == 0 {
            return Err(ScrapeError::Config("timeout_secs must be at least 1".to_string()));
        }

        Url::parse(&self.base_url)
            .map_err(|e| ScrapeError::Config(format!("invalid base_url '{}': {}", self.base_url, e)))
    }
}

/// On-disk TOML layout. Every key is optional; absent keys fall back to
/// the defaults of the site being scraped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub delay_secs: Option<f64>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub rotate_user_agents: Option<bool>,
}

impl ConfigFile {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ScrapeError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Resolve against the defaults for `default_base_url`.
    pub fn into_config(self, default_base_url: &str) -> ScraperConfig {
        let defaults = ScraperConfig::for_site(default_base_url);

        ScraperConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            delay_secs: self.delay_secs.unwrap_or(defaults.delay_secs),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            rotate_user_agents: self.rotate_user_agents.unwrap_or(defaults.rotate_user_agents),
        }
    }
}
