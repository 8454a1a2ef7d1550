use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Everything a screening run needs; nothing is read from globals after this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenConfig {
    // Store
    pub store_endpoint: String,
    pub technical_index: String,
    pub fundamental_index: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub rate_limit_per_minute: usize,

    // Scan
    pub observation_date: String,          // YYYY-MM-DD
    pub exchange_suffix: String,           // ".NS"
    pub max_support_distance_pct: f64,     // 10.0
    pub page_size: usize,                  // 1000

    // Enrichment
    pub concurrency: usize,                // 8

    // Output
    pub output_dir: PathBuf,
    pub include_reference_tables: bool,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            store_endpoint: "http://localhost:9200".to_string(),
            technical_index: "nifty_data_weekly".to_string(),
            fundamental_index: "nifty_fundamental".to_string(),
            api_key: None,
            request_timeout_secs: 30,
            rate_limit_per_minute: 600,
            observation_date: String::new(),
            exchange_suffix: ".NS".to_string(),
            max_support_distance_pct: 10.0,
            page_size: 1000,
            concurrency: 8,
            output_dir: PathBuf::from("support_resistance_scan"),
            include_reference_tables: false,
        }
    }
}

impl ScreenConfig {
    /// Read configuration from `SCREEN_*` environment variables, falling back
    /// to defaults. Call [`ScreenConfig::validate`] once overrides are applied.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            store_endpoint: env::var("SCREEN_STORE_ENDPOINT").unwrap_or(defaults.store_endpoint),
            technical_index: env::var("SCREEN_TECHNICAL_INDEX").unwrap_or(defaults.technical_index),
            fundamental_index: env::var("SCREEN_FUNDAMENTAL_INDEX")
                .unwrap_or(defaults.fundamental_index),
            api_key: env::var("SCREEN_STORE_API_KEY").ok().filter(|k| !k.is_empty()),
            request_timeout_secs: env::var("SCREEN_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("SCREEN_REQUEST_TIMEOUT_SECS must be an integer")?,
            rate_limit_per_minute: env::var("SCREEN_RATE_LIMIT")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .context("SCREEN_RATE_LIMIT must be an integer")?,

            observation_date: env::var("SCREEN_OBSERVATION_DATE").unwrap_or_default(),
            exchange_suffix: env::var("SCREEN_EXCHANGE_SUFFIX").unwrap_or(defaults.exchange_suffix),
            max_support_distance_pct: env::var("SCREEN_MAX_SUPPORT_DISTANCE_PCT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("SCREEN_MAX_SUPPORT_DISTANCE_PCT must be a number")?,
            page_size: env::var("SCREEN_PAGE_SIZE")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .context("SCREEN_PAGE_SIZE must be an integer")?,

            concurrency: env::var("SCREEN_CONCURRENCY")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .context("SCREEN_CONCURRENCY must be an integer")?,

            output_dir: env::var("SCREEN_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            include_reference_tables: env::var("SCREEN_INCLUDE_REFERENCE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .context("SCREEN_INCLUDE_REFERENCE must be true or false")?,
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.store_endpoint.trim().is_empty() {
            bail!("store endpoint is empty");
        }
        if self.technical_index.trim().is_empty() || self.fundamental_index.trim().is_empty() {
            bail!("technical and fundamental index names are required");
        }
        if self.observation_date.trim().is_empty() {
            bail!("observation date is required (SCREEN_OBSERVATION_DATE or --date)");
        }
        NaiveDate::parse_from_str(self.observation_date.trim(), "%Y-%m-%d")
            .with_context(|| format!("observation date '{}' is not YYYY-MM-DD", self.observation_date))?;
        if self.max_support_distance_pct.is_nan() || self.max_support_distance_pct <= 0.0 {
            bail!("max support distance must be positive, got {}", self.max_support_distance_pct);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Page size the store accepts (1..=1000).
    pub fn effective_page_size(&self) -> usize {
        self.page_size.clamp(1, search_client::MAX_PAGE_SIZE)
    }

    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}
