pub mod cli;
pub mod toml_config;

use crate::core::retry::RetryPolicy;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use clap::Parser;

pub const DEFAULT_API_ENDPOINT: &str = "https://public-api.prozorro.gov.ua/api/2.5/tenders";
pub const DEFAULT_EDRPOU: &str = "00034074";
pub const DEFAULT_YEAR: i32 = 2025;
pub const DEFAULT_OUTPUT_PATH: &str = ".";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_PAGE_LIMIT: u64 = 10_000_000;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 500;

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_endpoint: String,
    pub output_path: String,
    pub edrpou: String,
    pub year: i32,
    pub request_timeout: Duration,
    pub page_limit: u64,
    pub page_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            edrpou: DEFAULT_EDRPOU.to_string(),
            year: DEFAULT_YEAR,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            page_limit: DEFAULT_PAGE_LIMIT,
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
            retry: RetryPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Overlays every value the file sets.
    pub fn apply_toml(&mut self, file: &TomlConfig) {
        if let Some(edrpou) = &file.query.edrpou {
            self.edrpou = edrpou.clone();
        }
        if let Some(year) = file.query.year {
            self.year = year;
        }
        if let Some(endpoint) = &file.source.endpoint {
            self.api_endpoint = endpoint.clone();
        }
        if let Some(timeout) = file.source.timeout_seconds {
            self.request_timeout = Duration::from_secs(timeout);
        }
        if let Some(limit) = file.source.page_limit {
            self.page_limit = limit;
        }
        if let Some(attempts) = file.retry.max_attempts {
            self.retry.max_attempts = attempts;
        }
        if let Some(delay) = file.retry.rate_limit_delay_ms {
            self.retry.rate_limit_delay = Duration::from_millis(delay);
        }
        if let Some(delay) = file.retry.error_delay_ms {
            self.retry.error_delay = Duration::from_millis(delay);
        }
        if let Some(delay) = file.retry.page_delay_ms {
            self.page_delay = Duration::from_millis(delay);
        }
        if let Some(path) = &file.load.output_path {
            self.output_path = path.clone();
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api_endpoint", &self.api_endpoint)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_edrpou("edrpou", &self.edrpou)?;
        validation::validate_range("year", self.year, 2015, 2100)?;
        validation::validate_positive_number("retry.max_attempts", self.retry.max_attempts, 1)?;
        validation::validate_positive_number("source.page_limit", self.page_limit as usize, 1)?;
        Ok(())
    }
}

impl ConfigProvider for AppConfig {
    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn edrpou(&self) -> &str {
        &self.edrpou
    }

    fn year(&self) -> i32 {
        self.year
    }

    fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    fn page_limit(&self) -> u64 {
        self.page_limit
    }

    fn page_delay(&self) -> Duration {
        self.page_delay
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone()
    }
}

/// Command line flags. Anything given here wins over the config file,
/// which wins over the built-in defaults.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "prozorro-tenders")]
#[command(about = "Download a buyer's ProZorro tenders for a year and summarize them by category")]
pub struct CliConfig {
    /// Buyer EDRPOU code
    #[arg(long)]
    pub edrpou: Option<String>,

    /// Calendar year of tender modification
    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long)]
    pub api_endpoint: Option<String>,

    /// Directory for the CSV files
    #[arg(long)]
    pub output_path: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn resolve(&self) -> Result<AppConfig> {
        let mut config = AppConfig::default();

        if let Some(path) = &self.config {
            tracing::info!("📁 Loading configuration from: {}", path);
            config.apply_toml(&TomlConfig::from_file(path)?);
        }

        if let Some(edrpou) = &self.edrpou {
            config.edrpou = edrpou.clone();
        }
        if let Some(year) = self.year {
            config.year = year;
        }
        if let Some(endpoint) = &self.api_endpoint {
            config.api_endpoint = endpoint.clone();
        }
        if let Some(path) = &self.output_path {
            config.output_path = path.clone();
        }

        Ok(config)
    }
}
