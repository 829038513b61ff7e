//! Configuration types and loading
//!
//! YAML config with a fallback chain: explicit `--config` path, then
//! `.tripcrew.yml` in the working directory, then the user config dir, then
//! built-in defaults. Credentials are named by environment variable here and
//! resolved once at startup into an owned value; the engine itself never
//! touches process environment.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::budget::{CurrencyUnit, DEFAULT_DAILY_MINIMUM_INR, DEFAULT_DAILY_MINIMUM_USD, ExchangeRates};
use crate::orchestrator::Credentials;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Web-search tool configuration
    pub search: SearchConfig,

    /// Budget assumptions (daily minimums, exchange rates)
    pub budget: BudgetConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the credential environment variables are set. Call this
    /// early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        if std::env::var(&self.search.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "Search API key not found. Set the {} environment variable.",
                self.search.api_key_env
            ));
        }
        Ok(())
    }

    /// Resolve credentials from the configured environment variables
    ///
    /// Done once at startup; the resulting value is passed into the
    /// orchestrator so runs never read global state.
    pub fn resolve_credentials(&self) -> Result<Credentials> {
        let openai_api_key = std::env::var(&self.llm.api_key_env)
            .context(format!("{} is not set", self.llm.api_key_env))?;
        let serper_api_key = std::env::var(&self.search.api_key_env)
            .context(format!("{} is not set", self.search.api_key_env))?;
        Ok(Credentials {
            openai_api_key,
            serper_api_key,
        })
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from(".tripcrew.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tripcrew").join("tripcrew.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 120_000,
        }
    }
}

/// Web-search tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Environment variable containing the Serper API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: "SERPER_API_KEY".to_string(),
        }
    }
}

/// Budget assumptions
///
/// The daily minimums are per-currency economic baselines, deliberately not
/// derived from each other by exchange rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Per-person daily subsistence minimum when budgeting in USD
    #[serde(rename = "daily-minimum-usd")]
    pub daily_minimum_usd: f64,

    /// Per-person daily subsistence minimum when budgeting in INR
    #[serde(rename = "daily-minimum-inr")]
    pub daily_minimum_inr: f64,

    /// Fixed exchange-rate table for cross-currency reporting
    pub exchange: ExchangeRates,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily_minimum_usd: DEFAULT_DAILY_MINIMUM_USD,
            daily_minimum_inr: DEFAULT_DAILY_MINIMUM_INR,
            exchange: ExchangeRates::default(),
        }
    }
}

impl BudgetConfig {
    /// Daily minimum for the given billing currency
    pub fn daily_minimum(&self, currency: CurrencyUnit) -> f64 {
        match currency {
            CurrencyUnit::Usd => self.daily_minimum_usd,
            CurrencyUnit::Inr => self.daily_minimum_inr,
        }
    }
}
