use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::domain::amount::MAX_DECIMALS;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub dry_run: DryRunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Swap flow tuning
#[derive(Debug, Clone, Deserialize)]
pub struct FlowConfig {
    /// Quiescence window before a quote is requested (500-1000 ms)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Decimals of the input leg (agent token precision)
    #[serde(default = "default_input_decimals")]
    pub input_decimals: u32,
    /// Decimals of quoted amounts (base asset precision)
    #[serde(default = "default_quote_decimals")]
    pub quote_decimals: u32,
    /// Decimals shown when formatting a quote
    #[serde(default = "default_display_decimals")]
    pub display_decimals: u32,
    /// Symbol of the base asset (e.g., "LEFT")
    #[serde(default = "default_base_symbol")]
    pub base_symbol: String,
    /// Explorer prefix the transaction id is appended to
    #[serde(default)]
    pub explorer_tx_url: Option<String>,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_input_decimals() -> u32 {
    6
}

fn default_quote_decimals() -> u32 {
    18
}

fn default_display_decimals() -> u32 {
    6
}

fn default_base_symbol() -> String {
    "LEFT".to_string()
}

impl FlowConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Explorer link for a transaction, if an explorer is configured
    pub fn explorer_link(&self, transaction_id: &str) -> Option<String> {
        self.explorer_tx_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(|url| format!("{}{}", url, transaction_id))
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            input_decimals: default_input_decimals(),
            quote_decimals: default_quote_decimals(),
            display_decimals: default_display_decimals(),
            base_symbol: default_base_symbol(),
            explorer_tx_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the dashboard backend API
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_backend_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NotifierConfig {
    /// Webhook receiving notifications as JSON (disabled when unset)
    #[serde(default)]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DryRunConfig {
    /// Enable dry run mode (no real transactions)
    pub enabled: bool,
}

impl Default for DryRunConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            flow: FlowConfig::default(),
            backend: BackendConfig::default(),
            notifier: NotifierConfig::default(),
            dry_run: DryRunConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("flow.debounce_ms", default_debounce_ms())?
            .set_default("dry_run.enabled", true)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("SWAPFLOW_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (SWAPFLOW_BACKEND__BASE_URL, etc.)
            .add_source(
                Environment::with_prefix("SWAPFLOW")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(500..=1000).contains(&self.flow.debounce_ms) {
            errors.push(format!(
                "debounce_ms must be between 500 and 1000, got {}",
                self.flow.debounce_ms
            ));
        }

        if self.flow.input_decimals > MAX_DECIMALS {
            errors.push(format!("input_decimals must be at most {MAX_DECIMALS}"));
        }

        if self.flow.quote_decimals > MAX_DECIMALS {
            errors.push(format!("quote_decimals must be at most {MAX_DECIMALS}"));
        }

        if self.flow.display_decimals > self.flow.quote_decimals {
            errors.push("display_decimals cannot exceed quote_decimals".to_string());
        }

        if self.flow.base_symbol.trim().is_empty() {
            errors.push("base_symbol must not be empty".to_string());
        }

        if let Err(e) = url::Url::parse(&self.backend.base_url) {
            errors.push(format!("backend.base_url is not a valid URL: {e}"));
        }

        if let Some(webhook) = &self.notifier.webhook_url {
            if let Err(e) = url::Url::parse(webhook) {
                errors.push(format!("notifier.webhook_url is not a valid URL: {e}"));
            }
        }

        if self.backend.timeout_ms == 0 {
            errors.push("backend.timeout_ms must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert_eq!(config.flow.debounce(), Duration::from_millis(500));
        assert_eq!(config.flow.input_decimals, 6);
        assert_eq!(config.flow.quote_decimals, 18);
        assert!(config.dry_run.enabled);
        tokio_test::assert_ok!(config.validate());
    }

    #[test]
    fn test_validate_collects_every_error() {
        let mut config = AppConfig::default();
        config.flow.debounce_ms = 50;
        config.flow.display_decimals = 30;
        config.backend.base_url = "not a url".to_string();

        let errors = tokio_test::assert_err!(config.validate());
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors[0].contains("debounce_ms"));
    }

    #[test]
    fn test_explorer_link() {
        let mut flow = FlowConfig::default();
        assert_eq!(flow.explorer_link("0xabc"), None);

        flow.explorer_tx_url = Some("https://starkscan.co/tx/".to_string());
        assert_eq!(
            flow.explorer_link("0xabc").as_deref(),
            Some("https://starkscan.co/tx/0xabc")
        );
    }

    #[test]
    fn test_load_from_missing_dir_uses_defaults() {
        let config = AppConfig::load_from("does-not-exist").unwrap();
        assert_eq!(config.flow.debounce_ms, 500);
        assert_eq!(config.logging.level, "info");
    }
}
