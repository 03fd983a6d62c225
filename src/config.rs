use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub catalog_path: PathBuf,
    pub storage: StorageConfig,
    pub browser: BrowserConfig,
    pub retry: RetryConfig,
    pub alerts: AlertConfig,
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Provisioning service endpoint that hands out fresh browser instances.
    pub session_url: String,
    pub user_agent: String,
    pub nav_timeout_ms: u64,
    pub settle_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub attempts: u32,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Absent means notifications are disabled entirely.
    pub webhook_url: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    pub rows: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("catalog_path", "products.json")?
            .set_default("storage.data_dir", "data")?
            .set_default("browser.user_agent", "Mozilla/5.0 (compatible; Pricewatch/0.1)")?
            .set_default("browser.nav_timeout_ms", 30_000i64)?
            .set_default("browser.settle_timeout_ms", 15_000i64)?
            .set_default("retry.attempts", 2i64)?
            .set_default("retry.delay_ms", 1_000i64)?
            .set_default("alerts.request_timeout_secs", 10i64)?
            .set_default("review.rows", 10i64)?
            // Optional file-based configuration
            .add_source(File::with_name("config/default").required(false))
            // Local overrides (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Environment variables with prefix "PRICEWATCH_"
            .add_source(Environment::with_prefix("PRICEWATCH").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.browser.session_url).is_err() {
            return Err(ConfigError::Message(
                "browser.session_url must be a valid URL".into(),
            ));
        }

        if self.browser.nav_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "browser.nav_timeout_ms must be greater than 0".into(),
            ));
        }

        if self.browser.settle_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "browser.settle_timeout_ms must be greater than 0".into(),
            ));
        }

        if self.retry.attempts == 0 {
            return Err(ConfigError::Message(
                "retry.attempts must be greater than 0".into(),
            ));
        }

        if let Some(webhook_url) = &self.alerts.webhook_url {
            let parsed = Url::parse(webhook_url).map_err(|_| {
                ConfigError::Message("alerts.webhook_url must be a valid URL".into())
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(ConfigError::Message(
                    "alerts.webhook_url must use http or https".into(),
                ));
            }
        }

        if self.alerts.request_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "alerts.request_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.storage.data_dir.join("prices.csv")
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.storage.data_dir.join("snapshots")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            catalog_path: PathBuf::from("products.json"),
            storage: StorageConfig {
                data_dir: PathBuf::from("data"),
            },
            browser: BrowserConfig {
                session_url: "http://127.0.0.1:10001/browsers".to_string(),
                user_agent: "Mozilla/5.0 (compatible; Pricewatch/0.1)".to_string(),
                nav_timeout_ms: 30_000,
                settle_timeout_ms: 15_000,
            },
            retry: RetryConfig {
                attempts: 2,
                delay_ms: 1_000,
            },
            alerts: AlertConfig {
                webhook_url: None,
                request_timeout_secs: 10,
            },
            review: ReviewConfig { rows: 10 },
        }
    }

    #[test]
    fn test_config_validation_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_session_url() {
        let mut config = valid_config();
        config.browser.session_url = "not a url".to_string();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("session_url"));
    }

    #[test]
    fn test_config_validation_zero_retry_attempts() {
        let mut config = valid_config();
        config.retry.attempts = 0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("retry.attempts"));
    }

    #[test]
    fn test_config_validation_zero_nav_timeout() {
        let mut config = valid_config();
        config.browser.nav_timeout_ms = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_webhook_url() {
        let mut config = valid_config();
        config.alerts.webhook_url = Some("hooks.example.com/T000".to_string());

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("webhook_url"));
    }

    #[test]
    fn test_config_validation_webhook_scheme() {
        let mut config = valid_config();
        config.alerts.webhook_url = Some("ftp://hooks.example.com/T000".to_string());

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("http or https"));
    }

    #[test]
    fn test_config_validation_webhook_absent_is_ok() {
        let config = valid_config();
        assert!(config.alerts.webhook_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_derived_paths() {
        let mut config = valid_config();
        config.storage.data_dir = PathBuf::from("/var/lib/pricewatch");

        assert_eq!(
            config.ledger_path(),
            PathBuf::from("/var/lib/pricewatch/prices.csv")
        );
        assert_eq!(
            config.snapshot_dir(),
            PathBuf::from("/var/lib/pricewatch/snapshots")
        );
    }
}
