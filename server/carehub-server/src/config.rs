//! Layered server configuration
//!
//! Values are resolved in order, later sources winning:
//!
//! 1. built-in defaults ([`AppConfig::default`])
//! 2. an optional YAML file (`--config`, default `carehub.yaml`)
//! 3. `CAREHUB__SECTION__KEY` environment variables, e.g.
//!    `CAREHUB__SERVER__PORT=9000` or `CAREHUB__DATABASE__URL=postgres://...`

use config::{Config, Environment, File, Source};
use email_service::EmailConfig;
use error_common::{CareHubError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub email: EmailConfig,
    pub payments: PaymentSettings,
    pub reminders: ReminderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// `development` exposes internal error messages and enables coloured logs
    pub environment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// PostgreSQL URL; the in-memory store is used when absent
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayKind {
    Simulated,
    Approve,
    Decline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentSettings {
    pub gateway: GatewayKind,
    pub success_rate: f64,
    pub delay_ms: u64,
    pub default_reservation_fee: Decimal,
}

/// Daily reminder sweep time, UTC
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    pub enabled: bool,
    pub hour: u32,
    pub minute: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: "development".to_string(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            cookie_secure: false,
        }
    }
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            gateway: GatewayKind::Simulated,
            success_rate: 0.95,
            delay_ms: 1000,
            default_reservation_fee: Decimal::new(50, 0),
        }
    }
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            hour: 9,
            minute: 0,
        }
    }
}

impl AppConfig {
    /// Defaults, then `path` if it exists, then the environment
    pub fn load(path: &str) -> Result<Self> {
        Self::from_file_source(File::with_name(path).required(false))
    }

    fn from_file_source<S>(file: S) -> Result<Self>
    where
        S: Source + Send + Sync + 'static,
    {
        let defaults = Config::try_from(&AppConfig::default()).map_err(config_error)?;
        let config: AppConfig = Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(
                Environment::with_prefix("CAREHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error)?;

        config.validate()?;
        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.server.environment.eq_ignore_ascii_case("development")
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(CareHubError::ConfigError("auth.jwt_secret must be set".into()));
        }
        if !self.is_development() && self.auth.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(CareHubError::ConfigError(
                "auth.jwt_secret must be changed outside development".into(),
            ));
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(CareHubError::ConfigError("auth.token_ttl_hours must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.payments.success_rate) {
            return Err(CareHubError::ConfigError(
                "payments.success_rate must be between 0 and 1".into(),
            ));
        }
        if self.payments.default_reservation_fee < Decimal::ZERO {
            return Err(CareHubError::ConfigError(
                "payments.default_reservation_fee must not be negative".into(),
            ));
        }
        if self.reminders.hour > 23 || self.reminders.minute > 59 {
            return Err(CareHubError::ConfigError("reminders time is out of range".into()));
        }
        Ok(())
    }
}

fn config_error(error: config::ConfigError) -> CareHubError {
    CareHubError::ConfigError(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_yaml(yaml: &str) -> Result<AppConfig> {
        AppConfig::from_file_source(File::from_str(yaml, FileFormat::Yaml))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_development());
        assert!(config.database.url.is_none());
        assert_eq!(config.payments.default_reservation_fee, Decimal::new(50, 0));
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let config = from_yaml(
            r#"
server:
  port: 9100
payments:
  gateway: decline
  default_reservation_fee: 25.5
email:
  enabled: true
  smtp_host: smtp.example.org
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.payments.gateway, GatewayKind::Decline);
        assert_eq!(config.payments.default_reservation_fee, Decimal::new(255, 1));
        assert!(config.email.enabled);
        assert_eq!(config.email.smtp_port, 587);
        assert_eq!(config.reminders.hour, 9);
    }

    #[test]
    fn test_production_requires_real_secret() {
        let err = from_yaml("server:\n  environment: production\n").unwrap_err();
        assert!(err.to_string().contains("jwt_secret"));

        let config = from_yaml(
            "server:\n  environment: production\nauth:\n  jwt_secret: a-long-and-random-secret\n",
        )
        .unwrap();
        assert!(!config.is_development());
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        assert!(from_yaml("payments:\n  success_rate: 1.5\n").is_err());
        assert!(from_yaml("reminders:\n  hour: 24\n").is_err());
    }
}
