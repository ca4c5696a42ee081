use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::error::{AppError, Result};
use crate::domain::sales::{AnomalyConfig, CleaningConfig};

const DEFAULT_CONFIG_FILE: &str = "salesdash.toml";
const CONFIG_PATH_VAR: &str = "SALESDASH_CONFIG";
const ENV_PREFIX: &str = "SALESDASH_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted upload body in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            max_upload_bytes: 200 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://users.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle minutes before a session and its table are discarded
    pub timeout_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { timeout_minutes: 60 }
    }
}

/// Account created on startup when no user of that name exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

/// Application configuration.
///
/// Layered as: compiled defaults, then `salesdash.toml` (or the file named by
/// `SALESDASH_CONFIG`), then `SALESDASH_*` environment variables with `__`
/// separating nested keys, e.g. `SALESDASH_ANOMALY__CONTAMINATION=0.02`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub cleaning: CleaningConfig,
    pub anomaly: AnomalyConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl AppConfig {
    /// Load `.env`, then extract the layered configuration
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(err) if err.not_found() => {}
            Err(err) => return Err(AppError::ConfigError(format!("Invalid .env file: {}", err))),
        }

        let path = std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config = Self::from_figment(Self::figment(&path))?;
        info!(
            config_file = %path.display(),
            host = %config.server.host,
            port = config.server.port,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.anomaly
            .validate()
            .map_err(|e| AppError::ConfigError(format!("anomaly: {}", e)))?;

        if self.session.timeout_minutes <= 0 {
            return Err(AppError::ConfigError(
                "session.timeout_minutes must be > 0".to_string(),
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(AppError::ConfigError(
                "server.max_upload_bytes must be > 0".to_string(),
            ));
        }
        if let Some(admin) = &self.bootstrap_admin {
            if admin.username.trim().is_empty() || admin.password.is_empty() {
                return Err(AppError::ConfigError(
                    "bootstrap_admin needs a username and a password".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn session_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session.timeout_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sales::{FillPolicy, SeedPolicy};

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.anomaly.contamination, 0.01);
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn test_toml_and_env_layers() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "salesdash.toml",
                r#"
                [server]
                port = 9000

                [cleaning]
                fill_policy = "required_fields_excluded"

                [anomaly]
                contamination = 0.05
                seed = "entropy"
                "#,
            )?;
            jail.set_env("SALESDASH_SESSION__TIMEOUT_MINUTES", "15");

            let config = AppConfig::from_figment(AppConfig::figment(Path::new("salesdash.toml")))
                .map_err(|e| e.to_string())?;

            assert_eq!(config.server.port, 9000);
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.cleaning.fill_policy, FillPolicy::RequiredFieldsExcluded);
            assert_eq!(config.anomaly.contamination, 0.05);
            assert_eq!(config.anomaly.seed, SeedPolicy::Entropy);
            assert_eq!(config.session.timeout_minutes, 15);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_contamination_is_config_error() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SALESDASH_ANOMALY__CONTAMINATION", "0.9");
            let err = AppConfig::from_figment(AppConfig::figment(Path::new("missing.toml")))
                .unwrap_err();
            assert!(matches!(err, AppError::ConfigError(_)));
            Ok(())
        });
    }
}
