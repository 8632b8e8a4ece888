//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use serde::Deserialize;
use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load environment variables: {0}")]
    EnvLoad(#[from] dotenvy::Error),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0),
            port: 3000,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// DDL export configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Storage engine written after every CREATE TABLE
    pub engine: String,
    pub charset: String,
    /// First line of every generated script
    pub header: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            engine: "InnoDB".to_string(),
            charset: "utf8mb4".to_string(),
            header: "Generated by SchemaForge".to_string(),
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub export: ExportConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is fine, a malformed one is not
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = ServerConfig {
            host: lookup("HOST")
                .and_then(|h| h.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().port),
        };

        let cors = CorsConfig {
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        let defaults = ExportConfig::default();
        let export = ExportConfig {
            engine: Self::non_blank("DDL_ENGINE", lookup("DDL_ENGINE"))?.unwrap_or(defaults.engine),
            charset: Self::non_blank("DDL_CHARSET", lookup("DDL_CHARSET"))?.unwrap_or(defaults.charset),
            header: lookup("DDL_HEADER").unwrap_or(defaults.header),
        };

        Ok(Self {
            server,
            cors,
            export,
        })
    }

    fn non_blank(key: &str, value: Option<String>) -> Result<Option<String>, ConfigError> {
        match value {
            Some(v) if v.trim().is_empty() => {
                Err(ConfigError::InvalidValue(format!("{} must not be empty", key)))
            }
            Some(v) => Ok(Some(v.trim().to_string())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.export.engine, "InnoDB");
        assert_eq!(settings.export.charset, "utf8mb4");
        assert_eq!(settings.server.port, 3000);
    }

    #[test]
    fn test_invalid_port_falls_back_to_default() {
        let settings = settings_from(&[("PORT", "not-a-port"), ("DDL_ENGINE", "MyISAM")]).unwrap();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.export.engine, "MyISAM");
    }

    #[test]
    fn test_blank_charset_is_rejected() {
        let result = settings_from(&[("DDL_CHARSET", "  ")]);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_allowed_origins_are_split() {
        let settings =
            settings_from(&[("ALLOWED_ORIGINS", "http://a.test, http://b.test")]).unwrap();
        assert_eq!(settings.cors.allowed_origins, vec!["http://a.test", "http://b.test"]);
    }
}
