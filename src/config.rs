//! Gateway settings.
//!
//! Layers, lowest precedence first: built-in defaults, an optional YAML file,
//! `GATEWAY_*` environment variables. Command-line flags are applied on top
//! by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_DATABASE: &str = "showcase.db";
pub const DEFAULT_SHOWS_API_URL: &str = "https://api.tvmaze.com";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value '{value}' for {name}")]
    InvalidEnv { name: String, value: String },

    #[error("Invalid shows API url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub port: u16,
    /// SQLite file path, `:memory:`, or a full `sqlite:` url
    pub database_url: String,
    /// Root the show connector resolves its endpoints against
    pub shows_api_url: String,
    /// Allowed origin; any origin when unset
    pub cors_origin: Option<String>,
    /// Mount the GraphQL Playground at `/playground`
    pub playground: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE.to_string(),
            shows_api_url: DEFAULT_SHOWS_API_URL.to_string(),
            cors_origin: None,
            playground: cfg!(debug_assertions),
        }
    }
}

impl GatewayConfig {
    /// Defaults, then `path` when given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|name| std::env::var(name).ok())
    }

    /// Read a YAML file; keys it leaves out keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay `GATEWAY_*` variables, looked up through `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("GATEWAY_PORT") {
            self.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "GATEWAY_PORT".to_string(),
                value: port,
            })?;
        }
        if let Some(database_url) = lookup("GATEWAY_DATABASE_URL") {
            self.database_url = database_url;
        }
        if let Some(shows_api_url) = lookup("GATEWAY_SHOWS_API_URL") {
            self.shows_api_url = shows_api_url;
        }
        if let Some(cors_origin) = lookup("GATEWAY_CORS_ORIGIN") {
            self.cors_origin = Some(cors_origin).filter(|origin| !origin.is_empty());
        }
        if let Some(playground) = lookup("GATEWAY_PLAYGROUND") {
            self.playground = parse_flag(&playground).ok_or(ConfigError::InvalidEnv {
                name: "GATEWAY_PLAYGROUND".to_string(),
                value: playground,
            })?;
        }
        Ok(self)
    }

    pub fn shows_api_root(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.shows_api_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.shows_api_url.clone(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shows_api_root().map(|_| ())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.port, 4000);
        assert_eq!(config.database_url, "showcase.db");
        assert_eq!(
            config.shows_api_root().unwrap().as_str(),
            "https://api.tvmaze.com/"
        );
        assert!(config.cors_origin.is_none());
    }

    #[test]
    fn test_yaml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port: 8080\nshows_api_url: http://localhost:9000/").unwrap();

        let config = GatewayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.shows_api_url, "http://localhost:9000/");
        assert_eq!(config.database_url, DEFAULT_DATABASE);
    }

    #[test]
    fn test_invalid_yaml_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port: [not, a, port]").unwrap();

        let err = GatewayConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let config = GatewayConfig {
            port: 8080,
            ..Default::default()
        }
        .with_env(env(&[
            ("GATEWAY_PORT", "9090"),
            ("GATEWAY_DATABASE_URL", ":memory:"),
            ("GATEWAY_CORS_ORIGIN", "http://localhost:3000"),
            ("GATEWAY_PLAYGROUND", "off"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.database_url, ":memory:");
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:3000"));
        assert!(!config.playground);
    }

    #[test]
    fn test_invalid_env_values_are_rejected() {
        let err = GatewayConfig::default()
            .with_env(env(&[("GATEWAY_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref name, .. } if name == "GATEWAY_PORT"));

        let err = GatewayConfig::default()
            .with_env(env(&[("GATEWAY_PLAYGROUND", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn test_invalid_shows_url() {
        let config = GatewayConfig {
            shows_api_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }
}
