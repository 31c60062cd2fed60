use crate::error::{ApiError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

const CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

fn default_port() -> u16 {
    5000
}

fn default_database_path() -> String {
    "trivia.db".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Config {
    /// Loads config.toml when present, falling back to defaults. PORT and
    /// DATABASE_PATH environment variables win over the file.
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(CONFIG_PATH).exists() {
            let config_content = fs::read_to_string(CONFIG_PATH).map_err(|e| {
                ApiError::Config(format!("Failed to read config file '{CONFIG_PATH}': {e}"))
            })?;
            toml::from_str(&config_content)?
        } else {
            Config::default()
        };

        if let Ok(port) = env::var("PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| ApiError::Config(format!("Invalid PORT value '{port}'")))?;
        }
        if let Ok(path) = env::var("DATABASE_PATH") {
            config.database.path = path;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.path, "trivia.db");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "trivia.db");
    }
}
