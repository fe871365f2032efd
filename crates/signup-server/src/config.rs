use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("SIGNUP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("SIGNUP_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "SIGNUP_PORT",
                expected: "port number",
                value,
            })?,
            None => 3000,
        };
        let db_path = lookup("SIGNUP_DB_PATH")
            .unwrap_or_else(|| "signup.db".into())
            .into();

        Ok(Self {
            host,
            port,
            db_path,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let value = format!("{}:{}", self.host, self.port);
        value.parse().map_err(|_| ConfigError::Invalid {
            name: "SIGNUP_HOST",
            expected: "IP address",
            value,
        })
    }
}
