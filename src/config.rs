// Configuration for the event log shell.
//
// Responsibilities
// - Read the connection target, server port and authorization flag from the
//   environment.
// - Fail at construction when the connection target is missing, so a
//   misconfigured process never starts accepting requests.

use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("connection string is missing or empty (set DATABASE_URL)")]
    MissingConnectionString,

    #[error("invalid server port: {0}")]
    InvalidPort(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub connection_string: String,
    pub server_port: u16,
    pub enforce_authorization: bool,
}

impl Config {
    pub fn new(
        connection_string: impl Into<String>,
        server_port: u16,
        enforce_authorization: bool,
    ) -> Result<Self, ConfigurationError> {
        let connection_string = connection_string.into();
        if connection_string.is_empty() {
            return Err(ConfigurationError::MissingConnectionString);
        }
        Ok(Self {
            connection_string,
            server_port,
            enforce_authorization,
        })
    }

    pub fn from_env() -> Result<Self, ConfigurationError> {
        let connection_string = env::var("DATABASE_URL").unwrap_or_default();
        let server_port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigurationError::InvalidPort(raw))?,
            Err(_) => 8080,
        };
        let enforce_authorization = match env::var("ENFORCE_AUTHORIZATION") {
            Ok(raw) => !matches!(raw.as_str(), "false" | "0"),
            Err(_) => true,
        };
        Self::new(connection_string, server_port, enforce_authorization)
    }
}
