//! Error handling for the CPO/CAI client.

use thiserror::Error;

/// Main error type for the client
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (blank URLs, missing identity, ...)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The access gate refused the caller
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Connection / network errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status
    #[error("{method} {path} failed with status {status}: {snippet}")]
    HttpStatus {
        method: String,
        path: String,
        status: u16,
        snippet: String,
    },

    /// A response body could not be mapped onto the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// A wire token outside the accepted set for a field
    #[error("value {value:?} is out of range for field `{field}`, expected \"yes\" or \"no\"")]
    OutOfRange { field: &'static str, value: String },

    /// Local resource needed for a request is missing
    #[error("Missing resource: {0}")]
    MissingResource(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML serialization/deserialization errors
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    /// Request errors
    #[error("Request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    /// Invalid argument errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

/// Result type for the client
pub type Result<T> = std::result::Result<T, Error>;

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_error = Error::ConfigError("cpo_url is blank".to_string());
        assert_eq!(config_error.to_string(), "Configuration error: cpo_url is blank");

        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let wrapped_io_error = Error::from(io_error);
        assert!(wrapped_io_error.to_string().contains("I/O error"));

        let str_error = Error::from("custom error");
        assert_eq!(str_error.to_string(), "Error: custom error");
    }

    #[test]
    fn test_http_status_names_the_endpoint() {
        let err = Error::HttpStatus {
            method: "POST".into(),
            path: "run-oos-backtest".into(),
            status: 500,
            snippet: "boom".into(),
        };
        assert_eq!(err.to_string(), "POST run-oos-backtest failed with status 500: boom");
    }

    #[test]
    fn test_out_of_range_names_the_field() {
        let err = Error::OutOfRange { field: "hyperparameter_tuning", value: "maybe".into() };
        let text = err.to_string();
        assert!(text.contains("hyperparameter_tuning"));
        assert!(text.contains("maybe"));
    }
}
