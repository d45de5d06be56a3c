//! Client configuration: service URLs, caller identity and polling cadence.

use crate::utils::error::{Error, Result};
use crate::utils::fs;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// File name looked up by [`ClientConfig::load`].
pub const CONFIG_FILE: &str = "cpo.toml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the portfolio-optimization (CPO) service
    pub cpo_url: String,

    /// Base URL of the model training/inference (CAI) service
    pub cai_url: String,

    /// Caller identity (e-mail) sent with every request
    pub identity: String,

    /// Document listing the identities allowed to use the services
    #[serde(default)]
    pub roster_url: Option<String>,

    /// Check `identity` against the roster before allowing any call
    #[serde(default = "default_verify_identity")]
    pub verify_identity: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Job polling cadence
    #[serde(default)]
    pub poll: PollConfig,

    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Fixed-interval polling of job status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds to wait between two status requests
    pub interval_secs: u64,

    /// Status requests made before giving up
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 60, max_attempts: 5 }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cpo_url: "http://localhost:8000".to_string(),
            cai_url: "http://localhost:8001".to_string(),
            identity: String::new(),
            roster_url: None,
            verify_identity: default_verify_identity(),
            request_timeout_secs: default_request_timeout_secs(),
            poll: PollConfig::default(),
            log_level: default_log_level(),
        }
    }
}

// --------- Helper default functions for serde ---------
fn default_verify_identity() -> bool {
    true
}
fn default_request_timeout_secs() -> u64 {
    120
}
fn default_log_level() -> String {
    "info".to_string()
}

impl ClientConfig {
    /// Serialize default config to TOML string
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Load configuration from a specific file path
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::ConfigError(format!("Failed to read config file {:?}: {}", path.as_ref(), e))
        })?;
        let mut cfg: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;
        cfg.merge_env()?;
        Ok(cfg)
    }

    /// Save the configuration to a file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::ensure_dir(parent)?;
        }
        std::fs::write(path, content).map_err(|e| {
            Error::ConfigError(format!("Failed to write config file {:?}: {}", path, e))
        })?;
        Ok(())
    }

    /// Load configuration from default locations: `./cpo.toml`, then the user
    /// config directory, then built-in defaults.
    pub fn load() -> Result<Self> {
        let candidates = std::iter::once(PathBuf::from(CONFIG_FILE))
            .chain(fs::config_dir().map(|dir| dir.join(CONFIG_FILE)));
        Self::load_first(candidates)
    }

    /// Loads the first existing file among `candidates`. A file that exists but
    /// cannot be read or parsed is an error, never a silent fall back to defaults.
    fn load_first<I: IntoIterator<Item = PathBuf>>(candidates: I) -> Result<Self> {
        if let Some(path) = candidates.into_iter().find(|path| path.exists()) {
            return Self::from_file(path);
        }

        let mut config = Self::default();
        config.merge_env()?;
        Ok(config)
    }

    /// Merge environment variables into the configuration
    pub fn merge_env(&mut self) -> Result<()> {
        if let Ok(url) = env::var("CPO_API_URL") {
            self.cpo_url = url;
        }

        if let Ok(url) = env::var("CAI_API_URL") {
            self.cai_url = url;
        }

        if let Ok(identity) = env::var("CPO_USER_EMAIL") {
            self.identity = identity;
        }

        if let Ok(url) = env::var("CPO_ROSTER_URL") {
            self.roster_url = Some(url);
        }

        if let Ok(skip) = env::var("CPO_SKIP_VERIFICATION") {
            self.verify_identity = !matches!(skip.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let Ok(secs) = env::var("CPO_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs.trim().parse().map_err(|_| {
                Error::ConfigError(format!("CPO_REQUEST_TIMEOUT_SECS must be a number, got {:?}", secs))
            })?;
        }

        Ok(())
    }

    /// Validate the configuration for required fields and reasonable values
    pub fn validate(&self) -> Result<()> {
        if self.cpo_url.trim().is_empty() {
            return Err(Error::ConfigError("CPO service URL must be set".to_string()));
        }
        if self.cai_url.trim().is_empty() {
            return Err(Error::ConfigError("CAI service URL must be set".to_string()));
        }
        if self.identity.trim().is_empty() {
            return Err(Error::ConfigError("caller identity must be set".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::ConfigError("request_timeout_secs must be > 0".to_string()));
        }
        if self.poll.max_attempts == 0 {
            return Err(Error::ConfigError("poll.max_attempts must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.poll, PollConfig { interval_secs: 60, max_attempts: 5 });
        assert!(config.verify_identity);
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_default_toml() {
        let toml = ClientConfig::default_toml();
        assert!(toml.contains("cpo_url"));
        assert!(toml.contains("[poll]"));
    }

    #[test]
    #[serial]
    fn test_save_and_load_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("cpo.toml");

        let config = ClientConfig {
            cpo_url: "https://cpo.example.com".to_string(),
            identity: "quant@example.com".to_string(),
            ..Default::default()
        };
        config.save(&config_path).unwrap();

        temp_env::with_vars_unset(
            vec![
                "CPO_API_URL",
                "CAI_API_URL",
                "CPO_USER_EMAIL",
                "CPO_ROSTER_URL",
                "CPO_SKIP_VERIFICATION",
                "CPO_REQUEST_TIMEOUT_SECS",
            ],
            || {
                let loaded = ClientConfig::from_file(&config_path).unwrap();
                assert_eq!(loaded, config);
            },
        );
    }

    #[test]
    #[serial]
    fn test_broken_config_file_is_reported() {
        let temp_dir = tempdir().unwrap();
        let broken = temp_dir.path().join("cpo.toml");
        std::fs::write(&broken, "cpo_url = \"https://cpo.example.com\"\nidentity = [oops\n").unwrap();
        let fallback = temp_dir.path().join("home").join("cpo.toml");

        let err = ClientConfig::load_first(vec![broken, fallback]).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
        assert!(err.to_string().contains("Failed to parse config file"), "{}", err);
    }

    #[test]
    #[serial]
    fn test_first_existing_config_wins() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("cpo.toml");
        let user = temp_dir.path().join("home").join("cpo.toml");
        ClientConfig { identity: "quant@example.com".into(), ..Default::default() }.save(&user).unwrap();

        temp_env::with_vars_unset(
            vec![
                "CPO_API_URL",
                "CAI_API_URL",
                "CPO_USER_EMAIL",
                "CPO_ROSTER_URL",
                "CPO_SKIP_VERIFICATION",
                "CPO_REQUEST_TIMEOUT_SECS",
            ],
            || {
                let loaded = ClientConfig::load_first(vec![missing.clone(), user.clone()]).unwrap();
                assert_eq!(loaded.identity, "quant@example.com");

                let defaults = ClientConfig::load_first(vec![missing.clone()]).unwrap();
                assert_eq!(defaults, ClientConfig::default());
            },
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("cpo.toml");
        std::fs::write(&path, "cpo_url = \"a\"\ncai_url = \"b\"\nidentity = \"c\"\n").unwrap();
        let loaded: ClientConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.poll.interval_secs, 60);
        assert_eq!(loaded.request_timeout_secs, 120);
        assert!(loaded.roster_url.is_none());
    }

    #[test]
    #[serial]
    fn test_merge_env() {
        temp_env::with_vars(
            vec![
                ("CPO_API_URL", Some("https://cpo.test")),
                ("CPO_USER_EMAIL", Some("quant@example.com")),
                ("CPO_SKIP_VERIFICATION", Some("true")),
                ("CPO_REQUEST_TIMEOUT_SECS", Some("15")),
            ],
            || {
                let mut config = ClientConfig::default();
                config.merge_env().unwrap();

                assert_eq!(config.cpo_url, "https://cpo.test");
                assert_eq!(config.identity, "quant@example.com");
                assert!(!config.verify_identity);
                assert_eq!(config.request_timeout_secs, 15);
            },
        );
    }

    #[test]
    #[serial]
    fn test_bad_timeout_env() {
        temp_env::with_var("CPO_REQUEST_TIMEOUT_SECS", Some("soon"), || {
            let mut config = ClientConfig::default();
            assert!(matches!(config.merge_env(), Err(Error::ConfigError(_))));
        });
    }

    #[test]
    fn test_validate() {
        let mut config = ClientConfig { identity: "quant@example.com".into(), ..Default::default() };
        assert!(config.validate().is_ok());

        config.cai_url = " ".into();
        assert!(config.validate().unwrap_err().to_string().contains("CAI"));

        config.cai_url = "http://cai".into();
        config.identity.clear();
        assert!(config.validate().is_err());
    }
}
