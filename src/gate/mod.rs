//! Access gate deciding, once per client, whether the caller may use the services.
//!
//! In open mode any non-blank identity is entitled. In verified mode the identity
//! must appear in a roster document fetched from the configured roster URL; a
//! blank URL, a failed fetch or an absent identity denies every later call.

use crate::config::ClientConfig;
use crate::utils::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Source of the roster document.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn fetch(&self, url: String) -> Result<String>;
}

/// Fetches the roster over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRoster {
    client: Client,
}

impl HttpRoster {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self { client: Client::builder().timeout(timeout).build()? })
    }
}

#[async_trait]
impl RosterSource for HttpRoster {
    async fn fetch(&self, url: String) -> Result<String> {
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Proof that the gate let the caller through; carries the resolved identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant<'a> {
    identity: &'a str,
}

impl<'a> Grant<'a> {
    pub fn identity(&self) -> &'a str {
        self.identity
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Decision {
    Granted(String),
    Denied(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGate {
    decision: Decision,
}

impl AccessGate {
    /// Open mode: entitled when the identity is not blank.
    pub fn open(identity: &str) -> Self {
        let identity = identity.trim();
        if identity.is_empty() {
            return Self::denied("caller identity is blank");
        }
        log::info!("access granted to {} (verification disabled)", identity);
        Self { decision: Decision::Granted(identity.to_string()) }
    }

    /// Verified mode: entitled when the roster at `roster_url` lists the identity.
    pub async fn verified(identity: &str, roster_url: Option<&str>, roster: &dyn RosterSource) -> Self {
        let identity = identity.trim();
        if identity.is_empty() {
            return Self::denied("caller identity is blank");
        }
        let url = match roster_url.map(str::trim).filter(|url| !url.is_empty()) {
            | Some(url) => url,
            | None => return Self::denied("no roster URL configured"),
        };
        let document = match roster.fetch(url.to_string()).await {
            | Ok(document) => document,
            | Err(e) => return Self::denied(format!("could not fetch roster from {}: {}", url, e)),
        };
        if roster_contains(&document, identity) {
            log::info!("access granted to {}", identity);
            Self { decision: Decision::Granted(identity.to_string()) }
        } else {
            Self::denied(format!("{} is not a registered user", identity))
        }
    }

    /// A gate that refuses everything, e.g. after a configuration error.
    pub fn denied(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        log::warn!("access denied: {}", reason);
        Self { decision: Decision::Denied(reason) }
    }

    /// Picks the mode from the configuration.
    pub async fn resolve(config: &ClientConfig, roster: &dyn RosterSource) -> Self {
        if config.verify_identity {
            Self::verified(&config.identity, config.roster_url.as_deref(), roster).await
        } else {
            Self::open(&config.identity)
        }
    }

    pub fn authorize(&self) -> Result<Grant<'_>> {
        match &self.decision {
            | Decision::Granted(identity) => Ok(Grant { identity: identity.as_str() }),
            | Decision::Denied(reason) => Err(Error::AccessDenied(reason.clone())),
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self.decision, Decision::Granted(_))
    }
}

/// Whether `identity` appears as a token of the roster document.
///
/// Tokens are split on whitespace, commas, semicolons, quotes and brackets, which
/// covers plain lists, CSV and JSON arrays. Matching ignores ASCII case.
pub fn roster_contains(document: &str, identity: &str) -> bool {
    let identity = identity.trim();
    !identity.is_empty()
        && document
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '"' | '\'' | '[' | ']' | '{' | '}'))
            .any(|token| token.eq_ignore_ascii_case(identity))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster_with(document: &'static str) -> MockRosterSource {
        let mut roster = MockRosterSource::new();
        roster
            .expect_fetch()
            .withf(|url| url == "https://roster.example.com/users.json")
            .times(1)
            .returning(move |_| Ok(document.to_string()));
        roster
    }

    #[test]
    fn test_open_mode() {
        assert!(AccessGate::open("quant@example.com").is_granted());
        assert!(!AccessGate::open("   ").is_granted());
        let gate = AccessGate::open(" quant@example.com ");
        assert_eq!(gate.authorize().unwrap().identity(), "quant@example.com");
    }

    #[tokio::test]
    async fn test_verified_mode_grants_listed_identity() {
        let roster = roster_with(r#"["ops@example.com", "Quant@Example.com"]"#);
        let gate = AccessGate::verified(
            "quant@example.com",
            Some("https://roster.example.com/users.json"),
            &roster,
        )
        .await;
        assert!(gate.is_granted());
    }

    #[tokio::test]
    async fn test_verified_mode_denies_unlisted_identity() {
        let roster = roster_with("ops@example.com\nadmin@example.com\n");
        let gate = AccessGate::verified(
            "quant@example.com",
            Some("https://roster.example.com/users.json"),
            &roster,
        )
        .await;
        let err = gate.authorize().unwrap_err();
        assert!(matches!(err, Error::AccessDenied(_)));
        assert!(err.to_string().contains("not a registered user"));
    }

    #[tokio::test]
    async fn test_blank_roster_url_denies_without_fetching() {
        let mut roster = MockRosterSource::new();
        roster.expect_fetch().never();
        let gate = AccessGate::verified("quant@example.com", Some("  "), &roster).await;
        assert!(!gate.is_granted());
        let gate = AccessGate::verified("quant@example.com", None, &roster).await;
        assert!(!gate.is_granted());
    }

    #[tokio::test]
    async fn test_fetch_failure_denies() {
        let mut roster = MockRosterSource::new();
        roster.expect_fetch().returning(|_| Err(Error::Transport("timed out".into())));
        let gate =
            AccessGate::verified("quant@example.com", Some("https://roster.example.com/users.json"), &roster)
                .await;
        assert!(gate.authorize().unwrap_err().to_string().contains("timed out"));
    }

    #[test]
    fn test_roster_matching_is_token_based() {
        assert!(roster_contains("a@x.io, b@x.io", "b@x.io"));
        assert!(!roster_contains("ab@x.io", "b@x.io"));
        assert!(!roster_contains("a@x.io", ""));
        assert!(roster_contains(r#"{"users": ["a@x.io"]}"#, "a@x.io"));
    }
}
