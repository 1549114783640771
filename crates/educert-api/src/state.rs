//! # Application State
//!
//! The shared state handed to every handler: one [`CredentialService`]
//! over the in-memory ledger plus the configuration it was built from.
//! Cloning is cheap; the service holds its contract and attribute store
//! behind `Arc`s.

use std::path::PathBuf;
use std::sync::Arc;

use educert_contract::{
    AttributeStore, ContactMatch, ContractError, CredentialService, EducertContract,
    FileAttributeStore, InMemoryAttributeStore, PolicyConfig,
};
use educert_core::{ContactAttribute, OrganizationId, ValidationError};
use educert_ledger::InMemoryLedger;
use thiserror::Error;

// ─── Configuration ───────────────────────────────────────────────────

/// Application configuration.
///
/// Custom `Debug` redacts the `auth_token` to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// Issuing organization, admin contact and contact matching.
    pub policy: PolicyConfig,
    /// Emit JSON log lines instead of the human-readable format.
    pub log_json: bool,
    /// Directory for the file-backed attribute store. In-memory when `None`.
    pub attribute_dir: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("policy", &self.policy)
            .field("log_json", &self.log_json)
            .field("attribute_dir", &self.attribute_dir)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            policy: default_policy(),
            log_json: false,
            attribute_dir: None,
        }
    }
}

/// A configuration variable held an unusable value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a port number, got {value:?}")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl AppConfig {
    /// Read the configuration from the process environment.
    ///
    /// | Variable        | Default   |
    /// |-----------------|-----------|
    /// | `PORT`          | `8080`    |
    /// | `AUTH_TOKEN`    | unset     |
    /// | `ISSUING_ORG`   | `Org1MSP` |
    /// | `ADMIN_CONTACT` | `admin`   |
    /// | `CONTACT_MATCH` | `exact`   |
    /// | `LOG_FORMAT`    | text      |
    /// | `ATTRIBUTE_DIR` | in-memory |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let set = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port = match set("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort { var: "PORT", value })?,
            None => defaults.port,
        };

        let issuing_organization = match set("ISSUING_ORG") {
            Some(org) => OrganizationId::new(org).map_err(invalid("ISSUING_ORG"))?,
            None => defaults.policy.issuing_organization,
        };
        let admin_contact = match set("ADMIN_CONTACT") {
            Some(contact) => ContactAttribute::new(contact).map_err(invalid("ADMIN_CONTACT"))?,
            None => defaults.policy.admin_contact,
        };
        let contact_match = match set("CONTACT_MATCH") {
            Some(mode) => mode
                .trim()
                .parse::<ContactMatch>()
                .map_err(|reason| ConfigError::Invalid {
                    var: "CONTACT_MATCH",
                    reason,
                })?,
            None => defaults.policy.contact_match,
        };

        Ok(Self {
            port,
            auth_token: set("AUTH_TOKEN"),
            policy: PolicyConfig::new(issuing_organization, admin_contact, contact_match),
            log_json: set("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            attribute_dir: set("ATTRIBUTE_DIR").map(PathBuf::from),
        })
    }
}

fn invalid(var: &'static str) -> impl Fn(ValidationError) -> ConfigError {
    move |e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    }
}

fn default_policy() -> PolicyConfig {
    // The default identifiers are non-empty literals.
    PolicyConfig::standard().unwrap_or_else(|_| unreachable!("default policy identifiers are valid"))
}

// ─── State ───────────────────────────────────────────────────────────

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: CredentialService<InMemoryLedger>,
    pub config: AppConfig,
}

impl AppState {
    /// Build the state for `config`, initializing the ledger with the
    /// default schema.
    pub fn try_with_config(config: AppConfig) -> Result<Self, ContractError> {
        let attributes: Arc<dyn AttributeStore> = match &config.attribute_dir {
            Some(dir) => Arc::new(FileAttributeStore::new(dir.clone())),
            None => Arc::new(InMemoryAttributeStore::new()),
        };
        Self::with_attribute_store(config, InMemoryLedger::new(), attributes)
    }

    /// Build the state over an explicit ledger and attribute store.
    pub fn with_attribute_store(
        config: AppConfig,
        ledger: InMemoryLedger,
        attributes: Arc<dyn AttributeStore>,
    ) -> Result<Self, ContractError> {
        let contract = EducertContract::new(ledger, config.policy.clone());
        let schema = contract.init_ledger()?;
        tracing::debug!(schema_version = %schema.version, "default schema available");
        Ok(Self {
            service: CredentialService::new(Arc::new(contract), attributes),
            config,
        })
    }

    pub fn contract(&self) -> &EducertContract<InMemoryLedger> {
        self.service.contract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.auth_token.is_none());
        assert_eq!(config.policy.issuing_organization.as_str(), "Org1MSP");
        assert_eq!(config.policy.admin_contact.as_str(), "admin");
        assert_eq!(config.policy.contact_match, ContactMatch::Exact);
        assert!(!config.log_json);
        assert!(config.attribute_dir.is_none());
    }

    #[test]
    fn reads_every_variable() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("AUTH_TOKEN", "s3cret"),
            ("ISSUING_ORG", "UniversityMSP"),
            ("ADMIN_CONTACT", "registrar@uni.edu"),
            ("CONTACT_MATCH", "dot-insensitive"),
            ("LOG_FORMAT", "JSON"),
            ("ATTRIBUTE_DIR", "/var/lib/educert"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.auth_token.as_deref(), Some("s3cret"));
        assert_eq!(config.policy.issuing_organization.as_str(), "UniversityMSP");
        assert_eq!(config.policy.admin_contact.as_str(), "registrar@uni.edu");
        assert_eq!(config.policy.contact_match, ContactMatch::DotInsensitive);
        assert!(config.log_json);
        assert_eq!(
            config.attribute_dir.as_deref(),
            Some(std::path::Path::new("/var/lib/educert"))
        );
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("AUTH_TOKEN", "  "), ("PORT", "")])).unwrap();
        assert!(config.auth_token.is_none());
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn rejects_bad_port() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { var: "PORT", .. }));
    }

    #[test]
    fn rejects_unknown_contact_match() {
        let err = AppConfig::from_lookup(lookup(&[("CONTACT_MATCH", "fuzzy")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "CONTACT_MATCH",
                ..
            }
        ));
    }

    #[test]
    fn debug_redacts_auth_token() {
        let config = AppConfig {
            auth_token: Some("super-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn state_initializes_default_schema() {
        let state = AppState::try_with_config(AppConfig::default()).unwrap();
        assert_eq!(state.contract().schema_cache().len(), 1);
        assert_eq!(state.contract().ledger().len(), 1);
    }
}
