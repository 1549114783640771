//! # Ledger Key Namespace
//!
//! Every ledger key is a namespace prefix followed by an identifier. Keys
//! are only ever produced by the constructors on [`LedgerKey`], so two code
//! paths can never disagree on how a credential or issuer is addressed.
//!
//! | Namespace | Key | Value |
//! |---|---|---|
//! | schema | `SCHEMA_<version>` | schema record |
//! | issuer | `ISSUER_<name>` | issuer profile |
//! | issuer by contact | `ISSUER_BY_CONTACT_<contact>` | issuer profile |
//! | public key | `PUBLICKEY_<key>` | public key binding |
//! | credential | `CRED_<id>` | credential record |

use serde::{Deserialize, Serialize};

use crate::identity::{ContactAttribute, CredentialId, EncodedPublicKey, IssuerName, SchemaVersion};

/// The fixed set of key namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyNamespace {
    Schema,
    Issuer,
    IssuerByContact,
    PublicKey,
    Credential,
}

impl KeyNamespace {
    /// Key prefix, including the trailing underscore.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Schema => "SCHEMA_",
            Self::Issuer => "ISSUER_",
            Self::IssuerByContact => "ISSUER_BY_CONTACT_",
            Self::PublicKey => "PUBLICKEY_",
            Self::Credential => "CRED_",
        }
    }

    /// Classify a raw key. `ISSUER_BY_CONTACT_` is checked before `ISSUER_`
    /// because the latter is a prefix of the former.
    pub fn of(key: &str) -> Option<Self> {
        [
            Self::IssuerByContact,
            Self::Issuer,
            Self::Schema,
            Self::PublicKey,
            Self::Credential,
        ]
        .into_iter()
        .find(|ns| key.starts_with(ns.prefix()))
    }
}

impl std::fmt::Display for KeyNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix().trim_end_matches('_'))
    }
}

/// A fully qualified ledger key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerKey(String);

impl LedgerKey {
    fn namespaced(ns: KeyNamespace, id: &str) -> Self {
        Self(format!("{}{}", ns.prefix(), id))
    }

    pub fn schema(version: &SchemaVersion) -> Self {
        Self::namespaced(KeyNamespace::Schema, version.as_str())
    }

    pub fn issuer(name: &IssuerName) -> Self {
        Self::namespaced(KeyNamespace::Issuer, name.as_str())
    }

    pub fn issuer_by_contact(contact: &ContactAttribute) -> Self {
        Self::namespaced(KeyNamespace::IssuerByContact, contact.as_str())
    }

    pub fn public_key(key: &EncodedPublicKey) -> Self {
        Self::namespaced(KeyNamespace::PublicKey, key.as_str())
    }

    pub fn credential(id: &CredentialId) -> Self {
        Self::namespaced(KeyNamespace::Credential, &id.to_string())
    }

    /// Wrap a key read back from the store (e.g. a selector query result).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> Option<KeyNamespace> {
        KeyNamespace::of(&self.0)
    }
}

impl std::fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LedgerKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
