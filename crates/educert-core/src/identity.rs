//! # Domain Identity Newtypes
//!
//! Newtype wrappers for every identifier that reaches the ledger. You cannot
//! pass an `IssuerName` where a `ContactAttribute` is expected, and each
//! value is validated once, at construction or deserialization.
//!
//! ## Security Invariant
//!
//! String identifiers are embedded into ledger keys. They must be non-empty
//! and free of the NUL character, which some ledgers reserve as a composite
//! key separator. An issuer name must also stay inside the `ISSUER_`
//! namespace: `ISSUER_` prefixes the contact index, so a name such as
//! `BY_CONTACT_x` would address another issuer's contact entry.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::keys::KeyNamespace;

/// Unique identifier of a credential (the certificate UUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(pub Uuid);

impl CredentialId {
    /// Generate a new random credential identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the hyphenated UUID text form.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| ValidationError::Malformed {
                field: "credential id",
                reason: e.to_string(),
            })
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CredentialId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CredentialId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn validate_key_component(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.contains('\0') {
        return Err(ValidationError::ForbiddenCharacter {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn validate_issuer_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    validate_key_component(field, value)?;
    let key = format!("{}{value}", KeyNamespace::Issuer.prefix());
    if KeyNamespace::of(&key) != Some(KeyNamespace::Issuer) {
        return Err(ValidationError::Malformed {
            field,
            reason: format!("{value:?} falls outside the issuer key namespace"),
        });
    }
    Ok(())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        string_id!($(#[$meta])* $name, $field, validate_key_component);
    };
    ($(#[$meta:meta])* $name:ident, $field:literal, $check:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                $check($field, &value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Version label of a published schema (e.g. `v1`).
    SchemaVersion,
    "schema version"
);

string_id!(
    /// Unique name of an issuing university.
    IssuerName,
    "issuer name",
    validate_issuer_name
);

string_id!(
    /// Identity attribute asserted by the caller's credential, typically an
    /// email address. Unique per issuer profile.
    ContactAttribute,
    "contact attribute"
);

string_id!(
    /// Membership-service identifier of the caller's organization.
    OrganizationId,
    "organization"
);

string_id!(
    /// A P-256 public key as text: SubjectPublicKeyInfo PEM or uncompressed
    /// coordinate hex. Kept as given; the contract re-encodes keys to one
    /// canonical form before storing or comparing them.
    EncodedPublicKey,
    "public key"
);
