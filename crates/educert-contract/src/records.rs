//! # Ledger Records and the Versioned Envelope Codec
//!
//! Every value the contract writes is wrapped in an envelope:
//!
//! ```json
//! {"body": {...}, "docType": "credential", "formatVersion": 1}
//! ```
//!
//! and serialized as canonical JSON through [`CanonicalBytes`]. Decoding is
//! strict. An unknown field at any level, a `docType` other than the one
//! the caller expects, or a `formatVersion` other than
//! [`FORMAT_VERSION`] is an error.
//!
//! Selector queries address the body through dotted paths, for example
//! `body.holderPublicKey`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use educert_core::{
    CanonicalBytes, CommitmentHash, ContactAttribute, CredentialId, EncodedPublicKey, IssuerName,
    SchemaVersion, Timestamp,
};
use educert_state::{CredentialLifecycle, LifecycleError};

/// Envelope format version written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Discriminator stored alongside every record body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocType {
    Schema,
    Issuer,
    Credential,
    PublicKeyBinding,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Issuer => "issuer",
            Self::Credential => "credential",
            Self::PublicKeyBinding => "publicKeyBinding",
        }
    }
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type that is stored on the ledger under a fixed [`DocType`].
pub trait LedgerRecord: Serialize + DeserializeOwned {
    const DOC_TYPE: DocType;

    /// Cross-field consistency of a decoded body.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("expected a {expected} record, found {found}")]
    WrongDocType { expected: DocType, found: DocType },

    #[error("unsupported record format version {0}")]
    UnsupportedVersion(u32),

    #[error("malformed {doc_type} record: {reason}")]
    Malformed { doc_type: DocType, reason: String },

    #[error("cannot encode {doc_type} record: {reason}")]
    Encode { doc_type: DocType, reason: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRef<'a, T> {
    doc_type: DocType,
    format_version: u32,
    body: &'a T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawEnvelope {
    doc_type: DocType,
    format_version: u32,
    body: serde_json::Value,
}

/// Wrap `record` in an envelope and produce its canonical bytes.
pub fn encode<T: LedgerRecord>(record: &T) -> Result<Vec<u8>, CodecError> {
    let envelope = EnvelopeRef {
        doc_type: T::DOC_TYPE,
        format_version: FORMAT_VERSION,
        body: record,
    };
    CanonicalBytes::new(&envelope)
        .map(CanonicalBytes::into_vec)
        .map_err(|e| CodecError::Encode {
            doc_type: T::DOC_TYPE,
            reason: e.to_string(),
        })
}

/// Strictly decode bytes written by [`encode`].
pub fn decode<T: LedgerRecord>(bytes: &[u8]) -> Result<T, CodecError> {
    let malformed = |reason: String| CodecError::Malformed {
        doc_type: T::DOC_TYPE,
        reason,
    };
    let raw: RawEnvelope = serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
    if raw.doc_type != T::DOC_TYPE {
        return Err(CodecError::WrongDocType {
            expected: T::DOC_TYPE,
            found: raw.doc_type,
        });
    }
    if raw.format_version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(raw.format_version));
    }
    let record: T = serde_json::from_value(raw.body).map_err(|e| malformed(e.to_string()))?;
    record.check().map_err(malformed)?;
    Ok(record)
}

// ─── Issuer ──────────────────────────────────────────────────────────

/// Public profile of a registered issuing university.
///
/// Stored under both `ISSUER_<name>` and `ISSUER_BY_CONTACT_<contact>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IssuerProfile {
    pub name: IssuerName,
    pub public_key: EncodedPublicKey,
    pub contact_attribute: ContactAttribute,
    pub location: String,
    pub description: String,
}

impl LedgerRecord for IssuerProfile {
    const DOC_TYPE: DocType = DocType::Issuer;
}

/// Binds a public key to the issuer that registered it
/// (`PUBLICKEY_<key>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PublicKeyBinding {
    pub public_key: EncodedPublicKey,
    pub issuer_name: IssuerName,
}

impl LedgerRecord for PublicKeyBinding {
    const DOC_TYPE: DocType = DocType::PublicKeyBinding;
}

// ─── Credential ──────────────────────────────────────────────────────

/// The on-ledger credential. Attribute values never appear here, only
/// their commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CredentialRecord {
    pub id: CredentialId,
    pub commitment_hash: CommitmentHash,
    pub issuer_signature: String,
    pub holder_signature: String,
    pub issued_date: Timestamp,
    pub issuer_public_key: EncodedPublicKey,
    pub holder_public_key: EncodedPublicKey,
    /// Contact attribute of the caller that issued the credential. Absent
    /// on legacy records.
    #[serde(default)]
    pub issuer_identity_claim: Option<ContactAttribute>,
    pub schema_version: SchemaVersion,
    pub revoked: bool,
    #[serde(default)]
    pub revocation_reason: Option<String>,
    #[serde(default)]
    pub revoked_at: Option<Timestamp>,
}

impl LedgerRecord for CredentialRecord {
    const DOC_TYPE: DocType = DocType::Credential;

    fn check(&self) -> Result<(), String> {
        self.lifecycle().map(|_| ()).map_err(|e| e.to_string())
    }
}

impl CredentialRecord {
    /// Rebuild the lifecycle from the stored revocation fields.
    pub fn lifecycle(&self) -> Result<CredentialLifecycle, LifecycleError> {
        CredentialLifecycle::from_stored(
            self.revoked,
            self.revocation_reason.clone(),
            self.revoked_at,
        )
    }

    /// Copy the lifecycle's revocation state back onto the record.
    pub fn apply(&mut self, lifecycle: &CredentialLifecycle) {
        self.revoked = lifecycle.is_revoked();
        match lifecycle.revocation() {
            Some(r) => {
                self.revocation_reason = Some(r.reason.clone());
                self.revoked_at = Some(r.revoked_at);
            }
            None => {
                self.revocation_reason = None;
                self.revoked_at = None;
            }
        }
    }
}
