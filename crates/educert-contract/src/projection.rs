//! # Off-Ledger Attribute Projection
//!
//! The ledger holds only commitments. Full attribute values live in an
//! [`AttributeStore`] keyed by credential id, which disclosure proofs are
//! cut from.
//!
//! ## Integrity Invariant
//!
//! A stored projection must rebuild the exact commitment recorded on the
//! ledger. The store itself does not know the commitment; the contract
//! checks it on every proof generation and reports drift as `SyncGap`.
//!
//! Two implementations are provided: [`InMemoryAttributeStore`] and
//! [`FileAttributeStore`], which keeps one canonical JSON file per
//! credential at `{base_dir}/{credential_id}.json`.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use educert_core::{CanonicalBytes, CredentialId, SchemaVersion};

/// Attribute values of one credential, by attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CredentialAttributes {
    pub credential_id: CredentialId,
    pub schema_version: SchemaVersion,
    pub values: BTreeMap<String, String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// Projections are written once per credential.
    #[error("attributes for credential {0} are already stored")]
    AlreadyStored(CredentialId),

    #[error("stored attributes for credential {id} are malformed: {reason}")]
    Malformed { id: CredentialId, reason: String },

    #[error("attribute store I/O failure: {0}")]
    Io(String),
}

impl From<std::io::Error> for ProjectionError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Storage for full credential attribute values.
pub trait AttributeStore: Send + Sync {
    /// Store the attributes of a newly issued credential.
    fn save(&self, attributes: &CredentialAttributes) -> Result<(), ProjectionError>;

    fn load(&self, id: &CredentialId) -> Result<Option<CredentialAttributes>, ProjectionError>;
}

// ─── In-memory ───────────────────────────────────────────────────────

/// Shared in-process projection. Clones see the same entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAttributeStore {
    entries: Arc<RwLock<HashMap<CredentialId, CredentialAttributes>>>,
}

impl InMemoryAttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace a stored projection unconditionally.
    pub fn overwrite(&self, attributes: CredentialAttributes) {
        self.entries
            .write()
            .insert(attributes.credential_id, attributes);
    }
}

impl AttributeStore for InMemoryAttributeStore {
    fn save(&self, attributes: &CredentialAttributes) -> Result<(), ProjectionError> {
        let mut entries = self.entries.write();
        if entries.contains_key(&attributes.credential_id) {
            return Err(ProjectionError::AlreadyStored(attributes.credential_id));
        }
        entries.insert(attributes.credential_id, attributes.clone());
        Ok(())
    }

    fn load(&self, id: &CredentialId) -> Result<Option<CredentialAttributes>, ProjectionError> {
        Ok(self.entries.read().get(id).cloned())
    }
}

// ─── Filesystem ──────────────────────────────────────────────────────

/// One canonical JSON file per credential under a base directory.
///
/// The directory is created on the first save.
#[derive(Debug, Clone)]
pub struct FileAttributeStore {
    base_dir: PathBuf,
}

impl FileAttributeStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path_for(&self, id: &CredentialId) -> PathBuf {
        self.base_dir.join(format!("{id}.json"))
    }
}

impl AttributeStore for FileAttributeStore {
    fn save(&self, attributes: &CredentialAttributes) -> Result<(), ProjectionError> {
        let id = attributes.credential_id;
        let bytes = CanonicalBytes::new(attributes).map_err(|e| ProjectionError::Malformed {
            id,
            reason: e.to_string(),
        })?;
        fs::create_dir_all(&self.base_dir)?;

        // create_new makes the existence check and the create one step.
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path_for(&id))
        {
            Ok(mut f) => {
                f.write_all(bytes.as_bytes())?;
                f.sync_all()?;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(ProjectionError::AlreadyStored(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn load(&self, id: &CredentialId) -> Result<Option<CredentialAttributes>, ProjectionError> {
        let bytes = match fs::read(self.path_for(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let attributes: CredentialAttributes =
            serde_json::from_slice(&bytes).map_err(|e| ProjectionError::Malformed {
                id: *id,
                reason: e.to_string(),
            })?;
        if attributes.credential_id != *id {
            return Err(ProjectionError::Malformed {
                id: *id,
                reason: format!("file holds credential {}", attributes.credential_id),
            });
        }
        Ok(Some(attributes))
    }
}
