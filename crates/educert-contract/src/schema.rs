//! # Schema Registry Types
//!
//! A schema fixes the leaf order of every commitment issued under its
//! version. Published schemas are immutable, so lookups are memoized in a
//! [`SchemaCache`] that is never invalidated.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use educert_core::SchemaVersion;

use crate::error::ContractError;
use crate::records::{DocType, LedgerRecord};

/// Identifier of the schema published by `init_ledger`.
pub const DEFAULT_SCHEMA_ID: &str = "university degree";
/// Version of the schema published by `init_ledger`.
pub const DEFAULT_SCHEMA_VERSION: &str = "v1";
/// Attribute order of the default degree schema.
pub const DEFAULT_DEGREE_ATTRIBUTES: [&str; 5] = [
    "universityName",
    "major",
    "departmentName",
    "cgpa",
    "certUUID",
];

/// An ordered list of attribute names under a version label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Schema {
    pub id: String,
    pub version: SchemaVersion,
    pub ordering: Vec<String>,
}

impl LedgerRecord for Schema {
    const DOC_TYPE: DocType = DocType::Schema;
}

impl Schema {
    /// Validate and build a schema.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if the id is blank, the ordering is empty, or an
    /// attribute name is blank or repeated.
    pub fn new(
        id: impl Into<String>,
        version: SchemaVersion,
        ordering: Vec<String>,
    ) -> Result<Self, ContractError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ContractError::InvalidRequest("schema id must not be empty".into()));
        }
        if ordering.is_empty() {
            return Err(ContractError::InvalidRequest(
                "schema must name at least one attribute".into(),
            ));
        }
        let mut seen = HashSet::with_capacity(ordering.len());
        for name in &ordering {
            if name.trim().is_empty() {
                return Err(ContractError::InvalidRequest(
                    "attribute names must not be empty".into(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ContractError::InvalidRequest(format!(
                    "attribute {name:?} appears more than once"
                )));
            }
        }
        Ok(Self {
            id,
            version,
            ordering,
        })
    }

    /// The degree schema published by `init_ledger`.
    pub fn default_degree() -> Result<Self, ContractError> {
        Self::new(
            DEFAULT_SCHEMA_ID,
            SchemaVersion::new(DEFAULT_SCHEMA_VERSION)?,
            DEFAULT_DEGREE_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.ordering.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordering.is_empty()
    }

    /// Leaf position of an attribute.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.ordering.iter().position(|n| n == name)
    }

    /// Leaf positions for a disclosure request, in request order.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an empty request, an unknown name, or a name
    /// requested twice.
    pub fn indices_of<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>, ContractError> {
        if names.is_empty() {
            return Err(ContractError::InvalidRequest(
                "at least one attribute must be disclosed".into(),
            ));
        }
        let mut seen = HashSet::with_capacity(names.len());
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let index = self.index_of(name).ok_or_else(|| {
                    ContractError::InvalidRequest(format!(
                        "attribute {name:?} is not part of schema {}",
                        self.version
                    ))
                })?;
                if !seen.insert(index) {
                    return Err(ContractError::InvalidRequest(format!(
                        "attribute {name:?} requested more than once"
                    )));
                }
                Ok(index)
            })
            .collect()
    }

    /// Arrange named attribute values in schema order.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if a schema attribute is missing or `values` names
    /// an attribute the schema does not have.
    pub fn ordered_values(
        &self,
        values: &BTreeMap<String, String>,
    ) -> Result<Vec<String>, ContractError> {
        if let Some(extra) = values.keys().find(|k| self.index_of(k).is_none()) {
            return Err(ContractError::InvalidRequest(format!(
                "attribute {extra:?} is not part of schema {}",
                self.version
            )));
        }
        self.ordering
            .iter()
            .map(|name| {
                values.get(name).cloned().ok_or_else(|| {
                    ContractError::InvalidRequest(format!("missing value for attribute {name:?}"))
                })
            })
            .collect()
    }
}

// ─── Cache ───────────────────────────────────────────────────────────

/// Memoizes schema lookups by version.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct SchemaCache {
    entries: Arc<RwLock<HashMap<SchemaVersion, Arc<Schema>>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, version: &SchemaVersion) -> Option<Arc<Schema>> {
        self.entries.read().get(version).cloned()
    }

    /// Insert a schema, keeping any entry already cached for its version.
    pub fn insert(&self, schema: Schema) -> Arc<Schema> {
        let mut entries = self.entries.write();
        entries
            .entry(schema.version.clone())
            .or_insert_with(|| Arc::new(schema))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
