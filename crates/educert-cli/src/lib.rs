//! # educert-cli: CLI Tool for EduCert
//!
//! Offline tooling for issuers, holders and verifiers. Nothing here talks
//! to the ledger; every command works on local files.
//!
//! ## Subcommands
//!
//! - `educert keygen`: P-256 key pair generation.
//! - `educert sign`: sign a commitment hash.
//! - `educert commit`: Merkle commitment over attribute values.
//! - `educert prove`: selective-disclosure proof for chosen attributes.
//! - `educert verify`: check a proof against a commitment.
//!
//! ```bash
//! educert keygen --output keys --prefix registrar
//! educert commit --values degree.yaml
//! educert sign --key keys/registrar.key --hash 3f1c...
//! educert prove --values degree.yaml --disclose major,cgpa > proof.json
//! educert verify --root 3f1c... --proof proof.json
//! ```

pub mod commitment;
pub mod keys;

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use educert_contract::Schema;

/// Read a JSON or YAML document. Files ending in `.json` are parsed as
/// JSON, everything else as YAML.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON: {}", path.display()))
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML: {}", path.display()))
    }
}

/// Load and validate a schema file, or the default degree schema when no
/// path is given.
pub fn load_schema(path: Option<&Path>) -> Result<Schema> {
    let schema = match path {
        Some(path) => {
            let raw: Schema = load_document(path)?;
            Schema::new(raw.id, raw.version, raw.ordering)
                .with_context(|| format!("invalid schema: {}", path.display()))?
        }
        None => Schema::default_degree().context("default schema")?,
    };
    Ok(schema)
}
