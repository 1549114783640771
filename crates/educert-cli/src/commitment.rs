//! # Commitment Subcommands
//!
//! Merkle commitments and selective-disclosure proofs over a local
//! attribute file, and verification of such proofs against a commitment.
//!
//! Attribute files map attribute names to string values. Leaf order comes
//! from the schema (`--schema`, default: the degree schema).

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use educert_contract::Schema;
use educert_core::{CommitmentHash, SchemaVersion};
use educert_crypto::{leaf_hash, MerkleTree, MultiProof};

/// Arguments for `educert commit`.
#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Schema file (JSON or YAML). Defaults to the degree schema.
    #[arg(long)]
    pub schema: Option<PathBuf>,
    /// Attribute values file (JSON or YAML).
    #[arg(long)]
    pub values: PathBuf,
}

/// Arguments for `educert prove`.
#[derive(Args, Debug)]
pub struct ProveArgs {
    /// Schema file (JSON or YAML). Defaults to the degree schema.
    #[arg(long)]
    pub schema: Option<PathBuf>,
    /// Attribute values file (JSON or YAML).
    #[arg(long)]
    pub values: PathBuf,
    /// Comma-separated attribute names to disclose.
    #[arg(long, value_delimiter = ',', required = true)]
    pub disclose: Vec<String>,
}

/// Arguments for `educert verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Trusted commitment hash (64 hex characters).
    #[arg(long)]
    pub root: String,
    /// Proof file written by `educert prove`.
    #[arg(long)]
    pub proof: PathBuf,
}

/// One revealed attribute with its leaf position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisclosedAttribute {
    pub index: usize,
    pub name: String,
    pub value: String,
}

/// A self-contained disclosure proof. `disclosed` is in ascending leaf
/// order, matching `proof.indices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DisclosureProof {
    pub commitment: CommitmentHash,
    pub schema_version: SchemaVersion,
    pub disclosed: Vec<DisclosedAttribute>,
    pub proof: MultiProof,
}

/// Execute `educert commit`. Prints the commitment hash.
pub fn run_commit(args: &CommitArgs) -> Result<u8> {
    let schema = crate::load_schema(args.schema.as_deref())?;
    let values: BTreeMap<String, String> = crate::load_document(&args.values)?;
    let commitment = commit_values(&schema, &values)?;
    println!("{}", commitment.to_hex());
    Ok(0)
}

/// Execute `educert prove`. Prints the proof as JSON.
pub fn run_prove(args: &ProveArgs) -> Result<u8> {
    let schema = crate::load_schema(args.schema.as_deref())?;
    let values: BTreeMap<String, String> = crate::load_document(&args.values)?;
    let proof = build_proof(&schema, &values, &args.disclose)?;
    println!("{}", serde_json::to_string_pretty(&proof)?);
    Ok(0)
}

/// Execute `educert verify`. Exit code 0 when the proof holds, 1 when not.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let root = CommitmentHash::from_hex(&args.root)
        .map_err(|e| anyhow::anyhow!("invalid root: {e}"))?;
    let proof: DisclosureProof = crate::load_document(&args.proof)?;

    if proof.commitment != root {
        println!("FAIL: proof was cut from commitment {}", proof.commitment.to_hex());
        return Ok(1);
    }
    if check_proof(&root, &proof) {
        println!("OK: proof is valid");
        for attr in &proof.disclosed {
            println!("  {} = {}", attr.name, attr.value);
        }
        Ok(0)
    } else {
        println!("FAIL: proof does not reproduce the commitment");
        Ok(1)
    }
}

/// The Merkle commitment over `values` in schema order.
pub fn commit_values(schema: &Schema, values: &BTreeMap<String, String>) -> Result<CommitmentHash> {
    let ordered = schema.ordered_values(values)?;
    Ok(MerkleTree::from_values(&ordered)?.commitment())
}

/// Build a proof revealing `names`.
pub fn build_proof<N: AsRef<str>>(
    schema: &Schema,
    values: &BTreeMap<String, String>,
    names: &[N],
) -> Result<DisclosureProof> {
    let ordered = schema.ordered_values(values)?;
    let mut indices = schema.indices_of(names)?;
    indices.sort_unstable();

    let tree = MerkleTree::from_values(&ordered)?;
    let proof = tree
        .multi_proof(&indices)
        .context("failed to build multiproof")?;
    let disclosed = indices
        .iter()
        .map(|&i| DisclosedAttribute {
            index: i,
            name: schema.ordering[i].clone(),
            value: ordered[i].clone(),
        })
        .collect();

    Ok(DisclosureProof {
        commitment: tree.commitment(),
        schema_version: schema.version.clone(),
        disclosed,
        proof,
    })
}

/// Whether the disclosed values and proof hashes reproduce `root`.
pub fn check_proof(root: &CommitmentHash, proof: &DisclosureProof) -> bool {
    if proof
        .disclosed
        .iter()
        .map(|a| a.index)
        .ne(proof.proof.indices.iter().copied())
    {
        return false;
    }
    let leaves: Vec<[u8; 32]> = proof.disclosed.iter().map(|a| leaf_hash(&a.value)).collect();
    proof.proof.verify(root.as_bytes(), &leaves)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_schema() -> Schema {
        Schema::new(
            "transcript",
            SchemaVersion::new("v2").unwrap(),
            ["org", "field", "dept", "score", "id"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap()
    }

    fn scenario_values() -> BTreeMap<String, String> {
        [
            ("org", "A State"),
            ("field", "CS"),
            ("dept", "Engineering"),
            ("score", "3.8"),
            ("id", "cert-001"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn proof_for_two_attributes_verifies() {
        let schema = scenario_schema();
        let values = scenario_values();
        let root = commit_values(&schema, &values).unwrap();

        let proof = build_proof(&schema, &values, &["score", "field"]).unwrap();
        assert_eq!(proof.commitment, root);
        assert_eq!(proof.proof.indices, vec![1, 3]);
        assert_eq!(proof.proof.depth, 3);
        assert_eq!(proof.disclosed[0].value, "CS");
        assert_eq!(proof.disclosed[1].value, "3.8");
        assert!(check_proof(&root, &proof));
    }

    #[test]
    fn altered_value_fails() {
        let schema = scenario_schema();
        let values = scenario_values();
        let root = commit_values(&schema, &values).unwrap();
        let mut proof = build_proof(&schema, &values, &["field", "score"]).unwrap();
        proof.disclosed[1].value = "3.9".into();
        assert!(!check_proof(&root, &proof));
    }

    #[test]
    fn moved_index_fails() {
        let schema = scenario_schema();
        let values = scenario_values();
        let root = commit_values(&schema, &values).unwrap();
        let mut proof = build_proof(&schema, &values, &["field"]).unwrap();
        proof.disclosed[0].index = 2;
        assert!(!check_proof(&root, &proof));
    }

    #[test]
    fn missing_value_is_an_error() {
        let schema = scenario_schema();
        let mut values = scenario_values();
        values.remove("dept");
        assert!(commit_values(&schema, &values).is_err());
    }

    #[test]
    fn verify_command_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let schema = scenario_schema();
        let values = scenario_values();
        let root = commit_values(&schema, &values).unwrap();
        let proof = build_proof(&schema, &values, &["org"]).unwrap();

        let path = dir.path().join("proof.json");
        std::fs::write(&path, serde_json::to_string_pretty(&proof).unwrap()).unwrap();
        let ok = run_verify(&VerifyArgs {
            root: root.to_hex(),
            proof: path.clone(),
        })
        .unwrap();
        assert_eq!(ok, 0);

        let other = CommitmentHash::from_bytes([1u8; 32]).to_hex();
        let fail = run_verify(&VerifyArgs { root: other, proof: path }).unwrap();
        assert_eq!(fail, 1);
    }
}
