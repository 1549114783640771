//! # Selective Disclosure
//!
//! A holder reveals a subset of a credential's attributes together with a
//! Merkle multiproof. A verifier hashes the revealed values, replays the
//! proof, and compares the result with the commitment recorded on the
//! ledger. Undisclosed values never leave the attribute store.
//!
//! ## Security Invariant
//!
//! Verification trusts nothing in the bundle except the values and the
//! proof hashes. The leaf order comes from the published schema and the
//! root comes from the ledger record, so a bundle cannot move a value to
//! a different attribute or vouch for a different commitment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use educert_core::{CredentialId, SchemaVersion, Timestamp};
use educert_crypto::{leaf_hash, MerkleTree, MultiProof};
use educert_ledger::LedgerStore;

use crate::contract::EducertContract;
use crate::error::ContractError;
use crate::policy::CallerContext;
use crate::projection::AttributeStore;
use crate::records::CredentialRecord;

/// Disclosed attributes of one credential plus the proof that they belong
/// to its commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProofBundle {
    pub credential_id: CredentialId,
    pub schema_version: SchemaVersion,
    /// Attribute name to disclosed value.
    pub disclosed: BTreeMap<String, String>,
    pub proof: MultiProof,
}

/// Outcome of checking a bundle against the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisclosureVerdict {
    /// The proof is valid and the credential is not revoked.
    Verified,
    /// The proof is valid but the credential has been revoked.
    Revoked {
        reason: String,
        #[serde(rename = "revokedAt")]
        revoked_at: Timestamp,
    },
    /// The proof does not match the ledger.
    Rejected,
}

impl<S: LedgerStore> EducertContract<S> {
    /// Build a proof revealing `attribute_names` of credential `id`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the credential does not exist.
    /// - `Unauthorized` unless the caller is the holder, the issuer, or the
    ///   admin.
    /// - `InvalidRequest` for an empty, unknown, or repeated attribute name.
    /// - `SyncGap` if the stored attributes are missing or no longer
    ///   rebuild the on-ledger commitment.
    pub fn generate_disclosure_proof<N: AsRef<str>>(
        &self,
        caller: &CallerContext,
        id: &CredentialId,
        attribute_names: &[N],
        attributes: &dyn AttributeStore,
    ) -> Result<ProofBundle, ContractError> {
        let record = self.load_credential(id)?;
        if !self.policy().can_view(caller, &record) {
            tracing::warn!(
                credential_id = %id,
                organization = %caller.organization,
                "disclosure proof denied"
            );
            return Err(ContractError::Unauthorized(
                "only the holder, the issuer, or the admin may generate a disclosure proof".into(),
            ));
        }

        let schema = self.get_schema(&record.schema_version)?;
        let indices = schema.indices_of(attribute_names)?;

        let sync_gap = |reason: String| {
            tracing::error!(credential_id = %id, reason = %reason, "attribute store out of sync with ledger");
            ContractError::SyncGap {
                credential_id: *id,
                reason,
            }
        };
        let stored = attributes
            .load(id)
            .map_err(|e| sync_gap(e.to_string()))?
            .ok_or_else(|| sync_gap("no attributes stored for credential".into()))?;
        let values = schema
            .ordered_values(&stored.values)
            .map_err(|e| sync_gap(e.to_string()))?;

        let tree = MerkleTree::from_values(&values)?;
        if tree.commitment() != record.commitment_hash {
            return Err(sync_gap(
                "stored attributes do not rebuild the ledger commitment".into(),
            ));
        }
        let proof = tree.multi_proof(&indices)?;

        let disclosed = indices
            .iter()
            .map(|&i| (schema.ordering[i].clone(), values[i].clone()))
            .collect();

        tracing::info!(credential_id = %id, disclosed = indices.len(), "disclosure proof generated");
        Ok(ProofBundle {
            credential_id: *id,
            schema_version: record.schema_version,
            disclosed,
            proof,
        })
    }

    /// Whether the bundle's values belong to the credential's on-ledger
    /// commitment. Every malformed or mismatched bundle yields `false`.
    pub fn verify_disclosure_proof(&self, bundle: &ProofBundle) -> bool {
        self.proven_record(bundle).is_some()
    }

    /// Proof validity combined with revocation status. A record flagged
    /// revoked is never `Verified`; if its revocation details are
    /// incomplete the bundle is `Rejected`.
    pub fn check_disclosure(&self, bundle: &ProofBundle) -> DisclosureVerdict {
        let Some(record) = self.proven_record(bundle) else {
            return DisclosureVerdict::Rejected;
        };
        if !record.revoked {
            return DisclosureVerdict::Verified;
        }
        match record.lifecycle() {
            Ok(lifecycle) => match lifecycle.revocation() {
                Some(revocation) => DisclosureVerdict::Revoked {
                    reason: revocation.reason.clone(),
                    revoked_at: revocation.revoked_at,
                },
                None => DisclosureVerdict::Rejected,
            },
            Err(e) => {
                tracing::error!(credential_id = %record.id, error = %e, "revoked credential has inconsistent lifecycle");
                DisclosureVerdict::Rejected
            }
        }
    }

    /// The ledger record the bundle proves against, if the proof holds.
    fn proven_record(&self, bundle: &ProofBundle) -> Option<CredentialRecord> {
        let reject = |why: &str| {
            tracing::debug!(credential_id = %bundle.credential_id, why, "disclosure proof rejected");
            None
        };

        let Ok(record) = self.load_credential(&bundle.credential_id) else {
            return reject("credential unavailable");
        };
        if record.schema_version != bundle.schema_version {
            return reject("schema version differs from the credential's");
        }
        let Ok(schema) = self.get_schema(&record.schema_version) else {
            return reject("schema unavailable");
        };
        if bundle.proof.leaf_count != schema.len() {
            return reject("leaf count differs from the schema");
        }

        let names: Vec<&str> = bundle.disclosed.keys().map(String::as_str).collect();
        let Ok(indices) = schema.indices_of(&names) else {
            return reject("disclosed names do not belong to the schema");
        };
        let mut leaves: Vec<(usize, [u8; 32])> = indices
            .into_iter()
            .zip(bundle.disclosed.values())
            .map(|(i, value)| (i, leaf_hash(value)))
            .collect();
        leaves.sort_unstable_by_key(|&(i, _)| i);

        if leaves.iter().map(|&(i, _)| i).ne(bundle.proof.indices.iter().copied()) {
            return reject("disclosed names do not match the proof indices");
        }
        let leaf_hashes: Vec<[u8; 32]> = leaves.into_iter().map(|(_, h)| h).collect();

        if bundle
            .proof
            .verify(record.commitment_hash.as_bytes(), &leaf_hashes)
        {
            Some(record)
        } else {
            reject("multiproof does not reproduce the commitment")
        }
    }
}
