//! # Credential Service
//!
//! Pairs the contract with the off-ledger [`AttributeStore`]. Issuance goes
//! through here when the full attribute values are known: the values are
//! checked against the signed commitment, the ledger record is committed,
//! and then the values are projected.
//!
//! The ledger commit and the projection write are not atomic. When the
//! commit succeeds and the projection fails, the credential exists on the
//! ledger without retrievable attributes; that is reported as
//! [`ContractError::SyncGap`] and logged at `error`.

use std::collections::BTreeMap;
use std::sync::Arc;

use educert_core::{CommitmentHash, CredentialId, SchemaVersion};
use educert_crypto::MerkleTree;
use educert_ledger::LedgerStore;

use crate::contract::{EducertContract, IssueRequest};
use crate::disclosure::{DisclosureVerdict, ProofBundle};
use crate::error::ContractError;
use crate::policy::CallerContext;
use crate::projection::{AttributeStore, CredentialAttributes};
use crate::records::CredentialRecord;

pub struct CredentialService<S> {
    contract: Arc<EducertContract<S>>,
    attributes: Arc<dyn AttributeStore>,
}

impl<S> Clone for CredentialService<S> {
    fn clone(&self) -> Self {
        Self {
            contract: Arc::clone(&self.contract),
            attributes: Arc::clone(&self.attributes),
        }
    }
}

impl<S> std::fmt::Debug for CredentialService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService").finish_non_exhaustive()
    }
}

impl<S: LedgerStore> CredentialService<S> {
    pub fn new(contract: Arc<EducertContract<S>>, attributes: Arc<dyn AttributeStore>) -> Self {
        Self {
            contract,
            attributes,
        }
    }

    pub fn contract(&self) -> &EducertContract<S> {
        &self.contract
    }

    pub fn attributes(&self) -> &dyn AttributeStore {
        self.attributes.as_ref()
    }

    /// The commitment over `values` in the leaf order of `version`.
    pub fn compute_commitment(
        &self,
        version: &SchemaVersion,
        values: &BTreeMap<String, String>,
    ) -> Result<CommitmentHash, ContractError> {
        let schema = self.contract.get_schema(version)?;
        let ordered = schema.ordered_values(values)?;
        Ok(MerkleTree::from_values(&ordered)?.commitment())
    }

    /// Issue a credential and project its attribute values.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if `values` do not commit to the request's
    /// commitment hash, any error of
    /// [`EducertContract::issue_credential`], and `SyncGap` if the ledger
    /// committed but the projection could not be saved.
    pub fn issue_with_attributes(
        &self,
        caller: &CallerContext,
        request: IssueRequest,
        values: BTreeMap<String, String>,
    ) -> Result<CredentialRecord, ContractError> {
        let commitment = self.compute_commitment(&request.schema_version, &values)?;
        if commitment != request.commitment_hash {
            return Err(ContractError::InvalidRequest(
                "attribute values do not match the signed commitment".into(),
            ));
        }

        let record = self.contract.issue_credential(caller, request)?;

        let projection = CredentialAttributes {
            credential_id: record.id,
            schema_version: record.schema_version.clone(),
            values,
        };
        if let Err(e) = self.attributes.save(&projection) {
            tracing::error!(
                credential_id = %record.id,
                error = %e,
                "credential committed to ledger but attribute projection failed"
            );
            return Err(ContractError::SyncGap {
                credential_id: record.id,
                reason: e.to_string(),
            });
        }
        Ok(record)
    }

    pub fn generate_disclosure_proof<N: AsRef<str>>(
        &self,
        caller: &CallerContext,
        id: &CredentialId,
        attribute_names: &[N],
    ) -> Result<ProofBundle, ContractError> {
        self.contract
            .generate_disclosure_proof(caller, id, attribute_names, self.attributes.as_ref())
    }

    pub fn verify_disclosure_proof(&self, bundle: &ProofBundle) -> bool {
        self.contract.verify_disclosure_proof(bundle)
    }

    pub fn check_disclosure(&self, bundle: &ProofBundle) -> DisclosureVerdict {
        self.contract.check_disclosure(bundle)
    }
}
