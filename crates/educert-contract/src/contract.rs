//! # Credential Contract
//!
//! Every mutating operation opens one ledger transaction, performs all of
//! its checks, stages its writes, and commits. A failed check returns
//! before anything is staged; a failed commit writes nothing. The contract
//! takes no locks of its own and relies on the ledger's commit-time
//! validation for at-most-one-writer-per-key.
//!
//! ## Issuance order
//!
//! 1. Caller belongs to the issuing organization and carries a contact.
//! 2. No credential exists under the id.
//! 3. The schema version is published.
//! 4. The caller's registered issuer key equals the request's issuer key.
//! 5. Issuer and holder signatures verify over the commitment.
//! 6. The record is written with the caller's contact as issuer claim.
//!
//! ## Public keys
//!
//! Keys are stored and indexed in their canonical encoding (lowercase
//! uncompressed SEC1 hex), so `PUBLICKEY_<key>` binds a key once however it
//! was spelled at registration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use educert_core::{
    CommitmentHash, CredentialId, EncodedPublicKey, IssuerName, LedgerKey, SchemaVersion,
    Timestamp,
};
use educert_crypto::verify_signature;
use educert_ledger::{LedgerStore, QueryPage, Selector, Transaction};
use educert_state::{CredentialLifecycle, CredentialStatus};

use crate::error::ContractError;
use crate::policy::{
    canonical_or_verbatim, canonical_public_key, same_public_key, CallerContext, PolicyConfig,
    PolicyDenied,
};
use crate::records::{
    self, CredentialRecord, DocType, IssuerProfile, LedgerRecord, PublicKeyBinding,
};
use crate::schema::{Schema, SchemaCache};

/// Records per selector query page.
pub const QUERY_PAGE_SIZE: usize = 50;

// ─── Requests ────────────────────────────────────────────────────────

/// Registration of a new issuing university. The contact attribute is
/// taken from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterIssuerRequest {
    pub name: IssuerName,
    pub public_key: EncodedPublicKey,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

/// Issuance of a credential over an already computed commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IssueRequest {
    pub id: CredentialId,
    pub commitment_hash: CommitmentHash,
    pub issuer_signature: String,
    pub holder_signature: String,
    pub issued_date: Timestamp,
    pub issuer_public_key: EncodedPublicKey,
    pub holder_public_key: EncodedPublicKey,
    pub schema_version: SchemaVersion,
}

// ─── Query results ───────────────────────────────────────────────────

/// One result of a credential listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CredentialEntry {
    Credential(CredentialRecord),
    /// A stored value under the credential namespace that failed to
    /// decode. Only shown to privileged callers.
    Corrupt { key: String, raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPage {
    pub entries: Vec<CredentialEntry>,
    pub bookmark: Option<String>,
}

impl CredentialPage {
    /// The decodable records on this page.
    pub fn records(&self) -> impl Iterator<Item = &CredentialRecord> {
        self.entries.iter().filter_map(|e| match e {
            CredentialEntry::Credential(r) => Some(r),
            CredentialEntry::Corrupt { .. } => None,
        })
    }
}

/// One raw ledger entry. `value` is the stored JSON, or a string holding
/// the lossy UTF-8 text of a value that is not JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerPage {
    pub entries: Vec<LedgerEntry>,
    pub bookmark: Option<String>,
}

// ─── Contract ────────────────────────────────────────────────────────

/// The credential contract over a keyed ledger.
pub struct EducertContract<S> {
    ledger: S,
    policy: PolicyConfig,
    schemas: SchemaCache,
}

impl<S: std::fmt::Debug> std::fmt::Debug for EducertContract<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EducertContract")
            .field("ledger", &self.ledger)
            .field("policy", &self.policy)
            .field("cached_schemas", &self.schemas.len())
            .finish()
    }
}

impl<S: LedgerStore> EducertContract<S> {
    pub fn new(ledger: S, policy: PolicyConfig) -> Self {
        Self::with_schema_cache(ledger, policy, SchemaCache::new())
    }

    /// Build with a schema cache shared with other components.
    pub fn with_schema_cache(ledger: S, policy: PolicyConfig, schemas: SchemaCache) -> Self {
        Self {
            ledger,
            policy,
            schemas,
        }
    }

    pub fn ledger(&self) -> &S {
        &self.ledger
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn schema_cache(&self) -> &SchemaCache {
        &self.schemas
    }

    // ── Schemas ──────────────────────────────────────────────────────

    /// Publish the default degree schema if no schema holds its version.
    pub fn init_ledger(&self) -> Result<Arc<Schema>, ContractError> {
        let schema = Schema::default_degree()?;
        let key = LedgerKey::schema(&schema.version);
        let mut tx = self.ledger.begin()?;
        if let Some(existing) = read::<Schema>(tx.as_mut(), &key)? {
            return Ok(self.schemas.insert(existing));
        }
        write(tx.as_mut(), &key, &schema)?;
        tx.commit()?;
        tracing::info!(schema_version = %schema.version, "ledger initialized with default schema");
        Ok(self.schemas.insert(schema))
    }

    /// Publish a schema under a new version.
    pub fn publish_schema(
        &self,
        caller: &CallerContext,
        schema: Schema,
    ) -> Result<Arc<Schema>, ContractError> {
        self.policy
            .require_issuing_org(caller, "publish schemas")
            .map_err(|e| denied("publish_schema", caller, e))?;

        let key = LedgerKey::schema(&schema.version);
        let mut tx = self.ledger.begin()?;
        if tx.get(&key)?.is_some() {
            return Err(ContractError::AlreadyExists(format!(
                "schema {} is already published",
                schema.version
            )));
        }
        write(tx.as_mut(), &key, &schema)?;
        tx.commit()?;
        tracing::info!(schema_version = %schema.version, attributes = schema.len(), "schema published");
        Ok(self.schemas.insert(schema))
    }

    pub fn get_schema(&self, version: &SchemaVersion) -> Result<Arc<Schema>, ContractError> {
        if let Some(schema) = self.schemas.get(version) {
            return Ok(schema);
        }
        let mut tx = self.ledger.begin()?;
        self.schema_in(tx.as_mut(), version)
    }

    fn schema_in(
        &self,
        tx: &mut (dyn Transaction + '_),
        version: &SchemaVersion,
    ) -> Result<Arc<Schema>, ContractError> {
        if let Some(schema) = self.schemas.get(version) {
            return Ok(schema);
        }
        let schema = read::<Schema>(tx, &LedgerKey::schema(version))?
            .ok_or_else(|| ContractError::NotFound(format!("schema {version} does not exist")))?;
        Ok(self.schemas.insert(schema))
    }

    // ── Issuers ──────────────────────────────────────────────────────

    /// Register an issuing university bound to the caller's contact.
    ///
    /// Name, public key and contact attribute must each be unused.
    pub fn register_issuer(
        &self,
        caller: &CallerContext,
        request: RegisterIssuerRequest,
    ) -> Result<IssuerProfile, ContractError> {
        let contact = self
            .policy
            .require_issuer_identity(caller, "register issuers")
            .map_err(|e| denied("register_issuer", caller, e))?;

        let public_key = canonical_public_key(&request.public_key).ok_or_else(|| {
            ContractError::InvalidRequest(
                "public key is neither SPKI PEM nor uncompressed P-256 hex".into(),
            )
        })?;

        let name_key = LedgerKey::issuer(&request.name);
        let pk_key = LedgerKey::public_key(&public_key);
        let contact_key = LedgerKey::issuer_by_contact(contact);

        let mut tx = self.ledger.begin()?;
        if tx.get(&name_key)?.is_some() {
            return Err(ContractError::AlreadyExists(format!(
                "issuer {} is already registered",
                request.name
            )));
        }
        if tx.get(&pk_key)?.is_some() {
            return Err(ContractError::AlreadyExists(
                "public key is already registered by another issuer".into(),
            ));
        }
        if tx.get(&contact_key)?.is_some() {
            return Err(ContractError::AlreadyExists(format!(
                "contact {contact} already has an issuer profile"
            )));
        }

        let profile = IssuerProfile {
            name: request.name,
            public_key,
            contact_attribute: contact.clone(),
            location: request.location,
            description: request.description,
        };
        let binding = PublicKeyBinding {
            public_key: profile.public_key.clone(),
            issuer_name: profile.name.clone(),
        };
        write(tx.as_mut(), &name_key, &profile)?;
        write(tx.as_mut(), &contact_key, &profile)?;
        write(tx.as_mut(), &pk_key, &binding)?;
        tx.commit()?;

        tracing::info!(issuer = %profile.name, contact = %profile.contact_attribute, "issuer registered");
        Ok(profile)
    }

    pub fn get_issuer_profile(&self, name: &IssuerName) -> Result<IssuerProfile, ContractError> {
        let mut tx = self.ledger.begin()?;
        read::<IssuerProfile>(tx.as_mut(), &LedgerKey::issuer(name))?
            .ok_or_else(|| ContractError::NotFound(format!("issuer {name} does not exist")))
    }

    // ── Credentials ──────────────────────────────────────────────────

    pub fn issue_credential(
        &self,
        caller: &CallerContext,
        request: IssueRequest,
    ) -> Result<CredentialRecord, ContractError> {
        let contact = self
            .policy
            .require_issuer_identity(caller, "issue credentials")
            .map_err(|e| denied("issue_credential", caller, e))?;

        let cred_key = LedgerKey::credential(&request.id);
        let mut tx = self.ledger.begin()?;

        let current = if tx.get(&cred_key)?.is_some() {
            CredentialStatus::Issued
        } else {
            CredentialStatus::NonExistent
        };
        let lifecycle = CredentialLifecycle::issue(current).map_err(|_| {
            ContractError::AlreadyExists(format!("credential {} already exists", request.id))
        })?;

        self.schema_in(tx.as_mut(), &request.schema_version)?;

        let profile = read::<IssuerProfile>(tx.as_mut(), &LedgerKey::issuer_by_contact(contact))?
            .ok_or_else(|| {
                tracing::warn!(contact = %contact, "issuance by unregistered contact denied");
                ContractError::Unauthorized(format!(
                    "no issuer profile is registered for {contact}"
                ))
            })?;
        if !same_public_key(&profile.public_key, &request.issuer_public_key) {
            tracing::warn!(issuer = %profile.name, "issuance with foreign issuer key denied");
            return Err(ContractError::Unauthorized(format!(
                "issuer key does not match the key registered for {contact}"
            )));
        }

        let message = request.commitment_hash.to_hex();
        if !verify_signature(
            request.issuer_public_key.as_str(),
            &message,
            &request.issuer_signature,
        ) {
            return Err(ContractError::InvalidSignature(
                "issuer signature does not verify over the commitment".into(),
            ));
        }
        if !verify_signature(
            request.holder_public_key.as_str(),
            &message,
            &request.holder_signature,
        ) {
            return Err(ContractError::InvalidSignature(
                "holder signature does not verify over the commitment".into(),
            ));
        }

        let mut record = CredentialRecord {
            id: request.id,
            commitment_hash: request.commitment_hash,
            issuer_signature: request.issuer_signature,
            holder_signature: request.holder_signature,
            issued_date: request.issued_date,
            issuer_public_key: canonical_or_verbatim(&request.issuer_public_key),
            holder_public_key: canonical_or_verbatim(&request.holder_public_key),
            issuer_identity_claim: Some(contact.clone()),
            schema_version: request.schema_version,
            revoked: false,
            revocation_reason: None,
            revoked_at: None,
        };
        record.apply(&lifecycle);
        write(tx.as_mut(), &cred_key, &record)?;
        tx.commit()?;

        tracing::info!(
            credential_id = %record.id,
            issuer = %profile.name,
            schema_version = %record.schema_version,
            "credential issued"
        );
        Ok(record)
    }

    /// Revoke a credential. The revocation time is the transaction time.
    pub fn revoke_credential(
        &self,
        caller: &CallerContext,
        id: &CredentialId,
        reason: &str,
    ) -> Result<CredentialRecord, ContractError> {
        self.policy
            .require_issuing_org(caller, "revoke credentials")
            .map_err(|e| denied("revoke_credential", caller, e))?;

        let key = LedgerKey::credential(id);
        let mut tx = self.ledger.begin()?;
        let mut record = read::<CredentialRecord>(tx.as_mut(), &key)?
            .ok_or_else(|| ContractError::NotFound(format!("credential {id} does not exist")))?;

        self.policy
            .require_revoke(caller, &record)
            .map_err(|e| denied("revoke_credential", caller, e))?;

        let mut lifecycle = record.lifecycle()?;
        lifecycle.revoke(reason, tx.timestamp())?;
        record.apply(&lifecycle);
        write(tx.as_mut(), &key, &record)?;
        tx.commit()?;

        tracing::info!(credential_id = %id, reason, "credential revoked");
        Ok(record)
    }

    /// Read one credential. Visible to the admin, its holder and its
    /// issuer; anyone else is `Unauthorized`.
    pub fn get_credential(
        &self,
        caller: &CallerContext,
        id: &CredentialId,
    ) -> Result<CredentialRecord, ContractError> {
        let record = self.load_credential(id)?;
        if !self.policy.can_view(caller, &record) {
            tracing::warn!(
                credential_id = %id,
                organization = %caller.organization,
                "credential read denied"
            );
            return Err(ContractError::Unauthorized(
                "only the holder, the issuer, or the admin may read this credential".into(),
            ));
        }
        Ok(record)
    }

    /// Read one credential without a visibility check.
    pub(crate) fn load_credential(&self, id: &CredentialId) -> Result<CredentialRecord, ContractError> {
        let mut tx = self.ledger.begin()?;
        read::<CredentialRecord>(tx.as_mut(), &LedgerKey::credential(id))
            .map_err(|e| {
                tracing::error!(credential_id = %id, error = %e, "stored credential is unreadable");
                e
            })?
            .ok_or_else(|| ContractError::NotFound(format!("credential {id} does not exist")))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn list_credentials_by_holder(
        &self,
        caller: &CallerContext,
        holder: &EncodedPublicKey,
        bookmark: Option<&str>,
    ) -> Result<CredentialPage, ContractError> {
        let holder = canonical_or_verbatim(holder);
        self.list_credentials(caller, "body.holderPublicKey", holder.as_str(), bookmark)
    }

    pub fn list_credentials_by_issuer(
        &self,
        caller: &CallerContext,
        issuer: &EncodedPublicKey,
        bookmark: Option<&str>,
    ) -> Result<CredentialPage, ContractError> {
        let issuer = canonical_or_verbatim(issuer);
        self.list_credentials(caller, "body.issuerPublicKey", issuer.as_str(), bookmark)
    }

    pub fn list_credentials_by_schema_version(
        &self,
        caller: &CallerContext,
        version: &SchemaVersion,
        bookmark: Option<&str>,
    ) -> Result<CredentialPage, ContractError> {
        self.list_credentials(caller, "body.schemaVersion", version.as_str(), bookmark)
    }

    fn list_credentials(
        &self,
        caller: &CallerContext,
        path: &str,
        value: &str,
        bookmark: Option<&str>,
    ) -> Result<CredentialPage, ContractError> {
        let selector = Selector::all()
            .eq("docType", DocType::Credential.as_str())
            .eq(path, value);
        let page = self.query(&selector, bookmark)?;

        let mut entries = Vec::with_capacity(page.results.len());
        for kv in page.results {
            match records::decode::<CredentialRecord>(&kv.value) {
                Ok(record) => {
                    if self.policy.can_view(caller, &record) {
                        entries.push(CredentialEntry::Credential(record));
                    }
                }
                Err(e) => {
                    tracing::error!(key = %kv.key, error = %e, "skipping undecodable credential record");
                    if self.policy.can_view_corrupt(caller) {
                        entries.push(CredentialEntry::Corrupt {
                            key: kv.key,
                            raw: String::from_utf8_lossy(&kv.value).into_owned(),
                        });
                    }
                }
            }
        }
        Ok(CredentialPage {
            entries,
            bookmark: page.bookmark,
        })
    }

    /// Every key/value pair on the ledger, one page at a time. Admin only.
    pub fn list_all(
        &self,
        caller: &CallerContext,
        bookmark: Option<&str>,
    ) -> Result<LedgerPage, ContractError> {
        self.policy
            .require_list_all(caller)
            .map_err(|e| denied("list_all", caller, e))?;

        let page = self.query(&Selector::all(), bookmark)?;
        let entries = page
            .results
            .into_iter()
            .map(|kv| LedgerEntry {
                value: serde_json::from_slice(&kv.value).unwrap_or_else(|_| {
                    serde_json::Value::String(String::from_utf8_lossy(&kv.value).into_owned())
                }),
                key: kv.key,
            })
            .collect();
        Ok(LedgerPage {
            entries,
            bookmark: page.bookmark,
        })
    }

    fn query(&self, selector: &Selector, bookmark: Option<&str>) -> Result<QueryPage, ContractError> {
        let mut tx = self.ledger.begin()?;
        Ok(tx.query_by_selector(selector, QUERY_PAGE_SIZE, bookmark)?)
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn read<T: LedgerRecord>(
    tx: &mut (dyn Transaction + '_),
    key: &LedgerKey,
) -> Result<Option<T>, ContractError> {
    match tx.get(key)? {
        Some(bytes) => Ok(Some(records::decode::<T>(&bytes)?)),
        None => Ok(None),
    }
}

fn write<T: LedgerRecord>(
    tx: &mut (dyn Transaction + '_),
    key: &LedgerKey,
    record: &T,
) -> Result<(), ContractError> {
    tx.put(key, records::encode(record)?)?;
    Ok(())
}

fn denied(operation: &'static str, caller: &CallerContext, err: PolicyDenied) -> ContractError {
    tracing::warn!(
        operation,
        organization = %caller.organization,
        contact = ?caller.contact_attribute.as_ref().map(|c| c.as_str()),
        reason = %err,
        "access denied"
    );
    err.into()
}
