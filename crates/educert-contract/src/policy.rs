//! # Identity & Access Policy
//!
//! Stateless decisions over an explicit [`CallerContext`]. Every rule fails
//! closed: a missing attribute is a denial, never a pass.
//!
//! ## Security Invariant
//!
//! The contract consults this module before any ledger write. A caller
//! outside the issuing organization cannot register issuers, publish
//! schemas, issue, revoke, or dump the ledger, whatever else it presents.
//!
//! The administrator is the admin contact *within* the issuing
//! organization. The same contact presented by another organization carries
//! no privilege.
//!
//! ## Contact matching
//!
//! Contact attributes compare exactly by default. [`ContactMatch::DotInsensitive`]
//! additionally treats two contacts as equal when they are identical after
//! removing every `.`, which some deployments need for mail providers that
//! ignore dots. It widens who may act on a record and is off unless
//! configured.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use educert_core::{ContactAttribute, EncodedPublicKey, OrganizationId};
use educert_crypto::ecdsa;

use crate::records::CredentialRecord;

/// Default issuing organization.
pub const DEFAULT_ISSUING_ORGANIZATION: &str = "Org1MSP";
/// Default contact attribute of the administrator.
pub const DEFAULT_ADMIN_CONTACT: &str = "admin";

/// Who is calling, as asserted by the authenticated transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub organization: OrganizationId,
    pub contact_attribute: Option<ContactAttribute>,
    /// Public key the caller claims to hold, used for holder visibility.
    pub claimed_public_key: Option<EncodedPublicKey>,
}

impl CallerContext {
    pub fn new(organization: OrganizationId) -> Self {
        Self {
            organization,
            contact_attribute: None,
            claimed_public_key: None,
        }
    }

    pub fn with_contact(mut self, contact: ContactAttribute) -> Self {
        self.contact_attribute = Some(contact);
        self
    }

    pub fn with_public_key(mut self, key: EncodedPublicKey) -> Self {
        self.claimed_public_key = Some(key);
        self
    }
}

/// How contact attributes are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactMatch {
    #[default]
    Exact,
    DotInsensitive,
}

impl ContactMatch {
    pub fn matches(&self, a: &ContactAttribute, b: &ContactAttribute) -> bool {
        if a == b {
            return true;
        }
        match self {
            Self::Exact => false,
            Self::DotInsensitive => {
                let strip = |c: &ContactAttribute| c.as_str().replace('.', "");
                strip(a) == strip(b)
            }
        }
    }
}

impl std::str::FromStr for ContactMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "dot-insensitive" => Ok(Self::DotInsensitive),
            other => Err(format!(
                "unknown contact match mode {other:?} (expected exact or dot-insensitive)"
            )),
        }
    }
}

/// Re-encode `key` as lowercase uncompressed SEC1 hex. `None` if it is not
/// a P-256 key in an accepted encoding.
pub fn canonical_public_key(key: &EncodedPublicKey) -> Option<EncodedPublicKey> {
    ecdsa::canonical_public_key(key.as_str()).and_then(|hex| EncodedPublicKey::new(hex).ok())
}

/// The canonical form of `key`, or `key` itself when it does not parse.
pub fn canonical_or_verbatim(key: &EncodedPublicKey) -> EncodedPublicKey {
    canonical_public_key(key).unwrap_or_else(|| key.clone())
}

/// Whether two key texts name the same key.
pub fn same_public_key(a: &EncodedPublicKey, b: &EncodedPublicKey) -> bool {
    a == b || canonical_or_verbatim(a) == canonical_or_verbatim(b)
}

/// A denied policy decision.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyDenied {
    #[error("organization {organization} is not allowed to {action}")]
    Organization {
        organization: OrganizationId,
        action: &'static str,
    },

    #[error("caller identity is missing the required contact attribute")]
    MissingContact,

    #[error("only the administrator may {action}")]
    NotAdmin { action: &'static str },

    #[error("caller is not the issuer of this credential")]
    NotIssuer,
}

/// Deployment-level policy settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    pub issuing_organization: OrganizationId,
    pub admin_contact: ContactAttribute,
    pub contact_match: ContactMatch,
}

impl PolicyConfig {
    pub fn new(
        issuing_organization: OrganizationId,
        admin_contact: ContactAttribute,
        contact_match: ContactMatch,
    ) -> Self {
        Self {
            issuing_organization,
            admin_contact,
            contact_match,
        }
    }

    /// `Org1MSP`, `admin`, exact matching.
    pub fn standard() -> Result<Self, educert_core::ValidationError> {
        Ok(Self::new(
            OrganizationId::new(DEFAULT_ISSUING_ORGANIZATION)?,
            ContactAttribute::new(DEFAULT_ADMIN_CONTACT)?,
            ContactMatch::Exact,
        ))
    }

    /// Caller must belong to the issuing organization.
    pub fn require_issuing_org(
        &self,
        caller: &CallerContext,
        action: &'static str,
    ) -> Result<(), PolicyDenied> {
        if caller.organization != self.issuing_organization {
            return Err(PolicyDenied::Organization {
                organization: caller.organization.clone(),
                action,
            });
        }
        Ok(())
    }

    /// Caller must carry a contact attribute.
    pub fn require_contact<'a>(
        &self,
        caller: &'a CallerContext,
    ) -> Result<&'a ContactAttribute, PolicyDenied> {
        caller
            .contact_attribute
            .as_ref()
            .ok_or(PolicyDenied::MissingContact)
    }

    /// Issuing-org member with a contact attribute, as required for
    /// registering issuers and issuing credentials.
    pub fn require_issuer_identity<'a>(
        &self,
        caller: &'a CallerContext,
        action: &'static str,
    ) -> Result<&'a ContactAttribute, PolicyDenied> {
        self.require_issuing_org(caller, action)?;
        self.require_contact(caller)
    }

    /// Issuing organization and the admin contact, both.
    pub fn is_admin(&self, caller: &CallerContext) -> bool {
        caller.organization == self.issuing_organization
            && caller.contact_attribute.as_ref() == Some(&self.admin_contact)
    }

    /// Dumping the ledger needs the issuing organization and the admin
    /// contact.
    pub fn require_list_all(&self, caller: &CallerContext) -> Result<(), PolicyDenied> {
        self.require_issuing_org(caller, "list the ledger")?;
        if !self.is_admin(caller) {
            return Err(PolicyDenied::NotAdmin {
                action: "list the ledger",
            });
        }
        Ok(())
    }

    /// Whether an issuing-org caller's contact matches the record's issuer
    /// claim.
    pub fn is_issuer_of(&self, caller: &CallerContext, record: &CredentialRecord) -> bool {
        if caller.organization != self.issuing_organization {
            return false;
        }
        match (&caller.contact_attribute, &record.issuer_identity_claim) {
            (Some(contact), Some(claim)) => self.contact_match.matches(contact, claim),
            _ => false,
        }
    }

    /// Revocation by an issuing-org caller. Legacy records without an
    /// issuer claim may be revoked by any issuing-org caller.
    pub fn require_revoke(
        &self,
        caller: &CallerContext,
        record: &CredentialRecord,
    ) -> Result<(), PolicyDenied> {
        self.require_issuing_org(caller, "revoke credentials")?;
        if record.issuer_identity_claim.is_none() || self.is_issuer_of(caller, record) {
            return Ok(());
        }
        Err(PolicyDenied::NotIssuer)
    }

    pub fn is_holder_of(&self, caller: &CallerContext, record: &CredentialRecord) -> bool {
        caller
            .claimed_public_key
            .as_ref()
            .is_some_and(|claimed| same_public_key(claimed, &record.holder_public_key))
    }

    /// Query visibility: admin, holder, or issuer.
    pub fn can_view(&self, caller: &CallerContext, record: &CredentialRecord) -> bool {
        self.is_admin(caller) || self.is_holder_of(caller, record) || self.is_issuer_of(caller, record)
    }

    /// Undecodable records are shown raw to the admin only.
    pub fn can_view_corrupt(&self, caller: &CallerContext) -> bool {
        self.is_admin(caller)
    }
}
