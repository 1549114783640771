//! End-to-end lifecycle tests: registration, issuance, revocation,
//! queries, and selective disclosure over the in-memory ledger with real
//! P-256 signatures.

use std::collections::BTreeMap;
use std::sync::Arc;

use educert_contract::{
    AttributeStore, CallerContext, ContractError, CredentialAttributes, CredentialEntry,
    CredentialService, DisclosureVerdict, EducertContract, InMemoryAttributeStore, IssueRequest,
    PolicyConfig, ProjectionError, RegisterIssuerRequest, Schema,
};
use educert_core::{
    ContactAttribute, CredentialId, EncodedPublicKey, ErrorKind, IssuerName, LedgerKey,
    OrganizationId, SchemaVersion, Timestamp,
};
use educert_crypto::P256KeyPair;
use educert_ledger::{InMemoryLedger, LedgerStore, Transaction};

const REGISTRAR: &str = "registrar@astate.edu";

struct Fixture {
    ledger: InMemoryLedger,
    attributes: InMemoryAttributeStore,
    service: CredentialService<InMemoryLedger>,
    issuer: P256KeyPair,
    holder: P256KeyPair,
}

fn university(contact: &str) -> CallerContext {
    CallerContext::new(OrganizationId::new("Org1MSP").unwrap())
        .with_contact(ContactAttribute::new(contact).unwrap())
}

fn outsider() -> CallerContext {
    CallerContext::new(OrganizationId::new("Org2MSP").unwrap())
        .with_contact(ContactAttribute::new(REGISTRAR).unwrap())
}

fn pk(keys: &P256KeyPair) -> EncodedPublicKey {
    EncodedPublicKey::new(keys.public_key_hex()).unwrap()
}

fn holder_caller(keys: &P256KeyPair) -> CallerContext {
    CallerContext::new(OrganizationId::new("Org2MSP").unwrap()).with_public_key(pk(keys))
}

fn fixture() -> Fixture {
    fixture_with_store(Arc::new(InMemoryAttributeStore::new()), InMemoryAttributeStore::new())
}

fn fixture_with_store(store: Arc<dyn AttributeStore>, handle: InMemoryAttributeStore) -> Fixture {
    let ledger = InMemoryLedger::new();
    let contract = Arc::new(EducertContract::new(
        ledger.clone(),
        PolicyConfig::standard().unwrap(),
    ));
    contract.init_ledger().unwrap();
    let issuer = P256KeyPair::generate();
    contract
        .register_issuer(
            &university(REGISTRAR),
            RegisterIssuerRequest {
                name: IssuerName::new("A State University").unwrap(),
                public_key: pk(&issuer),
                location: "Jonesboro, AR".into(),
                description: "Public university".into(),
            },
        )
        .unwrap();
    Fixture {
        ledger,
        attributes: handle,
        service: CredentialService::new(contract, store),
        issuer,
        holder: P256KeyPair::generate(),
    }
}

fn shared_fixture() -> Fixture {
    let store = InMemoryAttributeStore::new();
    fixture_with_store(Arc::new(store.clone()), store)
}

fn degree_values(id: &CredentialId) -> BTreeMap<String, String> {
    [
        ("universityName", "A State University".to_string()),
        ("major", "CS".to_string()),
        ("departmentName", "Engineering".to_string()),
        ("cgpa", "3.8".to_string()),
        ("certUUID", id.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn issue_request(f: &Fixture, id: CredentialId, values: &BTreeMap<String, String>) -> IssueRequest {
    let v1 = SchemaVersion::new("v1").unwrap();
    let commitment = f.service.compute_commitment(&v1, values).unwrap();
    IssueRequest {
        id,
        commitment_hash: commitment,
        issuer_signature: f.issuer.sign_commitment(&commitment),
        holder_signature: f.holder.sign_commitment(&commitment),
        issued_date: Timestamp::parse("2024-06-01T00:00:00Z").unwrap(),
        issuer_public_key: pk(&f.issuer),
        holder_public_key: pk(&f.holder),
        schema_version: v1,
    }
}

fn issue(f: &Fixture) -> CredentialId {
    let id = CredentialId::new();
    let values = degree_values(&id);
    let request = issue_request(f, id, &values);
    f.service
        .issue_with_attributes(&university(REGISTRAR), request, values)
        .unwrap();
    id
}

// ─── Issuance ────────────────────────────────────────────────────────

#[test]
fn issued_record_carries_claim_and_schema() {
    let f = fixture();
    let id = issue(&f);
    let record = f.service.contract().get_credential(&university(REGISTRAR), &id).unwrap();
    assert_eq!(record.issuer_identity_claim.unwrap().as_str(), REGISTRAR);
    assert_eq!(record.schema_version.as_str(), "v1");
    assert!(!record.revoked);
}

#[test]
fn second_issue_is_already_exists_and_state_unchanged() {
    let f = fixture();
    let id = issue(&f);
    let before = f.service.contract().get_credential(&university(REGISTRAR), &id).unwrap();

    let mut values = degree_values(&id);
    values.insert("cgpa".into(), "4.0".into());
    let request = issue_request(&f, id, &values);
    let err = f
        .service
        .contract()
        .issue_credential(&university(REGISTRAR), request)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(f.service.contract().get_credential(&university(REGISTRAR), &id).unwrap(), before);
}

#[test]
fn outsider_cannot_issue() {
    let f = fixture();
    let id = CredentialId::new();
    let request = issue_request(&f, id, &degree_values(&id));
    let err = f
        .service
        .contract()
        .issue_credential(&outsider(), request)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn issuing_with_another_universitys_key_is_unauthorized() {
    let f = fixture();
    let other = P256KeyPair::generate();
    f.service
        .contract()
        .register_issuer(
            &university("registrar@other.edu"),
            RegisterIssuerRequest {
                name: IssuerName::new("Other University").unwrap(),
                public_key: pk(&other),
                location: String::new(),
                description: String::new(),
            },
        )
        .unwrap();

    let id = CredentialId::new();
    let request = issue_request(&f, id, &degree_values(&id));
    let err = f
        .service
        .contract()
        .issue_credential(&university("registrar@other.edu"), request)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn unregistered_contact_cannot_issue() {
    let f = fixture();
    let id = CredentialId::new();
    let request = issue_request(&f, id, &degree_values(&id));
    let err = f
        .service
        .contract()
        .issue_credential(&university("nobody@astate.edu"), request)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn bad_signatures_are_rejected() {
    let f = fixture();
    let id = CredentialId::new();
    let values = degree_values(&id);

    let mut forged_issuer = issue_request(&f, id, &values);
    forged_issuer.issuer_signature = P256KeyPair::generate().sign_commitment(&forged_issuer.commitment_hash);
    let err = f
        .service
        .contract()
        .issue_credential(&university(REGISTRAR), forged_issuer)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);

    let mut garbled_holder = issue_request(&f, id, &values);
    garbled_holder.holder_signature = "zz".into();
    let err = f
        .service
        .contract()
        .issue_credential(&university(REGISTRAR), garbled_holder)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);

    assert!(f.service.contract().get_credential(&university(REGISTRAR), &id).is_err());
}

#[test]
fn attributes_must_match_signed_commitment() {
    let f = fixture();
    let id = CredentialId::new();
    let values = degree_values(&id);
    let request = issue_request(&f, id, &values);

    let mut tampered = values.clone();
    tampered.insert("cgpa".into(), "4.0".into());
    let err = f
        .service
        .issue_with_attributes(&university(REGISTRAR), request, tampered)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert!(f.service.contract().get_credential(&university(REGISTRAR), &id).is_err());
}

// ─── Registration ────────────────────────────────────────────────────

#[test]
fn public_key_collision_prevented() {
    let f = fixture();
    let err = f
        .service
        .contract()
        .register_issuer(
            &university("registrar@copycat.edu"),
            RegisterIssuerRequest {
                name: IssuerName::new("Copycat College").unwrap(),
                public_key: pk(&f.issuer),
                location: String::new(),
                description: String::new(),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert!(f
        .service
        .contract()
        .get_issuer_profile(&IssuerName::new("Copycat College").unwrap())
        .is_err());
}

#[test]
fn duplicate_name_and_contact_rejected() {
    let f = fixture();
    let contract = f.service.contract();
    let fresh = |name: &str| RegisterIssuerRequest {
        name: IssuerName::new(name).unwrap(),
        public_key: pk(&P256KeyPair::generate()),
        location: String::new(),
        description: String::new(),
    };
    let err = contract
        .register_issuer(&university("someone@else.edu"), fresh("A State University"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    let err = contract
        .register_issuer(&university(REGISTRAR), fresh("Second Campus"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    let err = contract
        .register_issuer(&outsider(), fresh("Rogue"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn same_key_in_any_encoding_is_a_collision() {
    let f = fixture();
    let contract = f.service.contract();
    let sec1 = f.issuer.public_key_hex();
    let encodings = [
        sec1[2..].to_string(),
        sec1.to_uppercase(),
        f.issuer.public_key_pem().unwrap(),
    ];
    for (i, text) in encodings.into_iter().enumerate() {
        let err = contract
            .register_issuer(
                &university(&format!("registrar@copy{i}.edu")),
                RegisterIssuerRequest {
                    name: IssuerName::new(format!("Copy {i}")).unwrap(),
                    public_key: EncodedPublicKey::new(text).unwrap(),
                    location: String::new(),
                    description: String::new(),
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }
}

#[test]
fn issuer_name_cannot_claim_a_contact_entry() {
    let f = fixture();
    assert!(IssuerName::new("BY_CONTACT_victim@v.edu").is_err());

    let victim = P256KeyPair::generate();
    let profile = f
        .service
        .contract()
        .register_issuer(
            &university("victim@v.edu"),
            RegisterIssuerRequest {
                name: IssuerName::new("Victim University").unwrap(),
                public_key: pk(&victim),
                location: String::new(),
                description: String::new(),
            },
        )
        .unwrap();
    assert_eq!(profile.contact_attribute.as_str(), "victim@v.edu");
}

// ─── Revocation ──────────────────────────────────────────────────────

#[test]
fn revocation_is_monotonic() {
    let f = fixture();
    let id = issue(&f);
    let contract = f.service.contract();

    let revoked = contract
        .revoke_credential(&university(REGISTRAR), &id, "issued in error")
        .unwrap();
    assert!(revoked.revoked);
    assert_eq!(revoked.revocation_reason.as_deref(), Some("issued in error"));
    assert!(revoked.revoked_at.is_some());

    let err = contract
        .revoke_credential(&university(REGISTRAR), &id, "again")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);

    let stored = contract.get_credential(&university(REGISTRAR), &id).unwrap();
    assert!(stored.revoked);
    assert_eq!(stored.revocation_reason.as_deref(), Some("issued in error"));
}

#[test]
fn revocation_time_comes_from_the_ledger_clock() {
    let fixed = Timestamp::parse("2025-01-15T12:00:00Z").unwrap();
    let ledger = InMemoryLedger::with_clock(Arc::new(move || fixed));
    let contract = Arc::new(EducertContract::new(
        ledger,
        PolicyConfig::standard().unwrap(),
    ));
    contract.init_ledger().unwrap();

    let legacy = CredentialId::new();
    let mut tx = contract.ledger().begin().unwrap();
    tx.put(
        &LedgerKey::credential(&legacy),
        serde_json::to_vec(&serde_json::json!({
            "docType": "credential",
            "formatVersion": 1,
            "body": {
                "id": legacy,
                "commitmentHash": "11".repeat(32),
                "issuerSignature": "30",
                "holderSignature": "30",
                "issuedDate": "2020-06-01T00:00:00Z",
                "issuerPublicKey": "04aa",
                "holderPublicKey": "04bb",
                "schemaVersion": "v1",
                "revoked": false
            }
        }))
        .unwrap(),
    )
    .unwrap();
    tx.commit().unwrap();

    let record = contract
        .revoke_credential(&university("anyone@astate.edu"), &legacy, "legacy cleanup")
        .unwrap();
    assert_eq!(record.revoked_at, Some(fixed));
}

#[test]
fn only_the_issuer_may_revoke() {
    let f = fixture();
    let id = issue(&f);
    let contract = f.service.contract();

    let err = contract
        .revoke_credential(&university("registrar@other.edu"), &id, "nope")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = contract.revoke_credential(&outsider(), &id, "nope").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    assert!(!contract.get_credential(&university(REGISTRAR), &id).unwrap().revoked);
}

#[test]
fn revoking_unknown_credential_is_not_found() {
    let f = fixture();
    let err = f
        .service
        .contract()
        .revoke_credential(&university(REGISTRAR), &CredentialId::new(), "x")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = f
        .service
        .contract()
        .revoke_credential(&outsider(), &CredentialId::new(), "x")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

// ─── Queries ─────────────────────────────────────────────────────────

#[test]
fn holder_listing_respects_visibility() {
    let f = fixture();
    let a = issue(&f);
    let b = issue(&f);
    let contract = f.service.contract();
    let holder_key = pk(&f.holder);

    let as_holder = contract
        .list_credentials_by_holder(&holder_caller(&f.holder), &holder_key, None)
        .unwrap();
    let mut ids: Vec<_> = as_holder.records().map(|r| r.id).collect();
    ids.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(ids, expected);

    let stranger = holder_caller(&P256KeyPair::generate());
    let as_stranger = contract
        .list_credentials_by_holder(&stranger, &holder_key, None)
        .unwrap();
    assert!(as_stranger.entries.is_empty());

    let by_issuer = contract
        .list_credentials_by_issuer(&university(REGISTRAR), &pk(&f.issuer), None)
        .unwrap();
    assert_eq!(by_issuer.records().count(), 2);

    let by_schema = contract
        .list_credentials_by_schema_version(
            &university("admin"),
            &SchemaVersion::new("v1").unwrap(),
            None,
        )
        .unwrap();
    assert_eq!(by_schema.records().count(), 2);
}

#[test]
fn admin_contact_from_another_organization_sees_nothing() {
    let f = shared_fixture();
    let id = issue(&f);
    let contract = f.service.contract();
    let foreign_admin = CallerContext::new(OrganizationId::new("Org2MSP").unwrap())
        .with_contact(ContactAttribute::new("admin").unwrap());

    let page = contract
        .list_credentials_by_holder(&foreign_admin, &pk(&f.holder), None)
        .unwrap();
    assert!(page.entries.is_empty());
    let page = contract
        .list_credentials_by_schema_version(&foreign_admin, &SchemaVersion::new("v1").unwrap(), None)
        .unwrap();
    assert!(page.entries.is_empty());

    let err = contract.get_credential(&foreign_admin, &id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    let err = f
        .service
        .generate_disclosure_proof(&foreign_admin, &id, &["cgpa"])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn credential_read_is_scoped_to_the_caller() {
    let f = fixture();
    let id = issue(&f);
    let contract = f.service.contract();

    let pem = EncodedPublicKey::new(f.holder.public_key_pem().unwrap()).unwrap();
    let holder = CallerContext::new(OrganizationId::new("Org2MSP").unwrap()).with_public_key(pem.clone());
    assert_eq!(contract.get_credential(&holder, &id).unwrap().id, id);
    assert_eq!(
        contract
            .list_credentials_by_holder(&holder, &pem, None)
            .unwrap()
            .records()
            .count(),
        1
    );
    assert!(contract.get_credential(&university("admin"), &id).is_ok());

    let stranger = holder_caller(&P256KeyPair::generate());
    let err = contract.get_credential(&stranger, &id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    let err = contract
        .get_credential(&university("registrar@other.edu"), &id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    let err = contract.get_credential(&outsider(), &id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let err = contract
        .get_credential(&university("admin"), &CredentialId::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn corrupt_records_are_isolated() {
    let f = fixture();
    let good = issue(&f);
    let holder_key = pk(&f.holder);

    let bad_key = LedgerKey::credential(&CredentialId::new());
    let mut tx = f.ledger.begin().unwrap();
    tx.put(
        &bad_key,
        serde_json::to_vec(&serde_json::json!({
            "docType": "credential",
            "formatVersion": 1,
            "body": {"holderPublicKey": holder_key.as_str(), "revoked": "maybe"}
        }))
        .unwrap(),
    )
    .unwrap();
    tx.commit().unwrap();

    let contract = f.service.contract();

    let as_holder = contract
        .list_credentials_by_holder(&holder_caller(&f.holder), &holder_key, None)
        .unwrap();
    assert_eq!(as_holder.entries.len(), 1);
    assert_eq!(as_holder.records().next().unwrap().id, good);

    let as_admin = contract
        .list_credentials_by_holder(&university("admin"), &holder_key, None)
        .unwrap();
    assert_eq!(as_admin.entries.len(), 2);
    assert!(as_admin.entries.iter().any(|e| matches!(
        e,
        CredentialEntry::Corrupt { key, .. } if key == bad_key.as_str()
    )));

    let as_issuer = contract
        .list_credentials_by_holder(&university(REGISTRAR), &holder_key, None)
        .unwrap();
    assert_eq!(as_issuer.entries.len(), 1);
    assert!(as_issuer
        .entries
        .iter()
        .all(|e| matches!(e, CredentialEntry::Credential(_))));
}

#[test]
fn listings_page_through_bookmarks() {
    let f = fixture();
    for _ in 0..(educert_contract::QUERY_PAGE_SIZE + 3) {
        issue(&f);
    }
    let contract = f.service.contract();
    let caller = holder_caller(&f.holder);
    let holder_key = pk(&f.holder);

    let first = contract
        .list_credentials_by_holder(&caller, &holder_key, None)
        .unwrap();
    assert_eq!(first.entries.len(), educert_contract::QUERY_PAGE_SIZE);
    let bookmark = first.bookmark.clone().unwrap();

    let second = contract
        .list_credentials_by_holder(&caller, &holder_key, Some(&bookmark))
        .unwrap();
    assert_eq!(second.entries.len(), 3);
    assert_eq!(second.bookmark, None);
}

// ─── Selective disclosure ────────────────────────────────────────────

#[test]
fn five_attribute_scenario() {
    let f = shared_fixture();
    let contract = f.service.contract();
    let caller = university(REGISTRAR);
    let version = SchemaVersion::new("scenario").unwrap();
    contract
        .publish_schema(
            &caller,
            Schema::new(
                "scenario",
                version.clone(),
                ["org", "field", "dept", "score", "id"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            )
            .unwrap(),
        )
        .unwrap();

    let values: BTreeMap<String, String> = [
        ("org", "A State"),
        ("field", "CS"),
        ("dept", "Engineering"),
        ("score", "3.8"),
        ("id", "cert-001"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let commitment = f.service.compute_commitment(&version, &values).unwrap();
    let id = CredentialId::new();
    f.service
        .issue_with_attributes(
            &caller,
            IssueRequest {
                id,
                commitment_hash: commitment,
                issuer_signature: f.issuer.sign_commitment(&commitment),
                holder_signature: f.holder.sign_commitment(&commitment),
                issued_date: Timestamp::now(),
                issuer_public_key: pk(&f.issuer),
                holder_public_key: pk(&f.holder),
                schema_version: version,
            },
            values,
        )
        .unwrap();
    assert_eq!(f.attributes.len(), 1);

    let bundle = f
        .service
        .generate_disclosure_proof(&holder_caller(&f.holder), &id, &["field", "score"])
        .unwrap();
    assert_eq!(bundle.proof.indices, vec![1, 3]);
    assert_eq!(bundle.proof.depth, 3);
    assert_eq!(bundle.proof.hashes.len(), 3);
    assert_eq!(bundle.disclosed["field"], "CS");
    assert_eq!(bundle.disclosed["score"], "3.8");
    assert!(f.service.verify_disclosure_proof(&bundle));
    assert_eq!(f.service.check_disclosure(&bundle), DisclosureVerdict::Verified);

    let mut forged = bundle.clone();
    forged.disclosed.insert("score".into(), "3.9".into());
    assert!(!f.service.verify_disclosure_proof(&forged));
    assert_eq!(f.service.check_disclosure(&forged), DisclosureVerdict::Rejected);
}

#[test]
fn bundle_cannot_relabel_attributes() {
    let f = shared_fixture();
    let id = issue(&f);
    let bundle = f
        .service
        .generate_disclosure_proof(&holder_caller(&f.holder), &id, &["major"])
        .unwrap();

    let mut relabeled = bundle.clone();
    let value = relabeled.disclosed.remove("major").unwrap();
    relabeled.disclosed.insert("departmentName".into(), value);
    assert!(!f.service.verify_disclosure_proof(&relabeled));

    let mut other_credential = bundle.clone();
    other_credential.credential_id = issue(&f);
    assert!(!f.service.verify_disclosure_proof(&other_credential));

    let mut unknown = bundle;
    unknown.credential_id = CredentialId::new();
    assert!(!f.service.verify_disclosure_proof(&unknown));
}

#[test]
fn single_attribute_disclosure_then_revocation() {
    let f = shared_fixture();
    let id = issue(&f);
    let bundle = f
        .service
        .generate_disclosure_proof(&holder_caller(&f.holder), &id, &["cgpa"])
        .unwrap();
    assert_eq!(f.service.check_disclosure(&bundle), DisclosureVerdict::Verified);

    f.service
        .contract()
        .revoke_credential(&university(REGISTRAR), &id, "academic misconduct")
        .unwrap();
    assert!(f.service.verify_disclosure_proof(&bundle));
    match f.service.check_disclosure(&bundle) {
        DisclosureVerdict::Revoked { reason, .. } => assert_eq!(reason, "academic misconduct"),
        other => panic!("expected revoked verdict, got {other:?}"),
    }
}

#[test]
fn revoked_flag_without_details_is_never_verified() {
    let f = shared_fixture();
    let id = issue(&f);
    let bundle = f
        .service
        .generate_disclosure_proof(&holder_caller(&f.holder), &id, &["cgpa"])
        .unwrap();

    let mut record = f
        .service
        .contract()
        .get_credential(&university(REGISTRAR), &id)
        .unwrap();
    record.revoked = true;
    record.revocation_reason = Some("fraud".into());
    record.revoked_at = None;
    let mut tx = f.ledger.begin().unwrap();
    tx.put(
        &LedgerKey::credential(&id),
        educert_contract::records::encode(&record).unwrap(),
    )
    .unwrap();
    tx.commit().unwrap();

    assert_eq!(f.service.check_disclosure(&bundle), DisclosureVerdict::Rejected);
    assert!(!f.service.verify_disclosure_proof(&bundle));
}

#[test]
fn disclosure_requests_are_validated() {
    let f = shared_fixture();
    let id = issue(&f);
    let holder = holder_caller(&f.holder);
    let empty: [&str; 0] = [];

    for names in [&empty[..], &["gpa"][..], &["major", "major"][..]] {
        let err = f
            .service
            .generate_disclosure_proof(&holder, &id, names)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    let stranger = holder_caller(&P256KeyPair::generate());
    let err = f
        .service
        .generate_disclosure_proof(&stranger, &id, &["major"])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    assert!(f
        .service
        .generate_disclosure_proof(&university(REGISTRAR), &id, &["major"])
        .is_ok());
}

// ─── Projection drift ────────────────────────────────────────────────

struct FailingStore;

impl AttributeStore for FailingStore {
    fn save(&self, _: &CredentialAttributes) -> Result<(), ProjectionError> {
        Err(ProjectionError::Io("disk full".into()))
    }

    fn load(&self, _: &CredentialId) -> Result<Option<CredentialAttributes>, ProjectionError> {
        Ok(None)
    }
}

#[test]
fn failed_projection_is_a_sync_gap() {
    let f = fixture_with_store(Arc::new(FailingStore), InMemoryAttributeStore::new());
    let id = CredentialId::new();
    let values = degree_values(&id);
    let request = issue_request(&f, id, &values);

    let err = f
        .service
        .issue_with_attributes(&university(REGISTRAR), request, values)
        .unwrap_err();
    assert_eq!(
        err,
        ContractError::SyncGap {
            credential_id: id,
            reason: "attribute store I/O failure: disk full".into(),
        }
    );
    // The ledger write stands.
    assert!(f.service.contract().get_credential(&university(REGISTRAR), &id).is_ok());

    let err = f
        .service
        .generate_disclosure_proof(&holder_caller(&f.holder), &id, &["major"])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyncGap);
}

#[test]
fn drifted_projection_is_a_sync_gap() {
    let f = shared_fixture();
    let id = issue(&f);

    let mut drifted = f.attributes.load(&id).unwrap().unwrap();
    drifted.values.insert("cgpa".into(), "4.0".into());
    f.attributes.overwrite(drifted);

    let err = f
        .service
        .generate_disclosure_proof(&holder_caller(&f.holder), &id, &["major"])
        .unwrap_err();
    assert!(matches!(err, ContractError::SyncGap { credential_id, .. } if credential_id == id));
}

// ─── Concurrency ─────────────────────────────────────────────────────

#[test]
fn racing_issuance_of_one_id_has_one_winner() {
    let f = fixture();
    let id = CredentialId::new();
    let values = degree_values(&id);
    let request = issue_request(&f, id, &values);

    let outcomes: Vec<Result<_, ContractError>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let request = request.clone();
                let contract = f.service.contract();
                s.spawn(move || contract.issue_credential(&university(REGISTRAR), request))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    for err in outcomes.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(
            err.kind(),
            ErrorKind::AlreadyExists | ErrorKind::Conflict
        ));
    }
}
