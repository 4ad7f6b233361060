//! End-to-end scenarios over the claims service: two-level proofs, claim
//! revocation, root commits and anchoring.

use relay_core::{
    verify_proof_claim, ClaimAssignName, ClaimAuthorizeKSignBabyJub,
    ClaimAuthorizeKSignSecp256k1, ClaimBasic, ClaimSetRootKey, ProofClaimError, ProofOfClaim,
    CLAIM_TREE_DEPTH,
};
use relay_crypto::{sign_eth_msg, unix_now, EthSigner, SecretKey};
use relay_merkle::{hash::zero_hash, verify_proof, Entry, MerkleTree, Proof};
use relay_service::{
    ClaimAuthorizeKSignMsg, ClaimService, ClaimValueMsg, RootAnchor, RootSink, ServiceError,
    SinkError, RELAY_TREE_PREFIX,
};
use relay_storage::{MemoryStorage, Storage};
use relay_types::{ElemBytes, Hash, Id};

use rand::{prelude::StdRng, Rng, SeedableRng};

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

struct NullSink;

impl RootSink for NullSink {
    fn set_root(&self, _id: &Id, _root: &Hash) -> Result<(), SinkError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingSink {
    roots: Arc<Mutex<Vec<Hash>>>,
}

impl RootSink for RecordingSink {
    fn set_root(&self, _id: &Id, root: &Hash) -> Result<(), SinkError> {
        self.roots.lock().unwrap().push(*root);
        Ok(())
    }
}

struct Fixture {
    storage: MemoryStorage,
    service: ClaimService<MemoryStorage>,
    signer: Arc<EthSigner>,
    anchor: Arc<RootAnchor>,
    rng: StdRng,
}

fn random_id(rng: &mut StdRng) -> Id {
    let mut genesis = [0u8; Id::GENESIS_LEN];
    rng.fill(genesis.as_mut());
    Id::new([0x00, 0x00], genesis)
}

fn setup(seed: u64) -> Fixture {
    setup_with_sink(seed, NullSink)
}

fn setup_with_sink<K: RootSink>(seed: u64, sink: K) -> Fixture {
    let mut rng = StdRng::seed_from_u64(seed);
    let storage = MemoryStorage::new();
    let mt = Arc::new(
        MerkleTree::open(storage.with_prefix(RELAY_TREE_PREFIX), CLAIM_TREE_DEPTH).unwrap(),
    );
    let signer = Arc::new(EthSigner::new(SecretKey::random(&mut rng)));
    let relay_id = random_id(&mut rng);
    let anchor = Arc::new(RootAnchor::new(relay_id, sink));
    let service = ClaimService::new(relay_id, mt, Arc::clone(&anchor), Arc::clone(&signer));
    Fixture {
        storage,
        service,
        signer,
        anchor,
        rng,
    }
}

fn user_tree_of(fixture: &Fixture, id: &Id) -> MerkleTree<MemoryStorage> {
    let view = fixture
        .storage
        .with_prefix(RELAY_TREE_PREFIX)
        .with_prefix(id.bytes());
    MerkleTree::open(view, CLAIM_TREE_DEPTH).unwrap()
}

#[test]
fn assign_name_claims_prove_inclusion_and_absence() {
    let mut fixture = setup(0x53);
    let first_id = random_id(&mut fixture.rng);
    let second_id = random_id(&mut fixture.rng);

    let first = ClaimAssignName::new("alice@example.eth", first_id);
    let second = ClaimAssignName::new("bob@example.eth", second_id);
    fixture.service.add_claim_assign_name(first).unwrap();
    fixture.service.add_claim_assign_name(second).unwrap();

    let mt = fixture.service.mt();
    let root = mt.root();

    // The first name is provably present.
    let entry = first.entry();
    let proof = mt.generate_proof(&entry.hindex(), None).unwrap();
    assert!(proof.existence());
    assert!(verify_proof(&root, &proof, &entry.hindex(), &entry.hvalue()));

    // A name never inserted is provably absent.
    let missing = ClaimAssignName::new("carol@example.eth", first_id).entry();
    let proof = mt.generate_proof(&missing.hindex(), None).unwrap();
    assert!(!proof.existence());
    assert!(verify_proof(&root, &proof, &missing.hindex(), zero_hash()));
}

#[test]
fn proof_of_a_revoked_claim_is_refused() {
    let mut fixture = setup(0x54);
    let id = random_id(&mut fixture.rng);

    let name = ClaimAssignName::new("revoked@example.eth", id);
    // Version 0, then its revocation at version 1.
    fixture.service.add_claim_assign_name(name).unwrap();
    fixture.service.add_claim_assign_name(name).unwrap();

    let hi_v0 = name.entry().hindex();
    assert_eq!(
        fixture.service.get_claim_proof_by_hi(&hi_v0).unwrap_err(),
        ServiceError::RevokedClaim
    );

    // The latest version still proves fine.
    let mut latest = name;
    latest.version = 1;
    fixture
        .service
        .get_claim_proof_by_hi(&latest.entry().hindex())
        .unwrap();
}

#[test]
fn commit_new_id_root_enforces_authorization() {
    let mut fixture = setup(0x55);
    let id = random_id(&mut fixture.rng);
    let ksign = SecretKey::random(&mut fixture.rng);

    let root = Hash::new([0x0b; 32]);
    let timestamp = unix_now() - 10;
    let mut msg = Vec::new();
    msg.extend_from_slice(id.bytes());
    msg.extend_from_slice(root.as_ref());
    msg.extend_from_slice(&timestamp.to_be_bytes());
    let signature = sign_eth_msg(&ksign, &msg).unwrap();

    // The key is not authorized in the identity's tree yet.
    let err = fixture
        .service
        .commit_new_id_root(id, &ksign.public_key(), root, timestamp, &signature)
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidAuth(_)));

    // Authorize it, and the same request goes through and moves the relay.
    fixture
        .service
        .add_claim_authorize_ksign_secp256k1_first(
            id,
            ClaimAuthorizeKSignSecp256k1::new(ksign.public_key()),
        )
        .unwrap();
    let relay_root_before = fixture.service.mt().root();

    let set_root_key = fixture
        .service
        .commit_new_id_root(id, &ksign.public_key(), root, timestamp, &signature)
        .unwrap();
    assert_eq!(set_root_key.root_key, root);
    assert_ne!(fixture.service.mt().root(), relay_root_before);
}

#[test]
fn commit_new_id_root_rejects_stale_and_forged_requests() {
    let mut fixture = setup(0x56);
    let id = random_id(&mut fixture.rng);
    let ksign = SecretKey::random(&mut fixture.rng);
    fixture
        .service
        .add_claim_authorize_ksign_secp256k1_first(
            id,
            ClaimAuthorizeKSignSecp256k1::new(ksign.public_key()),
        )
        .unwrap();

    let root = Hash::new([0x0c; 32]);
    let stale = unix_now() - 60;
    let mut msg = Vec::new();
    msg.extend_from_slice(id.bytes());
    msg.extend_from_slice(root.as_ref());
    msg.extend_from_slice(&stale.to_be_bytes());
    let signature = sign_eth_msg(&ksign, &msg).unwrap();
    assert!(matches!(
        fixture
            .service
            .commit_new_id_root(id, &ksign.public_key(), root, stale, &signature)
            .unwrap_err(),
        ServiceError::InvalidAuth(_)
    ));

    // Fresh timestamp, but the signature covers different bytes.
    let timestamp = unix_now();
    let forged = sign_eth_msg(&ksign, b"unrelated").unwrap();
    assert!(matches!(
        fixture
            .service
            .commit_new_id_root(id, &ksign.public_key(), root, timestamp, &forged)
            .unwrap_err(),
        ServiceError::InvalidAuth(_)
    ));
}

#[test]
fn user_level_proof_round_trips_through_json_and_verifies() {
    let mut fixture = setup(0x57);
    let id = random_id(&mut fixture.rng);
    let ksign = SecretKey::random(&mut fixture.rng);

    let claim = ClaimAuthorizeKSignSecp256k1::new(ksign.public_key());
    fixture
        .service
        .add_claim_authorize_ksign_secp256k1_first(id, claim)
        .unwrap();

    let hi = claim.entry().hindex();
    let proof_claim = fixture.service.get_claim_proof_user_by_hi(&id, &hi).unwrap();
    assert_eq!(proof_claim.proofs.len(), 2);
    assert_eq!(proof_claim.leaf, claim.entry().data);
    let aux = proof_claim.proofs[0].aux.as_ref().unwrap();
    assert_eq!(aux.id, id);
    assert_eq!(aux.era, 0);
    assert!(proof_claim.proofs[1].aux.is_none());

    let json = serde_json::to_string(&proof_claim).unwrap();
    let parsed: ProofOfClaim = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, proof_claim);

    verify_proof_claim(&fixture.signer.public_key(), &parsed).unwrap();

    // A different relay key must not validate the proof.
    let foreign = SecretKey::random(&mut fixture.rng).public_key();
    assert_eq!(
        verify_proof_claim(&foreign, &parsed).unwrap_err(),
        ProofClaimError::InvalidSignature
    );
}

#[test]
fn tampered_user_level_proof_fails_verification() {
    let mut fixture = setup(0x58);
    let id = random_id(&mut fixture.rng);
    let ksign = SecretKey::random(&mut fixture.rng);

    let claim = ClaimAuthorizeKSignSecp256k1::new(ksign.public_key());
    fixture
        .service
        .add_claim_authorize_ksign_secp256k1_first(id, claim)
        .unwrap();

    let mut proof_claim = fixture
        .service
        .get_claim_proof_user_by_hi(&id, &claim.entry().hindex())
        .unwrap();
    proof_claim.leaf[0][0] ^= 0x01;
    assert!(verify_proof_claim(&fixture.signer.public_key(), &proof_claim).is_err());
}

#[test]
fn revoked_user_claim_yields_no_proof() {
    let mut fixture = setup(0x59);
    let id = random_id(&mut fixture.rng);

    let v0 = ClaimAuthorizeKSignBabyJub::new(true, ElemBytes::new([0x1e; 32]));
    let mut v1 = v0;
    v1.version = 1;
    fixture
        .service
        .add_claim_authorize_ksign_first(id, v0)
        .unwrap();
    fixture
        .service
        .add_claim_authorize_ksign_first(id, v1)
        .unwrap();

    assert_eq!(
        fixture
            .service
            .get_claim_proof_user_by_hi(&id, &v0.entry().hindex())
            .unwrap_err(),
        ServiceError::RevokedClaim
    );
}

#[test]
fn further_keys_require_a_valid_signature_from_an_authorized_key() {
    let mut fixture = setup(0x5a);
    let id = random_id(&mut fixture.rng);
    let ksign = SecretKey::random(&mut fixture.rng);

    fixture
        .service
        .add_claim_authorize_ksign_secp256k1_first(
            id,
            ClaimAuthorizeKSignSecp256k1::new(ksign.public_key()),
        )
        .unwrap();

    let new_key = ClaimAuthorizeKSignBabyJub::new(false, ElemBytes::new([0x2a; 32]));
    let signature = sign_eth_msg(&ksign, &new_key.entry().bytes()).unwrap();

    // Signed by an unauthorized key: rejected.
    let stranger = SecretKey::random(&mut fixture.rng);
    let stranger_msg = ClaimAuthorizeKSignMsg {
        claim: new_key,
        ksign_pk: stranger.public_key(),
        signature: sign_eth_msg(&stranger, &new_key.entry().bytes()).unwrap(),
    };
    assert!(matches!(
        fixture
            .service
            .add_claim_authorize_ksign(id, stranger_msg)
            .unwrap_err(),
        ServiceError::InvalidAuth(_)
    ));

    // Signature by the authorized key over the wrong payload: rejected.
    let bad_sig_msg = ClaimAuthorizeKSignMsg {
        claim: new_key,
        ksign_pk: ksign.public_key(),
        signature: sign_eth_msg(&ksign, b"wrong payload").unwrap(),
    };
    assert!(matches!(
        fixture
            .service
            .add_claim_authorize_ksign(id, bad_sig_msg)
            .unwrap_err(),
        ServiceError::InvalidAuth(_)
    ));

    // The honest message goes through and is provable afterwards.
    let msg = ClaimAuthorizeKSignMsg {
        claim: new_key,
        ksign_pk: ksign.public_key(),
        signature,
    };
    fixture.service.add_claim_authorize_ksign(id, msg).unwrap();
    fixture
        .service
        .get_claim_proof_user_by_hi(&id, &new_key.entry().hindex())
        .unwrap();
}

#[test]
fn user_id_claims_carry_opaque_payloads() {
    let mut fixture = setup(0x5b);
    let id = random_id(&mut fixture.rng);
    let ksign = SecretKey::random(&mut fixture.rng);

    fixture
        .service
        .add_claim_authorize_ksign_secp256k1_first(
            id,
            ClaimAuthorizeKSignSecp256k1::new(ksign.public_key()),
        )
        .unwrap();

    let claim_value = ClaimBasic::new([0x11; 50], [0x22; 62]).entry();
    let msg = ClaimValueMsg {
        claim_value,
        ksign_pk: ksign.public_key(),
        signature: sign_eth_msg(&ksign, &claim_value.bytes()).unwrap(),
    };
    fixture.service.add_user_id_claim(id, msg).unwrap();

    let proof_claim = fixture
        .service
        .get_claim_proof_user_by_hi(&id, &claim_value.hindex())
        .unwrap();
    verify_proof_claim(&fixture.signer.public_key(), &proof_claim).unwrap();
}

#[test]
fn get_id_root_returns_a_verifying_relay_proof() {
    let mut fixture = setup(0x5c);
    let id = random_id(&mut fixture.rng);
    let ksign = SecretKey::random(&mut fixture.rng);

    fixture
        .service
        .add_claim_authorize_ksign_secp256k1_first(
            id,
            ClaimAuthorizeKSignSecp256k1::new(ksign.public_key()),
        )
        .unwrap();

    let (user_root, proof_bytes) = fixture.service.get_id_root(&id).unwrap();
    assert_eq!(user_root, user_tree_of(&fixture, &id).root());

    let proof = Proof::from_bytes(CLAIM_TREE_DEPTH, &proof_bytes).unwrap();
    assert!(proof.existence());

    let set_root_key = ClaimSetRootKey::new(id, user_root);
    let entry = set_root_key.entry();
    assert!(verify_proof(
        &fixture.service.mt().root(),
        &proof,
        &entry.hindex(),
        &entry.hvalue()
    ));
}

#[test]
fn relay_catches_up_after_user_tree_drift() {
    let mut fixture = setup(0x5d);
    let id = random_id(&mut fixture.rng);
    let ksign = SecretKey::random(&mut fixture.rng);

    fixture
        .service
        .add_claim_authorize_ksign_secp256k1_first(
            id,
            ClaimAuthorizeKSignSecp256k1::new(ksign.public_key()),
        )
        .unwrap();

    // The user mutates its sub-tree without the relay noticing, as after a
    // crash between the two insertions.
    let user_mt = user_tree_of(&fixture, &id);
    user_mt
        .add(&ClaimBasic::new([0x31; 50], [0x32; 62]).entry())
        .unwrap();
    let drifted_root = user_mt.root();
    let (published_root, _) = fixture.service.get_id_root(&id).unwrap();
    assert_eq!(published_root, drifted_root);

    // Re-committing the derived root restores the relay's view with the next
    // claim version.
    let timestamp = unix_now();
    let mut msg = Vec::new();
    msg.extend_from_slice(id.bytes());
    msg.extend_from_slice(drifted_root.as_ref());
    msg.extend_from_slice(&timestamp.to_be_bytes());
    let signature = sign_eth_msg(&ksign, &msg).unwrap();
    let set_root_key = fixture
        .service
        .commit_new_id_root(id, &ksign.public_key(), drifted_root, timestamp, &signature)
        .unwrap();
    assert_eq!(set_root_key.version, 1);

    let proof_claim = fixture
        .service
        .get_claim_proof_user_by_hi(&id, &ClaimBasic::new([0x31; 50], [0x32; 62]).entry().hindex())
        .unwrap();
    verify_proof_claim(&fixture.signer.public_key(), &proof_claim).unwrap();
}

#[test]
fn direct_claims_are_idempotent_for_genesis_loading() {
    let fixture = setup(0x5e);
    let genesis: Vec<Entry> = vec![
        ClaimBasic::new([0x01; 50], [0x02; 62]).entry(),
        ClaimBasic::new([0x03; 50], [0x04; 62]).entry(),
    ];

    fixture.service.load_genesis(&genesis).unwrap();
    let root = fixture.service.mt().root();

    // Loading the very same claims again succeeds and changes nothing.
    fixture.service.load_genesis(&genesis).unwrap();
    assert_eq!(fixture.service.mt().root(), root);

    // A genesis claim whose stored payload differs is a hard error.
    let tampered = vec![ClaimBasic::new([0x01; 50], [0xff; 62]).entry()];
    assert_eq!(
        fixture.service.load_genesis(&tampered).unwrap_err(),
        ServiceError::GenesisClaimMismatch
    );
}

#[test]
fn anchor_receives_the_latest_relay_root() {
    let sink = RecordingSink::default();
    let mut fixture = setup_with_sink(0x5f, sink.clone());
    fixture.anchor.start();

    let id = random_id(&mut fixture.rng);
    fixture
        .service
        .add_claim_assign_name(ClaimAssignName::new("anchored@example.eth", id))
        .unwrap();
    let expected = fixture.service.mt().root();

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if sink.roots.lock().unwrap().last() == Some(&expected) {
            break;
        }
        assert!(Instant::now() < deadline, "root was never anchored");
        std::thread::sleep(Duration::from_millis(50));
    }
    fixture.anchor.stop_and_join();
}
