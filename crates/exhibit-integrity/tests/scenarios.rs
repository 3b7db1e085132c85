//! # End-to-end Integrity Scenarios
//!
//! Ingest → prove → verify → tamper-check with real SHA-256 and Ed25519,
//! a local timestamp authority and a pinned clock.

use std::sync::Arc;
use std::time::Duration;

use exhibit_core::{ActorId, Clock, EvidenceId, FixedClock, Timestamp};
use exhibit_crypto::{Ed25519KeyPair, SignatureService};
use exhibit_integrity::{
    CheckType, IndicatorType, IntegrityProof, LocalTimestampAuthority, ProofBuilder, Severity,
    TamperDetector, TimestampClient, VerificationEngine, VerificationResult, VerificationStatus,
};
use rand::RngCore;

fn now() -> Timestamp {
    Timestamp::parse("2026-09-15T14:00:00Z").unwrap()
}

fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(now()))
}

fn evidence() -> EvidenceId {
    EvidenceId::new("EV-2026-0042").unwrap()
}

fn random_content() -> Vec<u8> {
    let mut content = vec![0u8; 1024];
    rand::thread_rng().fill_bytes(&mut content);
    content
}

async fn ingest(content: &[u8]) -> IntegrityProof {
    let tsa = LocalTimestampAuthority::new("local-tsa", Ed25519KeyPair::generate(), clock());
    ProofBuilder::new(
        SignatureService::default(),
        TimestampClient::new(Arc::new(tsa), Duration::from_secs(1)).with_clock(clock()),
    )
    .create_proof(
        &evidence(),
        content,
        &Ed25519KeyPair::generate(),
        &ActorId::new("intake-officer").unwrap(),
    )
    .await
    .unwrap()
}

// ── Scenario A ──────────────────────────────────────────────────────

#[tokio::test]
async fn unchanged_content_is_verified_at_full_confidence() {
    let content = random_content();
    let mut proof = ingest(&content).await;
    let engine = VerificationEngine::new(SignatureService::default(), clock());

    let record = engine
        .verify(&evidence(), &content, &mut proof, &ActorId::new("auditor").unwrap())
        .unwrap();

    assert!(record.hash_match && record.signature_valid && record.timestamp_valid);
    assert!(record.merkle_present);
    assert_eq!(record.confidence, 100);
    assert_eq!(record.result, VerificationResult::Verified);
    assert_eq!(proof.verification_status(), VerificationStatus::Valid);
}

// ── Scenario B ──────────────────────────────────────────────────────

#[tokio::test]
async fn one_flipped_byte_fails_verification_and_tamper_check() {
    let content = random_content();
    let mut proof = ingest(&content).await;
    let mut mutated = content.clone();
    mutated[512] ^= 0x01;

    let engine = VerificationEngine::new(SignatureService::default(), clock());
    let record = engine
        .verify(&evidence(), &mutated, &mut proof, &ActorId::new("auditor").unwrap())
        .unwrap();
    assert!(!record.hash_match);
    assert!(record.confidence <= 60);
    assert_eq!(record.result, VerificationResult::Failed);
    assert_eq!(proof.verification_status(), VerificationStatus::Compromised);

    let detector = TamperDetector::new(SignatureService::default(), clock());
    let check = detector
        .perform_check(
            &evidence(),
            &mutated,
            &proof,
            &ActorId::new("forensics").unwrap(),
            CheckType::Manual,
        )
        .unwrap();
    assert!(check.tamper_detected);
    assert!(check.indicators.iter().any(
        |i| i.indicator_type == IndicatorType::HashMismatch && i.severity == Severity::Critical
    ));
    assert!(check.integrity_score <= 60);
}

// ── Tamper-check determinism ────────────────────────────────────────

#[tokio::test]
async fn identical_inputs_yield_identical_findings() {
    let content = random_content();
    let proof = ingest(&content).await;
    let mut mutated = content.clone();
    mutated[0] ^= 0xff;

    let detector = TamperDetector::new(SignatureService::default(), clock());
    let who = ActorId::new("forensics").unwrap();
    let first = detector
        .perform_check(&evidence(), &mutated, &proof, &who, CheckType::Scheduled)
        .unwrap();
    let second = detector
        .perform_check(&evidence(), &mutated, &proof, &who, CheckType::Scheduled)
        .unwrap();

    assert_eq!(first.indicators, second.indicators);
    assert_eq!(first.integrity_score, second.integrity_score);
    assert_eq!(first.checked_at, second.checked_at);
    assert_ne!(first.id, second.id);
}
