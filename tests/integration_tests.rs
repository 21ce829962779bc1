//! Integration tests for the admission engine
//!
//! These tests drive the public API end to end: gate and admissibility
//! decisions, anchor chaining into a file-backed ledger, slashing and
//! ranking, concurrent submitters alongside the probe agent, and the
//! health check.

use nexus_engine::crypto::AnchorHead;
use nexus_engine::ledger::TransactionStatus;
use nexus_engine::probe::PROBE_FLAG;
use nexus_engine::{
    AdmissibilityFilter, AdmissionPipeline, EngineConfig, EngineContext, EngineError,
    GENESIS_HASH, JsonLinesLedger, LedgerStore, ManualClock, MemoryLedger, ParticipantEffect,
    RejectReason, ReputationSequencer, SystemClock, ThresholdGate, read_records,
    run_health_check, verify_chain,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

/// Unit-weight gate: potential is the plain sum of the signals
fn unit_gate(threshold: f64) -> ThresholdGate {
    ThresholdGate::with_weights(vec![1.0; 5], 0.0, 0.05, threshold)
}

/// Pipeline over an in-memory ledger with a fresh sequencer
fn create_test_pipeline(threshold: f64) -> AdmissionPipeline {
    create_pipeline_with(
        unit_gate(threshold),
        Arc::new(MemoryLedger::new()),
        Arc::new(ReputationSequencer::default()),
    )
}

fn create_pipeline_with(
    gate: ThresholdGate,
    ledger: Arc<dyn LedgerStore>,
    sequencer: Arc<ReputationSequencer>,
) -> AdmissionPipeline {
    AdmissionPipeline::new(
        gate,
        AdmissibilityFilter::default(),
        ledger,
        sequencer,
        Arc::new(SystemClock::new()),
        Box::new(StdRng::seed_from_u64(7)),
    )
}

fn test_config(ledger: &Path) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.node_id = "nexus-test".to_string();
    config.ledger.path = ledger.to_path_buf();
    config.ledger.sync_on_append = false;
    config.probe.interval_ms = 5;
    config.probe.seed = Some(1234);
    config
}

const CLEAR: [f64; 5] = [1.0, 1.0, 1.0, 1.0, 1.0];
const LOW: [f64; 5] = [-1.0, -1.0, -1.0, -1.0, -1.0];

// ============================================================================
// Admission Decisions
// ============================================================================

mod admission {
    use super::*;

    #[test]
    fn test_gate_closed_slashes_participant() {
        let pipeline = create_test_pipeline(2.0);
        let sequencer = pipeline.sequencer().clone();

        sequencer.register("user1");
        sequencer.register("user2");
        sequencer.stake("user1", 100.0).unwrap();
        sequencer.stake("user2", 200.0).unwrap();

        let outcome = pipeline
            .submit(&LOW, &json!({"event": "TRANSFER"}), Some("user1"))
            .unwrap();

        assert_eq!(outcome.reject_reason(), Some(RejectReason::GateClosed));
        assert!(matches!(outcome.effect(), Some(ParticipantEffect::Slashed(_))));

        let user1 = sequencer.participant("user1").unwrap();
        assert_eq!(user1.stake, 50.0);
        assert_eq!(user1.malicious_count, 1);
        assert_eq!(user1.reputation, 90.0);

        let user2 = sequencer.participant("user2").unwrap();
        assert_eq!(user2.stake, 200.0);
        assert_eq!(user2.reputation, 100.0);
        assert_eq!(pipeline.ledger_len(), 0);
    }

    #[test]
    fn test_exposed_credentials_rejected() {
        let pipeline = create_test_pipeline(2.0);
        let before = pipeline.ledger_len();

        let outcome = pipeline
            .submit(
                &CLEAR,
                &json!({"event": "LEAK", "PRIVATE_KEY": "0xabc"}),
                None,
            )
            .unwrap();

        assert_eq!(
            outcome.reject_reason(),
            Some(RejectReason::ExposedCredentials)
        );
        assert_eq!(outcome.reject_reason().map(|r| r.code()), Some("EXPOSED_CREDENTIALS"));
        assert_eq!(pipeline.ledger_len(), before);
        assert_eq!(pipeline.head().hash, GENESIS_HASH);
    }

    #[test]
    fn test_clean_submission_commits() {
        let pipeline = create_test_pipeline(2.0);
        let before = pipeline.ledger_len();

        let outcome = pipeline
            .submit(&CLEAR, &json!({"event": "GLOBAL_SETTLEMENT"}), None)
            .unwrap();

        assert!(outcome.is_admitted());
        assert!(outcome.effect().is_none());
        assert_eq!(pipeline.ledger_len(), before + 1);

        let record = outcome.record().unwrap();
        assert_eq!(record.status, TransactionStatus::Committed);
        assert_eq!(record.epoch_id.len(), 64);
        assert_eq!(record.previous_hash, GENESIS_HASH);
        assert_eq!(pipeline.head().hash, record.anchor);
    }

    #[test]
    fn test_admission_credits_participant() {
        let pipeline = create_test_pipeline(2.0);
        let sequencer = pipeline.sequencer().clone();
        sequencer.register("alice");
        sequencer.stake("alice", 10.0).unwrap();

        let outcome = pipeline
            .submit(&CLEAR, &json!({"event": "PAY"}), Some("alice"))
            .unwrap();

        assert!(matches!(outcome.effect(), Some(ParticipantEffect::Credited)));
        let alice = sequencer.participant("alice").unwrap();
        assert_eq!(alice.stake, 10.0);
        assert_eq!(alice.successful_submissions, 1);
        assert_eq!(alice.reputation, 100.0);
    }

    #[test]
    fn test_unknown_participant_rejected_before_scoring() {
        let pipeline = create_test_pipeline(2.0);
        let gate_before = pipeline.gate_state();

        let err = pipeline
            .submit(&CLEAR, &json!({"event": "PAY"}), Some("ghost"))
            .unwrap_err();

        assert!(matches!(err, EngineError::UnknownParticipant(ref id) if id == "ghost"));
        assert_eq!(pipeline.gate_state(), gate_before);
        assert_eq!(pipeline.ledger_len(), 0);
    }

    #[test]
    fn test_dimension_mismatch_is_contract_violation() {
        let pipeline = create_test_pipeline(2.0);
        let err = pipeline
            .submit(&[1.0, 2.0], &json!({}), None)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::DimensionMismatch {
                expected: 5,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_backwards_clock_is_anchor_violation() {
        let clock = Arc::new(ManualClock::new(1_000));
        let sequencer = Arc::new(ReputationSequencer::default());
        sequencer.register("mallory");
        sequencer.stake("mallory", 100.0).unwrap();

        let pipeline = AdmissionPipeline::new(
            unit_gate(2.0),
            AdmissibilityFilter::default(),
            Arc::new(MemoryLedger::new()),
            sequencer.clone(),
            clock.clone(),
            Box::new(StdRng::seed_from_u64(1)),
        )
        .with_head(AnchorHead {
            hash: GENESIS_HASH.to_string(),
            timestamp: 5_000,
        });

        let outcome = pipeline
            .submit(&CLEAR, &json!({"event": "PAY"}), Some("mallory"))
            .unwrap();

        assert_eq!(outcome.reject_reason(), Some(RejectReason::AnchorViolation));
        assert!(!outcome.anchor().integrity_valid);

        // 0.5 x 1.5 of the stake is removed for an invalid anchor
        let mallory = sequencer.participant("mallory").unwrap();
        assert_eq!(mallory.stake, 25.0);
        assert_eq!(mallory.reputation, 90.0);
    }
}

// ============================================================================
// Anchor Chain & Ledger
// ============================================================================

mod chain {
    use super::*;

    #[test]
    fn test_file_ledger_forms_valid_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.jsonl");
        let ledger = Arc::new(JsonLinesLedger::open(&path, false).unwrap());
        let pipeline = create_pipeline_with(
            unit_gate(2.0),
            ledger,
            Arc::new(ReputationSequencer::default()),
        );

        let mut committed = 0;
        for i in 0..6 {
            let signals = if i % 3 == 2 { LOW } else { CLEAR };
            let outcome = pipeline
                .submit(&signals, &json!({"seq": i}), None)
                .unwrap();
            if outcome.is_admitted() {
                committed += 1;
            }
        }

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), committed);
        assert_eq!(records[0].previous_hash, GENESIS_HASH);
        for pair in records.windows(2) {
            assert_eq!(pair[1].previous_hash, pair[0].anchor);
            assert!(pair[1].timestamp >= pair[0].timestamp);
        }
        verify_chain(&records).unwrap();
        assert_eq!(pipeline.head().hash, records[records.len() - 1].anchor);
    }

    #[test]
    fn test_tampered_ledger_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.jsonl");
        let ledger = Arc::new(JsonLinesLedger::open(&path, false).unwrap());
        let pipeline = create_pipeline_with(
            unit_gate(-1e9),
            ledger,
            Arc::new(ReputationSequencer::default()),
        );

        for i in 0..3 {
            pipeline.submit(&CLEAR, &json!({"seq": i}), None).unwrap();
        }

        let mut records = read_records(&path).unwrap();
        records.remove(1);
        assert!(matches!(
            verify_chain(&records),
            Err(EngineError::ChainBroken { index: 1, .. })
        ));
    }

    #[test]
    fn test_context_resumes_from_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.jsonl");

        let mut config = test_config(&path);
        config.admission.threshold = -1e9;

        let first = EngineContext::from_config(config.clone()).unwrap();
        for i in 0..2 {
            first.pipeline.submit(&CLEAR, &json!({"seq": i}), None).unwrap();
        }
        let head = first.pipeline.head();
        drop(first);

        let second = EngineContext::from_config(config).unwrap();
        assert_eq!(second.pipeline.head().hash, head.hash);
        second
            .pipeline
            .submit(&CLEAR, &json!({"seq": 2}), None)
            .unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 3);
        verify_chain(&records).unwrap();
    }
}

// ============================================================================
// Stake & Reputation
// ============================================================================

mod reputation {
    use super::*;

    #[test]
    fn test_compete_orders_by_reputation_then_registration() {
        let sequencer = ReputationSequencer::default();
        for id in ["a", "b", "c", "d"] {
            sequencer.register(id);
        }
        sequencer.slash("b", None, true).unwrap();
        sequencer.slash("b", None, true).unwrap();
        sequencer.slash("c", None, true).unwrap();

        assert_eq!(sequencer.participant("b").unwrap().reputation, 80.0);
        assert_eq!(sequencer.participant("c").unwrap().reputation, 90.0);
        assert_eq!(sequencer.compete(), vec!["a", "d", "c"]);
    }

    #[test]
    fn test_stake_never_negative_and_reputation_floors_at_zero() {
        let pipeline = create_test_pipeline(1e9);
        let sequencer = pipeline.sequencer().clone();
        sequencer.register("spammer");
        sequencer.stake("spammer", 64.0).unwrap();

        for i in 0..12 {
            let outcome = pipeline
                .submit(&CLEAR, &json!({"seq": i}), Some("spammer"))
                .unwrap();
            assert_eq!(outcome.reject_reason(), Some(RejectReason::GateClosed));

            let p = sequencer.participant("spammer").unwrap();
            assert!(p.stake >= 0.0);
            let expected = (100.0 - 10.0 * p.malicious_count as f64).max(0.0);
            assert_eq!(p.reputation, expected);
        }

        let p = sequencer.participant("spammer").unwrap();
        assert_eq!(p.malicious_count, 12);
        assert_eq!(p.reputation, 0.0);
        assert_eq!(p.stake_history.len(), 13);
    }

    #[test]
    fn test_negative_stake_rejected() {
        let sequencer = ReputationSequencer::default();
        sequencer.register("x");
        assert!(matches!(
            sequencer.stake("x", -5.0),
            Err(EngineError::InvalidStake { .. })
        ));
        assert_eq!(sequencer.participant("x").unwrap().stake, 0.0);
    }
}

// ============================================================================
// Concurrency & Probe Agent
// ============================================================================

mod concurrency {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_submissions_keep_chain_linear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("concurrent.jsonl");
        let ledger = Arc::new(JsonLinesLedger::open(&path, false).unwrap());
        let sequencer = Arc::new(ReputationSequencer::default());
        let pipeline = Arc::new(create_pipeline_with(
            unit_gate(2.0),
            ledger,
            sequencer.clone(),
        ));

        let workers: Vec<_> = (0..4)
            .map(|w| {
                let pipeline = pipeline.clone();
                let sequencer = sequencer.clone();
                thread::spawn(move || {
                    let id = format!("worker-{}", w);
                    sequencer.register(&id);
                    sequencer.stake(&id, 100.0).unwrap();
                    let mut admitted = 0;
                    for i in 0..25 {
                        let signals = if (w + i) % 2 == 0 { CLEAR } else { LOW };
                        let outcome = pipeline
                            .submit(&signals, &json!({"w": w, "i": i}), Some(&id))
                            .unwrap();
                        if outcome.is_admitted() {
                            admitted += 1;
                        }
                    }
                    admitted
                })
            })
            .collect();

        let admitted: usize = workers.into_iter().map(|h| h.join().unwrap()).sum();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), admitted);
        assert_eq!(pipeline.ledger_len(), admitted);
        verify_chain(&records).unwrap();

        for w in 0..4 {
            let p = sequencer.participant(&format!("worker-{}", w)).unwrap();
            assert!(p.stake >= 0.0);
            assert_eq!(p.successful_submissions + p.malicious_count as u64, 25);
        }
    }

    #[tokio::test]
    async fn test_probe_runs_alongside_submissions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.jsonl");
        let mut config = test_config(&path);
        config.features = vec![PROBE_FLAG.to_string()];

        let ctx = EngineContext::from_config(config).unwrap();
        let handle = ctx.start_probe().expect("probe flag is set");

        for i in 0..5 {
            let pipeline = ctx.pipeline.clone();
            tokio::task::spawn_blocking(move || {
                pipeline.submit(&CLEAR, &json!({"event": "SETTLE", "i": i}), None)
            })
            .await
            .unwrap()
            .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let report = handle.shutdown().await.unwrap();
        assert!(report.probes >= 1);
        assert_eq!(report.probes, report.breaches + report.deflected + report.errors);
        assert_eq!(report.errors, 0);

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), ctx.pipeline.ledger_len());
        verify_chain(&records).unwrap();
    }
}

// ============================================================================
// Health Check
// ============================================================================

mod health {
    use super::*;

    #[test]
    fn test_health_check_on_open_gate() {
        let pipeline = create_test_pipeline(2.0);
        let report = run_health_check(&pipeline, &CLEAR).unwrap();
        assert!(report.is_healthy());
        assert_eq!(pipeline.ledger_len(), 1);
    }

    #[test]
    fn test_health_check_reports_closed_gate() {
        let pipeline = create_test_pipeline(1e9);
        let report = run_health_check(&pipeline, &CLEAR).unwrap();
        assert!(!report.admission_ok);
        assert!(report.admissibility_ok);
        assert!(!report.is_healthy());
    }
}
