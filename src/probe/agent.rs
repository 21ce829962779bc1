//! Adversarial Probe Agent
//!
//! Background task that keeps feeding synthetic hostile submissions through
//! the same entry point as real callers. It is best-effort and carries no
//! authority: a probe that gets admitted is logged as a breach, nothing
//! else happens.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::pipeline::{AdmissionPipeline, RejectReason};

/// Most recent probe results kept in the report
pub const PROBE_LOG_CAPACITY: usize = 256;

/// Probe signal components are drawn from `[-SIGNAL_SPAN, SIGNAL_SPAN)`
const SIGNAL_SPAN: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub interval: Duration,
    /// Fixed seed for reproducible probe sequences
    pub seed: Option<u64>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeResult {
    Breach { epoch: String },
    Deflected { reason: RejectReason },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeLogEntry {
    pub at: DateTime<Utc>,
    pub result: ProbeResult,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProbeReport {
    pub probes: u64,
    pub breaches: u64,
    pub deflected: u64,
    pub errors: u64,
    pub log: VecDeque<ProbeLogEntry>,
}

impl ProbeReport {
    fn record(&mut self, result: ProbeResult) {
        self.probes += 1;
        match &result {
            ProbeResult::Breach { .. } => self.breaches += 1,
            ProbeResult::Deflected { .. } => self.deflected += 1,
            ProbeResult::Error { .. } => self.errors += 1,
        }
        if self.log.len() == PROBE_LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(ProbeLogEntry {
            at: Utc::now(),
            result,
        });
    }
}

pub struct ProbeAgent {
    pipeline: Arc<AdmissionPipeline>,
    config: ProbeConfig,
    rng: StdRng,
}

impl ProbeAgent {
    pub fn new(pipeline: Arc<AdmissionPipeline>, config: ProbeConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            pipeline,
            config,
            rng,
        }
    }

    fn malicious_payload() -> Value {
        json!({"exploit": "BUFFER_OVERFLOW_TEST", "payload": "0xDEADBEEF"})
    }

    fn next_signals(&mut self) -> Vec<f64> {
        (0..self.pipeline.dimension())
            .map(|_| self.rng.gen_range(-SIGNAL_SPAN..SIGNAL_SPAN))
            .collect()
    }

    /// Fire one synthetic submission and classify the result
    pub fn probe_once(&mut self) -> ProbeResult {
        let signals = self.next_signals();
        submit_probe(&self.pipeline, &signals)
    }

    /// Run on the current tokio runtime until stopped
    pub fn spawn(self) -> ProbeHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run(self, stop_rx));
        ProbeHandle { stop_tx, task }
    }
}

/// Submit one hostile payload. Blocks on the pipeline lock and the ledger
/// write, so async callers run it on the blocking pool.
fn submit_probe(pipeline: &AdmissionPipeline, signals: &[f64]) -> ProbeResult {
    match pipeline.submit(signals, &ProbeAgent::malicious_payload(), None) {
        Ok(outcome) => match outcome.record() {
            Some(record) => {
                warn!(epoch = %record.epoch_id, "CRITICAL BREACH: probe submission admitted");
                ProbeResult::Breach {
                    epoch: record.epoch_id.clone(),
                }
            }
            None => {
                let reason = outcome
                    .reject_reason()
                    .unwrap_or(RejectReason::GateClosed);
                debug!(reason = %reason, "DEFENSE_STABLE: probe rejected");
                ProbeResult::Deflected { reason }
            }
        },
        Err(e) => {
            warn!(error = %e, "Probe submission failed");
            ProbeResult::Error {
                message: e.to_string(),
            }
        }
    }
}

async fn run(mut agent: ProbeAgent, mut stop: watch::Receiver<bool>) -> ProbeReport {
    let mut report = ProbeReport::default();
    info!(
        interval_ms = agent.config.interval.as_millis() as u64,
        "Probe agent started"
    );

    loop {
        if *stop.borrow() {
            break;
        }

        let signals = agent.next_signals();
        let pipeline = agent.pipeline.clone();
        let result = match tokio::task::spawn_blocking(move || submit_probe(&pipeline, &signals))
            .await
        {
            Ok(result) => result,
            Err(e) => ProbeResult::Error {
                message: e.to_string(),
            },
        };
        report.record(result);

        tokio::select! {
            _ = tokio::time::sleep(agent.config.interval) => {}
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
        }
    }

    info!(
        probes = report.probes,
        breaches = report.breaches,
        deflected = report.deflected,
        "Probe agent stopped"
    );
    report
}

/// Owner of a running probe task
pub struct ProbeHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<ProbeReport>,
}

impl ProbeHandle {
    /// Ask the agent to stop after its current iteration
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the agent and wait for it to exit
    pub async fn shutdown(self) -> Result<ProbeReport, JoinError> {
        self.stop();
        self.task.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::gate::{AdmissibilityFilter, ThresholdGate};
    use crate::error::Result;
    use crate::ledger::{LedgerStore, MemoryLedger, TransactionRecord};
    use crate::reputation::ReputationSequencer;

    /// Ledger whose appends hold the calling thread like a slow fsync
    struct SlowLedger(MemoryLedger);

    impl LedgerStore for SlowLedger {
        fn append(&self, record: &TransactionRecord) -> Result<()> {
            std::thread::sleep(Duration::from_millis(100));
            self.0.append(record)
        }

        fn len(&self) -> usize {
            self.0.len()
        }

        fn records(&self) -> Result<Vec<TransactionRecord>> {
            self.0.records()
        }
    }

    fn pipeline(threshold: f64) -> Arc<AdmissionPipeline> {
        Arc::new(AdmissionPipeline::new(
            ThresholdGate::with_weights(vec![0.0; 5], 0.0, 0.0, threshold),
            AdmissibilityFilter::default(),
            Arc::new(MemoryLedger::new()),
            Arc::new(ReputationSequencer::default()),
            Arc::new(SystemClock::new()),
            Box::new(StdRng::seed_from_u64(3)),
        ))
    }

    fn config() -> ProbeConfig {
        ProbeConfig {
            interval: Duration::from_millis(5),
            seed: Some(42),
        }
    }

    #[test]
    fn test_probe_deflected_by_closed_gate() {
        let mut agent = ProbeAgent::new(pipeline(1e9), config());
        assert_eq!(
            agent.probe_once(),
            ProbeResult::Deflected {
                reason: RejectReason::GateClosed
            }
        );
    }

    #[test]
    fn test_probe_breach_on_open_gate() {
        let p = pipeline(-1e9);
        let mut agent = ProbeAgent::new(p.clone(), config());
        assert!(matches!(agent.probe_once(), ProbeResult::Breach { .. }));
        assert_eq!(p.ledger_len(), 1);
    }

    #[test]
    fn test_report_log_is_bounded() {
        let mut report = ProbeReport::default();
        for _ in 0..PROBE_LOG_CAPACITY + 10 {
            report.record(ProbeResult::Deflected {
                reason: RejectReason::GateClosed,
            });
        }
        assert_eq!(report.log.len(), PROBE_LOG_CAPACITY);
        assert_eq!(report.deflected, (PROBE_LOG_CAPACITY + 10) as u64);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_slow_ledger_does_not_stall_runtime() {
        let p = Arc::new(AdmissionPipeline::new(
            ThresholdGate::with_weights(vec![0.0; 5], 0.0, 0.0, -1e9),
            AdmissibilityFilter::default(),
            Arc::new(SlowLedger(MemoryLedger::new())),
            Arc::new(ReputationSequencer::default()),
            Arc::new(SystemClock::new()),
            Box::new(StdRng::seed_from_u64(5)),
        ));
        let handle = ProbeAgent::new(p.clone(), config()).spawn();

        // Each append holds a thread for 100ms; on the single runtime
        // thread these 30 short sleeps would take seconds.
        let started = std::time::Instant::now();
        for _ in 0..30 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(started.elapsed() < Duration::from_secs(1));

        let report = handle.shutdown().await.unwrap();
        assert!(report.breaches >= 1);
        assert_eq!(report.breaches as usize, p.ledger_len());
    }

    #[tokio::test]
    async fn test_spawn_and_shutdown() {
        let handle = ProbeAgent::new(pipeline(1e9), config()).spawn();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!handle.is_finished());

        let report = handle.shutdown().await.unwrap();
        assert!(report.probes >= 1);
        assert_eq!(report.breaches, 0);
        assert_eq!(report.probes, report.deflected);
    }
}
