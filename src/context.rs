//! Engine wiring
//!
//! Builds the shared pipeline and sequencer from an [`EngineConfig`],
//! resuming the anchor chain from whatever the ledger file already holds.
//! The clock is started past the resumed head, so a wall clock that reads
//! behind the last record cannot turn every new anchor into a violation.

use anyhow::{Context, Result};
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::crypto::AnchorHead;
use crate::gate::{AdmissibilityFilter, ThresholdGate};
use crate::ledger::{JsonLinesLedger, LedgerStore, TransactionRecord};
use crate::pipeline::AdmissionPipeline;
use crate::probe::{FeatureFlags, PROBE_FLAG, ProbeAgent, ProbeHandle};
use crate::reputation::ReputationSequencer;

pub struct EngineContext {
    pub config: EngineConfig,
    pub pipeline: Arc<AdmissionPipeline>,
    pub sequencer: Arc<ReputationSequencer>,
    pub flags: Arc<dyn FeatureFlags>,
}

impl EngineContext {
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let ledger = JsonLinesLedger::open(&config.ledger.path, config.ledger.sync_on_append)
            .with_context(|| {
                format!("Failed to open ledger at {}", config.ledger.path.display())
            })?;
        let head = ledger
            .last_record()
            .as_ref()
            .map(head_from_record)
            .unwrap_or_else(AnchorHead::genesis);
        let records = ledger.len();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::not_before(head.timestamp));

        let mut rng = OsRng;
        let gate = ThresholdGate::from_rng(
            config.admission.dimension,
            config.admission.learning_rate,
            config.admission.threshold,
            &mut rng,
        );
        let filter = AdmissibilityFilter::with_markers(
            config.admission.jurisdiction.clone(),
            config.admission.disallowed_markers.iter().cloned(),
        );

        let sequencer = Arc::new(ReputationSequencer::with_clock(
            config.reputation.to_policy(),
            clock.clone(),
        ));

        let pipeline = AdmissionPipeline::new(
            gate,
            filter,
            Arc::new(ledger),
            sequencer.clone(),
            clock,
            Box::new(OsRng),
        )
        .with_node_id(config.node_id.clone())
        .with_head(head);

        let head_hash = pipeline.head().hash;
        info!(
            node = %config.node_id,
            zone = %config.admission.jurisdiction,
            records,
            head = %head_hash.get(..16).unwrap_or(&head_hash),
            "Engine context ready"
        );

        let flags: Arc<dyn FeatureFlags> = Arc::new(config.feature_flags());

        Ok(Self {
            config,
            pipeline: Arc::new(pipeline),
            sequencer,
            flags,
        })
    }

    /// Replace the flag provider, e.g. with a remote-backed one
    pub fn with_flags(mut self, flags: Arc<dyn FeatureFlags>) -> Self {
        self.flags = flags;
        self
    }

    /// Spawn the probe agent when its flag is on
    pub fn start_probe(&self) -> Option<ProbeHandle> {
        if !self.flags.is_enabled(PROBE_FLAG) {
            info!("Probe agent disabled by feature flag");
            return None;
        }
        let agent = ProbeAgent::new(self.pipeline.clone(), self.config.probe.to_probe_config());
        Some(agent.spawn())
    }
}

fn head_from_record(record: &TransactionRecord) -> AnchorHead {
    AnchorHead {
        hash: record.anchor.clone(),
        timestamp: record
            .timestamp
            .timestamp_nanos_opt()
            .map(|n| n.max(0) as u64)
            .unwrap_or(0),
    }
}
