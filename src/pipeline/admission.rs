//! Admission Pipeline
//!
//! Drives one submission through
//! `RECEIVED → SCORED → ANCHOR-ADVANCED → {ADMITTED, REJECTED}`.
//!
//! Gate state, anchor head and ledger append sit behind one lock, so the
//! `score → decide → adjust` sequence of concurrent submissions never
//! interleaves and ledger order always matches chain order. The sequencer
//! is notified after the lock is released; it serializes per participant.

use rand::RngCore;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::crypto::{AnchorHead, CausalAnchorChain, epoch_id, random_token};
use crate::error::{EngineError, Result};
use crate::gate::{AdmissibilityFilter, GateState, ThresholdGate};
use crate::ledger::{LedgerStore, TransactionRecord};
use crate::pipeline::{Admission, Outcome, Persistence, RejectReason, Rejection, RollbackPoint};
use crate::reputation::{ParticipantEffect, ReputationSequencer};

struct PipelineCore {
    gate: ThresholdGate,
    chain: CausalAnchorChain,
    entropy: Box<dyn RngCore + Send>,
}

pub struct AdmissionPipeline {
    node_id: String,
    dimension: usize,
    filter: AdmissibilityFilter,
    ledger: Arc<dyn LedgerStore>,
    sequencer: Arc<ReputationSequencer>,
    clock: Arc<dyn Clock>,
    core: Mutex<PipelineCore>,
}

impl AdmissionPipeline {
    pub fn new(
        gate: ThresholdGate,
        filter: AdmissibilityFilter,
        ledger: Arc<dyn LedgerStore>,
        sequencer: Arc<ReputationSequencer>,
        clock: Arc<dyn Clock>,
        entropy: Box<dyn RngCore + Send>,
    ) -> Self {
        let dimension = gate.dimension();
        let chain = CausalAnchorChain::new(clock.clone());
        Self {
            node_id: "nexus-local".to_string(),
            dimension,
            filter,
            ledger,
            sequencer,
            clock,
            core: Mutex::new(PipelineCore {
                gate,
                chain,
                entropy,
            }),
        }
    }

    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = node_id.into();
        self
    }

    /// Continue an existing chain instead of starting from genesis
    pub fn with_head(self, head: AnchorHead) -> Self {
        {
            let mut core = self.lock_core();
            core.chain = CausalAnchorChain::resume(self.clock.clone(), head);
        }
        self
    }

    fn lock_core(&self) -> MutexGuard<'_, PipelineCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn filter(&self) -> &AdmissibilityFilter {
        &self.filter
    }

    pub fn sequencer(&self) -> &Arc<ReputationSequencer> {
        &self.sequencer
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerStore> {
        &self.ledger
    }

    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }

    pub fn head(&self) -> AnchorHead {
        self.lock_core().chain.head().clone()
    }

    pub fn gate_state(&self) -> GateState {
        self.lock_core().gate.state().clone()
    }

    /// Submit a JSON payload; it is screened by its compact text form
    pub fn submit(
        &self,
        signals: &[f64],
        payload: &Value,
        participant_id: Option<&str>,
    ) -> Result<Outcome> {
        self.submit_serialized(signals, &payload.to_string(), participant_id)
    }

    /// Submit a payload the caller already serialized
    pub fn submit_serialized(
        &self,
        signals: &[f64],
        payload: &str,
        participant_id: Option<&str>,
    ) -> Result<Outcome> {
        // RECEIVED
        self.validate(signals, participant_id)?;
        let verdict = self.filter.check(payload);

        let mut core = self.lock_core();

        // SCORED
        let potential = core.gate.score(signals)?;
        debug!(node = %self.node_id, potential, "Submission scored");

        // ANCHOR-ADVANCED
        let head = core.chain.head().clone();
        let anchor = core.chain.advance(signals, &head.hash);

        let decision = if !anchor.integrity_valid {
            Err(RejectReason::AnchorViolation)
        } else if !verdict.admissible {
            Err(RejectReason::from(verdict.reason))
        } else if !core.gate.admits(potential) {
            Err(RejectReason::GateClosed)
        } else {
            Ok(())
        };

        match decision {
            Ok(()) => {
                let token = random_token(core.entropy.as_mut());
                let record =
                    TransactionRecord::committed(epoch_id(&token, potential), &anchor, self.clock.now_utc());
                let rollback = RollbackPoint {
                    head,
                    gate: core.gate.state().clone(),
                };

                core.chain.commit(&anchor);
                let persistence = match self.ledger.append(&record) {
                    Ok(()) => Persistence::Durable,
                    Err(e) => {
                        error!(
                            node = %self.node_id,
                            epoch = %record.epoch_id,
                            error = %e,
                            "Ledger append failed; record not persisted"
                        );
                        Persistence::Failed {
                            error: e.to_string(),
                            rollback,
                        }
                    }
                };
                core.gate.adjust(true, signals)?;
                drop(core);

                info!(
                    node = %self.node_id,
                    epoch = %&record.epoch_id[..12],
                    potential,
                    durable = persistence.is_durable(),
                    "Epoch committed"
                );

                let effect = self.notify(participant_id, true, &anchor.hash, true)?;
                Ok(Outcome::Admitted(Admission {
                    potential,
                    anchor,
                    record,
                    persistence,
                    effect,
                }))
            }
            Err(reason) => {
                core.gate.adjust(false, signals)?;
                drop(core);

                info!(
                    node = %self.node_id,
                    reason = %reason,
                    potential,
                    participant = participant_id.unwrap_or("-"),
                    "Submission rejected"
                );

                let anchor_valid = reason != RejectReason::AnchorViolation;
                let effect = self.notify(participant_id, false, &anchor.hash, anchor_valid)?;
                Ok(Outcome::Rejected(Rejection {
                    reason,
                    potential,
                    anchor,
                    effect,
                }))
            }
        }
    }

    /// Restore anchor head and gate to the state captured in `point`.
    ///
    /// Adjustments made by submissions that ran after the captured one are
    /// discarded as well.
    pub fn rollback(&self, point: &RollbackPoint) -> Result<()> {
        let mut core = self.lock_core();
        core.gate.restore(point.gate.clone())?;
        core.chain.rewind(point.head.clone());
        warn!(node = %self.node_id, head = %point.head.hash, "Pipeline rolled back");
        Ok(())
    }

    fn validate(&self, signals: &[f64], participant_id: Option<&str>) -> Result<()> {
        if signals.len() != self.dimension {
            return Err(EngineError::DimensionMismatch {
                expected: self.dimension,
                actual: signals.len(),
            });
        }
        if let Some(index) = signals.iter().position(|s| !s.is_finite()) {
            return Err(EngineError::NonFiniteSignal { index });
        }
        if let Some(id) = participant_id {
            if !self.sequencer.is_registered(id) {
                return Err(EngineError::UnknownParticipant(id.to_string()));
            }
        }
        Ok(())
    }

    fn notify(
        &self,
        participant_id: Option<&str>,
        admitted: bool,
        anchor_ref: &str,
        anchor_valid: bool,
    ) -> Result<Option<ParticipantEffect>> {
        match participant_id {
            Some(id) => self
                .sequencer
                .on_verdict(id, admitted, Some(anchor_ref), anchor_valid)
                .map(Some),
            None => Ok(None),
        }
    }
}
