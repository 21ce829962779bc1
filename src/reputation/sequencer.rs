//! Reputation Sequencer - Stake & Slashing Orchestrator
//!
//! Owns every participant's stake, audit trail, offence count and
//! reputation. Participants live in a sharded concurrent map: mutations of
//! one participant are serialized through its entry, different participants
//! can be updated in parallel.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{EngineError, Result};
use crate::reputation::{Participant, SlashPolicy, StakeEvent};

/// Maximum number of ids returned by [`ReputationSequencer::compete`]
pub const COMPETE_LIMIT: usize = 3;

/// What a pipeline verdict did to the submitting participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantEffect {
    Credited,
    Slashed(StakeEvent),
}

pub struct ReputationSequencer {
    policy: SlashPolicy,
    clock: Arc<dyn Clock>,
    participants: DashMap<String, Participant>,
    next_seq: AtomicU64,
}

impl ReputationSequencer {
    pub fn new(policy: SlashPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock::new()))
    }

    /// Sequencer whose audit trail is stamped by `clock`
    pub fn with_clock(policy: SlashPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            participants: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> &SlashPolicy {
        &self.policy
    }

    /// Register a participant. Returns false if it already existed.
    pub fn register(&self, participant_id: &str) -> bool {
        match self.participants.entry(participant_id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, AtomicOrdering::SeqCst);
                slot.insert(Participant::new(
                    participant_id.to_string(),
                    seq,
                    self.clock.now_utc(),
                ));
                info!(participant = %participant_id, seq, "Registered participant");
                true
            }
        }
    }

    pub fn is_registered(&self, participant_id: &str) -> bool {
        self.participants.contains_key(participant_id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Stake `amount` at weight 1 with no anchor reference
    pub fn stake(&self, participant_id: &str, amount: f64) -> Result<f64> {
        self.stake_weighted(participant_id, amount, 1.0, None)
    }

    /// Increase stake by `amount * weight`, returning the new stake
    pub fn stake_weighted(
        &self,
        participant_id: &str,
        amount: f64,
        weight: f64,
        anchor_ref: Option<&str>,
    ) -> Result<f64> {
        let delta = amount * weight;
        if !delta.is_finite() || delta < 0.0 {
            return Err(EngineError::InvalidStake { amount, weight });
        }

        let mut participant = self
            .participants
            .get_mut(participant_id)
            .ok_or_else(|| EngineError::UnknownParticipant(participant_id.to_string()))?;

        participant.add_stake(
            amount,
            weight,
            anchor_ref.map(str::to_string),
            self.clock.now_utc(),
        );

        debug!(
            participant = %participant_id,
            amount,
            weight,
            stake = participant.stake,
            "Stake added"
        );

        Ok(participant.stake)
    }

    /// Slash a participant for a rejected or invalid submission
    pub fn slash(
        &self,
        participant_id: &str,
        anchor_ref: Option<&str>,
        anchor_valid: bool,
    ) -> Result<StakeEvent> {
        let penalty = self.policy.penalty(anchor_valid);

        let mut participant = self
            .participants
            .get_mut(participant_id)
            .ok_or_else(|| EngineError::UnknownParticipant(participant_id.to_string()))?;

        let event =
            participant.apply_slash(penalty, anchor_ref.map(str::to_string), self.clock.now_utc());

        warn!(
            participant = %participant_id,
            penalty,
            anchor_valid,
            stake = participant.stake,
            malicious_count = participant.malicious_count,
            reputation = participant.reputation,
            "Applying slash to participant"
        );

        Ok(event)
    }

    /// Count an admitted submission; stake and reputation are unchanged
    pub fn record_success(&self, participant_id: &str) -> Result<()> {
        let mut participant = self
            .participants
            .get_mut(participant_id)
            .ok_or_else(|| EngineError::UnknownParticipant(participant_id.to_string()))?;

        participant.successful_submissions += 1;
        debug!(
            participant = %participant_id,
            successes = participant.successful_submissions,
            "Recorded successful submission"
        );
        Ok(())
    }

    /// React to a pipeline verdict: credit on admission, slash otherwise
    pub fn on_verdict(
        &self,
        participant_id: &str,
        admitted: bool,
        anchor_ref: Option<&str>,
        anchor_valid: bool,
    ) -> Result<ParticipantEffect> {
        if admitted {
            self.record_success(participant_id)?;
            Ok(ParticipantEffect::Credited)
        } else {
            let event = self.slash(participant_id, anchor_ref, anchor_valid)?;
            Ok(ParticipantEffect::Slashed(event))
        }
    }

    /// Up to three ids by descending reputation; ties keep registration order
    pub fn compete(&self) -> Vec<String> {
        let mut ranked: Vec<(f64, u64, String)> = self
            .participants
            .iter()
            .map(|entry| {
                let p = entry.value();
                (p.reputation, p.registration_seq, p.id.clone())
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        ranked
            .into_iter()
            .take(COMPETE_LIMIT)
            .map(|(_, _, id)| id)
            .collect()
    }

    /// Full stake audit trail in insertion order
    pub fn history(&self, participant_id: &str) -> Result<Vec<StakeEvent>> {
        self.participants
            .get(participant_id)
            .map(|p| p.stake_history.clone())
            .ok_or_else(|| EngineError::UnknownParticipant(participant_id.to_string()))
    }

    /// Snapshot of a participant
    pub fn participant(&self, participant_id: &str) -> Option<Participant> {
        self.participants
            .get(participant_id)
            .map(|p| p.value().clone())
    }
}

impl Default for ReputationSequencer {
    fn default() -> Self {
        Self::new(SlashPolicy::default())
    }
}
