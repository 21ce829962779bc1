//! Participant Records
//!
//! Stake starts at 0 and grows through weighted staking. Every change to it
//! leaves a [`StakeEvent`] in the participant's audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reputation of a participant with no offences
pub const MAX_REPUTATION: f64 = 100.0;

/// Reputation lost per recorded offence
pub const REPUTATION_PER_OFFENCE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeEventKind {
    Stake,
    Slash,
}

/// One entry of the stake audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeEvent {
    pub kind: StakeEventKind,
    pub previous_stake: f64,
    /// Signed change applied to the stake (negative for slashes)
    pub delta: f64,
    /// Staking weight, or the effective penalty factor for slashes
    pub weight: f64,
    pub anchor_ref: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub stake: f64,
    pub stake_history: Vec<StakeEvent>,
    pub malicious_count: u32,
    pub reputation: f64,
    pub successful_submissions: u64,

    /// Position in registration order (ties in rankings resolve on this)
    pub registration_seq: u64,
    pub registered_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(id: String, registration_seq: u64, registered_at: DateTime<Utc>) -> Self {
        Self {
            id,
            stake: 0.0,
            stake_history: Vec::new(),
            malicious_count: 0,
            reputation: MAX_REPUTATION,
            successful_submissions: 0,
            registration_seq,
            registered_at,
        }
    }

    /// Reputation implied by an offence count, floored at 0
    pub fn reputation_for(malicious_count: u32) -> f64 {
        (MAX_REPUTATION - REPUTATION_PER_OFFENCE * malicious_count as f64).max(0.0)
    }

    /// Apply a stake increment of `amount * weight` and record it
    pub fn add_stake(
        &mut self,
        amount: f64,
        weight: f64,
        anchor_ref: Option<String>,
        at: DateTime<Utc>,
    ) -> StakeEvent {
        let delta = amount * weight;
        let event = StakeEvent {
            kind: StakeEventKind::Stake,
            previous_stake: self.stake,
            delta,
            weight,
            anchor_ref,
            recorded_at: at,
        };
        self.stake += delta;
        self.stake_history.push(event.clone());
        event
    }

    /// Cut the stake by `penalty` (a fraction), count the offence and
    /// recompute reputation
    pub fn apply_slash(
        &mut self,
        penalty: f64,
        anchor_ref: Option<String>,
        at: DateTime<Utc>,
    ) -> StakeEvent {
        let previous_stake = self.stake;
        let reduced = (previous_stake - previous_stake * penalty).max(0.0);
        let event = StakeEvent {
            kind: StakeEventKind::Slash,
            previous_stake,
            delta: reduced - previous_stake,
            weight: penalty,
            anchor_ref,
            recorded_at: at,
        };
        self.stake = reduced;
        self.stake_history.push(event.clone());
        self.malicious_count += 1;
        self.reputation = Self::reputation_for(self.malicious_count);
        event
    }
}
