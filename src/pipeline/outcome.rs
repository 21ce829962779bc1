use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::{AnchorHead, AnchorRecord};
use crate::gate::{AdmissibilityReason, GateState};
use crate::ledger::TransactionRecord;
use crate::reputation::ParticipantEffect;

/// Why a submission was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    GateClosed,
    ExposedCredentials,
    AnchorViolation,
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::GateClosed => "GATE_CLOSED",
            RejectReason::ExposedCredentials => "EXPOSED_CREDENTIALS",
            RejectReason::AnchorViolation => "ANCHOR_VIOLATION",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<AdmissibilityReason> for RejectReason {
    fn from(reason: AdmissibilityReason) -> Self {
        match reason {
            AdmissibilityReason::ExposedCredentials => RejectReason::ExposedCredentials,
            // An admissible payload never produces a rejection on its own
            AdmissibilityReason::VerifiedAdmissible => RejectReason::GateClosed,
        }
    }
}

/// Pipeline state captured just before an admission mutated it
#[derive(Debug, Clone, PartialEq)]
pub struct RollbackPoint {
    pub head: AnchorHead,
    pub gate: GateState,
}

/// Whether an admitted record reached the ledger
#[derive(Debug, Clone, PartialEq)]
pub enum Persistence {
    Durable,
    /// The record was lost. Anchor head and gate have already advanced;
    /// pass `rollback` to `AdmissionPipeline::rollback` to undo them.
    Failed {
        error: String,
        rollback: RollbackPoint,
    },
}

impl Persistence {
    pub fn is_durable(&self) -> bool {
        matches!(self, Persistence::Durable)
    }
}

#[derive(Debug, Clone)]
pub struct Admission {
    pub potential: f64,
    pub anchor: AnchorRecord,
    pub record: TransactionRecord,
    pub persistence: Persistence,
    pub effect: Option<ParticipantEffect>,
}

#[derive(Debug, Clone)]
pub struct Rejection {
    pub reason: RejectReason,
    pub potential: f64,
    pub anchor: AnchorRecord,
    pub effect: Option<ParticipantEffect>,
}

/// Terminal result of one submission
#[derive(Debug, Clone)]
pub enum Outcome {
    Admitted(Admission),
    Rejected(Rejection),
}

impl Outcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Outcome::Admitted(_))
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Outcome::Admitted(_) => None,
            Outcome::Rejected(r) => Some(r.reason),
        }
    }

    pub fn potential(&self) -> f64 {
        match self {
            Outcome::Admitted(a) => a.potential,
            Outcome::Rejected(r) => r.potential,
        }
    }

    pub fn anchor(&self) -> &AnchorRecord {
        match self {
            Outcome::Admitted(a) => &a.anchor,
            Outcome::Rejected(r) => &r.anchor,
        }
    }

    pub fn effect(&self) -> Option<&ParticipantEffect> {
        match self {
            Outcome::Admitted(a) => a.effect.as_ref(),
            Outcome::Rejected(r) => r.effect.as_ref(),
        }
    }

    pub fn record(&self) -> Option<&TransactionRecord> {
        match self {
            Outcome::Admitted(a) => Some(&a.record),
            Outcome::Rejected(_) => None,
        }
    }
}
