//! Admission pipeline
//!
//! ```text
//! submit(signals, payload, participant?)
//!   │
//!   ├─ RECEIVED ........ dimension / finiteness / participant checks
//!   ├─ SCORED .......... ThresholdGate::score
//!   ├─ ANCHOR-ADVANCED . CausalAnchorChain::advance
//!   ├─ ADMITTED ........ head ← anchor, Ledger::append, gate.adjust(true)
//!   └─ REJECTED ........ gate.adjust(false)
//!   │
//!   └─ ReputationSequencer::on_verdict (when a participant was given)
//! ```

mod admission;
mod outcome;

pub use admission::AdmissionPipeline;
pub use outcome::{Admission, Outcome, Persistence, RejectReason, Rejection, RollbackPoint};
