//! Stake, Slashing & Reputation
//!
//! Tracks each participant's at-risk stake and derives a reputation score
//! from the number of offences recorded against it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────────┐     ┌─────────────────┐
//! │ Participant     │────►│ ReputationSequencer │◄────│ SlashPolicy     │
//! │ (stake, trail)  │     │ (orchestrator)      │     │ (penalties)     │
//! └─────────────────┘     └─────────────────────┘     └─────────────────┘
//!                                  ▲
//!                                  │ on_verdict
//!                         ┌────────┴─────────┐
//!                         │ AdmissionPipeline│
//!                         └──────────────────┘
//! ```
//!
//! ## Score Model
//!
//! - Reputation starts at 100 and is `max(0, 100 - 10 × offences)`
//! - A slash removes half the stake (75% when the anchor was invalid)
//! - Stake never drops below 0
//! - `compete()` ranks by reputation, ties resolved by registration order

mod participant;
mod sequencer;
mod slash;

pub use participant::{
    MAX_REPUTATION, Participant, REPUTATION_PER_OFFENCE, StakeEvent, StakeEventKind,
};
pub use sequencer::{COMPETE_LIMIT, ParticipantEffect, ReputationSequencer};
pub use slash::SlashPolicy;
