//! Engine fault taxonomy
//!
//! Only contract violations and I/O problems are faults. Gate closure,
//! inadmissible payloads and anchor violations are ordinary outcomes and
//! are reported through [`crate::pipeline::Outcome`] instead.

use thiserror::Error;

/// Errors raised by the admission pipeline, ledger and sequencer.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Signal vector length differs from the gate dimension.
    #[error("signal dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Signal vector contains NaN or an infinity.
    #[error("signal component {index} is not a finite number")]
    NonFiniteSignal { index: usize },

    /// Sequencer operation referenced an id that was never registered.
    #[error("unknown participant: {0}")]
    UnknownParticipant(String),

    /// Stake increment would be negative or not finite.
    #[error("invalid stake: amount {amount} with weight {weight}")]
    InvalidStake { amount: f64, weight: f64 },

    /// Ledger write or read failed at the I/O level.
    #[error("ledger persistence failure: {0}")]
    Persistence(String),

    /// A complete ledger line could not be decoded.
    #[error("ledger corrupted at line {line}: {reason}")]
    LedgerCorrupted { line: usize, reason: String },

    /// Two consecutive records are not hash-linked.
    #[error("anchor chain broken at record {index}: expected previous {expected}, found {found}")]
    ChainBroken {
        index: usize,
        expected: String,
        found: String,
    },

    /// An externally supplied state hash does not match the anchor.
    #[error("external state drifted from anchor: expected {expected}, found {found}")]
    AnchorDrift { expected: String, found: String },
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Persistence(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
