//! Admission gates
//!
//! Two independent checks decide whether a submission may commit:
//!
//! ```text
//! signals ──► ThresholdGate ──► potential >= threshold ?
//! payload ──► AdmissibilityFilter ──► no disallowed marker ?
//! ```

mod admissibility;
mod threshold;

pub use admissibility::{
    AdmissibilityFilter, AdmissibilityReason, AdmissibilityVerdict, DEFAULT_DISALLOWED_MARKER,
    DEFAULT_JURISDICTION,
};
pub use threshold::{
    DEFAULT_DIMENSION, DEFAULT_LEARNING_RATE, DEFAULT_THRESHOLD, GateState, SignalVector,
    ThresholdGate,
};
