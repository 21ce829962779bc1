//! Background adversarial probing
//!
//! The probe agent is gated by an external feature-flag provider and runs
//! as a cancellable tokio task that must be joined before shutdown.

mod agent;
mod flags;

pub use agent::{
    PROBE_LOG_CAPACITY, ProbeAgent, ProbeConfig, ProbeHandle, ProbeLogEntry, ProbeReport,
    ProbeResult,
};
pub use flags::{FeatureFlags, PROBE_FLAG, StaticFeatureFlags};
