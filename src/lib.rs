//! Nexus Admission Engine
//!
//! Admission-gated transaction engine: every submission is scored by an
//! adaptive threshold gate, screened for exposed credentials, bound to its
//! predecessor by a causal anchor and, when admitted, appended to an
//! append-only ledger. Participants stake against their submissions and are
//! slashed on rejection.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Reference run (submissions, probe, health check)
//! ├── config.rs      - Environment configuration
//! ├── context.rs     - Wiring of pipeline, ledger and sequencer
//! ├── error.rs       - Engine error type
//! ├── clock.rs       - Injectable time sources
//! ├── health.rs      - Two-step health check
//! ├── crypto/        - Digests and the causal anchor chain
//! │   ├── digest.rs  - SHA-256 / SHA-512, epoch ids
//! │   └── anchor.rs  - Anchor records, head, chain verification
//! ├── gate/          - Admission gates
//! │   ├── threshold.rs     - Adaptive linear threshold gate
//! │   └── admissibility.rs - Disallowed-marker payload filter
//! ├── ledger/        - Append-only JSON-lines ledger
//! ├── pipeline/      - Submission state machine and outcomes
//! ├── reputation/    - Stake, slashing & reputation ranking
//! └── probe/         - Feature-flagged adversarial probe agent
//! ```

pub mod clock;
pub mod config;
pub mod context;
pub mod crypto;
pub mod error;
pub mod gate;
pub mod health;
pub mod ledger;
pub mod pipeline;
pub mod probe;
pub mod reputation;

// Re-export main types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use context::EngineContext;
pub use crypto::{AnchorHead, AnchorRecord, CausalAnchorChain, GENESIS_HASH, SyncState, verify_chain};
pub use error::{EngineError, Result};
pub use gate::{AdmissibilityFilter, AdmissibilityVerdict, GateState, ThresholdGate};
pub use health::{HealthReport, run_health_check};
pub use ledger::{JsonLinesLedger, LedgerStore, MemoryLedger, TransactionRecord, read_records};
pub use pipeline::{AdmissionPipeline, Outcome, Persistence, RejectReason, RollbackPoint};
pub use probe::{FeatureFlags, ProbeAgent, ProbeConfig, ProbeHandle, ProbeReport, StaticFeatureFlags};
pub use reputation::{Participant, ParticipantEffect, ReputationSequencer, SlashPolicy};
