//! Hashing utilities for the admission engine
//!
//! Provides:
//! - SHA-256 / SHA-512 hex digests and epoch id derivation
//! - Causal anchor chain binding each submission to its predecessor
//! - Chain verification over committed ledger records

pub mod anchor;
pub mod digest;

pub use anchor::{AnchorHead, AnchorRecord, CausalAnchorChain, GENESIS_HASH, SyncState, verify_chain};
pub use digest::{epoch_id, random_token, sha256_hex, sha512_hex};
