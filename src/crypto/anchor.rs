//! Causal Anchor Chain
//!
//! Every submission is bound to the previously committed anchor and a
//! timestamp through a SHA-512 digest. The chain head only moves when the
//! pipeline commits a record, so the accepted history is a single linked
//! list with no branches.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::clock::Clock;
use crate::crypto::digest::sha512_hex;
use crate::error::{EngineError, Result};
use crate::ledger::TransactionRecord;

/// Previous-hash sentinel of the first record in a chain
pub const GENESIS_HASH: &str =
    "00000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000";

/// Hash-linked causal marker for one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRecord {
    pub hash: String,
    pub previous_hash: String,
    pub timestamp: u64,
    /// False when the submission would break causal order
    pub integrity_valid: bool,
}

/// Tip of the committed chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorHead {
    pub hash: String,
    pub timestamp: u64,
}

impl AnchorHead {
    pub fn genesis() -> Self {
        Self {
            hash: GENESIS_HASH.to_string(),
            timestamp: 0,
        }
    }
}

/// Result of checking an external system against an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncState {
    Synchronized,
}

pub struct CausalAnchorChain {
    clock: Arc<dyn Clock>,
    head: AnchorHead,
}

impl CausalAnchorChain {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            head: AnchorHead::genesis(),
        }
    }

    /// Resume from an existing head, e.g. the last record of a ledger
    pub fn resume(clock: Arc<dyn Clock>, head: AnchorHead) -> Self {
        Self { clock, head }
    }

    pub fn head(&self) -> &AnchorHead {
        &self.head
    }

    /// Produce the anchor for `signals` on top of `previous_hash`.
    ///
    /// The record is flagged invalid when `previous_hash` is not the current
    /// head or when the clock reads earlier than the head's timestamp. The
    /// head itself is untouched; see [`CausalAnchorChain::commit`].
    pub fn advance(&self, signals: &[f64], previous_hash: &str) -> AnchorRecord {
        let timestamp = self.clock.now_nanos();
        let serialized = serde_json::to_string(signals).unwrap_or_default();
        let hash = sha512_hex(format!("{}{}{}", serialized, previous_hash, timestamp).as_bytes());

        let linked = previous_hash == self.head.hash;
        let causal = timestamp >= self.head.timestamp;
        if !linked || !causal {
            warn!(
                head = %self.head.hash,
                previous_hash = %previous_hash,
                timestamp,
                head_timestamp = self.head.timestamp,
                "Anchor integrity check failed"
            );
        }

        AnchorRecord {
            hash,
            previous_hash: previous_hash.to_string(),
            timestamp,
            integrity_valid: linked && causal,
        }
    }

    /// Move the head onto an accepted record
    pub fn commit(&mut self, record: &AnchorRecord) {
        self.head = AnchorHead {
            hash: record.hash.clone(),
            timestamp: record.timestamp,
        };
    }

    /// Force the head back to an earlier position (caller-driven rollback)
    pub fn rewind(&mut self, head: AnchorHead) {
        self.head = head;
    }

    /// Compare an externally reported state hash with an anchor
    pub fn validate_external(&self, external_hash: &str, record: &AnchorRecord) -> Result<SyncState> {
        if external_hash == record.hash {
            Ok(SyncState::Synchronized)
        } else {
            Err(EngineError::AnchorDrift {
                expected: record.hash.clone(),
                found: external_hash.to_string(),
            })
        }
    }
}

/// Check that committed records form one chain rooted at the genesis sentinel
pub fn verify_chain(records: &[TransactionRecord]) -> Result<()> {
    let mut expected = GENESIS_HASH;
    for (index, record) in records.iter().enumerate() {
        if record.previous_hash != expected {
            return Err(EngineError::ChainBroken {
                index,
                expected: expected.to_string(),
                found: record.previous_hash.clone(),
            });
        }
        expected = &record.anchor;
    }
    Ok(())
}
