use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::AnchorRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    #[serde(rename = "COMMITTED")]
    Committed,
}

/// One committed epoch. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(rename = "epoch", alias = "epochId")]
    pub epoch_id: String,
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
    /// Hash of the anchor this record committed
    pub anchor: String,
    pub previous_hash: String,
}

impl TransactionRecord {
    pub fn committed(epoch_id: String, anchor: &AnchorRecord, timestamp: DateTime<Utc>) -> Self {
        Self {
            epoch_id,
            status: TransactionStatus::Committed,
            timestamp,
            anchor: anchor.hash.clone(),
            previous_hash: anchor.previous_hash.clone(),
        }
    }
}
