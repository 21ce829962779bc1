//! Append-only transaction ledger
//!
//! Committed epochs are persisted as JSON lines:
//!
//! ```text
//! {"epoch":"<sha256 hex>","status":"COMMITTED","timestamp":"<rfc3339>","anchor":"<sha512 hex>","previousHash":"<sha512 hex>"}
//! ```
//!
//! Readers treat the file as append-only and skip a truncated final line.

mod record;
mod store;

pub use record::{TransactionRecord, TransactionStatus};
pub use store::{JsonLinesLedger, LedgerStore, MemoryLedger, read_records};
