//! Append-only ledger stores
//!
//! [`JsonLinesLedger`] writes one JSON object per line to a file opened in
//! append mode. Each record goes out in a single `write_all` under the
//! store's lock so concurrent writers never interleave bytes. A write that
//! fails partway is cut back off the file; if that is not possible the
//! next append starts with a newline so the fragment stays on its own line.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::ledger::TransactionRecord;

/// Storage backend for committed records. No update or delete exists.
pub trait LedgerStore: Send + Sync {
    fn append(&self, record: &TransactionRecord) -> Result<()>;

    /// Number of records committed so far
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All committed records in append order
    fn records(&self) -> Result<Vec<TransactionRecord>>;
}

struct FileState {
    file: File,
    len: usize,
    last: Option<TransactionRecord>,
    /// File ends in a fragment that still needs a sealing newline
    torn: bool,
}

impl FileState {
    fn write_line(&mut self, line: &[u8]) -> std::io::Result<()> {
        self.file.write_all(line)?;
        self.file.flush()
    }

    /// Drop whatever a failed write left past `start`
    fn discard_tail(&mut self, start: u64) {
        if let Err(e) = self.file.set_len(start) {
            warn!(error = %e, "Could not truncate partial ledger write; sealing on next append");
            self.torn = true;
        }
    }
}

pub struct JsonLinesLedger {
    path: PathBuf,
    sync_on_append: bool,
    state: Mutex<FileState>,
}

impl JsonLinesLedger {
    /// Open (or create) the ledger file, counting the records already in it.
    ///
    /// A fragment left by a crashed writer is sealed with a newline so the
    /// next record starts on its own line.
    pub fn open(path: impl AsRef<Path>, sync_on_append: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let existing = if path.exists() {
            read_records(&path)?
        } else {
            Vec::new()
        };

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        if ends_with_fragment(&mut file)? {
            warn!(path = %path.display(), "Sealing partial trailing ledger line");
            file.write_all(b"\n")?;
        }

        info!(
            path = %path.display(),
            records = existing.len(),
            "Opened ledger"
        );

        Ok(Self {
            path,
            sync_on_append,
            state: Mutex::new(FileState {
                file,
                len: existing.len(),
                last: existing.last().cloned(),
                torn: false,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Most recently committed record, if any
    pub fn last_record(&self) -> Option<TransactionRecord> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last
            .clone()
    }
}

fn ends_with_fragment(file: &mut File) -> Result<bool> {
    let size = file.metadata()?.len();
    if size == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::Start(size - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

impl LedgerStore for JsonLinesLedger {
    fn append(&self, record: &TransactionRecord) -> Result<()> {
        let encoded = serde_json::to_string(record)
            .map_err(|e| EngineError::Persistence(format!("encode failed: {}", e)))?;

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut line = String::with_capacity(encoded.len() + 2);
        if state.torn {
            line.push('\n');
        }
        line.push_str(&encoded);
        line.push('\n');

        let start = state.file.metadata()?.len();
        if let Err(e) = state.write_line(line.as_bytes()) {
            state.discard_tail(start);
            return Err(e.into());
        }
        state.torn = false;

        if self.sync_on_append {
            state.file.sync_data()?;
        }
        state.len += 1;
        state.last = Some(record.clone());

        debug!(epoch = %record.epoch_id, len = state.len, "Ledger append");
        Ok(())
    }

    fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).len
    }

    fn records(&self) -> Result<Vec<TransactionRecord>> {
        let _guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        read_records(&self.path)
    }
}

/// Read every complete record from a JSON-lines ledger file.
///
/// Lines cut short by a crashed writer (the decoder runs out of input) are
/// skipped. Any other undecodable line is reported as corruption.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<TransactionRecord>> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<TransactionRecord>(trimmed) {
            Ok(record) => records.push(record),
            Err(e) if e.is_eof() => {
                warn!(line = index + 1, "Skipping truncated ledger line");
            }
            Err(e) => {
                return Err(EngineError::LedgerCorrupted {
                    line: index + 1,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(records)
}

/// Volatile store for tests and embedding
#[derive(Default)]
pub struct MemoryLedger {
    records: Mutex<Vec<TransactionRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryLedger {
    fn append(&self, record: &TransactionRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn records(&self) -> Result<Vec<TransactionRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
