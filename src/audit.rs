//! Lifecycle event logging.
//!
//! Records every successful hierarchy operation. The log is append-only and
//! never contains key material or caller inputs, only which operation ran
//! and when. Supports pluggable sinks for forwarding records to files etc.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The hierarchy operations that produce a lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HierarchyOp {
    /// SK0 was derived (or re-derived) from a fingerprint.
    Stage0Derived,
    /// SK1 was derived from SK0 and a user secret.
    Stage1Derived,
    /// The current SK1 bytes were copied out to a caller.
    Retrieved,
    /// Both secrets were zeroized and the chain reset.
    Released,
}

/// A sink that receives lifecycle events. Implement this to forward records
/// to a file, database, or other persistent store.
pub trait EventSink: Send {
    /// Append a record. Called for every successful hierarchy operation.
    fn append(&mut self, record: EventRecord);
}

/// A permanent record of one hierarchy operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Which operation ran.
    pub op: HierarchyOp,
    /// When it ran.
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    pub(crate) fn now(op: HierarchyOp) -> Self {
        Self {
            op,
            timestamp: Utc::now(),
        }
    }
}

/// An append-only log of all lifecycle events.
/// Can forward records to additional sinks via `add_forward_sink`.
#[derive(Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
    forward_sinks: Vec<Box<dyn EventSink>>,
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("records", &self.records)
            .field("forward_sinks", &self.forward_sinks.len())
            .finish()
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink to receive a copy of every record. Useful for persisting
    /// to a file or other store without replacing the in-memory log.
    pub fn add_forward_sink(&mut self, sink: Box<dyn EventSink>) {
        self.forward_sinks.push(sink);
    }

    /// Append a new record to the log and forward to any attached sinks.
    pub(crate) fn append(&mut self, record: EventRecord) {
        for sink in self.forward_sinks.iter_mut() {
            sink.append(record.clone());
        }
        self.records.push(record);
    }

    /// Return the number of records in the log.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, EventRecord> {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// Built-in sink: file
// ---------------------------------------------------------------------------

/// Writes lifecycle events as JSON lines (one per record) to a file.
/// Creates the file if it doesn't exist; appends if it does.
pub struct FileEventSink {
    file: std::fs::File,
}

impl FileEventSink {
    /// Open or create a file for append-only event logging.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }
}

impl EventSink for FileEventSink {
    fn append(&mut self, record: EventRecord) {
        if let Ok(line) = serde_json::to_string(&record) {
            let _ = writeln!(self.file, "{line}");
            let _ = self.file.flush();
        }
    }
}
