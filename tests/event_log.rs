//! Tests for the pluggable EventSink / forward sink functionality.

use std::sync::{Arc, Mutex};

use keystack::audit::{EventRecord, EventSink, HierarchyOp};
use keystack::KeyHierarchy;

/// A test sink that collects records into a shared Vec.
struct SharedVecSink {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl SharedVecSink {
    fn new(records: Arc<Mutex<Vec<EventRecord>>>) -> Self {
        Self { records }
    }
}

impl EventSink for SharedVecSink {
    fn append(&mut self, record: EventRecord) {
        self.records.lock().unwrap().push(record);
    }
}

#[test]
fn test_forward_sink_receives_records() {
    let mut hierarchy = KeyHierarchy::new();

    let records = Arc::new(Mutex::new(Vec::new()));
    hierarchy.add_event_sink(Box::new(SharedVecSink::new(Arc::clone(&records))));

    let h0 = hierarchy.derive_stage0(b"fp").unwrap();
    let h1 = hierarchy.derive_stage1(&h0, b"pw").unwrap();
    let _key = hierarchy.retrieve(&h1).unwrap();
    hierarchy.release_all(&h1);

    // Primary log has all four records.
    assert_eq!(hierarchy.event_log().len(), 4);

    // Forward sink received the same sequence.
    let collected = records.lock().unwrap();
    let ops: Vec<HierarchyOp> = collected.iter().map(|r| r.op).collect();
    assert_eq!(
        ops,
        [
            HierarchyOp::Stage0Derived,
            HierarchyOp::Stage1Derived,
            HierarchyOp::Retrieved,
            HierarchyOp::Released,
        ]
    );
}

#[test]
fn test_failures_produce_no_records() {
    let mut hierarchy = KeyHierarchy::new();

    let forged = keystack::Sk0Handle::from_raw(1);
    assert!(hierarchy.derive_stage1(&forged, b"pw").is_err());
    assert!(hierarchy.event_log().is_empty());
}

#[test]
fn test_records_serialize_without_secrets() {
    let mut hierarchy = KeyHierarchy::new();
    let h0 = hierarchy.derive_stage0(b"very-secret-fingerprint").unwrap();
    hierarchy.derive_stage1(&h0, b"very-secret-password").unwrap();

    for record in hierarchy.event_log().iter() {
        let json = serde_json::to_string(record).unwrap();
        // Records carry the operation and timestamp only.
        assert!(!json.contains("secret"));
    }
}
