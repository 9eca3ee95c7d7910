//! Negative tests: wrong, stale, and premature handles are always rejected.

use keystack::{KeyHierarchy, KeystackError, Sk0Handle, Sk1Handle, KEY_LEN};

#[test]
fn test_stage1_before_stage0_fails() {
    let mut h = KeyHierarchy::new();
    let forged = Sk0Handle::from_raw(1);
    assert_eq!(h.derive_stage1(&forged, b"pw"), Err(KeystackError::NotReady));
}

#[test]
fn test_stage1_rejects_wrong_handle_value() {
    let mut h = KeyHierarchy::new();
    h.derive_stage0(b"fp").unwrap();

    let wrong = Sk0Handle::from_raw(2);
    assert_eq!(
        h.derive_stage1(&wrong, b"pw"),
        Err(KeystackError::InvalidHandle)
    );

    // The failed call must not have produced a retrievable SK1.
    let sk1 = Sk1Handle::from_raw(1);
    assert_eq!(h.retrieve(&sk1), Err(KeystackError::NotReady));
}

#[test]
fn test_retrieve_before_stage1_fails() {
    let mut h = KeyHierarchy::new();
    h.derive_stage0(b"fp").unwrap();

    let premature = Sk1Handle::from_raw(1);
    assert_eq!(h.retrieve(&premature), Err(KeystackError::NotReady));
}

#[test]
fn test_retrieve_rejects_wrong_handle_value() {
    let mut h = KeyHierarchy::new();
    let h0 = h.derive_stage0(b"fp").unwrap();
    h.derive_stage1(&h0, b"pw").unwrap();

    let wrong = Sk1Handle::from_raw(0);
    assert_eq!(h.retrieve(&wrong), Err(KeystackError::InvalidHandle));
}

#[test]
fn test_failed_retrieve_leaves_buffer_untouched() {
    let mut h = KeyHierarchy::new();
    h.derive_stage0(b"fp").unwrap();

    let canary = [0xAAu8; KEY_LEN];
    let mut out = canary;

    let premature = Sk1Handle::from_raw(1);
    assert!(h.retrieve_into(&premature, &mut out).is_err());
    assert_eq!(out, canary);

    let wrong = Sk1Handle::from_raw(9);
    assert!(h.retrieve_into(&wrong, &mut out).is_err());
    assert_eq!(out, canary);
}

#[test]
fn test_release_with_wrong_handle_is_noop() {
    let mut h = KeyHierarchy::new();
    let h0 = h.derive_stage0(b"fp").unwrap();
    let h1 = h.derive_stage1(&h0, b"pw").unwrap();

    // A wrong sentinel must not wipe the live chain.
    h.release_all(&Sk1Handle::from_raw(3));
    assert!(h.retrieve(&h1).is_ok());
}

#[test]
fn test_failed_stage1_leaves_valid_sk1_intact() {
    let mut h = KeyHierarchy::new();
    let h0 = h.derive_stage0(b"fp").unwrap();
    let h1 = h.derive_stage1(&h0, b"pw").unwrap();
    let before = h.retrieve(&h1).unwrap();

    let wrong = Sk0Handle::from_raw(2);
    assert!(h.derive_stage1(&wrong, b"other").is_err());

    // SK1 must be exactly what it was before the rejected call.
    assert_eq!(h.retrieve(&h1).unwrap(), before);
}
