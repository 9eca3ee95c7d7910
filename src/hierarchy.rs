//! The two-stage key hierarchy.
//!
//! This module owns the crate's secret state: SK0 and SK1, two 32-byte
//! secrets with validity flags, held in types that are opaque, non-cloneable,
//! and zeroised on drop.
//!
//! ## Derivation structure
//!
//! ```text
//! SK0 = HKDF-SHA256(salt = STAGE0_SALT, ikm = fingerprint, info = STAGE0_INFO)
//! s1  = HMAC-SHA256(key = SK0, msg = user_secret)
//! SK1 = HKDF-SHA256(salt = s1, ikm = SK0, info = STAGE1_INFO)
//! ```
//!
//! SK0 never leaves the hierarchy; it exists only to feed the stage-1
//! derivation. SK1 is the single exported secret, and only through
//! [`KeyHierarchy::retrieve`] against a valid [`Sk1Handle`].
//!
//! ## One chain per hierarchy
//!
//! A hierarchy holds exactly one live SK0 and one live SK1. Re-running
//! stage 0 replaces SK0 and invalidates any SK1 derived from the old SK0,
//! so a stale working key can never be served after its parent changed.

use std::sync::Mutex;

use zeroize::Zeroize;

use crate::audit::{EventLog, EventRecord, EventSink, HierarchyOp};
use crate::error::KeystackError;
use crate::handle::{KeyHandle, Sk0Handle, Sk1Handle, RAW_HANDLE};
use crate::kdf::{self, KEY_LEN};

/// A two-stage key derivation chain with handle-guarded access.
///
/// All methods take `&mut self`: exclusive ownership is the serialization
/// mechanism. For cross-thread use wrap the hierarchy in [`SharedHierarchy`],
/// which guards every operation with one lock.
pub struct KeyHierarchy {
    sk0: [u8; KEY_LEN],
    sk1: [u8; KEY_LEN],
    sk0_set: bool,
    sk1_set: bool,
    events: EventLog,
}

impl KeyHierarchy {
    /// Create an empty hierarchy. No secret is valid until
    /// [`derive_stage0`](Self::derive_stage0) succeeds.
    pub fn new() -> Self {
        Self {
            sk0: [0u8; KEY_LEN],
            sk1: [0u8; KEY_LEN],
            sk0_set: false,
            sk1_set: false,
            events: EventLog::new(),
        }
    }

    /// Derive SK0 from a device fingerprint.
    ///
    /// Any byte sequence is accepted, including empty (a weak but
    /// well-defined KDF input). A repeated call overwrites the previous SK0
    /// and invalidates any SK1 derived from it: serving a working key whose
    /// parent has been replaced would silently bind the caller to the wrong
    /// chain.
    ///
    /// On failure the hierarchy is left exactly as it was.
    pub fn derive_stage0(&mut self, fingerprint: &[u8]) -> Result<Sk0Handle, KeystackError> {
        let derived = kdf::hkdf_sha256(kdf::STAGE0_SALT, fingerprint, kdf::STAGE0_INFO)?;

        if self.sk1_set {
            self.sk1.zeroize();
            self.sk1_set = false;
        }
        self.sk0 = derived;
        self.sk0_set = true;

        self.events.append(EventRecord::now(HierarchyOp::Stage0Derived));
        Ok(Sk0Handle::current())
    }

    /// Derive SK1 from the current SK0 and a user secret.
    ///
    /// The user secret is first folded into a 32-byte salt with HMAC-SHA256
    /// keyed by SK0, then SK0 itself is stretched under that salt. Both the
    /// fingerprint chain and the user secret therefore contribute to SK1.
    ///
    /// Fails with [`KeystackError::InvalidHandle`] if the presented handle
    /// is not the current sentinel, and [`KeystackError::NotReady`] if
    /// stage 0 has not completed (or was released). SK1 is untouched on
    /// every failure path.
    pub fn derive_stage1(
        &mut self,
        sk0_handle: &Sk0Handle,
        user_secret: &[u8],
    ) -> Result<Sk1Handle, KeystackError> {
        if sk0_handle.raw() != RAW_HANDLE {
            return Err(KeystackError::InvalidHandle);
        }
        if !self.sk0_set {
            return Err(KeystackError::NotReady);
        }

        let mut salt = kdf::hmac_sha256(&self.sk0, user_secret);
        let result = kdf::hkdf_sha256(&salt, &self.sk0, kdf::STAGE1_INFO);
        // The intermediate salt is keyed by SK0; wipe it before propagating
        // any error.
        salt.zeroize();
        let derived = result?;

        self.sk1 = derived;
        self.sk1_set = true;

        self.events.append(EventRecord::now(HierarchyOp::Stage1Derived));
        Ok(Sk1Handle::current())
    }

    /// Copy the current SK1 into `out`.
    ///
    /// Retrieval does not consume SK1: repeated calls succeed while the
    /// chain stays valid. On failure `out` is left untouched.
    pub fn retrieve_into(
        &mut self,
        sk1_handle: &Sk1Handle,
        out: &mut [u8; KEY_LEN],
    ) -> Result<(), KeystackError> {
        if sk1_handle.raw() != RAW_HANDLE {
            return Err(KeystackError::InvalidHandle);
        }
        if !self.sk1_set {
            return Err(KeystackError::NotReady);
        }

        out.copy_from_slice(&self.sk1);
        self.events.append(EventRecord::now(HierarchyOp::Retrieved));
        Ok(())
    }

    /// Return an owned copy of the current SK1.
    ///
    /// The caller takes responsibility for erasing the returned bytes when
    /// done with them (see the `zeroize` crate).
    pub fn retrieve(&mut self, sk1_handle: &Sk1Handle) -> Result<[u8; KEY_LEN], KeystackError> {
        let mut out = [0u8; KEY_LEN];
        self.retrieve_into(sk1_handle, &mut out)?;
        Ok(out)
    }

    /// Zeroize both secrets and reset the chain to empty.
    ///
    /// Accepts either stage's handle. The wipe uses `zeroize`, which the
    /// compiler cannot elide even though the buffers are about to be logically
    /// dead. Idempotent: presenting a stale handle after a previous release
    /// is a no-op, not an error.
    pub fn release_all<H: KeyHandle>(&mut self, handle: &H) {
        if handle.raw() != RAW_HANDLE {
            return;
        }
        self.sk0.zeroize();
        self.sk1.zeroize();
        self.sk0_set = false;
        self.sk1_set = false;

        self.events.append(EventRecord::now(HierarchyOp::Released));
    }

    /// Borrow the lifecycle event log.
    pub fn event_log(&self) -> &EventLog {
        &self.events
    }

    /// Attach a sink that receives a copy of every lifecycle event.
    pub fn add_event_sink(&mut self, sink: Box<dyn EventSink>) {
        self.events.add_forward_sink(sink);
    }
}

impl Default for KeyHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for KeyHierarchy {
    fn drop(&mut self) {
        // Overwrite key material before the memory is deallocated.
        self.sk0.zeroize();
        self.sk1.zeroize();
    }
}

// ---------------------------------------------------------------------------
// Shared wrapper
// ---------------------------------------------------------------------------

/// A [`KeyHierarchy`] behind one mutex, for embeddings where multiple
/// threads share the chain.
///
/// Each operation holds the lock for its whole duration, so a stage-1 call
/// that observes a stage-0 handle is guaranteed to see the fully written
/// SK0. Operations never leave the hierarchy half-mutated, so a poisoned
/// lock is recovered rather than propagated.
pub struct SharedHierarchy {
    inner: Mutex<KeyHierarchy>,
}

impl SharedHierarchy {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(KeyHierarchy::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, KeyHierarchy> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// See [`KeyHierarchy::derive_stage0`].
    pub fn derive_stage0(&self, fingerprint: &[u8]) -> Result<Sk0Handle, KeystackError> {
        self.lock().derive_stage0(fingerprint)
    }

    /// See [`KeyHierarchy::derive_stage1`].
    pub fn derive_stage1(
        &self,
        sk0_handle: &Sk0Handle,
        user_secret: &[u8],
    ) -> Result<Sk1Handle, KeystackError> {
        self.lock().derive_stage1(sk0_handle, user_secret)
    }

    /// See [`KeyHierarchy::retrieve`].
    pub fn retrieve(&self, sk1_handle: &Sk1Handle) -> Result<[u8; KEY_LEN], KeystackError> {
        self.lock().retrieve(sk1_handle)
    }

    /// See [`KeyHierarchy::retrieve_into`].
    pub fn retrieve_into(
        &self,
        sk1_handle: &Sk1Handle,
        out: &mut [u8; KEY_LEN],
    ) -> Result<(), KeystackError> {
        self.lock().retrieve_into(sk1_handle, out)
    }

    /// See [`KeyHierarchy::release_all`].
    pub fn release_all<H: KeyHandle>(&self, handle: &H) {
        self.lock().release_all(handle)
    }
}

impl Default for SharedHierarchy {
    fn default() -> Self {
        Self::new()
    }
}
