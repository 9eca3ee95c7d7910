//! # keystack
//!
//! Two-stage handle-guarded key derivation hierarchy.
//!
//! A public device fingerprint seeds SK0 via HKDF-SHA256; SK0 plus a user
//! secret seed SK1, the 256-bit working key. Callers never touch raw SK0,
//! and only reach SK1 through opaque typed handles checked on every use.
//! Both secrets are zeroized on release and on drop.
//!
//! ## Public API
//!
//! The public surface of this crate is intentionally narrow. Only the types
//! and functions listed here are intended for use by callers. Everything
//! else is `pub(crate)` at most.
//!
//! ```
//! use keystack::KeyHierarchy;
//!
//! let mut hierarchy = KeyHierarchy::new();
//! let h0 = hierarchy.derive_stage0(b"device-fingerprint")?;
//! let h1 = hierarchy.derive_stage1(&h0, b"user secret")?;
//! let working_key = hierarchy.retrieve(&h1)?;
//! hierarchy.release_all(&h1);
//! # let _ = working_key;
//! # Ok::<(), keystack::KeystackError>(())
//! ```

// Module declarations.
pub mod audit;
pub mod error;
pub mod handle;
pub mod hierarchy;
pub(crate) mod kdf;

pub use error::KeystackError;
pub use handle::{KeyHandle, Sk0Handle, Sk1Handle};
pub use hierarchy::{KeyHierarchy, SharedHierarchy};
pub use kdf::KEY_LEN;
