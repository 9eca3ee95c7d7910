//! Error types for keystack.
//!
//! Every variant is a distinct failure mode of the derivation chain. Error
//! messages are intentionally minimal: they signal *what* failed without
//! revealing anything about the secret state involved.

use std::fmt;

/// The single error type for all keystack operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeystackError {
    /// The underlying HKDF or HMAC primitive failed to initialize or
    /// compute. Not worth retrying: the computation is deterministic, so
    /// retrying with the same inputs cannot succeed.
    DerivationFailure,

    /// A wrong or stale handle was presented. The caller recovers by
    /// re-deriving the chain from stage 0.
    InvalidHandle,

    /// An operation was attempted before its prerequisite stage completed.
    /// The caller recovers by running the missing prior stage.
    NotReady,
}

impl fmt::Display for KeystackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DerivationFailure => write!(f, "key derivation failed"),
            Self::InvalidHandle => write!(f, "invalid or stale key handle"),
            Self::NotReady => write!(f, "prerequisite derivation stage not completed"),
        }
    }
}

impl std::error::Error for KeystackError {}
