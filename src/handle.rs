//! Opaque key handles.
//!
//! A handle represents authorized access to one of the hierarchy's secrets
//! without exposing the secret's bytes. The two stages get distinct types so
//! a stage-0 handle can never be presented where a stage-1 handle is
//! required, even though both carry the same sentinel value on the wire.
//!
//! A handle alone proves nothing: the hierarchy checks it against its own
//! validity flags at every use, so a handle that outlives a `release_all`
//! (or a stage-0 re-derivation, for SK1) is rejected as stale.

/// The raw sentinel value carried by every live handle. A single hierarchy
/// holds exactly one chain, so one value suffices for each stage.
pub(crate) const RAW_HANDLE: u8 = 1;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Sk0Handle {}
    impl Sealed for super::Sk1Handle {}
}

/// Common surface of the two handle types. Sealed: the only implementors
/// are [`Sk0Handle`] and [`Sk1Handle`].
pub trait KeyHandle: sealed::Sealed {
    /// The wire representation of this handle.
    fn raw(&self) -> u8;
}

impl KeyHandle for Sk0Handle {
    fn raw(&self) -> u8 {
        self.0
    }
}

impl KeyHandle for Sk1Handle {
    fn raw(&self) -> u8 {
        self.0
    }
}

/// Capability for the current SK0. Only accepted by
/// [`derive_stage1`](crate::hierarchy::KeyHierarchy::derive_stage1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sk0Handle(u8);

/// Capability for the current SK1. Only accepted by
/// [`retrieve`](crate::hierarchy::KeyHierarchy::retrieve) and
/// [`retrieve_into`](crate::hierarchy::KeyHierarchy::retrieve_into).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sk1Handle(u8);

impl Sk0Handle {
    pub(crate) fn current() -> Self {
        Self(RAW_HANDLE)
    }

    /// Reconstruct a handle from its wire representation. Validity is
    /// decided by the hierarchy when the handle is presented, not here.
    pub fn from_raw(raw: u8) -> Self {
        Self(raw)
    }
}

impl Sk1Handle {
    pub(crate) fn current() -> Self {
        Self(RAW_HANDLE)
    }

    /// Reconstruct a handle from its wire representation. Validity is
    /// decided by the hierarchy when the handle is presented, not here.
    pub fn from_raw(raw: u8) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip() {
        assert_eq!(Sk0Handle::current().raw(), RAW_HANDLE);
        assert_eq!(Sk1Handle::from_raw(7).raw(), 7);
        assert_eq!(Sk0Handle::from_raw(Sk0Handle::current().raw()), Sk0Handle::current());
    }
}
