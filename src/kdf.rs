//! Low-level key derivation primitives.
//!
//! This is the only module in the crate that imports `ring`. All other
//! modules derive key material exclusively through the two functions
//! exposed here.
//!
//! Primitive choices:
//! - **KDF**: HKDF-SHA256 (extract-then-expand)
//! - **Salt generator**: HMAC-SHA256
//! - **Key size**: 256 bits (32 bytes)
//!
//! The salt and info strings below are wire constants. They must stay
//! byte-for-byte identical across builds: every derivation chain ever
//! produced depends on them, and changing a single byte orphans all of it.

use ring::hkdf;
use ring::hmac;

use crate::error::KeystackError;

/// Size of every derived secret in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// HKDF salt for the stage-0 derivation (fingerprint -> SK0).
pub(crate) const STAGE0_SALT: &[u8] = b"ZILANT_SK0_SALT__";

/// HKDF info string for the stage-0 derivation.
pub(crate) const STAGE0_INFO: &[u8] = b"ZILANT_INFO_SK0_";

/// HKDF info string for the stage-1 derivation (SK0 + user secret -> SK1).
/// Distinct from [`STAGE0_INFO`] so the two stages can never collide.
pub(crate) const STAGE1_INFO: &[u8] = b"ZILANT_INFO_SK1_";

/// Run one HKDF-SHA256 extract-and-expand, producing 32 bytes of output
/// keying material.
///
/// # Security properties
/// - HKDF is one-way: the output reveals nothing about the input keying
///   material.
/// - Different salt or info inputs produce statistically independent outputs.
pub(crate) fn hkdf_sha256(
    salt: &[u8],
    ikm: &[u8],
    info: &[u8],
) -> Result<[u8; KEY_LEN], KeystackError> {
    // Extract phase: compress the input keying material into a PRK.
    let salt = hkdf::Salt::new(hkdf::HKDF_SHA256, salt);
    let prk = salt.extract(ikm);

    // Expand phase: stretch the PRK under the info string. `HKDF_SHA256`
    // doubles as the output key type, fixing the length at 32 bytes.
    let info_slices = [info];
    let okm = prk
        .expand(&info_slices, hkdf::HKDF_SHA256)
        .map_err(|_| KeystackError::DerivationFailure)?;

    let mut out = [0u8; KEY_LEN];
    okm.fill(&mut out)
        .map_err(|_| KeystackError::DerivationFailure)?;

    Ok(out)
}

/// Compute HMAC-SHA256 over `message` keyed by `key`.
///
/// Used as the stage-1 salt generator, not for authentication: binding the
/// salt to SK0 makes the stage-1 output depend on both the fingerprint chain
/// and the user secret.
pub(crate) fn hmac_sha256(key: &[u8; KEY_LEN], message: &[u8]) -> [u8; KEY_LEN] {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    let tag = hmac::sign(&key, message);

    let mut out = [0u8; KEY_LEN];
    out.copy_from_slice(tag.as_ref());
    out
}
