//! Transportable blob layout.
//!
//! Two kinds of blob leave the crypto core, both standard base64 over
//! fixed-offset binary fields:
//!
//! - hash blob:   `salt(16) + hash(32)`
//! - secret blob: `salt(16) + nonce(12) + ciphertext(incl. tag)`
//!
//! Field lengths are fixed constants, so length alone disambiguates
//! the fields on decode.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

use crate::crypto::{HASH_LEN, NONCE_LEN, SALT_LEN, TAG_LEN};
use crate::error::{VaultError, VaultResult};

/// Raw length of a decoded master-hash blob.
pub const HASH_BLOB_LEN: usize = SALT_LEN + HASH_LEN;
/// Smallest raw length of a valid secret blob.
pub const MIN_SECRET_BLOB_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

fn decode(text: &str) -> VaultResult<Vec<u8>> {
    BASE64.decode(text).map_err(|_| VaultError::InvalidFormat)
}

/// Pack a salt and master-password hash into a text blob.
pub fn encode_hash_blob(salt: &[u8; SALT_LEN], hash: &[u8; HASH_LEN]) -> String {
    let mut raw = Vec::with_capacity(HASH_BLOB_LEN);
    raw.extend_from_slice(salt);
    raw.extend_from_slice(hash);
    BASE64.encode(raw)
}

/// Split a hash blob back into salt and hash.
///
/// The decoded length must be exactly [`HASH_BLOB_LEN`].
pub fn decode_hash_blob(text: &str) -> VaultResult<([u8; SALT_LEN], [u8; HASH_LEN])> {
    let raw = decode(text)?;

    if raw.len() != HASH_BLOB_LEN {
        return Err(VaultError::InvalidFormat);
    }

    let salt = raw[..SALT_LEN]
        .try_into()
        .map_err(|_| VaultError::InvalidFormat)?;
    let hash = raw[SALT_LEN..]
        .try_into()
        .map_err(|_| VaultError::InvalidFormat)?;

    Ok((salt, hash))
}

/// Pack a salt, nonce, and ciphertext into a text blob.
pub fn encode_secret_blob(
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> String {
    let mut raw = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    raw.extend_from_slice(salt);
    raw.extend_from_slice(nonce);
    raw.extend_from_slice(ciphertext);
    BASE64.encode(raw)
}

/// Split a secret blob into salt, nonce, and ciphertext.
///
/// The decoded length must be at least [`MIN_SECRET_BLOB_LEN`]; the
/// ciphertext (tag included) is everything past the nonce.
pub fn decode_secret_blob(text: &str) -> VaultResult<([u8; SALT_LEN], [u8; NONCE_LEN], Vec<u8>)> {
    let raw = decode(text)?;

    if raw.len() < MIN_SECRET_BLOB_LEN {
        return Err(VaultError::InvalidFormat);
    }

    let salt = raw[..SALT_LEN]
        .try_into()
        .map_err(|_| VaultError::InvalidFormat)?;
    let nonce = raw[SALT_LEN..SALT_LEN + NONCE_LEN]
        .try_into()
        .map_err(|_| VaultError::InvalidFormat)?;
    let ciphertext = raw[SALT_LEN + NONCE_LEN..].to_vec();

    Ok((salt, nonce, ciphertext))
}
