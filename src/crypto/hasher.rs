//! Master-password hashing and verification.

use subtle::ConstantTimeEq;

use super::{KdfProfile, aead, kdf};
use crate::envelope;
use crate::error::{VaultError, VaultResult};

/// Hash the master password for storage.
///
/// Generates a fresh random salt, so two hashes of the same password
/// never match.
pub fn hash_master_password(password: &str) -> VaultResult<String> {
    if password.is_empty() {
        return Err(VaultError::EmptyInput);
    }

    let salt = aead::generate_salt()?;
    let hash = kdf::derive_key(password, &salt, KdfProfile::Hashing)?;

    Ok(envelope::encode_hash_blob(&salt, &hash))
}

/// Verify a password against a stored hash blob.
///
/// Re-derives with the salt embedded in the blob and compares in
/// constant time, never short-circuiting on a byte difference.
pub fn verify_master_password(password: &str, encoded: &str) -> VaultResult<()> {
    if password.is_empty() || encoded.is_empty() {
        return Err(VaultError::EmptyInput);
    }

    let (salt, stored) = envelope::decode_hash_blob(encoded)?;
    let computed = kdf::derive_key(password, &salt, KdfProfile::Hashing)?;

    if bool::from(computed[..].ct_eq(&stored[..])) {
        Ok(())
    } else {
        Err(VaultError::InvalidCredential)
    }
}
