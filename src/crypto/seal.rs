//! Sealing and opening of individual secrets.
//!
//! Every seal derives a fresh key from a fresh salt, so a nonce is
//! never used twice under the same key.

use zeroize::Zeroizing;

use super::{KdfProfile, aead, kdf};
use crate::envelope;
use crate::error::{VaultError, VaultResult};

/// Encrypt a secret under the master password.
///
/// Output is a self-describing text blob carrying its own salt and
/// nonce. Non-deterministic: two seals of identical inputs never
/// produce the same blob.
pub fn seal(plaintext: &str, password: &str) -> VaultResult<String> {
    if plaintext.is_empty() || password.is_empty() {
        return Err(VaultError::EmptyInput);
    }

    let salt = aead::generate_salt()?;
    let key = kdf::derive_key(password, &salt, KdfProfile::Encryption)?;
    let (ciphertext, nonce) = aead::encrypt(&*key, plaintext.as_bytes())?;

    Ok(envelope::encode_secret_blob(&salt, &nonce, &ciphertext))
}

/// Decrypt a sealed blob under the master password.
///
/// The key is always re-derived from the salt embedded in this blob.
pub fn open(blob: &str, password: &str) -> VaultResult<Zeroizing<String>> {
    if blob.is_empty() || password.is_empty() {
        return Err(VaultError::EmptyInput);
    }

    let (salt, nonce, ciphertext) = envelope::decode_secret_blob(blob)?;
    let key = kdf::derive_key(password, &salt, KdfProfile::Encryption)?;
    let plaintext = aead::decrypt(&*key, &nonce, &ciphertext)?;

    let text = std::str::from_utf8(&plaintext).map_err(|_| VaultError::DecryptionFailed)?;
    Ok(Zeroizing::new(text.to_string()))
}
