use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use getrandom::fill;
use zeroize::Zeroizing;

use super::{NONCE_LEN, SALT_LEN};
use crate::error::{VaultError, VaultResult};

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> VaultResult<()> {
    fill(buf).map_err(|_| VaultError::RandomUnavailable)
}

/// Generate a fresh key-derivation salt.
pub fn generate_salt() -> VaultResult<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    secure_random(&mut salt)?;
    Ok(salt)
}

/// Encrypt plaintext under a fresh random nonce.
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> VaultResult<(Vec<u8>, [u8; NONCE_LEN])> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| VaultError::EncryptionFailed)?;

    let mut nonce = [0u8; NONCE_LEN];
    secure_random(&mut nonce)?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| VaultError::EncryptionFailed)?;

    Ok((ciphertext, nonce))
}

/// Decrypt ciphertext, verifying the authentication tag.
///
/// Wrong key, corruption, and tampering are indistinguishable here.
pub fn decrypt(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> VaultResult<Zeroizing<Vec<u8>>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| VaultError::DecryptionFailed)?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| VaultError::DecryptionFailed)?;
    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{KEY_LEN, TAG_LEN};

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = [9u8; KEY_LEN];
        let (ciphertext, nonce) = encrypt(&key, b"secret data").unwrap();

        let plaintext = decrypt(&key, &nonce, &ciphertext).unwrap();
        assert_eq!(&*plaintext, b"secret data");
    }

    #[test]
    fn ciphertext_carries_tag_overhead() {
        let key = [9u8; KEY_LEN];
        let (ciphertext, _) = encrypt(&key, b"abc").unwrap();

        assert_eq!(ciphertext.len(), 3 + TAG_LEN);
    }

    #[test]
    fn wrong_key_fails() {
        let (ciphertext, nonce) = encrypt(&[1u8; KEY_LEN], b"secret").unwrap();

        assert!(matches!(
            decrypt(&[2u8; KEY_LEN], &nonce, &ciphertext),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn generated_salts_differ() {
        let a = generate_salt().unwrap();
        let b = generate_salt().unwrap();

        assert_ne!(a, b);
    }
}
