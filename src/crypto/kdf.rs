use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroizing;

use super::KEY_LEN;
use crate::error::{VaultError, VaultResult};

/// Fixed Argon2id parameter sets, one per purpose.
///
/// Both sets are baked into the blob format: changing either would
/// orphan every previously produced blob, since no version tag is
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdfProfile {
    /// Master-password hashing, tuned for interactive login latency.
    Hashing,
    /// Per-record key derivation. Runs once per seal/open rather than
    /// once per login, so it can afford more iterations.
    Encryption,
}

impl KdfProfile {
    fn time_cost(self) -> u32 {
        match self {
            KdfProfile::Hashing => 1,
            KdfProfile::Encryption => 3,
        }
    }

    fn mem_cost_kib(self) -> u32 {
        64 * 1024 // 64 MiB
    }

    fn parallelism(self) -> u32 {
        4
    }
}

/// Derive a 256-bit key from a password and salt.
///
/// Deterministic for identical (password, salt, profile).
pub fn derive_key(
    password: &str,
    salt: &[u8],
    profile: KdfProfile,
) -> VaultResult<Zeroizing<[u8; KEY_LEN]>> {
    let params = Params::new(
        profile.mem_cost_kib(),
        profile.time_cost(),
        profile.parallelism(),
        Some(KEY_LEN),
    )
    .map_err(|_| VaultError::KeyDerivation)?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut *key)
        .map_err(|_| VaultError::KeyDerivation)?;

    Ok(key)
}
