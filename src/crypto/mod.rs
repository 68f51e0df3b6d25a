//! Cryptographic core of the vault.
//!
//! Provides master-password hashing/verification, per-record key
//! derivation, and authenticated sealing/opening of secrets.

pub mod aead;
pub mod hasher;
pub mod kdf;
pub mod seal;

pub use hasher::{hash_master_password, verify_master_password};
pub use kdf::{KdfProfile, derive_key};
pub use seal::{open, seal};

/// Length of the random salt prefixed to every blob (16 bytes).
pub const SALT_LEN: usize = 16;
/// Length of the AES-GCM nonce (12 bytes / 96 bits).
pub const NONCE_LEN: usize = 12;
/// Length of a derived encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the stored master-password hash (32 bytes).
pub const HASH_LEN: usize = 32;
/// Length of the GCM authentication tag (16 bytes).
pub const TAG_LEN: usize = 16;
