//! Error types for vault operations.

use thiserror::Error;

/// Errors produced by the crypto core and its storage plumbing.
///
/// Messages never contain passwords, keys, plaintexts, or blob
/// contents. Cryptographic failures are terminal for the current
/// operation and are never retried.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("input must not be empty")]
    EmptyInput,

    #[error("malformed blob")]
    InvalidFormat,

    #[error("decryption failed: wrong master password or corrupted data")]
    DecryptionFailed,

    #[error("invalid master password")]
    InvalidCredential,

    #[error("{0}")]
    ValidationFailed(&'static str),

    #[error("current master password rejected")]
    AuthenticationFailed,

    #[error("failed to persist vault: {0}")]
    PersistenceFailed(String),

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("key derivation failed")]
    KeyDerivation,

    #[error("OS random generator unavailable")]
    RandomUnavailable,

    #[error("vault does not exist yet, run `passkeep init` first")]
    NotInitialized,

    #[error("vault already exists")]
    AlreadyInitialized,

    #[error("no entry with id {0}")]
    RecordNotFound(u64),

    #[error("entry for '{0}' / '{1}' already exists")]
    DuplicateRecord(String, String),
}

pub type VaultResult<T> = Result<T, VaultError>;
