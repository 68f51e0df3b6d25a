//! passkeep: a local, single-user credential vault.
//!
//! Records (service / username / password / notes) live in one JSON
//! document on disk. Every password is sealed individually under a key
//! derived from the master password with a per-record salt; the master
//! password itself is stored only as a salted Argon2id hash. Neither
//! plaintext secrets nor the master password ever touch the disk.

mod db;
mod envelope;
mod error;
mod storage;

pub mod crypto;

pub use crate::db::{Record, VaultDb};
pub use crate::error::{VaultError, VaultResult};
pub use crate::storage::Storage;

use directories::ProjectDirs;
use serde::Serialize;
use zeroize::Zeroizing;

use crate::crypto::{hash_master_password, open, seal, verify_master_password};

/// Minimum length of a master password.
pub const MIN_MASTER_PASSWORD_LEN: usize = 8;

/// An unlocked vault session.
///
/// Holds the master password in memory (zeroized on drop) for the
/// lifetime of one CLI invocation; it is needed for every seal and
/// open. All mutations go through [`Vault::commit`], which persists a
/// scratch copy of the document atomically before the in-memory state
/// is swapped, so a failed save never leaves the two out of step.
pub struct Vault {
    storage: Storage,
    db: VaultDb,
    master: Zeroizing<String>,
}

/// A fully decrypted record, produced only for export.
#[derive(Debug, Serialize)]
pub struct PlainRecord {
    pub service: String,
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl Vault {
    /// Creates a new vault protected by `master`.
    pub fn create(storage: Storage, master: Zeroizing<String>) -> VaultResult<Self> {
        if storage.exists() {
            return Err(VaultError::AlreadyInitialized);
        }
        validate_master_password(&master)?;

        let mut db = VaultDb::new();
        db.set_master_hash(hash_master_password(&master)?);
        storage.save(&db)?;

        Ok(Self {
            storage,
            db,
            master,
        })
    }

    /// Opens an existing vault, verifying `master` against the stored
    /// hash.
    pub fn unlock(storage: Storage, master: Zeroizing<String>) -> VaultResult<Self> {
        if !storage.exists() {
            return Err(VaultError::NotInitialized);
        }

        let db = storage.load()?;
        let stored = db.master_hash().ok_or(VaultError::NotInitialized)?;
        verify_master_password(&master, stored)?;

        Ok(Self {
            storage,
            db,
            master,
        })
    }

    /// Stores a new record. The password is sealed before it enters
    /// the document.
    pub fn add(
        &mut self,
        service: &str,
        username: &str,
        password: &str,
        notes: &str,
    ) -> VaultResult<u64> {
        let blob = seal(password, &self.master)?;

        let mut db = self.db.clone();
        let id = db.add(service, username, blob, notes)?;
        self.commit(db)?;

        Ok(id)
    }

    pub fn get(&self, id: u64) -> Option<&Record> {
        self.db.get(id)
    }

    /// All records sorted by (service, username). Secrets stay sealed.
    pub fn list(&self) -> Vec<&Record> {
        self.db.sorted()
    }

    /// Case-insensitive search over service, username, and notes.
    pub fn search(&self, query: &str) -> Vec<&Record> {
        self.db.search(query)
    }

    /// Decrypts one record's password.
    pub fn reveal(&self, id: u64) -> VaultResult<Zeroizing<String>> {
        let record = self.db.get(id).ok_or(VaultError::RecordNotFound(id))?;
        open(record.secret(), &self.master)
    }

    /// Updates a record; `None` fields are left unchanged. A new
    /// password is re-sealed with a fresh salt and nonce.
    pub fn update(
        &mut self,
        id: u64,
        service: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
        notes: Option<&str>,
    ) -> VaultResult<()> {
        let mut db = self.db.clone();
        db.update_fields(id, service, username, notes)?;
        if let Some(password) = password {
            db.replace_secret(id, seal(password, &self.master)?)?;
        }
        self.commit(db)
    }

    pub fn remove(&mut self, id: u64) -> VaultResult<()> {
        let mut db = self.db.clone();
        db.remove(id)?;
        self.commit(db)
    }

    /// Decrypts every record, for export by the caller.
    pub fn export(&self) -> VaultResult<Vec<PlainRecord>> {
        let mut entries = Vec::with_capacity(self.db.len());
        for record in self.list() {
            let password = open(record.secret(), &self.master)?;
            entries.push(PlainRecord {
                service: record.service().to_string(),
                username: record.username().to_string(),
                password: password.to_string(),
                notes: record.notes().to_string(),
            });
        }
        Ok(entries)
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Replaces the master password, re-encrypting every record.
    ///
    /// One logical operation with no durable intermediate state:
    /// authenticate, open every record under the current password,
    /// validate the new one, re-seal everything into a scratch
    /// document, then commit with a single atomic save. Any failure
    /// before or during the commit leaves the vault, on disk and in
    /// memory, exactly as it was. Returns the number of re-encrypted
    /// records.
    pub fn rotate_master_password(&mut self, current: &str, new: &str) -> VaultResult<usize> {
        let stored = self.db.master_hash().ok_or(VaultError::NotInitialized)?;
        verify_master_password(current, stored).map_err(|e| match e {
            VaultError::InvalidCredential => VaultError::AuthenticationFailed,
            other => other,
        })?;

        // decrypt-all first: one unopenable record aborts the whole
        // rotation before anything is re-encrypted
        let mut plaintexts: Vec<(u64, Zeroizing<String>)> = Vec::with_capacity(self.db.len());
        for record in self.db.records() {
            plaintexts.push((record.id(), open(record.secret(), current)?));
        }

        validate_master_password(new)?;

        let mut db = self.db.clone();
        db.set_master_hash(hash_master_password(new)?);
        for (id, plaintext) in &plaintexts {
            db.replace_secret(*id, seal(plaintext, new)?)?;
        }

        let count = plaintexts.len();
        self.storage.save(&db)?;

        // only after the commit lands does the session switch keys
        self.db = db;
        self.master = Zeroizing::new(new.to_string());

        Ok(count)
    }

    fn commit(&mut self, db: VaultDb) -> VaultResult<()> {
        self.storage.save(&db)?;
        self.db = db;
        Ok(())
    }
}

fn validate_master_password(password: &str) -> VaultResult<()> {
    if password.chars().count() < MIN_MASTER_PASSWORD_LEN {
        return Err(VaultError::ValidationFailed(
            "master password must be at least 8 characters",
        ));
    }
    Ok(())
}

/// Default vault location under the platform data directory.
pub fn default_storage() -> VaultResult<Storage> {
    let project_dirs = ProjectDirs::from("", "", "passkeep").ok_or_else(|| {
        VaultError::PersistenceFailed("could not determine platform directories".to_string())
    })?;

    Ok(Storage::new(project_dirs.data_dir().join("passkeep.json")))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn pw(s: &str) -> Zeroizing<String> {
        Zeroizing::new(s.to_string())
    }

    fn vault_with_records(storage: Storage) -> Vault {
        let mut vault = Vault::create(storage, pw("old-master-1")).unwrap();
        vault.add("github", "octocat", "gh-secret", "").unwrap();
        vault
            .add("aws", "admin", "aws-secret", "prod account")
            .unwrap();
        vault
    }

    #[test]
    fn create_and_unlock_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("vault.json"));

        let mut vault = Vault::create(storage.clone(), pw("master-pw-1")).unwrap();
        let id = vault.add("github", "octocat", "s3cr3t!", "").unwrap();

        let reopened = Vault::unlock(storage, pw("master-pw-1")).unwrap();
        assert_eq!(&*reopened.reveal(id).unwrap(), "s3cr3t!");
    }

    #[test]
    fn create_fails_if_vault_exists() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("vault.json"));

        Vault::create(storage.clone(), pw("master-pw-1")).unwrap();
        assert!(matches!(
            Vault::create(storage, pw("master-pw-1")),
            Err(VaultError::AlreadyInitialized)
        ));
    }

    #[test]
    fn create_rejects_short_master_password() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("vault.json"));

        assert!(matches!(
            Vault::create(storage.clone(), pw("short")),
            Err(VaultError::ValidationFailed(_))
        ));
        assert!(!storage.exists());
    }

    #[test]
    fn unlock_with_wrong_password_fails() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("vault.json"));

        Vault::create(storage.clone(), pw("master-pw-1")).unwrap();
        assert!(matches!(
            Vault::unlock(storage, pw("master-pw-2")),
            Err(VaultError::InvalidCredential)
        ));
    }

    #[test]
    fn unlock_missing_vault_fails() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("vault.json"));

        assert!(matches!(
            Vault::unlock(storage, pw("master-pw-1")),
            Err(VaultError::NotInitialized)
        ));
    }

    #[test]
    fn stored_document_never_contains_plaintext() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("vault.json"));

        let mut vault = Vault::create(storage.clone(), pw("master-pw-1")).unwrap();
        vault.add("github", "octocat", "hunter2-plain", "").unwrap();

        let on_disk = std::fs::read_to_string(storage.path()).unwrap();
        assert!(!on_disk.contains("hunter2-plain"));
        assert!(!on_disk.contains("master-pw-1"));
    }

    #[test]
    fn update_reseals_password() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("vault.json"));
        let mut vault = vault_with_records(storage);

        let before = vault.get(1).unwrap().secret().to_string();
        vault
            .update(1, None, None, Some("new-secret"), Some("rotated"))
            .unwrap();

        let record = vault.get(1).unwrap();
        assert_ne!(record.secret(), before);
        assert_eq!(record.notes(), "rotated");
        assert_eq!(&*vault.reveal(1).unwrap(), "new-secret");
    }

    #[test]
    fn remove_then_reveal_fails() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("vault.json"));
        let mut vault = vault_with_records(storage);

        vault.remove(1).unwrap();
        assert!(matches!(
            vault.reveal(1),
            Err(VaultError::RecordNotFound(1))
        ));
    }

    #[test]
    fn export_decrypts_all_records() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("vault.json"));
        let vault = vault_with_records(storage);

        let entries = vault.export().unwrap();
        assert_eq!(entries.len(), 2);
        // sorted by service
        assert_eq!(entries[0].service, "aws");
        assert_eq!(entries[0].password, "aws-secret");
        assert_eq!(entries[1].password, "gh-secret");
    }

    // --------------------------------------------------
    // ROTATION TESTS
    // --------------------------------------------------

    #[test]
    fn rotation_reencrypts_every_record() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("vault.json"));
        let mut vault = vault_with_records(storage.clone());

        let old_blobs: Vec<String> = vault
            .list()
            .iter()
            .map(|r| r.secret().to_string())
            .collect();

        let count = vault
            .rotate_master_password("old-master-1", "new-master-1")
            .unwrap();
        assert_eq!(count, 2);

        // session continues under the new password
        assert_eq!(&*vault.reveal(1).unwrap(), "gh-secret");

        // old password no longer opens anything
        assert!(matches!(
            Vault::unlock(storage.clone(), pw("old-master-1")),
            Err(VaultError::InvalidCredential)
        ));

        // every blob was replaced and opens under the new password
        let reopened = Vault::unlock(storage, pw("new-master-1")).unwrap();
        for (record, old_blob) in reopened.list().iter().zip(&old_blobs) {
            assert_ne!(record.secret(), old_blob.as_str());
        }
        assert_eq!(&*reopened.reveal(1).unwrap(), "gh-secret");
        assert_eq!(&*reopened.reveal(2).unwrap(), "aws-secret");

        // the old blobs do not open under the new password either
        for old_blob in &old_blobs {
            assert!(matches!(
                crypto::open(old_blob, "new-master-1"),
                Err(VaultError::DecryptionFailed)
            ));
        }
    }

    #[test]
    fn rotation_with_wrong_current_password_fails() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("vault.json"));
        let mut vault = vault_with_records(storage);

        assert!(matches!(
            vault.rotate_master_password("wrong-master", "new-master-1"),
            Err(VaultError::AuthenticationFailed)
        ));

        // nothing changed
        assert_eq!(&*vault.reveal(1).unwrap(), "gh-secret");
    }

    #[test]
    fn rotation_rejects_short_new_password_before_resealing() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("vault.json"));
        let mut vault = vault_with_records(storage.clone());

        assert!(matches!(
            vault.rotate_master_password("old-master-1", "short"),
            Err(VaultError::ValidationFailed(_))
        ));

        // vault still opens under the old password
        let reopened = Vault::unlock(storage, pw("old-master-1")).unwrap();
        assert_eq!(&*reopened.reveal(1).unwrap(), "gh-secret");
    }

    #[test]
    fn rotation_aborts_if_any_record_fails_to_open() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("vault.json"));
        let mut vault = vault_with_records(storage.clone());

        // corrupt one sealed blob on disk, then reload the session
        let mut db = storage.load().unwrap();
        db.replace_secret(2, crypto::seal("stray", "other-password-1").unwrap())
            .unwrap();
        storage.save(&db).unwrap();
        drop(vault);
        vault = Vault::unlock(storage, pw("old-master-1")).unwrap();

        assert!(matches!(
            vault.rotate_master_password("old-master-1", "new-master-1"),
            Err(VaultError::DecryptionFailed)
        ));

        // the openable record is still encrypted under the old password
        assert_eq!(&*vault.reveal(1).unwrap(), "gh-secret");
    }

    #[test]
    fn rotation_commit_failure_leaves_vault_untouched() {
        use std::fs;

        let dir = tempdir().unwrap();
        let path = dir.path().join("vault.json");
        let storage = Storage::new(path.clone());
        let mut vault = vault_with_records(storage.clone());

        // keep the pre-rotation bytes, then block the commit by putting
        // a directory where the vault file lives: the atomic rename
        // onto it cannot succeed
        let original = fs::read(&path).unwrap();
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let result = vault.rotate_master_password("old-master-1", "new-master-1");
        assert!(matches!(result, Err(VaultError::PersistenceFailed(_))));

        // in-memory session still runs under the old password
        assert_eq!(&*vault.reveal(1).unwrap(), "gh-secret");

        // the pre-rotation bytes still form a vault that opens under
        // the old password
        fs::remove_dir(&path).unwrap();
        fs::write(&path, &original).unwrap();
        let reopened = Vault::unlock(storage, pw("old-master-1")).unwrap();
        assert_eq!(&*reopened.reveal(1).unwrap(), "gh-secret");
        assert_eq!(&*reopened.reveal(2).unwrap(), "aws-secret");
    }

    #[test]
    fn rotation_of_empty_vault_reports_zero_records() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("vault.json"));
        let mut vault = Vault::create(storage, pw("old-master-1")).unwrap();

        let count = vault
            .rotate_master_password("old-master-1", "new-master-1")
            .unwrap();
        assert_eq!(count, 0);
    }
}
