//! Vault file persistence.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use getrandom::fill;

use crate::db::VaultDb;
use crate::error::{VaultError, VaultResult};

/// Persists the vault document to disk.
///
/// `Storage` owns the single durable artifact of the vault: one JSON
/// file holding the master hash and every sealed record. Saving is the
/// commit step of every mutating operation, including rotation.
#[derive(Clone, Debug)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Creates a new Storage instance with the given path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns `true` if the vault file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads and parses the vault document.
    pub fn load(&self) -> VaultResult<VaultDb> {
        let data = fs::read(&self.path).map_err(persistence)?;
        serde_json::from_slice(&data)
            .map_err(|_| VaultError::PersistenceFailed("vault file is not readable".to_string()))
    }

    /// Saves the document using an atomic write.
    ///
    /// Crash-safety:
    /// 1. Serialize and write to a temporary file with a random name
    /// 2. Sync the temporary file to disk
    /// 3. Atomically replace the old file with the new one
    /// 4. Sync the parent directory so the rename is persisted
    ///
    /// If the process dies mid-save, either the old or the new file is
    /// present, never a partial write. This is the transaction
    /// boundary the rotation protocol relies on: until the rename
    /// lands, the prior vault state remains fully valid.
    pub fn save(&self, db: &VaultDb) -> VaultResult<()> {
        let data = serde_json::to_vec_pretty(db)
            .map_err(|_| VaultError::PersistenceFailed("vault serialization failed".to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(persistence)?;
        }

        let tmp_path = self.random_tmp_path()?;

        // securely create temp file (fail if exists)
        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
            .map_err(persistence)?;

        let write_result = tmp_file
            .write_all(&data)
            .and_then(|_| tmp_file.sync_all())
            .map_err(persistence);
        drop(tmp_file);

        if let Err(e) = write_result.and_then(|_| self.atomic_replace(&tmp_path)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        // fsync directory
        if let Some(parent) = self.path.parent() {
            let dir = File::open(parent).map_err(persistence)?;
            dir.sync_all().map_err(persistence)?;
        }

        Ok(())
    }

    /// Deletes the vault file.
    pub fn remove(&self) -> VaultResult<()> {
        fs::remove_file(&self.path).map_err(persistence)
    }

    /// Returns the path to the vault file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Generates a unique temporary file path in the same directory.
    ///
    /// Format: `filename.tmp.<randomhex>`
    fn random_tmp_path(&self) -> VaultResult<PathBuf> {
        let mut buf = [0u8; 8]; // 64 bit entropy
        fill(&mut buf).map_err(|_| VaultError::RandomUnavailable)?;

        let rand_string = buf.iter().map(|b| format!("{:02x}", b)).collect::<String>();

        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| VaultError::PersistenceFailed("vault path has no file name".to_string()))?
            .to_string_lossy();

        let tmp_name = format!("{}.tmp.{}", file_name, rand_string);

        Ok(self.path.with_file_name(tmp_name))
    }

    /// Atomically replaces the target file with the temporary file.
    ///
    /// Uses the Windows `ReplaceFileW` API with `REPLACEFILE_WRITE_THROUGH`
    /// so the replacement is atomic and persisted to disk.
    #[cfg(target_os = "windows")]
    fn atomic_replace(&self, tmp_path: &Path) -> VaultResult<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

        fn to_wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        let target_w = to_wide(self.path.as_os_str());
        let tmp_w = to_wide(tmp_path.as_os_str());

        // SAFETY:
        // - Strings are valid UTF-16 and null-terminated
        // - Pointers remain valid during the call
        // - Windows does not retain the pointers after return
        let result = unsafe {
            ReplaceFileW(
                target_w.as_ptr(),
                tmp_w.as_ptr(),
                std::ptr::null(),
                REPLACEFILE_WRITE_THROUGH,
                std::ptr::null(),
                std::ptr::null(),
            )
        };

        if result == 0 {
            return Err(persistence(std::io::Error::last_os_error()));
        }

        Ok(())
    }

    /// Atomically replaces the target file with the temporary file.
    ///
    /// On Unix, `rename()` is atomic when both paths are on the same
    /// filesystem.
    #[cfg(not(target_os = "windows"))]
    fn atomic_replace(&self, tmp_path: &Path) -> VaultResult<()> {
        fs::rename(tmp_path, &self.path).map_err(persistence)
    }
}

fn persistence(e: std::io::Error) -> VaultError {
    VaultError::PersistenceFailed(e.to_string())
}
