use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultResult};

/// The whole vault as one serializable document: the master-password
/// hash plus every credential record.
///
/// Secrets live here only as opaque sealed blobs; the document never
/// holds plaintext passwords.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VaultDb {
    master_hash: Option<String>,
    next_id: u64,
    records: Vec<Record>,
    creation_date: String,
}

/// One stored credential. Only `secret` is encrypted; service,
/// username, and notes are searchable plaintext.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Record {
    id: u64,
    service: String,
    username: String,
    secret: String,
    notes: String,
    created: String,
    updated: String,
}

impl Record {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The sealed password blob.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn created(&self) -> &str {
        &self.created
    }

    pub fn updated(&self) -> &str {
        &self.updated
    }

    fn touch(&mut self) {
        self.updated = Local::now().to_string();
    }

    fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.service.to_lowercase().contains(&query)
            || self.username.to_lowercase().contains(&query)
            || self.notes.to_lowercase().contains(&query)
    }
}

impl VaultDb {
    pub fn new() -> Self {
        VaultDb {
            master_hash: None,
            next_id: 1,
            records: Vec::new(),
            creation_date: Local::now().to_string(),
        }
    }

    pub fn master_hash(&self) -> Option<&str> {
        self.master_hash.as_deref()
    }

    /// Replaces the master-password hash wholesale. There is never
    /// more than one.
    pub fn set_master_hash(&mut self, encoded: String) {
        self.master_hash = Some(encoded);
    }

    /// Appends a record. The (service, username) pair must be unique.
    pub fn add(
        &mut self,
        service: &str,
        username: &str,
        secret: String,
        notes: &str,
    ) -> VaultResult<u64> {
        if self
            .records
            .iter()
            .any(|r| r.service == service && r.username == username)
        {
            return Err(VaultError::DuplicateRecord(
                service.to_string(),
                username.to_string(),
            ));
        }

        let id = self.next_id;
        self.next_id += 1;

        let now = Local::now().to_string();
        self.records.push(Record {
            id,
            service: service.to_string(),
            username: username.to_string(),
            secret,
            notes: notes.to_string(),
            created: now.clone(),
            updated: now,
        });

        Ok(id)
    }

    pub fn get(&self, id: u64) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Records sorted by (service, username).
    pub fn sorted(&self) -> Vec<&Record> {
        let mut entries: Vec<&Record> = self.records.iter().collect();
        entries.sort_by(|a, b| {
            (a.service.as_str(), a.username.as_str()).cmp(&(b.service.as_str(), b.username.as_str()))
        });
        entries
    }

    /// Case-insensitive substring search over service, username, and
    /// notes, sorted by (service, username).
    pub fn search(&self, query: &str) -> Vec<&Record> {
        let mut entries: Vec<&Record> = self.records.iter().filter(|r| r.matches(query)).collect();
        entries.sort_by(|a, b| {
            (a.service.as_str(), a.username.as_str()).cmp(&(b.service.as_str(), b.username.as_str()))
        });
        entries
    }

    /// Updates the plaintext fields of a record. A `None` leaves the
    /// field unchanged. The new (service, username) pair must not
    /// collide with another record.
    pub fn update_fields(
        &mut self,
        id: u64,
        service: Option<&str>,
        username: Option<&str>,
        notes: Option<&str>,
    ) -> VaultResult<()> {
        let current = self.get(id).ok_or(VaultError::RecordNotFound(id))?;
        let service = service.unwrap_or(&current.service).to_string();
        let username = username.unwrap_or(&current.username).to_string();

        if self
            .records
            .iter()
            .any(|r| r.id != id && r.service == service && r.username == username)
        {
            return Err(VaultError::DuplicateRecord(service, username));
        }

        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(VaultError::RecordNotFound(id))?;
        record.service = service;
        record.username = username;
        if let Some(notes) = notes {
            record.notes = notes.to_string();
        }
        record.touch();

        Ok(())
    }

    /// Swaps in a new sealed blob for a record.
    pub fn replace_secret(&mut self, id: u64, secret: String) -> VaultResult<()> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(VaultError::RecordNotFound(id))?;
        record.secret = secret;
        record.touch();

        Ok(())
    }

    pub fn remove(&mut self, id: u64) -> VaultResult<()> {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);

        if self.records.len() == before {
            return Err(VaultError::RecordNotFound(id));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn creation_date(&self) -> &str {
        &self.creation_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_db() -> VaultDb {
        let mut db = VaultDb::new();
        db.add("github", "octocat", "blob-a".into(), "work account")
            .unwrap();
        db.add("aws", "admin", "blob-b".into(), "").unwrap();
        db
    }

    #[test]
    fn new_db_is_empty() {
        let db = VaultDb::new();
        assert!(db.is_empty());
        assert!(db.master_hash().is_none());
        assert_ne!(db.creation_date(), "");
    }

    #[test]
    fn add_assigns_increasing_ids() {
        let db = sample_db();
        let ids: Vec<u64> = db.records().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn duplicate_service_username_fails() {
        let mut db = sample_db();
        match db.add("github", "octocat", "blob-c".into(), "") {
            Err(VaultError::DuplicateRecord(s, u)) => {
                assert_eq!(s, "github");
                assert_eq!(u, "octocat");
            }
            other => panic!("expected DuplicateRecord, got: {other:?}"),
        }
    }

    #[test]
    fn same_service_different_username_is_allowed() {
        let mut db = sample_db();
        db.add("github", "workbot", "blob-c".into(), "").unwrap();
        assert_eq!(db.len(), 3);
    }

    #[test]
    fn sorted_orders_by_service_then_username() {
        let db = sample_db();
        let services: Vec<&str> = db.sorted().iter().map(|r| r.service()).collect();
        assert_eq!(services, vec!["aws", "github"]);
    }

    #[test]
    fn search_is_case_insensitive_over_all_text_fields() {
        let db = sample_db();

        assert_eq!(db.search("GITHUB").len(), 1);
        assert_eq!(db.search("Admin").len(), 1);
        assert_eq!(db.search("work account").len(), 1);
        assert_eq!(db.search("nothing").len(), 0);
    }

    #[test]
    fn update_fields_preserves_unset_fields() {
        let mut db = sample_db();
        db.update_fields(1, Some("gitlab"), None, None).unwrap();

        let record = db.get(1).unwrap();
        assert_eq!(record.service(), "gitlab");
        assert_eq!(record.username(), "octocat");
        assert_eq!(record.notes(), "work account");
    }

    #[test]
    fn update_fields_rejects_collision() {
        let mut db = sample_db();
        assert!(matches!(
            db.update_fields(2, Some("github"), Some("octocat"), None),
            Err(VaultError::DuplicateRecord(_, _))
        ));
    }

    #[test]
    fn replace_secret_bumps_updated() {
        let mut db = sample_db();
        let before = db.get(1).unwrap().updated().to_string();

        db.replace_secret(1, "blob-new".into()).unwrap();

        let record = db.get(1).unwrap();
        assert_eq!(record.secret(), "blob-new");
        assert!(record.updated() >= before.as_str());
    }

    #[test]
    fn remove_missing_id_fails() {
        let mut db = sample_db();
        db.remove(1).unwrap();
        assert!(matches!(db.remove(1), Err(VaultError::RecordNotFound(1))));
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut db = sample_db();
        db.remove(2).unwrap();
        let id = db.add("gitlab", "dev", "blob-c".into(), "").unwrap();
        assert_eq!(id, 3);
    }
}
