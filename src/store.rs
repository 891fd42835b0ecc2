// ! JSON-file user store
// !
// ! Thin persistence collaborator behind the user capability set. Records
// ! live in one JSON document (an array), read in full and rewritten in full
// ! on every create; a mutex serializes writers so the append is atomic
// ! relative to other writers. Ids are assigned as `count + 1` and records
// ! are never mutated or deleted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::core::error::{CapError, CapResult};

/// A stored user record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    /// Positive, unique, monotonically assigned
    pub id: u64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
}

/// Field set for a record about to be created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
}

/// The external user collection, backed by a single JSON file
pub struct UserStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl UserStore {
    /// Open a store at the given path. The file is created lazily on the
    /// first append; a missing file reads as an empty collection.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full collection
    pub async fn list(&self) -> CapResult<Vec<UserRecord>> {
        read_records(&self.path).await
    }

    /// Look up one record by id
    pub async fn get(&self, id: u64) -> CapResult<Option<UserRecord>> {
        let records = self.list().await?;
        Ok(records.into_iter().find(|r| r.id == id))
    }

    /// Append a record, assigning `id = count + 1`, and return the new id.
    ///
    /// The read-mutate-write cycle runs under the store's lock, so two
    /// appends can never observe the same count.
    pub async fn append(&self, new_user: NewUser) -> CapResult<u64> {
        let _guard = self.write_lock.lock().await;

        let mut records = read_records(&self.path).await?;
        let id = records.len() as u64 + 1;
        records.push(UserRecord {
            id,
            name: new_user.name,
            email: new_user.email,
            address: new_user.address,
            phone: new_user.phone,
        });

        write_records(&self.path, &records).await?;
        tracing::debug!(id, path = %self.path.display(), "appended user record");
        Ok(id)
    }
}

async fn read_records(path: &Path) -> CapResult<Vec<UserRecord>> {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(CapError::persistence(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };

    serde_json::from_str(&data).map_err(|e| {
        CapError::persistence(format!("failed to parse {}: {e}", path.display()))
    })
}

async fn write_records(path: &Path, records: &[UserRecord]) -> CapResult<()> {
    let data = serde_json::to_string_pretty(records)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                CapError::persistence(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
    }

    // Write to a sibling temp file and rename so readers never see a torn
    // document.
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, data).await.map_err(|e| {
        CapError::persistence(format!("failed to write {}: {e}", tmp.display()))
    })?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| {
        CapError::persistence(format!("failed to replace {}: {e}", path.display()))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            address: "1 Main".to_string(),
            phone: "555".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = UserStore::new(dir.path().join("users.json"));
        assert!(store.list().await.unwrap().is_empty());
        assert_eq!(store.get(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_append_assigns_monotonic_ids() {
        let dir = TempDir::new().unwrap();
        let store = UserStore::new(dir.path().join("users.json"));

        assert_eq!(store.append(new_user("Ada")).await.unwrap(), 1);
        assert_eq!(store.append(new_user("Grace")).await.unwrap(), 2);
        assert_eq!(store.append(new_user("Edsger")).await.unwrap(), 3);

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "Ada");
        assert_eq!(records[2].id, 3);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let dir = TempDir::new().unwrap();
        let store = UserStore::new(dir.path().join("users.json"));
        store.append(new_user("Ada")).await.unwrap();

        let record = store.get(1).await.unwrap().unwrap();
        assert_eq!(record.name, "Ada");
        assert_eq!(record.email, "ada@example.com");
        assert_eq!(store.get(99).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rewrite_preserves_existing_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");

        {
            let store = UserStore::new(&path);
            store.append(new_user("Ada")).await.unwrap();
        }
        // Reopen: the document on disk is the source of truth
        let store = UserStore::new(&path);
        assert_eq!(store.append(new_user("Grace")).await.unwrap(), 2);
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = UserStore::new(&path);
        let err = store.list().await.unwrap_err();
        assert!(matches!(err, CapError::Persistence(_)));

        let err = store.append(new_user("Ada")).await.unwrap_err();
        assert!(matches!(err, CapError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_concurrent_appends_never_share_an_id() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(UserStore::new(dir.path().join("users.json")));

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append(new_user(&format!("user{i}"))).await.unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=8).collect::<Vec<u64>>());
    }
}
