//! Profile persistence: the `ProfileStore` seam and the local JSON-file backend.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::profiles::models::ToneProfile;

#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("Invalid profile id: {0}")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Profile JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Remote store error: {0}")]
    Remote(String),
}

/// Keyed store of tone profiles. Profile ids double as file names, so they are
/// restricted to ASCII letters, digits, `-` and `_`.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// id → display name.
    async fn list(&self) -> Result<BTreeMap<String, String>, ProfileStoreError>;
    async fn load(&self, id: &str) -> Result<Option<ToneProfile>, ProfileStoreError>;
    async fn save(&self, id: &str, profile: &ToneProfile) -> Result<(), ProfileStoreError>;
    async fn delete(&self, id: &str) -> Result<(), ProfileStoreError>;
}

pub fn validate_id(id: &str) -> Result<(), ProfileStoreError> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ProfileStoreError::InvalidId(id.to_string()))
    }
}

/// Display name for the client list: the profile's name, else its id.
pub fn list_label(id: &str, profile: Option<&ToneProfile>) -> String {
    profile
        .map(|p| p.display_label(id).to_string())
        .unwrap_or_else(|| id.to_string())
}

/// One pretty-printed `<id>.json` per profile inside a directory.
pub struct FileProfileStore {
    dir: PathBuf,
}

impl FileProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, ProfileStoreError> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{id}.json")))
    }
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn list(&self) -> Result<BTreeMap<String, String>, ProfileStoreError> {
        let mut profiles = BTreeMap::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(profiles),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let profile = match tokio::fs::read(&path).await {
                Ok(bytes) => serde_json::from_slice::<ToneProfile>(&bytes)
                    .map_err(|e| warn!("Unreadable profile {}: {e}", path.display()))
                    .ok(),
                Err(e) => {
                    warn!("Failed to read {}: {e}", path.display());
                    None
                }
            };
            let label = list_label(&id, profile.as_ref());
            profiles.insert(id, label);
        }
        Ok(profiles)
    }

    async fn load(&self, id: &str) -> Result<Option<ToneProfile>, ProfileStoreError> {
        let path = self.path_for(id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, id: &str, profile: &ToneProfile) -> Result<(), ProfileStoreError> {
        let path = self.path_for(id)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec_pretty(profile)?;
        tokio::fs::write(&path, json).await?;
        info!("Saved profile {id} to {}", path.display());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), ProfileStoreError> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted profile {id}");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> ToneProfile {
        ToneProfile {
            name: name.to_string(),
            brand_name: "toutvert".to_string(),
            ..ToneProfile::default()
        }
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("toutvert").is_ok());
        assert!(validate_id("brand_abc-2").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("../secrets").is_err());
        assert!(validate_id("a b").is_err());
    }

    #[tokio::test]
    async fn test_save_load_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProfileStore::new(dir.path().join("clients"));

        assert!(store.list().await.unwrap().is_empty());
        assert!(store.load("toutvert").await.unwrap().is_none());

        store.save("toutvert", &profile("Tout Vert")).await.unwrap();
        store.save("unnamed", &profile("")).await.unwrap();

        let loaded = store.load("toutvert").await.unwrap().unwrap();
        assert_eq!(loaded, profile("Tout Vert"));

        let listed = store.list().await.unwrap();
        assert_eq!(listed.get("toutvert").map(String::as_str), Some("Tout Vert"));
        assert_eq!(listed.get("unnamed").map(String::as_str), Some("unnamed"));

        store.delete("toutvert").await.unwrap();
        assert!(store.load("toutvert").await.unwrap().is_none());
        // deleting twice is fine
        store.delete("toutvert").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProfileStore::new(dir.path());
        let err = store.save("../escape", &profile("x")).await.unwrap_err();
        assert!(matches!(err, ProfileStoreError::InvalidId(_)));
    }

    #[tokio::test]
    async fn test_list_skips_non_json_and_tolerates_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("readme.txt"), "hi").await.unwrap();
        tokio::fs::write(dir.path().join("broken.json"), "{").await.unwrap();

        let store = FileProfileStore::new(dir.path());
        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed.get("broken").map(String::as_str), Some("broken"));
    }
}
