use std::fs;
use std::path::{Path, PathBuf};

use crate::error::TrackerError;

/// Audit-trail screenshots: one PNG per successful observation, named by
/// epoch second and site key. Nothing reads these back; no retention policy.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the snapshot directory iff absent. Idempotent.
    pub fn ensure_initialized(&self) -> Result<(), TrackerError> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn store(&self, epoch_secs: i64, site: &str, png: &[u8]) -> Result<PathBuf, TrackerError> {
        let path = self.dir.join(format!("{}_{}.png", epoch_secs, site));
        fs::write(&path, png)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_initialized_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("snapshots"));

        store.ensure_initialized().unwrap();
        store.ensure_initialized().unwrap();
        assert!(store.dir().is_dir());
    }

    #[test]
    fn test_store_writes_named_png() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("snapshots"));
        store.ensure_initialized().unwrap();

        let path = store
            .store(1714559400, "books_to_scrape", b"\x89PNG fake bytes")
            .unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "1714559400_books_to_scrape.png"
        );
        assert_eq!(fs::read(&path).unwrap(), b"\x89PNG fake bytes");
    }

    #[test]
    fn test_store_without_directory_fails() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("missing/snapshots"));

        let result = store.store(1714559400, "books_to_scrape", b"png");
        assert!(matches!(result, Err(TrackerError::Io(_))));
    }
}
