use super::archive::{decompress_and_deserialize, serialize_and_compress, Archive};
use super::error::SaveError;
use super::format::SnapshotBlobs;
use std::fs::{remove_file, rename, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// "Save current state / load last state" collaborator.
pub trait SnapshotStore: Send {
    fn save(&mut self, blobs: &SnapshotBlobs) -> Result<(), SaveError>;

    /// `Ok(None)` when nothing was ever saved.
    fn load(&self) -> Result<Option<SnapshotBlobs>, SaveError>;

    fn clear(&mut self) -> Result<(), SaveError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    last: Option<SnapshotBlobs>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves, for hosts and tests that watch cadence.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl SnapshotStore for MemoryStore {
    fn save(&mut self, blobs: &SnapshotBlobs) -> Result<(), SaveError> {
        self.last = Some(blobs.clone());
        self.saves += 1;
        Ok(())
    }

    fn load(&self) -> Result<Option<SnapshotBlobs>, SaveError> {
        Ok(self.last.clone())
    }

    fn clear(&mut self) -> Result<(), SaveError> {
        self.last = None;
        Ok(())
    }
}

/// Archive file on disk, written atomically (temp file + rename).
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/lineup_game.dat`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join("lineup_game.dat"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl SnapshotStore for FileStore {
    fn save(&mut self, blobs: &SnapshotBlobs) -> Result<(), SaveError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = serialize_and_compress(&Archive::new(blobs.clone()))?;
        let temp_path = self.path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&data)?;
            file.flush()?;
            file.sync_all()?;
        }
        rename(&temp_path, &self.path)?;

        log::debug!("Saved {} bytes to {:?}", data.len(), self.path);
        Ok(())
    }

    fn load(&self) -> Result<Option<SnapshotBlobs>, SaveError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut data = Vec::new();
        File::open(&self.path)?.read_to_end(&mut data)?;
        let archive = decompress_and_deserialize(&data)?;

        log::debug!("Loaded {} bytes from {:?}", data.len(), self.path);
        Ok(Some(archive.blobs))
    }

    fn clear(&mut self) -> Result<(), SaveError> {
        if self.path.exists() {
            remove_file(&self.path)?;
            log::info!("Deleted saved game {:?}", self.path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn blobs() -> SnapshotBlobs {
        let mut blobs = SnapshotBlobs::new();
        blobs.insert("clock.v1", br#"{"duration_seconds":600,"remaining_seconds":42}"#.to_vec());
        blobs
    }

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::in_dir(temp_dir.path().join("nested"));

        assert_eq!(store.load().unwrap(), None);
        store.save(&blobs()).unwrap();
        assert_eq!(store.load().unwrap(), Some(blobs()));
        assert!(!store.path().with_extension("tmp").exists());

        store.clear().unwrap();
        assert!(!store.exists());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::in_dir(temp_dir.path());
        store.save(&blobs()).unwrap();
        std::fs::write(store.path(), b"definitely not an archive, long enough to pass the size check")
            .unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, SaveError::ChecksumMismatch));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let mut store = MemoryStore::new();
        store.save(&blobs()).unwrap();
        store.save(&blobs()).unwrap();
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.load().unwrap(), Some(blobs()));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
