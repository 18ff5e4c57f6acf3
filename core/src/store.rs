use hashbrown::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::*;

/// Durable key-value storage for snapshots.
pub trait SnapshotStore {
    fn get(&self, key: &str) -> core::result::Result<Option<Snapshot>, StoreError>;
    fn set(&mut self, key: &str, snapshot: &Snapshot) -> core::result::Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> core::result::Result<(), StoreError>;
}

/// Decodes a stored entry, treating undecodable data as missing.
fn decode_entry(key: &str, json: &str) -> Option<Snapshot> {
    match Snapshot::from_json(json) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            log::warn!("Discarding undecodable snapshot {:?}: {}", key, err);
            None
        }
    }
}

/// Store kept in memory, entries are held as JSON like a browser's local storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes a raw entry, bypassing encoding.
    pub fn insert_raw(&mut self, key: impl Into<String>, json: impl Into<String>) {
        self.entries.insert(key.into(), json.into());
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> core::result::Result<Option<Snapshot>, StoreError> {
        Ok(self
            .entries
            .get(key)
            .and_then(|json| decode_entry(key, json)))
    }

    fn set(&mut self, key: &str, snapshot: &Snapshot) -> core::result::Result<(), StoreError> {
        self.entries.insert(key.to_owned(), snapshot.to_json()?);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> core::result::Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store writing one `<key>.json` file per entry into a directory.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Opens the store, creating `dir` when missing.
    pub fn open(dir: impl Into<PathBuf>) -> core::result::Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> core::result::Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SnapshotStore for JsonFileStore {
    fn get(&self, key: &str) -> core::result::Result<Option<Snapshot>, StoreError> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(json) => Ok(decode_entry(key, &json)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, snapshot: &Snapshot) -> core::result::Result<(), StoreError> {
        let path = self.entry_path(key)?;
        let json = snapshot.to_json()?;
        // stage then rename over the old entry
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, &path)?;
        log::trace!("Saved snapshot {:?} to {}", key, path.display());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> core::result::Result<(), StoreError> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        Snapshot {
            width: 9,
            height: 9,
            mine_count: 10,
            cell_bits: vec![(0, 1), (80, 6)],
            duration: 4_200,
        }
    }

    #[test]
    fn memory_store_round_trips_and_removes() {
        let mut store = MemoryStore::new();

        assert_eq!(store.get("board").unwrap(), None);
        store.set("board", &snapshot()).unwrap();
        store.set("board", &snapshot()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("board").unwrap(), Some(snapshot()));

        store.remove("board").unwrap();
        assert!(store.is_empty());
        store.remove("board").unwrap();
    }

    #[test]
    fn undecodable_entry_reads_as_missing() {
        let mut store = MemoryStore::new();
        store.insert_raw("board", "{not json");

        assert_eq!(store.get("board").unwrap(), None);
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::open(dir.path()).unwrap();

        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(
                store.set(key, &snapshot()),
                Err(StoreError::InvalidKey(_))
            ));
        }
        assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 0);
    }

    #[test]
    fn file_store_writes_one_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::open(dir.path().join("saves")).unwrap();

        assert_eq!(store.get("board").unwrap(), None);
        store.set("board", &snapshot()).unwrap();

        assert!(store.dir().join("board.json").is_file());
        assert_eq!(store.get("board").unwrap(), Some(snapshot()));

        store.remove("board").unwrap();
        store.remove("board").unwrap();
        assert_eq!(store.get("board").unwrap(), None);
    }
}
