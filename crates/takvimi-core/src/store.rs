//! Persisted JSON documents for extracted years and months.
//!
//! Entries never expire: a document is replaced only when the data manager
//! re-extracts its year. Reads that fail (I/O or malformed JSON) surface as
//! [`StoreError`] rather than being treated as misses, so a damaged cache is
//! noticed instead of silently re-extracted over.
//!
//! [`FsStore`] lays files out as `<root>/<year>.json` and
//! `<root>/<year>/<MM>.json` and writes through a temp file in the target
//! directory followed by a rename, so readers never observe a half-written
//! document. [`MemoryStore`] keeps the serialized bytes in a [`DashMap`] and is
//! what tests use.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::record::{Month, MonthDocument, Year, YearDocument, YearRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    Year(Year),
    Month(Year, Month),
}

impl CacheKey {
    pub fn year(&self) -> Year {
        match self {
            CacheKey::Year(y) | CacheKey::Month(y, _) => *y,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Year(y) => write!(f, "{y}"),
            CacheKey::Month(y, m) => write!(f, "{y}/{m}"),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("cache I/O error for {key}: {source}")]
    Io {
        key: String,
        source: Arc<std::io::Error>,
    },
    #[error("corrupt cache entry {key}: {message}")]
    Corrupt { key: String, message: String },
}

impl StoreError {
    fn io(key: impl ToString, err: std::io::Error) -> Self {
        StoreError::Io {
            key: key.to_string(),
            source: Arc::new(err),
        }
    }

    fn corrupt(key: impl ToString, err: impl fmt::Display) -> Self {
        StoreError::Corrupt {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

/// Raw document storage keyed by [`CacheKey`].
///
/// `read` returns `Ok(None)` only when the entry does not exist.
pub trait CacheStore: Send + Sync {
    fn read(&self, key: CacheKey) -> Result<Option<Vec<u8>>, StoreError>;
    fn write(&self, key: CacheKey, bytes: &[u8]) -> Result<(), StoreError>;
    /// Every stored key, sorted.
    fn keys(&self) -> Result<Vec<CacheKey>, StoreError>;
}

/// Typed accessors over a [`CacheStore`].
pub trait CacheStoreExt: CacheStore {
    fn read_year(&self, year: Year) -> Result<Option<YearDocument>, StoreError> {
        let key = CacheKey::Year(year);
        self.read(key)?
            .map(|bytes| serde_json::from_slice(&bytes).map_err(|e| StoreError::corrupt(key, e)))
            .transpose()
    }

    fn read_month(&self, year: Year, month: Month) -> Result<Option<MonthDocument>, StoreError> {
        let key = CacheKey::Month(year, month);
        self.read(key)?
            .map(|bytes| serde_json::from_slice(&bytes).map_err(|e| StoreError::corrupt(key, e)))
            .transpose()
    }

    fn write_year(&self, doc: &YearDocument) -> Result<(), StoreError> {
        let year: Year = doc
            .year
            .parse()
            .map_err(|e| StoreError::corrupt(&doc.year, e))?;
        let key = CacheKey::Year(year);
        let bytes = serde_json::to_vec(doc).map_err(|e| StoreError::corrupt(key, e))?;
        self.write(key, &bytes)
    }

    fn write_month(&self, doc: &MonthDocument) -> Result<(), StoreError> {
        let year: Year = doc
            .year
            .parse()
            .map_err(|e| StoreError::corrupt(&doc.year, e))?;
        let month = Month::parse_key(&doc.month)
            .ok_or_else(|| StoreError::corrupt(&doc.month, "invalid month key"))?;
        let key = CacheKey::Month(year, month);
        let bytes = serde_json::to_vec(doc).map_err(|e| StoreError::corrupt(key, e))?;
        self.write(key, &bytes)
    }

    /// Write the year document, then one document per month.
    fn persist_year(&self, year: Year, record: &YearRecord) -> Result<(), StoreError> {
        self.write_year(&YearDocument::new(year, record.clone()))?;
        for (month, data) in record.months() {
            self.write_month(&MonthDocument::new(year, month, data.clone()))?;
        }
        Ok(())
    }
}

impl<T: CacheStore + ?Sized> CacheStoreExt for T {}

/// JSON files under a root directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: CacheKey) -> PathBuf {
        match key {
            CacheKey::Year(y) => self.root.join(format!("{y}.json")),
            CacheKey::Month(y, m) => self.root.join(y.to_string()).join(format!("{m}.json")),
        }
    }
}

impl CacheStore for FsStore {
    fn read(&self, key: CacheKey) -> Result<Option<Vec<u8>>, StoreError> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    fn write(&self, key: CacheKey, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let dir = path.parent().unwrap_or(&self.root);
        std::fs::create_dir_all(dir).map_err(|e| StoreError::io(key, e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(key, e))?;
        tmp.write_all(bytes).map_err(|e| StoreError::io(key, e))?;
        tmp.as_file().sync_all().map_err(|e| StoreError::io(key, e))?;
        tmp.persist(&path).map_err(|e| StoreError::io(key, e.error))?;
        tracing::debug!(key = %key, path = %path.display(), "cache entry written");
        Ok(())
    }

    fn keys(&self) -> Result<Vec<CacheKey>, StoreError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(self.root.display(), e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(self.root.display(), e))?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if path.is_dir() {
                let Ok(year) = name.parse::<Year>() else {
                    continue;
                };
                let months =
                    std::fs::read_dir(&path).map_err(|e| StoreError::io(path.display(), e))?;
                for month in months {
                    let month = month.map_err(|e| StoreError::io(path.display(), e))?;
                    let file = month.file_name();
                    if let Some(m) = file
                        .to_str()
                        .and_then(|f| f.strip_suffix(".json"))
                        .and_then(Month::parse_key)
                    {
                        keys.push(CacheKey::Month(year, m));
                    }
                }
            } else if let Some(year) = name.strip_suffix(".json").and_then(|y| y.parse().ok()) {
                keys.push(CacheKey::Year(year));
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<CacheKey, Vec<u8>>,
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

    /// Store raw bytes, bypassing serialization. Useful for planting corrupt
    /// entries.
    pub fn insert_raw(&self, key: CacheKey, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(key, bytes.into());
    }
}

impl CacheStore for MemoryStore {
    fn read(&self, key: CacheKey) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(&key).map(|v| v.clone()))
    }

    fn write(&self, key: CacheKey, bytes: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(key, bytes.to_vec());
        Ok(())
    }

    fn keys(&self) -> Result<Vec<CacheKey>, StoreError> {
        let mut keys: Vec<CacheKey> = self.entries.iter().map(|e| *e.key()).collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MonthRecord;
    use std::sync::Mutex;

    /// Remembers the order of writes.
    #[derive(Default)]
    struct RecordingStore {
        writes: Mutex<Vec<CacheKey>>,
    }

    impl CacheStore for RecordingStore {
        fn read(&self, _key: CacheKey) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(None)
        }

        fn write(&self, key: CacheKey, _bytes: &[u8]) -> Result<(), StoreError> {
            self.writes.lock().unwrap().push(key);
            Ok(())
        }

        fn keys(&self) -> Result<Vec<CacheKey>, StoreError> {
            Ok(self.writes.lock().unwrap().clone())
        }
    }

    #[test]
    fn persist_writes_year_before_months() {
        let mut record = YearRecord::new();
        record.insert(Month::DECEMBER, MonthRecord::default());
        record.insert(Month::JANUARY, MonthRecord::default());

        let store = RecordingStore::default();
        store.persist_year(2025, &record).unwrap();
        assert_eq!(
            *store.writes.lock().unwrap(),
            vec![
                CacheKey::Year(2025),
                CacheKey::Month(2025, Month::JANUARY),
                CacheKey::Month(2025, Month::DECEMBER),
            ]
        );
    }

    #[test]
    fn fs_store_layout_and_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        assert!(store.keys().unwrap().is_empty());

        store
            .write_year(&YearDocument::new(2025, YearRecord::new()))
            .unwrap();
        store
            .write_month(&MonthDocument::new(2025, Month::JANUARY, MonthRecord::default()))
            .unwrap();

        assert!(dir.path().join("2025.json").is_file());
        assert!(dir.path().join("2025").join("01.json").is_file());
        assert_eq!(
            store.keys().unwrap(),
            vec![CacheKey::Year(2025), CacheKey::Month(2025, Month::JANUARY)]
        );

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("2025"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "01.json")
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind");
    }

    #[test]
    fn missing_entry_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path().join("absent"));
        assert!(store.read_year(2030).unwrap().is_none());
        assert!(store.read_month(2030, Month::DECEMBER).unwrap().is_none());
    }

    #[test]
    fn corrupt_entry_is_an_error() {
        let store = MemoryStore::new();
        store.insert_raw(CacheKey::Year(2025), "{not json");
        let err = store.read_year(2025).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn month_key_display() {
        assert_eq!(CacheKey::Month(2025, Month::FEBRUARY).to_string(), "2025/02");
        assert_eq!(CacheKey::Year(2025).to_string(), "2025");
    }
}
