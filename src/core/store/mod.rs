//! core::store
//!
//! The authoritative key-value mapping and its indexes.
//!
//! # Architecture
//!
//! [`KeyValueStore`] owns:
//! - the key to value mapping (ordered, so documents and snapshots are deterministic)
//! - an [`OrderedIndex`] over keys and one over values
//! - named custom indexes derived from values by caller-supplied functions
//! - the path of its persisted document
//!
//! Every public operation holds one internal mutex for its whole duration,
//! so batches are never observed half-applied. The indexes have no lock of
//! their own and are only touched under this one.
//!
//! # Invariants
//!
//! - Every live key is present in the key index
//! - Every live value is present in the value index (possibly more than once)
//! - Value index entries are not removed with their key; the key index only
//!   forgets keys held by its root (see [`crate::core::index`])
//!
//! # Example
//!
//! ```
//! use verdant::core::store::KeyValueStore;
//!
//! let store = KeyValueStore::new("data/example.json");
//! store.insert("user:1", "alice");
//! store.insert("user:2", "bob");
//!
//! assert_eq!(store.get("user:1").as_deref(), Some("alice"));
//! assert_eq!(store.query_by_prefix("user:").len(), 2);
//! ```

pub mod document;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::core::index::OrderedIndex;
use crate::core::lock::LockError;
pub use document::Mapping;

/// Errors from store persistence and queries.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store document '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write store document '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("store document '{path}' does not exist")]
    Missing { path: PathBuf },

    #[error("malformed store document '{path}': {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("invalid value pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Derives an index value from a stored value.
pub type Indexer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// One entry of a named index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// The store key.
    pub key: String,
    /// The indexer's output for the key's value.
    pub value: String,
}

struct NamedIndex {
    indexer: Indexer,
    entries: Vec<IndexEntry>,
}

impl NamedIndex {
    fn upsert(&mut self, key: &str, value: &str) {
        let derived = (self.indexer)(value);
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.value = derived,
            None => self.entries.push(IndexEntry {
                key: key.to_string(),
                value: derived,
            }),
        }
    }

    fn remove(&mut self, key: &str) {
        self.entries.retain(|e| e.key != key);
    }
}

struct StoreState {
    path: PathBuf,
    data: Mapping,
    key_index: OrderedIndex,
    value_index: OrderedIndex,
    indexes: BTreeMap<String, NamedIndex>,
}

impl StoreState {
    fn insert(&mut self, key: &str, value: &str) {
        self.data.insert(key.to_string(), value.to_string());
        self.key_index.insert(key);
        self.value_index.insert(value);
        for index in self.indexes.values_mut() {
            index.upsert(key, value);
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        if self.data.remove(key).is_none() {
            return false;
        }
        self.key_index.remove(key);
        for index in self.indexes.values_mut() {
            index.remove(key);
        }
        true
    }

    fn clear(&mut self) {
        self.data.clear();
        self.key_index.clear();
        self.value_index.clear();
        for index in self.indexes.values_mut() {
            index.entries.clear();
        }
    }

    fn rebuild_indexes(&mut self) {
        self.key_index.rebuild(self.data.keys().cloned());
        self.value_index.rebuild(self.data.values().cloned());
        for index in self.indexes.values_mut() {
            index.entries = self
                .data
                .iter()
                .map(|(key, value)| IndexEntry {
                    key: key.clone(),
                    value: (index.indexer)(value),
                })
                .collect();
        }
    }

    /// Replace the mapping with the target document, if it exists.
    fn load(&mut self) -> Result<bool, StoreError> {
        let Some(mapping) = document::read_document(&self.path)? else {
            return Ok(false);
        };
        self.data = mapping;
        self.rebuild_indexes();
        debug!(path = %self.path.display(), entries = self.data.len(), "loaded store");
        Ok(true)
    }
}

/// The key-value store.
pub struct KeyValueStore {
    state: Mutex<StoreState>,
}

impl std::fmt::Debug for KeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("KeyValueStore")
            .field("path", &state.path)
            .field("entries", &state.data.len())
            .finish_non_exhaustive()
    }
}

impl KeyValueStore {
    /// Create an empty store persisted at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                path: path.into(),
                data: Mapping::new(),
                key_index: OrderedIndex::default(),
                value_index: OrderedIndex::default(),
                indexes: BTreeMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // A panic mid-operation leaves plain collections behind; keep serving.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Basic operations
    // =========================================================================

    /// Insert or update a record.
    pub fn insert(&self, key: &str, value: &str) {
        self.lock().insert(key, value);
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().data.get(key).cloned()
    }

    /// Remove a record. Returns whether the key was present.
    ///
    /// Removing a key held by an internal root node of the key index
    /// rebuilds that index (see [`OrderedIndex::remove`]).
    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key)
    }

    /// Number of records.
    pub fn size(&self) -> usize {
        self.lock().data.len()
    }

    /// A full copy of the mapping.
    pub fn snapshot(&self) -> Mapping {
        self.lock().data.clone()
    }

    /// How many keys hold each distinct value.
    pub fn value_distribution(&self) -> HashMap<String, usize> {
        let state = self.lock();
        let mut distribution = HashMap::new();
        for value in state.data.values() {
            *distribution.entry(value.clone()).or_insert(0) += 1;
        }
        distribution
    }

    // =========================================================================
    // Scans over the live mapping
    // =========================================================================

    /// Keys whose record satisfies `predicate(key, value)`.
    pub fn query(&self, predicate: impl Fn(&str, &str) -> bool) -> Vec<String> {
        self.lock()
            .data
            .iter()
            .filter(|(k, v)| predicate(k, v))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Keys starting with `prefix`.
    pub fn query_by_prefix(&self, prefix: &str) -> Vec<String> {
        self.query(|key, _| key.starts_with(prefix))
    }

    /// Keys whose value equals `value`.
    pub fn query_by_value(&self, value: &str) -> Vec<String> {
        self.query(|_, v| v == value)
    }

    /// Keys whose value matches the regular expression `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Pattern`] if `pattern` does not compile.
    pub fn query_by_value_pattern(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let re = Regex::new(pattern)?;
        Ok(self.query(|_, v| re.is_match(v)))
    }

    // =========================================================================
    // B-Tree lookups (may include stale entries)
    // =========================================================================

    /// Keys in the key index starting with `prefix`.
    pub fn query_by_prefix_btree(&self, prefix: &str) -> Vec<String> {
        self.lock().key_index.range_search(prefix)
    }

    /// Values in the value index starting with `value`.
    pub fn query_by_value_btree(&self, value: &str) -> Vec<String> {
        self.lock().value_index.range_search(value)
    }

    /// In-order dump of the key index.
    pub fn key_index_dump(&self) -> Vec<String> {
        self.lock().key_index.traverse()
    }

    /// In-order dump of the value index.
    pub fn value_index_dump(&self) -> Vec<String> {
        self.lock().value_index.traverse()
    }

    /// Rebuild both B-Trees and every named index from the live mapping,
    /// dropping stale entries.
    pub fn rebuild_indexes(&self) {
        self.lock().rebuild_indexes();
    }

    // =========================================================================
    // Named indexes
    // =========================================================================

    /// Register a named index populated from the current mapping.
    ///
    /// Returns `false` if an index with that name already exists.
    pub fn create_index(
        &self,
        name: &str,
        indexer: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> bool {
        let mut state = self.lock();
        if state.indexes.contains_key(name) {
            return false;
        }

        let indexer: Indexer = Arc::new(indexer);
        let entries = state
            .data
            .iter()
            .map(|(key, value)| IndexEntry {
                key: key.clone(),
                value: indexer(value),
            })
            .collect();
        state
            .indexes
            .insert(name.to_string(), NamedIndex { indexer, entries });
        true
    }

    /// Keys whose derived index value equals `value`. Empty for unknown indexes.
    pub fn query_by_index(&self, name: &str, value: &str) -> Vec<String> {
        self.lock()
            .indexes
            .get(name)
            .map(|index| {
                index
                    .entries
                    .iter()
                    .filter(|e| e.value == value)
                    .map(|e| e.key.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names of the registered indexes.
    pub fn index_names(&self) -> Vec<String> {
        self.lock().indexes.keys().cloned().collect()
    }

    // =========================================================================
    // Batches
    // =========================================================================

    /// Insert every entry under one lock acquisition.
    pub fn batch_insert<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut state = self.lock();
        for (key, value) in entries {
            state.insert(key.as_ref(), value.as_ref());
        }
    }

    /// Remove every key under one lock acquisition. Returns how many existed.
    pub fn batch_remove<K: AsRef<str>>(&self, keys: impl IntoIterator<Item = K>) -> usize {
        let mut state = self.lock();
        keys.into_iter()
            .filter(|key| state.remove(key.as_ref()))
            .count()
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// The document this store reads and writes.
    pub fn file_path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    /// Clear everything, bind to `new_path`, and load it if it exists.
    ///
    /// Returns whether a document was loaded.
    pub fn reset(&self, new_path: impl Into<PathBuf>) -> Result<bool, StoreError> {
        let mut state = self.lock();
        state.path = new_path.into();
        state.clear();
        state.load()
    }

    /// Replace the mapping with the persisted document.
    ///
    /// Returns `Ok(false)` (leaving the store untouched) if the document
    /// does not exist yet.
    pub fn load(&self) -> Result<bool, StoreError> {
        self.lock().load()
    }

    /// Persist the mapping to the store's document.
    pub fn save(&self) -> Result<(), StoreError> {
        let state = self.lock();
        document::write_document(&state.path, &state.data)?;
        debug!(path = %state.path.display(), entries = state.data.len(), "saved store");
        Ok(())
    }

    /// Write the mapping to an arbitrary path.
    pub fn export_to(&self, path: &Path) -> Result<(), StoreError> {
        let state = self.lock();
        document::write_document(path, &state.data)
    }

    /// Read a document from `path` into the store.
    ///
    /// With `merge` the entries overlay the current mapping; without it they
    /// replace it. Every index is rebuilt afterwards.
    pub fn import_from(&self, path: &Path, merge: bool) -> Result<usize, StoreError> {
        let mapping = document::read_document(path)?.ok_or_else(|| StoreError::Missing {
            path: path.to_path_buf(),
        })?;

        let mut state = self.lock();
        if !merge {
            state.data.clear();
        }
        let count = mapping.len();
        state.data.extend(mapping);
        state.rebuild_indexes();
        debug!(path = %path.display(), count, merge, "imported store document");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir) -> KeyValueStore {
        KeyValueStore::new(temp.path().join("db.json"))
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn insert_get_remove() {
        let store = KeyValueStore::new("unused.json");
        store.insert("a", "1");
        assert_eq!(store.get("a").as_deref(), Some("1"));

        store.insert("a", "2");
        assert_eq!(store.get("a").as_deref(), Some("2"));
        assert_eq!(store.size(), 1);

        assert!(store.remove("a"));
        assert_eq!(store.get("a"), None);
        assert!(!store.remove("a"));
    }

    #[test]
    fn missing_key_is_none() {
        let store = KeyValueStore::new("unused.json");
        assert_eq!(store.get("nope"), None);
    }

    #[test]
    fn scans_follow_live_mapping() {
        let store = KeyValueStore::new("unused.json");
        store.insert("user:1", "alice");
        store.insert("user:2", "bob");
        store.insert("order:1", "alice");

        assert_eq!(
            sorted(store.query_by_prefix("user:")),
            vec!["user:1", "user:2"]
        );
        assert_eq!(
            sorted(store.query_by_value("alice")),
            vec!["order:1", "user:1"]
        );
        assert_eq!(store.query_by_value_pattern("^b.b$").unwrap(), vec!["user:2"]);

        store.remove("user:1");
        assert_eq!(store.query_by_prefix("user:"), vec!["user:2"]);
    }

    #[test]
    fn invalid_pattern_is_error() {
        let store = KeyValueStore::new("unused.json");
        assert!(matches!(
            store.query_by_value_pattern("("),
            Err(StoreError::Pattern(_))
        ));
    }

    #[test]
    fn predicate_query() {
        let store = KeyValueStore::new("unused.json");
        store.insert("a", "10");
        store.insert("b", "200");
        let long = store.query(|_, v| v.len() > 2);
        assert_eq!(long, vec!["b"]);
    }

    #[test]
    fn btree_queries_reflect_inserts() {
        let store = KeyValueStore::new("unused.json");
        store.insert("apple", "red");
        store.insert("app", "blue");
        store.insert("apply", "reddish");

        assert_eq!(
            sorted(store.query_by_prefix_btree("app")),
            vec!["app", "apple", "apply"]
        );
        assert_eq!(
            sorted(store.query_by_value_btree("red")),
            vec!["red", "reddish"]
        );
    }

    #[test]
    fn value_index_keeps_stale_values_until_rebuild() {
        let store = KeyValueStore::new("unused.json");
        store.insert("k", "old");
        store.insert("k", "new");
        assert_eq!(store.query_by_value_btree("old"), vec!["old"]);

        store.rebuild_indexes();
        assert!(store.query_by_value_btree("old").is_empty());
        assert_eq!(store.value_index_dump(), vec!["new"]);
    }

    #[test]
    fn root_level_key_removal_is_reflected() {
        let store = KeyValueStore::new("unused.json");
        store.insert("solo", "v");
        assert!(store.remove("solo"));
        assert!(store.query_by_prefix_btree("solo").is_empty());
        assert!(store.key_index_dump().is_empty());
    }

    #[test]
    fn named_index_is_maintained_incrementally() {
        let store = KeyValueStore::new("unused.json");
        store.insert("u1", "Alice");
        assert!(store.create_index("lower", |v| v.to_lowercase()));
        assert!(!store.create_index("lower", |v| v.to_string()));

        store.insert("u2", "ALICE");
        store.insert("u3", "bob");
        assert_eq!(sorted(store.query_by_index("lower", "alice")), vec!["u1", "u2"]);

        store.insert("u2", "Carol");
        assert_eq!(store.query_by_index("lower", "alice"), vec!["u1"]);
        assert_eq!(store.query_by_index("lower", "carol"), vec!["u2"]);

        store.remove("u1");
        assert!(store.query_by_index("lower", "alice").is_empty());
        assert!(store.query_by_index("missing", "alice").is_empty());
        assert_eq!(store.index_names(), vec!["lower"]);
    }

    #[test]
    fn batches() {
        let store = KeyValueStore::new("unused.json");
        store.batch_insert([("a", "1"), ("b", "2"), ("c", "3")]);
        assert_eq!(store.size(), 3);

        let removed = store.batch_remove(["a", "c", "zzz"]);
        assert_eq!(removed, 2);
        assert_eq!(store.snapshot().into_keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn value_distribution_counts() {
        let store = KeyValueStore::new("unused.json");
        store.batch_insert([("a", "x"), ("b", "x"), ("c", "y")]);
        let dist = store.value_distribution();
        assert_eq!(dist["x"], 2);
        assert_eq!(dist["y"], 1);
    }

    #[test]
    fn save_then_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.insert("user:1", "alice");
        store.insert("config", r#"{"debug":true}"#);
        store.save().unwrap();

        let reloaded = store_in(&temp);
        assert!(reloaded.load().unwrap());
        assert_eq!(reloaded.snapshot(), store.snapshot());
        assert_eq!(reloaded.key_index_dump(), vec!["config", "user:1"]);
    }

    #[test]
    fn load_missing_file_is_false() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.insert("keep", "me");
        assert!(!store.load().unwrap());
        assert_eq!(store.get("keep").as_deref(), Some("me"));
    }

    #[test]
    fn load_rebuilds_indexes_from_scratch() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.insert("a", "1");
        store.save().unwrap();
        store.insert("b", "2");

        assert!(store.load().unwrap());
        assert_eq!(store.key_index_dump(), vec!["a"]);
        assert_eq!(store.value_index_dump(), vec!["1"]);
    }

    #[test]
    fn reset_rebinds_and_reloads() {
        let temp = TempDir::new().unwrap();
        let other = temp.path().join("other.json");
        let seed = KeyValueStore::new(&other);
        seed.insert("from", "other");
        seed.save().unwrap();

        let store = store_in(&temp);
        store.insert("stale", "x");
        assert!(store.reset(&other).unwrap());
        assert_eq!(store.file_path(), other);
        assert_eq!(store.get("stale"), None);
        assert_eq!(store.get("from").as_deref(), Some("other"));
        assert_eq!(store.key_index_dump(), vec!["from"]);
    }

    #[test]
    fn reset_to_missing_target_clears() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.insert("a", "1");
        assert!(!store.reset(temp.path().join("fresh.json")).unwrap());
        assert_eq!(store.size(), 0);
        assert!(store.key_index_dump().is_empty());
    }

    #[test]
    fn import_replace_and_merge() {
        let temp = TempDir::new().unwrap();
        let export = temp.path().join("export.json");

        let source = KeyValueStore::new("unused.json");
        source.batch_insert([("a", "1"), ("b", "2")]);
        source.export_to(&export).unwrap();

        let store = store_in(&temp);
        store.batch_insert([("b", "old"), ("z", "26")]);
        assert_eq!(store.import_from(&export, true).unwrap(), 2);
        assert_eq!(store.get("b").as_deref(), Some("2"));
        assert_eq!(store.get("z").as_deref(), Some("26"));

        store.import_from(&export, false).unwrap();
        assert_eq!(store.get("z"), None);
        assert_eq!(store.key_index_dump(), vec!["a", "b"]);
    }

    #[test]
    fn import_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        assert!(matches!(
            store.import_from(&temp.path().join("nope.json"), false),
            Err(StoreError::Missing { .. })
        ));
    }
}
