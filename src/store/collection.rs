use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{MirrorDnaError, Result};

/// A stored record: an arbitrary JSON object keyed by its collection's
/// identity field.
pub type Record = serde_json::Map<String, Value>;

type Collection = BTreeMap<String, Record>;

/// Document store persisting one JSON file per collection.
///
/// Every mutation loads the whole collection, applies the change, and
/// rewrites the file. The store is single-writer by contract: concurrent
/// writers race on the whole-document rewrite and the last one wins.
/// Callers needing concurrent access must serialize it externally.
pub struct CollectionStore {
    root: PathBuf,
}

impl CollectionStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Opens the default store at `~/.mirrordna/data`.
    pub fn open_default() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            MirrorDnaError::NotFound("home directory for default storage root".to_string())
        })?;
        Self::open(home.join(".mirrordna").join("data"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The identity field a collection keys its records on.
    pub fn id_field(collection: &str) -> &'static str {
        match collection {
            "identities" => "identity_id",
            "sessions" => "session_id",
            "memories" => "memory_id",
            "agent_dna" => "agent_dna_id",
            _ => "id",
        }
    }

    /// Stores a new record. The record must carry the collection's identity
    /// field as a non-empty string; the id must not already exist.
    pub fn create(&self, collection: &str, record: &Record) -> Result<String> {
        ensure_nonempty("collection name", collection)?;

        let id_field = Self::id_field(collection);
        let id = match record.get(id_field) {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(_) => {
                return Err(MirrorDnaError::InvalidFormat(format!(
                    "field '{id_field}' in collection '{collection}' must be a non-empty string"
                )))
            }
            None => {
                return Err(MirrorDnaError::InvalidFormat(format!(
                    "record for collection '{collection}' must contain field '{id_field}'"
                )))
            }
        };

        let mut data = self.load_collection(collection)?;
        if data.contains_key(&id) {
            return Err(MirrorDnaError::DuplicateEntry {
                collection: collection.to_string(),
                id,
            });
        }

        data.insert(id.clone(), record.clone());
        self.save_collection(collection, &data)?;
        debug!(collection, id = %id, "record created");

        Ok(id)
    }

    /// Reads a record by id. Absence is a normal return, not an error.
    pub fn read(&self, collection: &str, id: &str) -> Result<Option<Record>> {
        ensure_nonempty("collection name", collection)?;
        ensure_nonempty("record id", id)?;

        let data = self.load_collection(collection)?;
        Ok(data.get(id).cloned())
    }

    /// Shallow-merges `updates` into the stored record. Returns `None`
    /// (no implicit create) when the id is absent.
    pub fn update(
        &self,
        collection: &str,
        id: &str,
        updates: &Record,
    ) -> Result<Option<Record>> {
        ensure_nonempty("collection name", collection)?;
        ensure_nonempty("record id", id)?;

        let mut data = self.load_collection(collection)?;
        let Some(record) = data.get_mut(id) else {
            return Ok(None);
        };

        for (key, value) in updates {
            record.insert(key.clone(), value.clone());
        }
        let updated = record.clone();

        self.save_collection(collection, &data)?;
        debug!(collection, id, "record updated");

        Ok(Some(updated))
    }

    /// Removes a record. Returns `false` when the id is absent; never an
    /// error for a miss.
    pub fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        ensure_nonempty("collection name", collection)?;
        ensure_nonempty("record id", id)?;

        let mut data = self.load_collection(collection)?;
        if data.remove(id).is_none() {
            return Ok(false);
        }

        self.save_collection(collection, &data)?;
        debug!(collection, id, "record deleted");

        Ok(true)
    }

    /// Exact-match query over a collection. Filter keys may use dotted paths
    /// for nested lookup (e.g. `metadata.priority`). Loads the full
    /// collection, filters, then truncates to `limit`. Intended for
    /// dozens-to-thousands of records, not high-cardinality lookup.
    pub fn query(
        &self,
        collection: &str,
        filters: &Record,
        limit: usize,
    ) -> Result<Vec<Record>> {
        ensure_nonempty("collection name", collection)?;

        let data = self.load_collection(collection)?;
        let mut results: Vec<Record> = data
            .into_values()
            .filter(|record| {
                filters
                    .iter()
                    .all(|(path, expected)| lookup_path(record, path) == Some(expected))
            })
            .collect();
        results.truncate(limit);

        Ok(results)
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.json"))
    }

    fn load_collection(&self, collection: &str) -> Result<Collection> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Collection::new());
        }

        let content = fs::read_to_string(&path).map_err(|e| MirrorDnaError::StorageRead {
            collection: collection.to_string(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| MirrorDnaError::StorageRead {
            collection: collection.to_string(),
            reason: format!("failed to parse {}: {}", path.display(), e),
        })
    }

    fn save_collection(&self, collection: &str, data: &Collection) -> Result<()> {
        let path = self.collection_path(collection);
        let body =
            serde_json::to_string_pretty(data).map_err(|e| MirrorDnaError::StorageWrite {
                collection: collection.to_string(),
                reason: e.to_string(),
            })?;

        // Write-then-rename keeps the file parseable; the store remains
        // non-transactional and last-write-wins across writers.
        let tmp = self.root.join(format!("{collection}.json.tmp"));
        fs::write(&tmp, body).map_err(|e| MirrorDnaError::StorageWrite {
            collection: collection.to_string(),
            reason: e.to_string(),
        })?;
        fs::rename(&tmp, &path).map_err(|e| MirrorDnaError::StorageWrite {
            collection: collection.to_string(),
            reason: e.to_string(),
        })
    }
}

fn ensure_nonempty(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(MirrorDnaError::InvalidFormat(format!(
            "{what} must be non-empty"
        )));
    }
    Ok(())
}

/// Resolves a dotted field path (`metadata.priority`) inside a record.
fn lookup_path<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}
