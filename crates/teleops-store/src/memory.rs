//! In-memory document store
//!
//! Collections are `BTreeMap`s of JSON documents behind a single mutex, so
//! every trait method is atomic. An optional snapshot file persists the
//! collections as pretty JSON, written via temp-file-then-rename.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Sender};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::path::{get_path, merge_fields, set_path};
use crate::{ChangeEvent, ChangeKind, Document, DocumentStore, Subscription};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    collections: HashMap<String, BTreeMap<String, Value>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Value>>,
    watchers: HashMap<String, Vec<Sender<ChangeEvent>>>,
}

impl Inner {
    fn notify(&mut self, kind: ChangeKind, collection: &str, id: &str, fields: &Value) {
        let Some(senders) = self.watchers.get_mut(collection) else {
            return;
        };
        let event = ChangeEvent {
            kind,
            collection: collection.to_string(),
            doc: Document {
                id: id.to_string(),
                fields: fields.clone(),
            },
        };
        senders.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// In-memory store with an optional on-disk snapshot.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    snapshot_path: Option<PathBuf>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store with no snapshot file.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            snapshot_path: None,
        }
    }

    /// Open a store backed by a snapshot file, loading it when it exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut inner = Inner::default();
        if path.exists() {
            let json = fs::read_to_string(&path)?;
            let snapshot: Snapshot = serde_json::from_str(&json)?;
            inner.collections = snapshot.collections;
        }
        Ok(Self {
            inner: Mutex::new(inner),
            snapshot_path: Some(path),
        })
    }

    /// Write the snapshot file (write-then-rename). No-op without a path.
    pub fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let inner = self.inner.lock().expect("store lock poisoned");
        let snapshot = Snapshot {
            collections: inner.collections.clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        write_atomic(path, &json)?;
        tracing::debug!(path = %path.display(), "snapshot persisted");
        Ok(())
    }

    fn next_document_id() -> String {
        ulid::Ulid::new().to_string().to_lowercase()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("store lock poisoned")
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, contents)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

impl DocumentStore for MemoryStore {
    fn create(&self, collection: &str, fields: Value) -> Result<Document, StoreError> {
        let id = Self::next_document_id();
        let mut inner = self.lock();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields.clone());
        inner.notify(ChangeKind::Added, collection, &id, &fields);
        tracing::debug!(collection, id = %id, "document created");
        Ok(Document { id, fields })
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    fn set(&self, collection: &str, id: &str, fields: Value) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let docs = inner.collections.entry(collection.to_string()).or_default();
        let kind = if docs.contains_key(id) {
            ChangeKind::Modified
        } else {
            ChangeKind::Added
        };
        docs.insert(id.to_string(), fields.clone());
        inner.notify(kind, collection, id, &fields);
        Ok(())
    }

    fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let mut inner = self.lock();
        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        merge_fields(doc, &fields);
        let merged = doc.clone();
        inner.notify(ChangeKind::Modified, collection, id, &merged);
        Ok(Document {
            id: id.to_string(),
            fields: merged,
        })
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let removed = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        inner.notify(ChangeKind::Removed, collection, id, &removed);
        tracing::debug!(collection, id, "document deleted");
        Ok(())
    }

    fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn query_prefix(
        &self,
        collection: &str,
        field: &str,
        prefix: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| {
                        get_path(fields, field)
                            .and_then(Value::as_str)
                            .is_some_and(|s| s.starts_with(prefix))
                    })
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn array_union(
        &self,
        collection: &str,
        id: &str,
        path: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let docs = inner.collections.entry(collection.to_string()).or_default();
        let doc = docs
            .entry(id.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match get_path(doc, path) {
            None => set_path(doc, path, Value::Array(vec![value])),
            Some(Value::Array(items)) => {
                if items.contains(&value) {
                    return Ok(());
                }
                let mut items = items.clone();
                items.push(value);
                set_path(doc, path, Value::Array(items));
            }
            Some(_) => {
                return Err(StoreError::NotAnArray {
                    path: path.to_string(),
                })
            }
        }
        let merged = doc.clone();
        inner.notify(ChangeKind::Modified, collection, id, &merged);
        Ok(())
    }

    fn array_remove(
        &self,
        collection: &str,
        id: &str,
        path: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let Some(doc) = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
        else {
            return Ok(());
        };
        match get_path(doc, path) {
            None => return Ok(()),
            Some(Value::Array(items)) => {
                let items: Vec<Value> = items.iter().filter(|v| **v != value).cloned().collect();
                set_path(doc, path, Value::Array(items));
            }
            Some(_) => {
                return Err(StoreError::NotAnArray {
                    path: path.to_string(),
                })
            }
        }
        let merged = doc.clone();
        inner.notify(ChangeKind::Modified, collection, id, &merged);
        Ok(())
    }

    fn transact(
        &self,
        collection: &str,
        id: &str,
        f: &mut dyn FnMut(Option<Value>) -> Option<Value>,
    ) -> Result<Option<Value>, StoreError> {
        let mut inner = self.lock();
        let docs = inner.collections.entry(collection.to_string()).or_default();
        let current = docs.get(id).cloned();
        let existed = current.is_some();
        let next = f(current);
        match &next {
            Some(fields) => {
                docs.insert(id.to_string(), fields.clone());
                let kind = if existed {
                    ChangeKind::Modified
                } else {
                    ChangeKind::Added
                };
                let fields = fields.clone();
                inner.notify(kind, collection, id, &fields);
            }
            None => {
                if let Some(removed) = docs.remove(id) {
                    inner.notify(ChangeKind::Removed, collection, id, &removed);
                }
            }
        }
        Ok(next)
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        let (tx, rx) = channel();
        let mut inner = self.lock();
        inner
            .watchers
            .entry(collection.to_string())
            .or_default()
            .push(tx);
        Subscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_and_get() {
        let store = MemoryStore::new();
        let doc = store.create("jobs", json!({"status": "new"})).unwrap();
        assert_eq!(doc.id.len(), 26);

        let loaded = store.get("jobs", &doc.id).unwrap().unwrap();
        assert_eq!(loaded.fields, json!({"status": "new"}));
    }

    #[test]
    fn test_update_merges_dotted_paths() {
        let store = MemoryStore::new();
        store
            .set("settings", "master_data", json!({"subcontractors": []}))
            .unwrap();

        let mut fields = Map::new();
        fields.insert("rr_indexes.sub_reroute".to_string(), json!({"index": 2}));
        let doc = store.update("settings", "master_data", fields).unwrap();

        assert_eq!(
            doc.fields,
            json!({"subcontractors": [], "rr_indexes": {"sub_reroute": {"index": 2}}})
        );
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update("jobs", "nope", Map::new()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.delete("jobs", "nope").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_query_prefix_matches_field() {
        let store = MemoryStore::new();
        store
            .create("jobs", json!({"internal_id": "PVT2608001"}))
            .unwrap();
        store
            .create("jobs", json!({"internal_id": "PVT2608002"}))
            .unwrap();
        store
            .create("jobs", json!({"internal_id": "RER2608001"}))
            .unwrap();

        let docs = store.query_prefix("jobs", "internal_id", "PVT2608").unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_array_union_is_set_add() {
        let store = MemoryStore::new();
        store
            .array_union("settings", "master_data", "subcontractors", json!("A"))
            .unwrap();
        store
            .array_union("settings", "master_data", "subcontractors", json!("A"))
            .unwrap();
        store
            .array_union("settings", "master_data", "subcontractors", json!("B"))
            .unwrap();

        let doc = store.get("settings", "master_data").unwrap().unwrap();
        assert_eq!(doc.fields, json!({"subcontractors": ["A", "B"]}));
    }

    #[test]
    fn test_array_remove_is_set_remove() {
        let store = MemoryStore::new();
        store
            .set("settings", "master_data", json!({"subcontractors": ["A", "B"]}))
            .unwrap();
        store
            .array_remove("settings", "master_data", "subcontractors", json!("A"))
            .unwrap();
        store
            .array_remove("settings", "master_data", "subcontractors", json!("Z"))
            .unwrap();

        let doc = store.get("settings", "master_data").unwrap().unwrap();
        assert_eq!(doc.fields, json!({"subcontractors": ["B"]}));
    }

    #[test]
    fn test_transact_creates_and_increments() {
        let store = MemoryStore::new();
        for _ in 0..3 {
            store
                .transact("settings", "counters", &mut |doc| {
                    let mut fields = doc.unwrap_or_else(|| json!({}));
                    let current = fields
                        .get("PVT2608")
                        .and_then(Value::as_u64)
                        .unwrap_or(0);
                    fields["PVT2608"] = json!(current + 1);
                    Some(fields)
                })
                .unwrap();
        }
        let doc = store.get("settings", "counters").unwrap().unwrap();
        assert_eq!(doc.fields, json!({"PVT2608": 3}));
    }

    #[test]
    fn test_transact_none_deletes() {
        let store = MemoryStore::new();
        store.set("jobs", "j1", json!({"status": "new"})).unwrap();
        store.transact("jobs", "j1", &mut |_| None).unwrap();
        assert!(store.get("jobs", "j1").unwrap().is_none());
    }

    #[test]
    fn test_subscription_sees_lifecycle() {
        let store = MemoryStore::new();
        let sub = store.subscribe("jobs");

        let doc = store.create("jobs", json!({"status": "new"})).unwrap();
        let mut fields = Map::new();
        fields.insert("status".to_string(), json!("process"));
        store.update("jobs", &doc.id, fields).unwrap();
        store.delete("jobs", &doc.id).unwrap();

        let events = sub.drain();
        let kinds: Vec<ChangeKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![ChangeKind::Added, ChangeKind::Modified, ChangeKind::Removed]
        );
        assert!(events.iter().all(|e| e.doc.id == doc.id));
    }

    #[test]
    fn test_subscription_scoped_to_collection() {
        let store = MemoryStore::new();
        let sub = store.subscribe("jobs");
        store.create("sessions", json!({})).unwrap();
        assert!(sub.try_next().is_none());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.json");

        let store = MemoryStore::open(&path).unwrap();
        let doc = store
            .create("jobs", json!({"internal_id": "AI2608001"}))
            .unwrap();
        store.persist().unwrap();

        let reopened = MemoryStore::open(&path).unwrap();
        let loaded = reopened.get("jobs", &doc.id).unwrap().unwrap();
        assert_eq!(loaded.fields, json!({"internal_id": "AI2608001"}));
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(dir.path().join("absent.json")).unwrap();
        assert!(store.list("jobs").unwrap().is_empty());
    }
}
