//! Document store collaborator for the teleops desk
//!
//! The desk treats persistence as an external collaborator: a store of JSON
//! documents grouped into named collections, with merge updates, prefix
//! queries, atomic single-document read-modify-write, and change
//! subscriptions. [`MemoryStore`] is the in-process implementation, with an
//! optional JSON snapshot on disk.

pub mod error;
pub mod memory;
pub mod path;

pub use error::StoreError;
pub use memory::MemoryStore;

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use serde_json::{Map, Value};

/// A stored document: its key plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Value,
}

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// A change notification delivered to subscribers of a collection.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub collection: String,
    pub doc: Document,
}

/// Receiving end of a collection subscription.
///
/// Events are delivered in mutation order. Dropping the subscription
/// detaches it from the store.
pub struct Subscription {
    rx: Receiver<ChangeEvent>,
}

impl Subscription {
    pub(crate) fn new(rx: Receiver<ChangeEvent>) -> Self {
        Self { rx }
    }

    /// Take the next pending event without blocking.
    pub fn try_next(&self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    /// Block up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<ChangeEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Drain everything currently pending.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_next() {
            events.push(event);
        }
        events
    }
}

/// The persistence surface the desk depends on.
///
/// Implementations must make each method atomic with respect to the others;
/// no consistency is promised across documents.
pub trait DocumentStore: Send + Sync {
    /// Create a document with a generated id. Returns the stored document.
    fn create(&self, collection: &str, fields: Value) -> Result<Document, StoreError>;

    /// Read a document by key.
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Write a document wholesale, creating it if absent.
    fn set(&self, collection: &str, id: &str, fields: Value) -> Result<(), StoreError>;

    /// Merge fields into an existing document. Keys may be dotted paths
    /// (see [`path`]). Fails with [`StoreError::NotFound`] when absent.
    fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError>;

    /// Remove a document. Fails with [`StoreError::NotFound`] when absent.
    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// All documents of a collection, in key order.
    fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Documents whose string field at `field` starts with `prefix`.
    fn query_prefix(
        &self,
        collection: &str,
        field: &str,
        prefix: &str,
    ) -> Result<Vec<Document>, StoreError>;

    /// Set-add `value` to the array at `path`, creating document and array
    /// as needed. No-op when the value is already present.
    fn array_union(
        &self,
        collection: &str,
        id: &str,
        path: &str,
        value: Value,
    ) -> Result<(), StoreError>;

    /// Set-remove `value` from the array at `path`. No-op when absent.
    fn array_remove(
        &self,
        collection: &str,
        id: &str,
        path: &str,
        value: Value,
    ) -> Result<(), StoreError>;

    /// Atomic read-modify-write of a single document.
    ///
    /// The closure receives the current fields (`None` when the document
    /// does not exist) and returns the replacement (`None` deletes). The
    /// whole exchange happens under the store's write lock, so concurrent
    /// transactions on the same key serialize.
    fn transact(
        &self,
        collection: &str,
        id: &str,
        f: &mut dyn FnMut(Option<Value>) -> Option<Value>,
    ) -> Result<Option<Value>, StoreError>;

    /// Subscribe to changes of a collection.
    fn subscribe(&self, collection: &str) -> Subscription;
}
