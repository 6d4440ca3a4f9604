//! Asynchronous key-value storage shared between contexts.

/// Directory-backed store with cross-process change notification.
pub mod file;
/// In-process store for tests and single-process embedding.
pub mod memory;
mod subscription;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreResult;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use subscription::Subscription;
pub(crate) use subscription::{KeyedListeners, Listeners};

/// Callback receiving the new persisted form of a key, or `None` once removed.
pub type WatchHandler = Arc<dyn Fn(&Option<String>) + Send + Sync>;

/// Durable string store keyed by namespace-qualified names.
///
/// Several handles may point at the same underlying storage. Writes are
/// last-writer-wins; every handle's watchers eventually see the latest value,
/// but no ordering is promised between independent handles.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the persisted form of `key`, `None` when absent.
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace the persisted form of `key`.
    async fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete `key`. Removing an absent key is not an error.
    async fn remove_item(&self, key: &str) -> StoreResult<()>;

    /// Register `handler` for every change to `key`, whichever context made it.
    fn watch(&self, key: &str, handler: WatchHandler) -> Subscription;
}
