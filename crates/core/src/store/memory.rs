use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::{KeyValueStore, KeyedListeners, Subscription, WatchHandler};
use crate::error::StoreResult;

/// A [`KeyValueStore`] held entirely in memory.
///
/// Watchers run synchronously inside `set_item`/`remove_item`, after the map
/// has been updated and its lock released.
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
    watchers: KeyedListeners<Option<String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `items`.
    pub fn with_items<K, V>(items: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            items: RwLock::new(
                items
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
            watchers: KeyedListeners::new(),
        }
    }

    /// Synchronous snapshot of a key, for inspection.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.items.read().get(key).cloned()
    }

    fn notify(&self, key: &str, value: Option<String>) {
        if let Some(listeners) = self.watchers.get(key) {
            debug!(key, "dispatching change to {} watcher(s)", listeners.len());
            listeners.emit(&value);
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.peek(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.items.write().insert(key.to_string(), value.to_string());
        self.notify(key, Some(value.to_string()));
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StoreResult<()> {
        let existed = self.items.write().remove(key).is_some();
        if existed {
            self.notify(key, None);
        }
        Ok(())
    }

    fn watch(&self, key: &str, handler: WatchHandler) -> Subscription {
        self.watchers.add(key, handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    #[tokio::test]
    async fn watchers_see_changes_in_order() -> anyhow::Result<()> {
        let store = MemoryStore::with_items([("k", "\"a\"")]);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let subscription = store.watch(
            "k",
            Arc::new(move |value: &Option<String>| sink.lock().push(value.clone())),
        );
        let _other = store.watch("other", Arc::new(|_: &Option<String>| panic!("wrong key")));

        store.set_item("k", "\"b\"").await?;
        store.set_item("k", "\"c\"").await?;
        store.remove_item("k").await?;
        store.remove_item("k").await?;
        subscription.unsubscribe();
        assert_eq!(store.watchers.key_count(), 1);
        store.set_item("k", "\"d\"").await?;

        assert_eq!(
            *seen.lock(),
            vec![Some("\"b\"".to_string()), Some("\"c\"".to_string()), None]
        );
        assert_eq!(store.get_item("k").await?, Some("\"d\"".to_string()));
        Ok(())
    }
}
