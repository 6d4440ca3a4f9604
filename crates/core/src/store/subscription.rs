use std::{collections::HashMap, sync::Arc};

use parking_lot::{Mutex, RwLock};

/// Callback invoked with each emitted event.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Handle returned by every watch or subscribe call.
///
/// Dropping the handle removes the listener; call [`detach`](Self::detach) to
/// keep it registered for the rest of the process.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    /// Keep the listener registered for as long as its source lives.
    pub fn detach(mut self) {
        self.cancel = None;
    }

    fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Ordered set of listeners sharing one event type.
pub(crate) struct Listeners<E> {
    inner: Arc<Mutex<Table<E>>>,
}

struct Table<E> {
    next_id: u64,
    entries: Vec<(u64, Listener<E>)>,
}

impl<E: 'static> Listeners<E> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Table {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub(crate) fn add(&self, listener: Listener<E>) -> Subscription {
        let id = self.insert(listener);
        let table = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(table) = table.upgrade() {
                table.lock().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }

    fn insert(&self, listener: Listener<E>) -> u64 {
        let mut table = self.inner.lock();
        let id = table.next_id;
        table.next_id += 1;
        table.entries.push((id, listener));
        id
    }

    fn remove(&self, id: u64) {
        self.inner.lock().entries.retain(|(entry, _)| *entry != id);
    }

    /// Invoke every listener; the lock is released before any callback runs.
    pub(crate) fn emit(&self, event: &E) {
        let listeners: Vec<Listener<E>> = self
            .inner
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

impl<E> Clone for Listeners<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Listener sets per key. A key's entry is dropped with its last listener.
pub(crate) struct KeyedListeners<E> {
    table: Arc<RwLock<HashMap<String, Listeners<E>>>>,
}

impl<E: 'static> KeyedListeners<E> {
    pub(crate) fn new() -> Self {
        Self {
            table: Arc::default(),
        }
    }

    pub(crate) fn add(&self, key: &str, listener: Listener<E>) -> Subscription {
        // Inserted under the table lock so a concurrent prune cannot orphan it.
        let (listeners, id) = {
            let mut table = self.table.write();
            let listeners = table
                .entry(key.to_string())
                .or_insert_with(Listeners::new)
                .clone();
            let id = listeners.insert(listener);
            (listeners, id)
        };

        let table = Arc::downgrade(&self.table);
        let key = key.to_string();
        Subscription::new(move || {
            listeners.remove(id);
            if let Some(table) = table.upgrade() {
                let mut table = table.write();
                let emptied = table.get(&key).is_some_and(|current| {
                    Arc::ptr_eq(&current.inner, &listeners.inner) && current.len() == 0
                });
                if emptied {
                    table.remove(&key);
                }
            }
        })
    }

    pub(crate) fn get(&self, key: &str) -> Option<Listeners<E>> {
        self.table.read().get(key).cloned()
    }

    pub(crate) fn key_count(&self) -> usize {
        self.table.read().len()
    }
}

impl<E: 'static> Default for KeyedListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for KeyedListeners<E> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn unsubscribe_and_drop_remove_listeners() {
        let listeners: Listeners<u32> = Listeners::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let first = listeners.add(Arc::new(move |value: &u32| {
            counter.fetch_add(*value as usize, Ordering::SeqCst);
        }));
        let counter = hits.clone();
        listeners
            .add(Arc::new(move |_: &u32| {
                counter.fetch_add(100, Ordering::SeqCst);
            }))
            .detach();
        {
            let _scoped = listeners.add(Arc::new(|_: &u32| {}));
            assert_eq!(listeners.len(), 3);
        }
        assert_eq!(listeners.len(), 2);

        listeners.emit(&1);
        first.unsubscribe();
        listeners.emit(&1);

        assert_eq!(hits.load(Ordering::SeqCst), 201);
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn keyed_entries_are_pruned_with_their_last_listener() {
        let keyed: KeyedListeners<u32> = KeyedListeners::new();
        let first = keyed.add("a", Arc::new(|_: &u32| {}));
        let second = keyed.add("a", Arc::new(|_: &u32| {}));
        let other = keyed.add("b", Arc::new(|_: &u32| {}));
        assert_eq!(keyed.key_count(), 2);

        first.unsubscribe();
        assert_eq!(keyed.get("a").map(|listeners| listeners.len()), Some(1));
        drop(second);
        assert!(keyed.get("a").is_none());
        other.unsubscribe();
        assert_eq!(keyed.key_count(), 0);

        keyed.add("a", Arc::new(|_: &u32| {})).detach();
        assert_eq!(keyed.get("a").map(|listeners| listeners.len()), Some(1));
    }
}
