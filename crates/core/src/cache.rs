//! Reactive in-memory mirror of one persisted setting.

use std::{
    collections::VecDeque,
    future::Future,
    sync::{Arc, Weak},
};

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::{
    codec::{self, DecodeError},
    error::StoreResult,
    store::{KeyValueStore, Listeners, Subscription},
};

/// Bounds every cached setting type satisfies.
pub trait Setting: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Setting for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Synchronously readable cache of a single persisted key.
///
/// Local writes are visible to [`read`](Self::read) immediately. Changes made
/// through any other handle on the same store arrive via the store's watch
/// channel and replace the cached value; contexts converge last-writer-wins,
/// eventually rather than immediately.
///
/// The store reports this cache's own writes back through the same channel.
/// Those echoes are matched against the writes still outstanding so an older
/// echo never replaces a newer local value.
pub struct PersistedCache<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    key: String,
    default: T,
    store: Arc<dyn KeyValueStore>,
    state: RwLock<State<T>>,
    loaded: OnceCell<()>,
    listeners: Listeners<T>,
    _watch: Subscription,
}

struct State<T> {
    value: T,
    /// Bumped on every local write or incoming change.
    revision: u64,
    next_write: u64,
    /// Local writes whose echo has not come back yet, oldest first.
    outstanding: VecDeque<OutstandingWrite>,
}

struct OutstandingWrite {
    id: u64,
    payload: String,
    /// The store call returned successfully.
    persisted: bool,
}

impl<T: Setting> PersistedCache<T> {
    /// Create a cache for `key` holding `default` until the store says otherwise.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, default: T) -> Self {
        let key = key.into();
        let inner = Arc::new_cyclic(|weak: &Weak<Inner<T>>| {
            let weak = weak.clone();
            let watch = store.watch(
                &key,
                Arc::new(move |raw: &Option<String>| {
                    if let Some(inner) = weak.upgrade() {
                        inner.apply_change(raw.as_deref());
                    }
                }),
            );

            Inner {
                key: key.clone(),
                state: RwLock::new(State {
                    value: default.clone(),
                    revision: 0,
                    next_write: 0,
                    outstanding: VecDeque::new(),
                }),
                default,
                store: store.clone(),
                loaded: OnceCell::new(),
                listeners: Listeners::new(),
                _watch: watch,
            }
        });

        Self { inner }
    }

    /// Key this cache mirrors.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Last known value; the default until a load or change arrives.
    pub fn read(&self) -> T {
        self.inner.state.read().value.clone()
    }

    /// Whether the initial store read has completed.
    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.initialized()
    }

    /// Load the persisted value once per cache lifetime.
    ///
    /// Concurrent callers share one store read. Store failures and malformed
    /// payloads leave the current value untouched.
    pub async fn ensure_loaded(&self) {
        self.inner
            .loaded
            .get_or_init(|| self.inner.load_from_store())
            .await;
    }

    /// Replace the value.
    ///
    /// The cache is updated before this returns; the returned future performs
    /// the store write and reports its failure, without retrying.
    pub fn write(&self, value: T) -> impl Future<Output = StoreResult<()>> + Send + 'static {
        let encoded = codec::encode(&self.inner.key, &value);
        let write_id = {
            let mut state = self.inner.state.write();
            state.value = value;
            state.revision += 1;
            let id = state.next_write;
            state.next_write += 1;
            if let Ok(payload) = &encoded {
                state.outstanding.push_back(OutstandingWrite {
                    id,
                    payload: payload.clone(),
                    persisted: false,
                });
            }
            id
        };

        let inner = self.inner.clone();
        async move {
            let encoded = encoded?;
            let result = inner.store.set_item(&inner.key, &encoded).await;
            inner.finish_write(write_id, result.is_ok());
            result
        }
    }

    /// Apply `mutate` to a copy of the current value and write the result.
    pub fn update(
        &self,
        mutate: impl FnOnce(&mut T),
    ) -> impl Future<Output = StoreResult<()>> + Send + 'static {
        let mut value = self.read();
        mutate(&mut value);
        self.write(value)
    }

    /// Register `handler` for every change of the persisted key.
    ///
    /// Payloads that fail to decode are skipped without calling the handler.
    pub fn subscribe(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.inner.listeners.add(Arc::new(handler))
    }
}

impl<T: Setting> Inner<T> {
    async fn load_from_store(&self) {
        let revision = self.state.read().revision;
        let raw = match self.store.get_item(&self.key).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key = %self.key, "store read failed, keeping default: {err}");
                return;
            }
        };

        match codec::decode::<T>(raw.as_deref()) {
            Ok(value) => {
                let mut state = self.state.write();
                if state.revision == revision {
                    state.value = value;
                    debug!(key = %self.key, "loaded persisted value");
                } else {
                    debug!(key = %self.key, "newer value arrived during load, discarding stored one");
                }
            }
            Err(DecodeError::Absent) => debug!(key = %self.key, "no persisted value"),
            Err(DecodeError::Malformed(err)) => {
                warn!(key = %self.key, "ignoring malformed persisted value: {err}")
            }
        }
    }

    fn finish_write(&self, id: u64, persisted: bool) {
        let mut state = self.state.write();
        if persisted {
            if let Some(write) = state.outstanding.iter_mut().find(|write| write.id == id) {
                write.persisted = true;
            }
        } else {
            state.outstanding.retain(|write| write.id != id);
        }
    }

    fn apply_change(&self, raw: Option<&str>) {
        let value = match codec::decode::<T>(raw) {
            Ok(value) => value,
            Err(DecodeError::Absent) => self.default.clone(),
            Err(DecodeError::Malformed(err)) => {
                debug!(key = %self.key, "ignoring malformed change: {err}");
                return;
            }
        };

        {
            let mut state = self.state.write();
            let echoed = raw.and_then(|raw| {
                state
                    .outstanding
                    .iter()
                    .position(|write| write.payload == raw)
            });
            match echoed {
                Some(position) => {
                    state.outstanding.drain(..=position);
                    if !state.outstanding.is_empty() {
                        debug!(key = %self.key, "skipping echo of a superseded local write");
                        return;
                    }
                }
                // An unpersisted local write lands after this change, and its
                // echo will carry the final value.
                None if state.outstanding.iter().any(|write| !write.persisted) => {
                    debug!(key = %self.key, "deferring change behind pending local write");
                    return;
                }
                None => state.outstanding.clear(),
            }
            state.value = value.clone();
            state.revision += 1;
        }
        self.listeners.emit(&value);
    }
}

impl<T> Clone for PersistedCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}
