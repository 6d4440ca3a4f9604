use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{KeyValueStore, KeyedListeners, Subscription, WatchHandler};
use crate::error::{StoreError, StoreResult};

const ITEM_EXTENSION: &str = "json";

type WatchTable = KeyedListeners<Option<String>>;

/// A [`KeyValueStore`] keeping one file per key inside a directory.
///
/// Any process writing into the same directory is a sibling context: a
/// filesystem watcher forwards its changes to this handle's watchers.
/// Delivery is at-least-once, so a single write may be reported more than once.
pub struct FileStore {
    root: PathBuf,
    watchers: WatchTable,
    _watcher: RecommendedWatcher,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;

        let watchers: WatchTable = KeyedListeners::new();
        let table = watchers.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => dispatch_event(&table, event),
            Err(err) => warn!("storage watcher error: {err}"),
        })
        .map_err(|source| StoreError::Watch {
            path: root.clone(),
            source,
        })?;
        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .map_err(|source| StoreError::Watch {
                path: root.clone(),
                source,
            })?;

        debug!("opened file store at {}", root.display());
        Ok(Self {
            root,
            watchers,
            _watcher: watcher,
        })
    }

    /// Directory holding the item files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every key currently persisted, sorted.
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut keys: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| key_for_path(&entry.path()))
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{ITEM_EXTENSION}", encode_key(key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.item_path(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.item_path(key);
        let root = self.root.clone();
        let contents = value.to_string();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&root, &target, &contents))
            .await
            .map_err(|err| StoreError::Io {
                path,
                source: io::Error::other(err),
            })??;
        debug!(key, "persisted {} bytes", value.len());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StoreResult<()> {
        let path = self.item_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn watch(&self, key: &str, handler: WatchHandler) -> Subscription {
        self.watchers.add(key, handler)
    }
}

fn dispatch_event(table: &WatchTable, event: Event) {
    if matches!(event.kind, EventKind::Access(_)) {
        return;
    }

    for path in &event.paths {
        let Some(key) = key_for_path(path) else {
            continue;
        };
        let Some(listeners) = table.get(&key) else {
            continue;
        };

        let value = match fs::read_to_string(path) {
            Ok(contents) => Some(contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!("failed to read changed item {}: {err}", path.display());
                continue;
            }
        };
        listeners.emit(&value);
    }
}

/// Write through a sibling temp file and rename, so readers never see a partial item.
fn write_atomically(root: &Path, path: &Path, contents: &str) -> StoreResult<()> {
    let io_error = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = NamedTempFile::new_in(root).map_err(io_error)?;
    file.write_all(contents.as_bytes()).map_err(io_error)?;
    file.persist(path).map_err(|err| io_error(err.error))?;
    Ok(())
}

fn key_for_path(path: &Path) -> Option<String> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(ITEM_EXTENSION) {
        return None;
    }
    decode_key(path.file_stem()?.to_str()?)
}

/// Reversibly map a key onto a portable file stem.
fn encode_key(key: &str) -> String {
    let mut result = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_') {
            result.push(byte as char);
        } else {
            result.push_str(&format!("%{byte:02X}"));
        }
    }
    result
}

fn decode_key(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' {
            let hex = stem.get(index + 1..index + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            index += 3;
        } else {
            decoded.push(bytes[index]);
            index += 1;
        }
    }
    String::from_utf8(decoded).ok()
}
