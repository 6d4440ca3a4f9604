//! Error types shared by the store, cache and identifier layers.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by a [`KeyValueStore`](crate::store::KeyValueStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store io error at {path}: {source}")]
    Io {
        /// File or directory involved in the failing operation.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The filesystem watcher could not be installed.
    #[error("failed to watch {path}: {source}")]
    Watch {
        /// Directory the watcher was attached to.
        path: PathBuf,
        /// Underlying watcher error.
        #[source]
        source: notify::Error,
    },

    /// A value could not be serialised into its persisted form.
    #[error("failed to encode value for {key}: {source}")]
    Encode {
        /// Key the value was destined for.
        key: String,
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Format errors raised while decomposing compound identifiers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    /// The path part of a building identifier has too few meaningful segments.
    #[error("building identifier {raw:?} needs 3 path segments after the root, found {found}")]
    MissingPathSegments {
        /// Identifier as received.
        raw: String,
        /// Number of meaningful segments present.
        found: usize,
    },

    /// A path segment between separators is empty.
    #[error("building identifier {raw:?} has an empty path segment")]
    EmptyPathSegment {
        /// Identifier as received.
        raw: String,
    },

    /// One of the `|`-separated fields is absent or blank.
    #[error("building identifier {raw:?} is missing its {field} field")]
    MissingField {
        /// Identifier as received.
        raw: String,
        /// Name of the absent field.
        field: &'static str,
    },

    /// The table type is neither `construction` nor `upgrade`.
    #[error("building identifier {raw:?} has unknown table type {table_type:?}")]
    UnknownTableType {
        /// Identifier as received.
        raw: String,
        /// Offending table type.
        table_type: String,
    },

    /// A techno identifier has fewer than five underscore-delimited tokens.
    #[error("techno identifier {raw:?} needs at least 5 tokens, found {found}")]
    TooFewTokens {
        /// Identifier as received.
        raw: String,
        /// Number of tokens present.
        found: usize,
    },
}
