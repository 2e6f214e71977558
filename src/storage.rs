//! Array storage ([stores](store) and [storage adapters](storage_adapter)).
//!
//! A store is a key/value system that holds the schema document and tiles of each array.
//! For example: memory or a filesystem directory.
//!
//! A [storage adapter](storage_adapter) wraps a store and has the same interface as a store.
//! Adapters are used to observe storage access, e.g. to log calls or to count bytes written.

pub mod storage_adapter;
mod storage_sync;
pub mod store;
mod store_key;
mod store_prefix;

use std::sync::Arc;

use thiserror::Error;

pub use store_key::{StoreKey, StoreKeyError, StoreKeys};
pub use store_prefix::{StorePrefix, StorePrefixError, StorePrefixes};

pub use self::storage_sync::{
    ListableStorageTraits, ReadableListableStorageTraits, ReadableStorageTraits,
    ReadableWritableListableStorageTraits, ReadableWritableStorageTraits, WritableStorageTraits,
};

use crate::node::NodePath;

/// [`Arc`] wrapped readable, writable, and listable storage.
pub type ReadableWritableListableStorage = Arc<dyn ReadableWritableListableStorageTraits>;

/// The type for bytes used in store set and get methods.
///
/// An alias for [`bytes::Bytes`].
pub type Bytes = bytes::Bytes;

/// An alias for bytes which may or may not be available.
///
/// When a value is read from a store, it returns `MaybeBytes` which is [`None`] if the key is not available.
pub type MaybeBytes = Option<Bytes>;

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write operation was attempted on a read only store.
    #[error("a write operation was attempted on a read only store")]
    ReadOnly,
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An invalid store prefix.
    #[error("invalid store prefix {0}")]
    StorePrefixError(#[from] StorePrefixError),
    /// An invalid store key.
    #[error("invalid store key {0}")]
    InvalidStoreKey(#[from] StoreKeyError),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// Return the key of a file named `name` within the node at `path`.
fn node_key(path: &NodePath, name: &str) -> StoreKey {
    let path = path.as_str();
    if path.eq("/") {
        StoreKey::new_unchecked(name)
    } else {
        let path = path.strip_prefix('/').unwrap_or(path);
        StoreKey::new_unchecked(format!("{path}/{name}"))
    }
}

/// Return the schema key (`__schema.json`) of the array at `path`.
#[must_use]
pub fn schema_key(path: &NodePath) -> StoreKey {
    node_key(path, "__schema.json")
}

/// Return the commit key (`__commit.json`) of the array at `path`.
#[must_use]
pub fn commit_key(path: &NodePath) -> StoreKey {
    node_key(path, "__commit.json")
}

/// Return the name of the tile at `tile_indices` of `attribute`, relative to its array.
///
/// Tile names are `<attribute>/c/<i>/<j>/...`.
#[must_use]
pub fn tile_name(attribute: &str, tile_indices: &[u64]) -> String {
    let mut name = format!("{attribute}/c");
    for index in tile_indices {
        name.push('/');
        name.push_str(&index.to_string());
    }
    name
}

/// Return the key of write `generation` of the tile `tile_name` in the array at `path`.
///
/// Tiles are encoded as `<path>/<tile_name>.<generation>`.
#[must_use]
pub fn tile_key(path: &NodePath, tile_name: &str, generation: u64) -> StoreKey {
    node_key(path, &format!("{tile_name}.{generation}"))
}
