//! A filesystem store.

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use walkdir::WalkDir;

use std::{
    collections::HashMap,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::storage::{
    Bytes, ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey,
    StoreKeyError, StoreKeys, StorePrefix, WritableStorageTraits,
};

/// A synchronous file system store.
///
/// Each store key maps to a file relative to the base path of the store.
/// Directories are created on demand, so a store whose base path does not exist leaves no trace on disk until a value is written.
#[derive(Debug)]
pub struct FilesystemStore {
    base_path: PathBuf,
    sort: bool,
    readonly: bool,
    files: Mutex<HashMap<StoreKey, Arc<RwLock<()>>>>,
}

impl FilesystemStore {
    /// Create a new file system store at a given `base_path`.
    ///
    /// # Errors
    /// Returns a [`FilesystemStoreCreateError`] if `base_path`:
    ///   - is not valid,
    ///   - points to an existing file rather than a directory, or
    ///   - has no existing ancestor whose permissions can be read.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, FilesystemStoreCreateError> {
        let base_path = base_path.as_ref().to_path_buf();
        if base_path.to_str().is_none() {
            return Err(FilesystemStoreCreateError::InvalidBasePath(base_path));
        }
        if base_path.is_file() {
            return Err(FilesystemStoreCreateError::ExistingFile(base_path));
        }

        // the nearest existing ancestor (or the base path itself) decides if the store is read only
        let existing = base_path
            .ancestors()
            .find(|path| path.exists())
            .unwrap_or_else(|| Path::new("."));
        let readonly = std::fs::metadata(existing)?.permissions().readonly();

        Ok(Self {
            base_path,
            sort: false,
            readonly,
            files: Mutex::default(),
        })
    }

    /// Makes the store sort directories/files when walking.
    #[must_use]
    pub const fn sorted(mut self) -> Self {
        self.sort = true;
        self
    }

    /// Returns true if the store rejects writes.
    #[must_use]
    pub const fn readonly(&self) -> bool {
        self.readonly
    }

    /// Maps a [`StoreKey`] to a filesystem [`PathBuf`].
    #[must_use]
    pub fn key_to_fspath(&self, key: &StoreKey) -> PathBuf {
        let mut path = self.base_path.clone();
        if !key.as_str().is_empty() {
            path.push(key.as_str().strip_prefix('/').unwrap_or(key.as_str()));
        }
        path
    }

    /// Maps a filesystem [`PathBuf`] to a [`StoreKey`].
    fn fspath_to_key(&self, path: &Path) -> Result<StoreKey, StoreKeyError> {
        let invalid = || StoreKeyError::from(path.to_string_lossy().to_string());
        let path = pathdiff::diff_paths(path, &self.base_path).ok_or_else(invalid)?;
        let path = path.to_str().ok_or_else(invalid)?;
        // keys always use `/`, regardless of the platform separator
        StoreKey::new(path.replace('\\', "/"))
    }

    /// Maps a store [`StorePrefix`] to a filesystem [`PathBuf`].
    #[must_use]
    pub fn prefix_to_fs_path(&self, prefix: &StorePrefix) -> PathBuf {
        let mut path = self.base_path.clone();
        if let Some(prefix) = prefix.as_str().strip_suffix('/') {
            path.push(prefix);
        }
        path
    }

    fn get_file_mutex(&self, key: &StoreKey) -> Arc<RwLock<()>> {
        let mut files = self.files.lock();
        files.entry(key.clone()).or_default().clone()
    }

    fn walk_files(&self, path: &Path) -> impl Iterator<Item = PathBuf> {
        let walker = if self.sort {
            WalkDir::new(path).sort_by_file_name()
        } else {
            WalkDir::new(path)
        };
        walker
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|v| v.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
    }
}

impl ReadableStorageTraits for FilesystemStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        let file = self.get_file_mutex(key);
        let _lock = file.read();

        match std::fs::read(self.key_to_fspath(key)) {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        match std::fs::metadata(self.key_to_fspath(key)) {
            Ok(metadata) => Ok(Some(metadata.len())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl WritableStorageTraits for FilesystemStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }

        let file = self.get_file_mutex(key);
        let _lock = file.write();

        let key_path = self.key_to_fspath(key);
        if let Some(parent) = key_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(key_path)?;
        file.write_all(&value)?;
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }

        let file = self.get_file_mutex(key);
        let _lock = file.write();

        match std::fs::remove_file(self.key_to_fspath(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }

        let _lock = self.files.lock(); // lock all operations

        let prefix_path = self.prefix_to_fs_path(prefix);
        match std::fs::remove_dir_all(prefix_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl ListableStorageTraits for FilesystemStore {
    fn list(&self) -> Result<StoreKeys, StorageError> {
        self.list_prefix(&StorePrefix::root())
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        let prefix_path = self.prefix_to_fs_path(prefix);
        let mut keys: StoreKeys = self
            .walk_files(&prefix_path)
            .filter_map(|path| self.fspath_to_key(&path).ok())
            .collect();
        if self.sort {
            keys.sort();
        }
        Ok(keys)
    }

    fn size_prefix(&self, prefix: &StorePrefix) -> Result<u64, StorageError> {
        let prefix_path = self.prefix_to_fs_path(prefix);
        let mut size = 0;
        for path in self.walk_files(&prefix_path) {
            size += std::fs::metadata(path)?.len();
        }
        Ok(size)
    }
}

/// A filesystem store creation error.
#[derive(Debug, Error)]
pub enum FilesystemStoreCreateError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The path is not valid on this system.
    #[error("base path {0} is not valid")]
    InvalidBasePath(PathBuf),
    /// Base path is an existing file.
    #[error("{0} is an existing file")]
    ExistingFile(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn filesystem_set() -> Result<(), Box<dyn Error>> {
        let path = tempfile::TempDir::new()?;
        let store = FilesystemStore::new(path.path())?;
        let key = "a/b".try_into()?;
        store.set(&key, vec![0, 1, 2].into())?;
        assert_eq!(store.get(&key)?.unwrap(), vec![0, 1, 2]);
        assert_eq!(store.size_key(&key)?, Some(3));
        assert_eq!(store.get(&"a/c".try_into()?)?, None);
        assert!(path.path().join("a").join("b").is_file());
        Ok(())
    }

    #[test]
    fn filesystem_list() -> Result<(), Box<dyn Error>> {
        let path = tempfile::TempDir::new()?;
        let store = FilesystemStore::new(path.path())?.sorted();

        store.set(&"a/b".try_into()?, Bytes::new())?;
        store.set(&"a/c".try_into()?, Bytes::new())?;
        store.set(&"a/d/e".try_into()?, Bytes::new())?;
        store.set(&"a/d/f".try_into()?, vec![0; 4].into())?;
        store.erase(&"a/d/e".try_into()?)?;
        assert_eq!(
            store.list()?,
            &["a/b".try_into()?, "a/c".try_into()?, "a/d/f".try_into()?]
        );
        assert_eq!(
            store.list_prefix(&"a/d/".try_into()?)?,
            &["a/d/f".try_into()?]
        );
        assert!(store.list_prefix(&"z/".try_into()?)?.is_empty());
        assert_eq!(store.size()?, 4);

        store.erase_prefix(&"a/d/".try_into()?)?;
        assert_eq!(store.list()?, &["a/b".try_into()?, "a/c".try_into()?]);
        Ok(())
    }

    #[test]
    fn filesystem_lazy_base_path() -> Result<(), Box<dyn Error>> {
        let path = tempfile::TempDir::new()?;
        let base_path = path.path().join("not_yet");
        let store = FilesystemStore::new(&base_path)?;
        assert!(!base_path.exists());
        assert!(store.list()?.is_empty());
        store.set(&"k".try_into()?, vec![1].into())?;
        assert!(base_path.join("k").is_file());
        Ok(())
    }

    #[test]
    fn filesystem_lazy_nested_base_path() -> Result<(), Box<dyn Error>> {
        let path = tempfile::TempDir::new()?;
        let base_path = path.path().join("a").join("b").join("c");
        let store = FilesystemStore::new(&base_path)?;
        assert!(!store.readonly());
        assert!(!path.path().join("a").exists());
        store.set(&"k".try_into()?, vec![1].into())?;
        assert!(base_path.join("k").is_file());
        Ok(())
    }

    #[test]
    fn filesystem_existing_file() -> Result<(), Box<dyn Error>> {
        let file = tempfile::NamedTempFile::new()?;
        assert!(matches!(
            FilesystemStore::new(file.path()),
            Err(FilesystemStoreCreateError::ExistingFile(_))
        ));
        Ok(())
    }
}
