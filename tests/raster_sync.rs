use std::sync::Arc;

use rasterstore::{
    array::{Array, ArrayCreateError, ArrayOpenError, Context, Mode, QueryStep, Subarray},
    raster::{store_raster_array_with, RasterError, PIXEL_ATTRIBUTE, X_DIMENSION, Y_DIMENSION},
    storage::{
        storage_adapter::performance_metrics::PerformanceMetricsStorageAdapter,
        store::MemoryStore, Bytes, ListableStorageTraits, MaybeBytes, ReadableStorageTraits,
        StorageError, StoreKey, StoreKeys, StorePrefix, WritableStorageTraits,
    },
};

/// A store which fails reads and writes of the keys matched by its predicates.
struct FailingStore {
    storage: MemoryStore,
    fail_get: fn(&str) -> bool,
    fail_set: fn(&str) -> bool,
}

impl FailingStore {
    /// A store which fails to write tiles.
    fn tile_writes() -> Self {
        Self {
            storage: MemoryStore::new(),
            fail_get: |_| false,
            fail_set: |key| key.contains("/c/"),
        }
    }

    /// A store which fails to read array schemas.
    fn schema_reads() -> Self {
        Self {
            storage: MemoryStore::new(),
            fail_get: |key| key.ends_with("__schema.json"),
            fail_set: |_| false,
        }
    }
}

impl ReadableStorageTraits for FailingStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        if (self.fail_get)(key.as_str()) {
            Err(StorageError::Other("connection reset".to_string()))
        } else {
            self.storage.get(key)
        }
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        self.storage.size_key(key)
    }
}

impl ListableStorageTraits for FailingStore {
    fn list(&self) -> Result<StoreKeys, StorageError> {
        self.storage.list()
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        self.storage.list_prefix(prefix)
    }

    fn size_prefix(&self, prefix: &StorePrefix) -> Result<u64, StorageError> {
        self.storage.size_prefix(prefix)
    }
}

impl WritableStorageTraits for FailingStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        if (self.fail_set)(key.as_str()) {
            Err(StorageError::Other("disk full".to_string()))
        } else {
            self.storage.set(key, value)
        }
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        self.storage.erase(key)
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        self.storage.erase_prefix(prefix)
    }
}

fn read_raster<TStorage: ?Sized + ReadableStorageTraits>(
    context: &Context<TStorage>,
    path: &str,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let array = Array::open(context, path, Mode::Read)?;
    Ok(array.retrieve_subarray(PIXEL_ATTRIBUTE, &Subarray::new())?)
}

#[test]
fn raster_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let context = Context::new(Arc::new(MemoryStore::new()));
    let (width, height) = (7i64, 5i64);
    let pixels: Vec<u8> = (0..35).map(|i| (i * 3 % 256) as u8).collect();
    store_raster_array_with(&context, "/raster", width, height, &pixels)?;
    assert_eq!(context.total_open_handles(), 0);

    let array = Array::open(&context, "/raster", Mode::Read)?;
    for y in 0..height {
        for x in 0..width {
            let cell = array.retrieve_subarray(
                PIXEL_ATTRIBUTE,
                &Subarray::new()
                    .add_range(X_DIMENSION, [x, x])
                    .add_range(Y_DIMENSION, [y, y]),
            )?;
            assert_eq!(cell, vec![pixels[(y * width + x) as usize]]);
        }
    }
    Ok(())
}

#[test]
fn raster_2x2() -> Result<(), Box<dyn std::error::Error>> {
    let context = Context::new(Arc::new(MemoryStore::new()));
    store_raster_array_with(&context, "/", 2, 2, &[10, 20, 30, 40])?;

    let array = Array::open(&context, "/", Mode::Read)?;
    let column = array.retrieve_subarray(
        PIXEL_ATTRIBUTE,
        &Subarray::new().add_range(X_DIMENSION, [1, 1]),
    )?;
    assert_eq!(column, vec![20, 40]);
    let row = array.retrieve_subarray(
        PIXEL_ATTRIBUTE,
        &Subarray::new().add_range(Y_DIMENSION, [1, 1]),
    )?;
    assert_eq!(row, vec![30, 40]);
    Ok(())
}

#[test]
fn raster_1x1() -> Result<(), Box<dyn std::error::Error>> {
    let context = Context::new(Arc::new(MemoryStore::new()));
    store_raster_array_with(&context, "/one", 1, 1, &[255])?;
    assert_eq!(read_raster(&context, "/one")?, vec![255]);
    Ok(())
}

#[test]
fn raster_multiple_tiles() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let context = Context::new(store.clone());
    let (width, height) = (300i64, 260i64);
    let pixels: Vec<u8> = (0..width * height).map(|i| (i % 251) as u8).collect();
    store_raster_array_with(&context, "/large", width, height, &pixels)?;

    // the default tile extent is 256, so 2x2 tiles
    assert_eq!(store.list_prefix(&"large/pixel/c/".try_into()?)?.len(), 4);
    assert_eq!(read_raster(&context, "/large")?, pixels);
    Ok(())
}

#[test]
fn raster_store_twice() -> Result<(), Box<dyn std::error::Error>> {
    let context = Context::new(Arc::new(MemoryStore::new()));
    store_raster_array_with(&context, "/raster", 2, 2, &[1, 2, 3, 4])?;

    let result = store_raster_array_with(&context, "/raster", 2, 2, &[5, 6, 7, 8]);
    assert!(matches!(
        result,
        Err(RasterError::StorageCreate {
            source: ArrayCreateError::AlreadyExists(_),
            ..
        })
    ));
    assert_eq!(read_raster(&context, "/raster")?, vec![1, 2, 3, 4]);

    // a different shape at the same path is rejected as well
    assert!(store_raster_array_with(&context, "/raster", 1, 1, &[9]).is_err());
    assert_eq!(read_raster(&context, "/raster")?, vec![1, 2, 3, 4]);
    assert_eq!(context.total_open_handles(), 0);
    Ok(())
}

#[test]
fn raster_invalid_input() {
    let store = Arc::new(PerformanceMetricsStorageAdapter::new(Arc::new(
        MemoryStore::new(),
    )));
    let context = Context::new(store.clone());

    let err = store_raster_array_with(&context, "/raster", 0, 2, &[]).unwrap_err();
    assert!(matches!(err, RasterError::InvalidInput { .. }));
    assert_eq!(
        err.to_string(),
        "invalid raster input for /raster: width 0 must be positive"
    );
    let err = store_raster_array_with(&context, "/raster", 2, 0, &[]).unwrap_err();
    assert!(matches!(err, RasterError::InvalidInput { .. }));
    let err = store_raster_array_with(&context, "/raster", 2, 2, &[1, 2, 3]).unwrap_err();
    assert!(matches!(err, RasterError::InvalidInput { .. }));
    assert_eq!(
        err.to_string(),
        "invalid raster input for /raster: pixel buffer has 3 values, expected 4"
    );

    assert_eq!(store.requests(), 0);
    assert_eq!(context.total_open_handles(), 0);
}

#[test]
fn raster_submit_failure() -> Result<(), Box<dyn std::error::Error>> {
    let context = Context::new(Arc::new(FailingStore::tile_writes()));
    let err = store_raster_array_with(&context, "/raster", 2, 2, &[1, 2, 3, 4]).unwrap_err();
    let RasterError::WriteQuery { path, source } = &err else {
        panic!("unexpected error {err}");
    };
    assert_eq!(path, "/raster");
    assert_eq!(source.step(), QueryStep::Submit);
    assert!(err.to_string().contains("submit"));
    assert_eq!(context.total_open_handles(), 0);

    // the array was created but never committed, so it reads as fill values
    assert_eq!(read_raster(&context, "/raster")?, vec![0; 4]);
    Ok(())
}

#[test]
fn raster_open_failure() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(FailingStore::schema_reads());
    let context = Context::new(store.clone());
    let err = store_raster_array_with(&context, "/raster", 2, 2, &[1, 2, 3, 4]).unwrap_err();
    assert!(matches!(
        &err,
        RasterError::ArrayOpen {
            source: ArrayOpenError::StorageError(_),
            ..
        }
    ));
    assert_eq!(
        err.to_string(),
        "failed to open raster array /raster for writing: connection reset"
    );
    assert_eq!(context.total_open_handles(), 0);

    // the array was created, but nothing was written
    assert!(store.storage.get(&"raster/__schema.json".try_into()?)?.is_some());
    assert!(store.storage.list_prefix(&"raster/pixel/".try_into()?)?.is_empty());
    Ok(())
}

#[cfg(feature = "filesystem")]
mod filesystem {
    use rasterstore::{
        array::{Array, Context, Mode, Subarray},
        raster::{store_raster_array, RasterError, PIXEL_ATTRIBUTE},
        storage::store::FilesystemStore,
    };
    use std::sync::Arc;

    #[test]
    fn raster_filesystem_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let location = dir.path().join("raster");
        let pixels: Vec<u8> = (0..12).collect();
        store_raster_array(&location, 4, 3, &pixels)?;
        assert!(location.join("__schema.json").is_file());
        assert!(location.join("__commit.json").is_file());
        assert!(location.join("pixel").join("c").join("0").join("0.1").is_file());

        let context = Context::new(Arc::new(FilesystemStore::new(&location)?));
        let array = Array::open(&context, "/", Mode::Read)?;
        assert_eq!(
            array.retrieve_subarray(PIXEL_ATTRIBUTE, &Subarray::new())?,
            pixels
        );
        Ok(())
    }

    #[test]
    fn raster_filesystem_store_twice() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let location = dir.path().join("raster");
        store_raster_array(&location, 2, 2, &[10, 20, 30, 40])?;
        let schema = std::fs::read(location.join("__schema.json"))?;
        let tile = std::fs::read(location.join("pixel/c/0/0.1"))?;

        let result = store_raster_array(&location, 2, 2, &[1, 1, 1, 1]);
        assert!(matches!(result, Err(RasterError::StorageCreate { .. })));
        assert_eq!(std::fs::read(location.join("__schema.json"))?, schema);
        assert_eq!(std::fs::read(location.join("pixel/c/0/0.1"))?, tile);
        assert_eq!(tile, vec![10, 20, 30, 40]);
        Ok(())
    }

    #[test]
    fn raster_filesystem_invalid_input() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let location = dir.path().join("raster");
        assert!(matches!(
            store_raster_array(&location, -1, 2, &[]),
            Err(RasterError::InvalidInput { .. })
        ));
        assert!(matches!(
            store_raster_array(&location, 2, 2, &[0; 5]),
            Err(RasterError::InvalidInput { .. })
        ));
        assert!(!location.exists());
        Ok(())
    }

    #[test]
    fn raster_filesystem_existing_file() -> Result<(), Box<dyn std::error::Error>> {
        let file = tempfile::NamedTempFile::new()?;
        assert!(matches!(
            store_raster_array(file.path(), 2, 2, &[0; 4]),
            Err(RasterError::StorageCreate { .. })
        ));
        Ok(())
    }
}
