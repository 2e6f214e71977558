//! Dense 2D rasters.
//!
//! A raster is a `width` × `height` grid of [`u8`] pixels, supplied as a row-major buffer with `x` varying fastest.
//! It is persisted as a dense array with
//!  - the dimensions [`Y_DIMENSION`] (`[0, height-1]`) and [`X_DIMENSION`] (`[0, width-1]`), both `int32`, in that order, and
//!  - the single `uint8` attribute [`PIXEL_ATTRIBUTE`].
//!
//! Cell `(x, y)` holds `pixels[y * width + x]`.
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # use std::sync::Arc;
//! use rasterstore::{
//!     array::{Array, Context, Mode, Subarray},
//!     raster::{store_raster_array_with, PIXEL_ATTRIBUTE},
//!     storage::store::MemoryStore,
//! };
//! let context = Context::new(Arc::new(MemoryStore::new()));
//! store_raster_array_with(&context, "/raster", 2, 2, &[10, 20, 30, 40])?;
//!
//! let array = Array::open(&context, "/raster", Mode::Read)?;
//! let pixels = array.retrieve_subarray(
//!     PIXEL_ATTRIBUTE,
//!     &Subarray::new().add_range("x", [1, 1]).add_range("y", [0, 0]),
//! )?;
//! assert_eq!(pixels, vec![20]);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "filesystem")]
use std::{path::Path, sync::Arc};

use thiserror::Error;

use crate::{
    array::{
        Array, ArrayCreateError, ArrayOpenError, ArraySchema, ArraySchemaBuilder, Attribute,
        Context, DataType, Dimension, Domain, Layout, Mode, QueryError, SchemaCreateError,
        Subarray, WriteQuery,
    },
    node::{NodePath, NodePathError},
    storage::ReadableWritableListableStorageTraits,
};

/// The name of the pixel attribute.
pub const PIXEL_ATTRIBUTE: &str = "pixel";

/// The name of the dimension indexing columns.
pub const X_DIMENSION: &str = "x";

/// The name of the dimension indexing rows.
pub const Y_DIMENSION: &str = "y";

/// Invalid raster input, detected before any storage access.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// A width that is not positive.
    #[error("width {0} must be positive")]
    InvalidWidth(i64),
    /// A height that is not positive.
    #[error("height {0} must be positive")]
    InvalidHeight(i64),
    /// The pixel buffer length is not width × height.
    #[error("pixel buffer has {actual} values, expected {expected}")]
    PixelCountMismatch {
        /// The expected number of pixels.
        expected: u128,
        /// The length of the pixel buffer.
        actual: usize,
    },
    /// An invalid array path.
    #[error(transparent)]
    InvalidArrayPath(#[from] NodePathError),
}

/// A raster storage error.
///
/// Each variant names the failed operation and the array location, and holds the cause as its source.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The raster dimensions, pixel buffer, or array path are invalid.
    #[error("invalid raster input for {path}: {source}")]
    InvalidInput {
        /// The array location.
        path: String,
        /// The cause.
        source: InvalidInputError,
    },
    /// The array schema could not be constructed.
    #[error("failed to construct the raster schema for {path}: {source}")]
    SchemaConstruction {
        /// The array location.
        path: String,
        /// The cause.
        source: SchemaCreateError,
    },
    /// The array could not be created, for example because it already exists.
    #[error("failed to create raster array {path}: {source}")]
    StorageCreate {
        /// The array location.
        path: String,
        /// The cause.
        source: ArrayCreateError,
    },
    /// The array could not be opened for writing.
    #[error("failed to open raster array {path} for writing: {source}")]
    ArrayOpen {
        /// The array location.
        path: String,
        /// The cause.
        source: ArrayOpenError,
    },
    /// The pixel write query could not be built or submitted.
    #[error("failed to write pixels to raster array {path}: {source}")]
    WriteQuery {
        /// The array location.
        path: String,
        /// The cause.
        source: QueryError,
    },
}

/// The extent of a raster.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RasterSpec {
    width: i64,
    height: i64,
}

impl RasterSpec {
    /// Create a new raster spec.
    ///
    /// # Errors
    /// Returns [`InvalidInputError`] if `width` or `height` is not positive.
    pub fn new(width: i64, height: i64) -> Result<Self, InvalidInputError> {
        if width <= 0 {
            Err(InvalidInputError::InvalidWidth(width))
        } else if height <= 0 {
            Err(InvalidInputError::InvalidHeight(height))
        } else {
            Ok(Self { width, height })
        }
    }

    /// Return the width (number of columns).
    #[must_use]
    pub const fn width(&self) -> i64 {
        self.width
    }

    /// Return the height (number of rows).
    #[must_use]
    pub const fn height(&self) -> i64 {
        self.height
    }

    /// Return the number of pixels, `width * height`.
    #[must_use]
    pub fn num_pixels(&self) -> u128 {
        u128::from(self.width.unsigned_abs()) * u128::from(self.height.unsigned_abs())
    }

    /// Check that `pixels` holds exactly one value per pixel.
    ///
    /// # Errors
    /// Returns [`InvalidInputError::PixelCountMismatch`] otherwise.
    pub fn validate_pixels(&self, pixels: &[u8]) -> Result<(), InvalidInputError> {
        let expected = self.num_pixels();
        if pixels.len() as u128 == expected {
            Ok(())
        } else {
            Err(InvalidInputError::PixelCountMismatch {
                expected,
                actual: pixels.len(),
            })
        }
    }

    /// Return the subarray covering the whole raster.
    #[must_use]
    pub fn subarray(&self) -> Subarray {
        Subarray::new()
            .add_range(Y_DIMENSION, [0, self.height - 1])
            .add_range(X_DIMENSION, [0, self.width - 1])
    }
}

/// Build the dense array schema of a raster.
///
/// The domain is `y ∈ [0, height-1]` then `x ∈ [0, width-1]` (`int32`), with a single `uint8` attribute `pixel`.
/// This does not access storage.
///
/// # Errors
/// Returns [`SchemaCreateError`] if a dimension is not representable, e.g. more than 2^31 pixels along an axis.
pub fn raster_schema(spec: &RasterSpec) -> Result<ArraySchema, SchemaCreateError> {
    let domain = Domain::new(vec![
        Dimension::new(Y_DIMENSION, DataType::Int32, [0, spec.height - 1])?,
        Dimension::new(X_DIMENSION, DataType::Int32, [0, spec.width - 1])?,
    ])?;
    ArraySchemaBuilder::new(domain)
        .attribute(Attribute::new(PIXEL_ATTRIBUTE, DataType::UInt8)?)
        .build()
}

/// Store a raster as a new dense array at `array_path` of the store of `context`.
///
/// The input is validated before any storage access.
/// The array is then created, opened for writing, written with one row-major query over its full extent, and closed.
/// The array is closed on every path out of this function.
///
/// # Errors
/// Returns a [`RasterError`] if
///  - `width` or `height` is not positive, `pixels.len() != width * height`, or `array_path` is invalid ([`RasterError::InvalidInput`]),
///  - the schema cannot be built ([`RasterError::SchemaConstruction`]),
///  - the array already exists or cannot be created ([`RasterError::StorageCreate`]),
///  - the array cannot be opened ([`RasterError::ArrayOpen`]), or
///  - the write query fails ([`RasterError::WriteQuery`]).
pub fn store_raster_array_with<TStorage: ?Sized + ReadableWritableListableStorageTraits>(
    context: &Context<TStorage>,
    array_path: &str,
    width: i64,
    height: i64,
    pixels: &[u8],
) -> Result<(), RasterError> {
    let invalid_input = |source: InvalidInputError| RasterError::InvalidInput {
        path: array_path.to_string(),
        source,
    };
    NodePath::new(array_path).map_err(|err| invalid_input(err.into()))?;
    let spec = RasterSpec::new(width, height).map_err(invalid_input)?;
    spec.validate_pixels(pixels).map_err(invalid_input)?;
    write_raster(context, array_path, array_path, &spec, pixels)
}

/// Store a raster as a new dense array in the directory `location`.
///
/// The array is the root of a [`FilesystemStore`](crate::storage::store::FilesystemStore) at `location`.
/// Invalid input is rejected before `location` is touched, so it is not created.
///
/// # Errors
/// See [`store_raster_array_with`].
/// [`RasterError::StorageCreate`] is also returned if the filesystem store cannot be created at `location`.
#[cfg(feature = "filesystem")]
pub fn store_raster_array(
    location: impl AsRef<Path>,
    width: i64,
    height: i64,
    pixels: &[u8],
) -> Result<(), RasterError> {
    use crate::storage::store::FilesystemStore;

    let location = location.as_ref();
    let path = location.display().to_string();
    let spec = RasterSpec::new(width, height)
        .and_then(|spec| spec.validate_pixels(pixels).map(|()| spec))
        .map_err(|source| RasterError::InvalidInput {
            path: path.clone(),
            source,
        })?;
    let store = FilesystemStore::new(location).map_err(|err| RasterError::StorageCreate {
        path: path.clone(),
        source: err.into(),
    })?;
    let context = Context::new(Arc::new(store));
    write_raster(&context, &path, "/", &spec, pixels)
}

fn write_raster<TStorage: ?Sized + ReadableWritableListableStorageTraits>(
    context: &Context<TStorage>,
    location: &str,
    array_path: &str,
    spec: &RasterSpec,
    pixels: &[u8],
) -> Result<(), RasterError> {
    let path = || location.to_string();
    let schema = raster_schema(spec).map_err(|source| RasterError::SchemaConstruction {
        path: path(),
        source,
    })?;
    Array::create(context, array_path, &schema).map_err(|source| RasterError::StorageCreate {
        path: path(),
        source,
    })?;
    let array = Array::open(context, array_path, Mode::Write).map_err(|source| {
        RasterError::ArrayOpen {
            path: path(),
            source,
        }
    })?;
    WriteQuery::new(&array)
        .and_then(|query| query.layout(Layout::RowMajor))
        .and_then(|query| query.subarray(&spec.subarray()))
        .and_then(|query| query.data_buffer(PIXEL_ATTRIBUTE, pixels))
        .and_then(WriteQuery::submit)
        .map_err(|source| RasterError::WriteQuery {
            path: path(),
            source,
        })?;
    array.close();
    Ok(())
}
