use thiserror::Error;

use crate::{
    array_subset::{
        ArrayIndices, ArraySubsetError, IncompatibleArraySubsetAndShapeError,
        IncompatibleDimensionalityError,
    },
    node::{NodePath, NodePathError},
    storage::StorageError,
};

use super::{data_type::IncompatibleFillValueError, DataType, Layout, Mode};

/// An array schema creation error.
///
/// Raised while building a [`Dimension`](super::Dimension), [`Domain`](super::Domain), [`Attribute`](super::Attribute) or [`ArraySchema`](super::ArraySchema).
#[derive(Debug, Error)]
pub enum SchemaCreateError {
    /// An invalid dimension or attribute name.
    #[error("invalid name {0:?}, names must be non-empty, must not contain '/' and must not start with '__'")]
    InvalidName(String),
    /// A dimension with a data type other than `int32`.
    #[error("dimension {name} has unsupported data type {data_type}, expected int32")]
    UnsupportedDimensionDataType {
        /// The dimension name.
        name: String,
        /// The data type.
        data_type: DataType,
    },
    /// A dimension domain that is empty or not representable as `int32`.
    #[error("dimension {name} has invalid domain [{lower}, {upper}]")]
    InvalidDimensionDomain {
        /// The dimension name.
        name: String,
        /// The lower bound (inclusive).
        lower: i64,
        /// The upper bound (inclusive).
        upper: i64,
    },
    /// A tile extent of zero or larger than the dimension extent.
    #[error("dimension {name} has invalid tile extent {tile_extent}, expected 1 to {extent}")]
    InvalidTileExtent {
        /// The dimension name.
        name: String,
        /// The tile extent.
        tile_extent: u64,
        /// The dimension extent.
        extent: u64,
    },
    /// A domain without dimensions.
    #[error("a domain must have at least one dimension")]
    EmptyDomain,
    /// A schema without attributes.
    #[error("an array schema must have at least one attribute")]
    NoAttributes,
    /// A dimension or attribute name is used more than once.
    #[error("duplicate dimension or attribute name {0}")]
    DuplicateName(String),
    /// An attribute fill value is incompatible with its data type.
    #[error(transparent)]
    IncompatibleFillValue(#[from] IncompatibleFillValueError),
}

/// An array creation error.
#[derive(Debug, Error)]
pub enum ArrayCreateError {
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// The array path already holds data.
    #[error("array {0} already exists")]
    AlreadyExists(NodePath),
    /// Failed to serialise the array schema.
    #[error("failed to serialise array schema: {0}")]
    MetadataSerialization(#[from] serde_json::Error),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// Failed to create a filesystem store.
    #[cfg(feature = "filesystem")]
    #[error(transparent)]
    FilesystemStoreCreateError(#[from] crate::storage::store::FilesystemStoreCreateError),
}

/// An array open error.
#[derive(Debug, Error)]
pub enum ArrayOpenError {
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// There is no array schema at the path.
    #[error("array {0} not found")]
    NotFound(NodePath),
    /// The array schema could not be parsed or is invalid.
    #[error("array {0} has invalid metadata: {1}")]
    InvalidMetadata(NodePath, String),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

/// Array errors.
///
/// Raised by reads and by the steps of a [`WriteQuery`](super::WriteQuery).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArrayError {
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// The operation is not permitted in the mode the array was opened with.
    #[error("array is open in {actual} mode, expected {expected} mode")]
    InvalidMode {
        /// The mode required by the operation.
        expected: Mode,
        /// The mode of the array.
        actual: Mode,
    },
    /// The layout is not supported by the array.
    #[error("layout {0} is not supported by dense arrays")]
    UnsupportedLayout(Layout),
    /// An unknown attribute.
    #[error("unknown attribute {0}")]
    UnknownAttribute(String),
    /// An unknown dimension.
    #[error("unknown dimension {0}")]
    UnknownDimension(String),
    /// A dimension range was set more than once.
    #[error("range for dimension {0} set more than once")]
    DuplicateRange(String),
    /// A data buffer was set more than once.
    #[error("data buffer for attribute {0} set more than once")]
    DuplicateDataBuffer(String),
    /// A subarray range outside of the dimension domain.
    #[error("range [{}, {}] of dimension {dimension} is outside of its domain [{}, {}]", .range[0], .range[1], .domain[0], .domain[1])]
    InvalidRange {
        /// The dimension name.
        dimension: String,
        /// The range (inclusive).
        range: [i64; 2],
        /// The dimension domain (inclusive).
        domain: [i64; 2],
    },
    /// A write query without a data buffer for an attribute.
    #[error("missing data buffer for attribute {0}")]
    MissingDataBuffer(String),
    /// An unexpected bytes input size.
    #[error("data buffer for attribute {0} has size {1}, expected {2}")]
    InvalidBytesInputSize(String, usize, u64),
    /// An unexpected tile size in the store.
    #[error("tile {0} has size {1}, expected {2}")]
    UnexpectedTileSize(String, usize, usize),
    /// A subarray or tile with more bytes than can be addressed.
    #[error("the number of elements exceeds the addressable memory")]
    TooManyElements,
    /// Tile indices outside of the tile grid.
    #[error("invalid tile indices {0:?}")]
    InvalidTileIndices(ArrayIndices),
    /// A tile referenced by the commit document is not in the store.
    #[error("tile {0} referenced by the commit document is missing")]
    MissingTile(String),
    /// The commit document could not be parsed.
    #[error("invalid commit metadata: {0}")]
    InvalidCommitMetadata(String),
    /// Failed to serialise the commit document.
    #[error("failed to serialise commit metadata: {0}")]
    MetadataSerialization(#[from] serde_json::Error),
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionalityError(#[from] IncompatibleDimensionalityError),
    /// An array subset error.
    #[error(transparent)]
    ArraySubsetError(#[from] ArraySubsetError),
    /// Incompatible array subset.
    #[error(transparent)]
    IncompatibleArraySubsetAndShapeError(#[from] IncompatibleArraySubsetAndShapeError),
}
