use serde::{Deserialize, Serialize};

use crate::config::global_config;

use super::{array_schema::validate_name, DataType, SchemaCreateError};

/// A dimension of a dense array domain.
///
/// A dimension has a name, an `int32` coordinate type, an inclusive domain `[lower, upper]` and a tile extent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    name: String,
    #[serde(rename = "type")]
    data_type: DataType,
    domain: [i64; 2],
    tile_extent: u64,
}

impl Dimension {
    /// Create a new dimension spanning `domain` (inclusive).
    ///
    /// The tile extent is the [default tile extent](crate::config::Config#default-tile-extent) capped to the dimension extent.
    ///
    /// # Errors
    /// Returns [`SchemaCreateError`] if
    ///  - the name is invalid,
    ///  - the data type is not [`DataType::Int32`], or
    ///  - the domain is empty or has bounds outside of the `int32` range.
    pub fn new(
        name: impl Into<String>,
        data_type: DataType,
        domain: [i64; 2],
    ) -> Result<Self, SchemaCreateError> {
        let name = name.into();
        validate_name(&name)?;
        if data_type != DataType::Int32 {
            return Err(SchemaCreateError::UnsupportedDimensionDataType { name, data_type });
        }
        let [lower, upper] = domain;
        if lower > upper || i32::try_from(lower).is_err() || i32::try_from(upper).is_err() {
            return Err(SchemaCreateError::InvalidDimensionDomain { name, lower, upper });
        }
        let extent = upper.abs_diff(lower) + 1;
        let tile_extent = std::cmp::min(extent, global_config().default_tile_extent().get());
        Ok(Self {
            name,
            data_type,
            domain,
            tile_extent,
        })
    }

    /// Set the tile extent.
    ///
    /// # Errors
    /// Returns [`SchemaCreateError::InvalidTileExtent`] if `tile_extent` is zero or exceeds the dimension extent.
    pub fn with_tile_extent(mut self, tile_extent: u64) -> Result<Self, SchemaCreateError> {
        let extent = self.extent();
        if tile_extent == 0 || tile_extent > extent {
            return Err(SchemaCreateError::InvalidTileExtent {
                name: self.name,
                tile_extent,
                extent,
            });
        }
        self.tile_extent = tile_extent;
        Ok(self)
    }

    /// Return the dimension name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the coordinate data type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Return the inclusive domain `[lower, upper]`.
    #[must_use]
    pub const fn domain(&self) -> [i64; 2] {
        self.domain
    }

    /// Return the lower bound of the domain.
    #[must_use]
    pub const fn lower(&self) -> i64 {
        self.domain[0]
    }

    /// Return the number of coordinates in the domain.
    #[must_use]
    pub fn extent(&self) -> u64 {
        self.domain[1].abs_diff(self.domain[0]) + 1
    }

    /// Return the tile extent.
    #[must_use]
    pub const fn tile_extent(&self) -> u64 {
        self.tile_extent
    }

    /// Check the dimension, for example after it has been deserialised.
    ///
    /// # Errors
    /// Returns [`SchemaCreateError`] if the dimension could not have been created with [`Dimension::new`] and [`Dimension::with_tile_extent`].
    pub fn validate(&self) -> Result<(), SchemaCreateError> {
        Self::new(self.name.clone(), self.data_type, self.domain)?.with_tile_extent(self.tile_extent)?;
        Ok(())
    }
}
