//! Cell data types.
//!
//! Dimension coordinates are [`DataType::Int32`]. Attributes may be any [`DataType`].

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::FillValue;

/// A cell data type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum DataType {
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    #[display("int32")]
    Int32,
    /// `uint8` Integer in `[0, 2^8-1]`.
    #[display("uint8")]
    UInt8,
}

/// A fill value is incompatible with a data type.
#[derive(Debug, Error)]
#[error("fill value {1} is incompatible with data type {0}")]
pub struct IncompatibleFillValueError(DataType, FillValue);

impl IncompatibleFillValueError {
    /// Create a new incompatible fill value error.
    #[must_use]
    pub const fn new(data_type: DataType, fill_value: FillValue) -> Self {
        Self(data_type, fill_value)
    }
}

impl DataType {
    /// Returns the size in bytes of one element of the data type.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Int32 => 4,
            Self::UInt8 => 1,
        }
    }

    /// Returns the default fill value of the data type (all zero bytes).
    #[must_use]
    pub fn default_fill_value(&self) -> FillValue {
        FillValue::from(vec![0u8; self.size()])
    }

    /// Check that `fill_value` is compatible with the data type.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueError`] if the size of `fill_value` does not match the data type size.
    pub fn validate_fill_value(&self, fill_value: &FillValue) -> Result<(), IncompatibleFillValueError> {
        if fill_value.size() == self.size() {
            Ok(())
        } else {
            Err(IncompatibleFillValueError::new(*self, fill_value.clone()))
        }
    }
}
