//! Fill values.

use serde::{Deserialize, Serialize};

/// The fill value of an attribute.
///
/// Provides an element value for cells that have never been written, and for the padding of edge tiles.
/// Multi-byte fill values are stored little-endian.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FillValue(Vec<u8>);

impl core::fmt::Display for FillValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<&[u8]> for FillValue {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for FillValue {
    fn from(value: [u8; N]) -> Self {
        Self(value.to_vec())
    }
}

impl From<Vec<u8>> for FillValue {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<u8> for FillValue {
    fn from(value: u8) -> Self {
        Self(vec![value])
    }
}

impl From<i32> for FillValue {
    fn from(value: i32) -> Self {
        Self(value.to_le_bytes().to_vec())
    }
}

impl FillValue {
    /// Create a new fill value composed of `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the byte representation of the fill value.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Return `num_elements` repetitions of the fill value.
    #[must_use]
    pub fn repeat(&self, num_elements: usize) -> Vec<u8> {
        self.0.repeat(num_elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_value() {
        let fill_value = FillValue::from(7u8);
        assert_eq!(fill_value.size(), 1);
        assert_eq!(fill_value.repeat(3), vec![7, 7, 7]);
        assert_eq!(FillValue::from(1i32).as_bytes(), &[1, 0, 0, 0]);
        assert_eq!(FillValue::from([1, 2]).to_string(), "[1, 2]");
        assert_eq!(serde_json::to_string(&fill_value).unwrap(), "[7]");
    }
}
