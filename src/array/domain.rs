use serde::{Deserialize, Serialize};

use crate::array_subset::{ArrayShape, ArraySubset};

use super::{Dimension, SchemaCreateError};

/// The domain of a dense array: an ordered, non-empty list of uniquely named dimensions.
///
/// Cells are ordered row-major over the domain, so the last dimension varies fastest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(Vec<Dimension>);

impl Domain {
    /// Create a new domain from `dimensions`.
    ///
    /// # Errors
    /// Returns [`SchemaCreateError`] if `dimensions` is empty or dimension names are not unique.
    pub fn new(dimensions: Vec<Dimension>) -> Result<Self, SchemaCreateError> {
        if dimensions.is_empty() {
            return Err(SchemaCreateError::EmptyDomain);
        }
        for (i, dimension) in dimensions.iter().enumerate() {
            if dimensions[..i]
                .iter()
                .any(|other| other.name() == dimension.name())
            {
                return Err(SchemaCreateError::DuplicateName(
                    dimension.name().to_string(),
                ));
            }
        }
        Ok(Self(dimensions))
    }

    /// Return the dimensions.
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.0
    }

    /// Return the dimension named `name` and its position in the domain.
    #[must_use]
    pub fn dimension(&self, name: &str) -> Option<(usize, &Dimension)> {
        self.0
            .iter()
            .enumerate()
            .find(|(_, dimension)| dimension.name() == name)
    }

    /// Return the number of dimensions.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.0.len()
    }

    /// Return the shape of the domain in cells.
    #[must_use]
    pub fn shape(&self) -> ArrayShape {
        self.0.iter().map(Dimension::extent).collect()
    }

    /// Return the tile shape.
    #[must_use]
    pub fn tile_shape(&self) -> ArrayShape {
        self.0.iter().map(Dimension::tile_extent).collect()
    }

    /// Return the subset covering the whole domain.
    #[must_use]
    pub fn subset_all(&self) -> ArraySubset {
        ArraySubset::new_with_shape(self.shape())
    }

    /// Check the domain, for example after it has been deserialised.
    ///
    /// # Errors
    /// Returns [`SchemaCreateError`] if any dimension is invalid or the domain could not have been created with [`Domain::new`].
    pub fn validate(&self) -> Result<(), SchemaCreateError> {
        for dimension in &self.0 {
            dimension.validate()?;
        }
        Self::new(self.0.clone())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::DataType;

    #[test]
    fn domain() {
        let domain = Domain::new(vec![
            Dimension::new("y", DataType::Int32, [0, 2]).unwrap(),
            Dimension::new("x", DataType::Int32, [1, 4])
                .unwrap()
                .with_tile_extent(2)
                .unwrap(),
        ])
        .unwrap();
        assert_eq!(domain.dimensionality(), 2);
        assert_eq!(domain.shape(), vec![3, 4]);
        assert_eq!(domain.tile_shape(), vec![3, 2]);
        assert_eq!(domain.subset_all(), ArraySubset::new_with_ranges(&[0..3, 0..4]));
        assert_eq!(domain.dimension("x").map(|(i, _)| i), Some(1));
        assert!(domain.dimension("z").is_none());
        assert!(domain.validate().is_ok());
    }

    #[test]
    fn domain_invalid() {
        assert!(matches!(
            Domain::new(vec![]),
            Err(SchemaCreateError::EmptyDomain)
        ));
        let x = Dimension::new("x", DataType::Int32, [0, 2]).unwrap();
        assert!(matches!(
            Domain::new(vec![x.clone(), x]),
            Err(SchemaCreateError::DuplicateName(name)) if name == "x"
        ));
    }
}
