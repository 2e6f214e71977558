use std::ops::Range;

use crate::array_subset::ArraySubset;

use super::{ArrayError, Domain};

/// A subarray: named inclusive ranges in domain coordinates.
///
/// Dimensions without a range span their full domain, so [`Subarray::new`] alone selects the whole array.
///
/// ```rust
/// # use rasterstore::array::Subarray;
/// let subarray = Subarray::new().add_range("y", [0, 9]).add_range("x", [10, 19]);
/// assert_eq!(subarray.ranges().len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Subarray {
    ranges: Vec<(String, [i64; 2])>,
}

impl Subarray {
    /// Create a new subarray spanning the full domain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the inclusive `range` for `dimension`.
    #[must_use]
    pub fn add_range(mut self, dimension: impl Into<String>, range: [i64; 2]) -> Self {
        self.ranges.push((dimension.into(), range));
        self
    }

    /// Return the ranges that have been set.
    #[must_use]
    pub fn ranges(&self) -> &[(String, [i64; 2])] {
        &self.ranges
    }

    /// Resolve the subarray to an [`ArraySubset`] of the cells of `domain`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if a dimension is unknown or set twice, or a range is reversed or outside of the dimension domain.
    pub fn to_array_subset(&self, domain: &Domain) -> Result<ArraySubset, ArrayError> {
        let mut ranges: Vec<Option<Range<u64>>> = vec![None; domain.dimensionality()];
        for (name, range) in &self.ranges {
            let (index, dimension) = domain
                .dimension(name)
                .ok_or_else(|| ArrayError::UnknownDimension(name.clone()))?;
            if ranges[index].is_some() {
                return Err(ArrayError::DuplicateRange(name.clone()));
            }
            let [lower, upper] = dimension.domain();
            if range[0] > range[1] || range[0] < lower || range[1] > upper {
                return Err(ArrayError::InvalidRange {
                    dimension: name.clone(),
                    range: *range,
                    domain: dimension.domain(),
                });
            }
            ranges[index] = Some(range[0].abs_diff(lower)..range[1].abs_diff(lower) + 1);
        }
        let ranges: Vec<Range<u64>> = std::iter::zip(ranges, domain.dimensions())
            .map(|(range, dimension)| range.unwrap_or(0..dimension.extent()))
            .collect();
        Ok(ArraySubset::new_with_ranges(&ranges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{DataType, Dimension};

    fn domain() -> Domain {
        Domain::new(vec![
            Dimension::new("y", DataType::Int32, [0, 3]).unwrap(),
            Dimension::new("x", DataType::Int32, [-2, 5]).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn subarray() {
        let domain = domain();
        assert_eq!(
            Subarray::new().to_array_subset(&domain).unwrap(),
            ArraySubset::new_with_ranges(&[0..4, 0..8])
        );
        assert_eq!(
            Subarray::new()
                .add_range("x", [-1, 0])
                .to_array_subset(&domain)
                .unwrap(),
            ArraySubset::new_with_ranges(&[0..4, 1..3])
        );
        assert_eq!(
            Subarray::new()
                .add_range("y", [2, 2])
                .add_range("x", [5, 5])
                .to_array_subset(&domain)
                .unwrap(),
            ArraySubset::new_with_ranges(&[2..3, 7..8])
        );
    }

    #[test]
    fn subarray_invalid() {
        let domain = domain();
        assert!(matches!(
            Subarray::new().add_range("z", [0, 0]).to_array_subset(&domain),
            Err(ArrayError::UnknownDimension(_))
        ));
        assert!(matches!(
            Subarray::new()
                .add_range("y", [0, 0])
                .add_range("y", [1, 1])
                .to_array_subset(&domain),
            Err(ArrayError::DuplicateRange(_))
        ));
        assert!(matches!(
            Subarray::new().add_range("y", [0, 4]).to_array_subset(&domain),
            Err(ArrayError::InvalidRange { .. })
        ));
        assert!(matches!(
            Subarray::new().add_range("x", [-3, 0]).to_array_subset(&domain),
            Err(ArrayError::InvalidRange { .. })
        ));
        assert!(matches!(
            Subarray::new().add_range("y", [2, 1]).to_array_subset(&domain),
            Err(ArrayError::InvalidRange { .. })
        ));
    }
}
