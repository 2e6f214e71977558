//! The regular tile grid of a dense array.
//!
//! The array shape is split into tiles of equal shape.
//! Tiles on the upper edge of a dimension may extend past the array; they are stored with their full shape.

use crate::array_subset::{ArrayIndices, ArrayShape, ArraySubset, IncompatibleDimensionalityError};

/// A regular tile grid.
#[derive(Debug, Clone)]
pub struct TileGrid {
    array_shape: ArrayShape,
    tile_shape: ArrayShape,
}

impl TileGrid {
    /// Create a new tile grid with tiles of `tile_shape` over an array of `array_shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `tile_shape` and `array_shape` differ.
    pub fn new(
        array_shape: ArrayShape,
        tile_shape: ArrayShape,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if array_shape.len() == tile_shape.len() {
            Ok(Self {
                array_shape,
                tile_shape,
            })
        } else {
            Err(IncompatibleDimensionalityError::new(
                tile_shape.len(),
                array_shape.len(),
            ))
        }
    }

    /// Return the tile shape.
    #[must_use]
    pub fn tile_shape(&self) -> &[u64] {
        &self.tile_shape
    }

    /// Return the number of tiles along each dimension.
    ///
    /// Returns [`None`] if a tile extent is zero.
    #[must_use]
    pub fn grid_shape(&self) -> Option<ArrayShape> {
        std::iter::zip(&self.array_shape, &self.tile_shape)
            .map(|(&array_extent, &tile_extent)| {
                array_extent
                    .checked_next_multiple_of(tile_extent)?
                    .checked_div(tile_extent)
            })
            .collect()
    }

    /// Return the number of elements in a tile.
    ///
    /// Returns [`None`] if it overflows a [`u64`].
    #[must_use]
    pub fn tile_num_elements(&self) -> Option<u64> {
        ArraySubset::new_with_shape(self.tile_shape.clone()).num_elements()
    }

    /// Return the array subset of the tile at `tile_indices`.
    ///
    /// Returns [`None`] if `tile_indices` are outside of the grid.
    #[must_use]
    pub fn tile_subset(&self, tile_indices: &[u64]) -> Option<ArraySubset> {
        let grid_shape = self.grid_shape()?;
        if tile_indices.len() != grid_shape.len()
            || std::iter::zip(tile_indices, &grid_shape).any(|(index, extent)| index >= extent)
        {
            return None;
        }
        let start: ArrayIndices = std::iter::zip(tile_indices, &self.tile_shape)
            .map(|(index, tile_extent)| index * tile_extent)
            .collect();
        ArraySubset::new_with_start_shape(start, self.tile_shape.clone()).ok()
    }

    /// Return the subset of tile indices of the tiles intersecting `array_subset`.
    ///
    /// Returns [`None`] if `array_subset` is outside of the array.
    #[must_use]
    pub fn tiles_in_array_subset(&self, array_subset: &ArraySubset) -> Option<ArraySubset> {
        if !array_subset.inbounds_shape(&self.array_shape)
            || self.tile_shape.iter().any(|tile_extent| *tile_extent == 0)
        {
            return None;
        }
        let Some(end_inc) = array_subset.end_inc() else {
            return Some(ArraySubset::new_with_shape(vec![0; self.tile_shape.len()]));
        };
        let tiles_start = std::iter::zip(array_subset.start(), &self.tile_shape)
            .map(|(start, tile_extent)| start / tile_extent)
            .collect();
        let tiles_end_inc = std::iter::zip(&end_inc, &self.tile_shape)
            .map(|(end, tile_extent)| end / tile_extent)
            .collect();
        ArraySubset::new_with_start_end_inc(tiles_start, tiles_end_inc).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_grid() {
        let tile_grid = TileGrid::new(vec![5, 7], vec![2, 3]).unwrap();
        assert_eq!(tile_grid.tile_shape(), &[2, 3]);
        assert_eq!(tile_grid.grid_shape(), Some(vec![3, 3]));
        assert_eq!(tile_grid.tile_num_elements(), Some(6));
        assert_eq!(
            tile_grid.tile_subset(&[2, 2]),
            Some(ArraySubset::new_with_ranges(&[4..6, 6..9]))
        );
        assert_eq!(tile_grid.tile_subset(&[3, 0]), None);
        assert_eq!(tile_grid.tile_subset(&[0]), None);
        assert_eq!(
            tile_grid.tiles_in_array_subset(&ArraySubset::new_with_ranges(&[1..4, 2..4])),
            Some(ArraySubset::new_with_ranges(&[0..2, 0..2]))
        );
        assert_eq!(
            tile_grid.tiles_in_array_subset(&ArraySubset::new_with_ranges(&[0..5, 0..7])),
            Some(ArraySubset::new_with_ranges(&[0..3, 0..3]))
        );
        assert!(tile_grid
            .tiles_in_array_subset(&ArraySubset::new_with_ranges(&[0..2, 0..0]))
            .unwrap()
            .is_empty());
        assert_eq!(
            tile_grid.tiles_in_array_subset(&ArraySubset::new_with_ranges(&[0..6, 0..7])),
            None
        );
    }

    #[test]
    fn tile_grid_incompatible() {
        assert!(TileGrid::new(vec![5, 7], vec![2]).is_err());
        assert_eq!(TileGrid::new(vec![5], vec![0]).unwrap().grid_shape(), None);
    }
}
