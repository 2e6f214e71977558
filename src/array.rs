//! Dense arrays.
//!
//! A dense array stores a value for every [`Attribute`] in every cell of its [`Domain`].
//! Its [`ArraySchema`] is built once with an [`ArraySchemaBuilder`] and persisted with [`Array::create`].
//!
//! An array is accessed through an [`Array`] handle returned by [`Array::open`], bound to a [`Context`] and a [`Mode`].
//! Cells are written with a [`WriteQuery`] and read with [`Array::retrieve_subarray`].
//! The handle is released by [`Array::close`] or when it is dropped.
//!
//! ## Storage layout
//! An array at path `/p` in a store has the keys
//!  - `p/__schema.json`: the [`ArraySchema`] as JSON,
//!  - `p/__commit.json`: the number of completed writes and the live generation of each tile,
//!  - `p/<attribute>/c/<i>/<j>.<g>`: generation `g` of the tile at tile indices `[i, j]` of an attribute (one index per dimension).
//!
//! Tiles are the row-major bytes of the full tile shape, edge tiles padded with the fill value.
//! Write `g` stores every tile it touches as generation `g`, then replaces the commit document.
//! Readers only follow the commit document, so the tiles of a failed write are never visible.
//! Tiles absent from the commit document read as the fill value.

mod array_errors;
mod array_schema;
mod attribute;
mod context;
mod data_type;
mod dimension;
mod domain;
mod fill_value;
mod query;
mod subarray;
mod tile_grid;

use std::{borrow::Cow, collections::BTreeMap, ops::Range};

use derive_more::Display;
use serde::{Deserialize, Serialize};

pub use self::{
    array_errors::{ArrayCreateError, ArrayError, ArrayOpenError, SchemaCreateError},
    array_schema::{ArraySchema, ArraySchemaBuilder},
    attribute::Attribute,
    context::Context,
    data_type::{DataType, IncompatibleFillValueError},
    dimension::Dimension,
    domain::Domain,
    fill_value::FillValue,
    query::{Layout, QueryError, QueryStep, WriteQuery},
    subarray::Subarray,
    tile_grid::TileGrid,
};
pub use crate::array_subset::{ArrayIndices, ArrayShape};

use crate::{
    array_subset::{ArraySubset, IncompatibleArraySubsetAndShapeError},
    config::global_config,
    node::NodePath,
    storage::{
        commit_key, schema_key, tile_key, tile_name, ReadableStorageTraits, ReadableWritableListableStorageTraits,
        ReadableWritableStorageTraits, StorePrefix,
    },
};

/// The mode an [`Array`] is opened with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum Mode {
    /// Cells can be read.
    #[display("read")]
    Read,
    /// Cells can be written.
    #[display("write")]
    Write,
}

/// The commit document of an array.
#[derive(Serialize, Deserialize)]
struct CommitMetadata {
    format_version: monostate::MustBe!(1u64),
    write_count: u64,
    /// The live generation of each written tile, by tile name.
    tiles: BTreeMap<String, u64>,
}

impl CommitMetadata {
    fn new() -> Self {
        Self {
            format_version: monostate::MustBe!(1u64),
            write_count: 0,
            tiles: BTreeMap::new(),
        }
    }
}

/// An open dense array.
///
/// The handle is registered with its [`Context`] while open.
/// It is released by [`Array::close`], or when dropped, so every exit path closes it.
#[derive(Debug)]
pub struct Array<'a, TStorage: ?Sized> {
    context: &'a Context<TStorage>,
    path: NodePath,
    mode: Mode,
    schema: ArraySchema,
}

impl<'a, TStorage: ?Sized> Array<'a, TStorage> {
    /// Return the node path of the array.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Return the mode the array was opened with.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Return the array schema.
    #[must_use]
    pub const fn schema(&self) -> &ArraySchema {
        &self.schema
    }

    /// Return the context of the array.
    #[must_use]
    pub const fn context(&self) -> &'a Context<TStorage> {
        self.context
    }

    /// Close the array, releasing its handle.
    pub fn close(self) {
        drop(self);
    }

    fn tile_grid(&self) -> Result<TileGrid, ArrayError> {
        let domain = self.schema.domain();
        Ok(TileGrid::new(domain.shape(), domain.tile_shape())?)
    }

    fn tiles_in_subset(
        &self,
        tile_grid: &TileGrid,
        subset: &ArraySubset,
    ) -> Result<ArraySubset, ArrayError> {
        tile_grid.tiles_in_array_subset(subset).ok_or_else(|| {
            IncompatibleArraySubsetAndShapeError::new(
                subset.clone(),
                self.schema.domain().shape(),
            )
            .into()
        })
    }
}

impl<TStorage: ?Sized + ReadableWritableListableStorageTraits> Array<'_, TStorage> {
    /// Create the array at `path` with `schema`.
    ///
    /// Writes the array schema to `<path>/__schema.json`.
    /// The array must then be opened with [`Array::open`].
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if
    ///  - `path` is not a valid [`NodePath`],
    ///  - any key already exists under `path` ([`ArrayCreateError::AlreadyExists`]), or
    ///  - there is an underlying storage error.
    pub fn create(
        context: &Context<TStorage>,
        path: &str,
        schema: &ArraySchema,
    ) -> Result<(), ArrayCreateError> {
        let path = NodePath::new(path)?;
        let storage = context.storage();
        if !storage.list_prefix(&StorePrefix::from(&path))?.is_empty() {
            return Err(ArrayCreateError::AlreadyExists(path));
        }
        let schema_bytes = if global_config().pretty_metadata() {
            serde_json::to_vec_pretty(schema)?
        } else {
            serde_json::to_vec(schema)?
        };
        storage.set(&schema_key(&path), schema_bytes.into())?;
        Ok(())
    }
}

impl<'a, TStorage: ?Sized + ReadableStorageTraits> Array<'a, TStorage> {
    /// Open the array at `path` in `mode`.
    ///
    /// # Errors
    /// Returns an [`ArrayOpenError`] if
    ///  - `path` is not a valid [`NodePath`],
    ///  - there is no array schema at `path` ([`ArrayOpenError::NotFound`]),
    ///  - the array schema is not valid ([`ArrayOpenError::InvalidMetadata`]), or
    ///  - there is an underlying storage error.
    pub fn open(
        context: &'a Context<TStorage>,
        path: &str,
        mode: Mode,
    ) -> Result<Self, ArrayOpenError> {
        let path = NodePath::new(path)?;
        let schema_bytes = context
            .storage()
            .get(&schema_key(&path))?
            .ok_or_else(|| ArrayOpenError::NotFound(path.clone()))?;
        let schema: ArraySchema = serde_json::from_slice(&schema_bytes)
            .map_err(|err| ArrayOpenError::InvalidMetadata(path.clone(), err.to_string()))?;
        schema
            .validate()
            .map_err(|err| ArrayOpenError::InvalidMetadata(path.clone(), err.to_string()))?;
        context.acquire(&path);
        Ok(Self {
            context,
            path,
            mode,
            schema,
        })
    }

    /// Return the number of completed writes to the array.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the commit document is invalid or there is an underlying storage error.
    pub fn write_count(&self) -> Result<u64, ArrayError> {
        Ok(self.commit()?.write_count)
    }

    fn commit(&self) -> Result<CommitMetadata, ArrayError> {
        let Some(commit_bytes) = self.context.storage().get(&commit_key(&self.path))? else {
            return Ok(CommitMetadata::new());
        };
        serde_json::from_slice(&commit_bytes)
            .map_err(|err| ArrayError::InvalidCommitMetadata(err.to_string()))
    }

    /// Read the cells of `subarray` of `attribute` into row-major bytes.
    ///
    /// Cells that have never been written hold the fill value of the attribute.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the array is not open in [`Mode::Read`],
    ///  - the attribute is unknown,
    ///  - the subarray is invalid,
    ///  - a committed tile is missing or has an unexpected size, or
    ///  - there is an underlying storage error.
    pub fn retrieve_subarray(
        &self,
        attribute: &str,
        subarray: &Subarray,
    ) -> Result<Vec<u8>, ArrayError> {
        if self.mode != Mode::Read {
            return Err(ArrayError::InvalidMode {
                expected: Mode::Read,
                actual: self.mode,
            });
        }
        let attribute = self
            .schema
            .attribute(attribute)
            .ok_or_else(|| ArrayError::UnknownAttribute(attribute.to_string()))?;
        let subset = subarray.to_array_subset(self.schema.domain())?;
        let element_size = attribute.data_type().size();
        let mut bytes = attribute
            .fill_value()
            .repeat(num_bytes(subset.num_elements(), 1)?);
        let commit = self.commit()?;
        if commit.tiles.is_empty() {
            return Ok(bytes);
        }

        let tile_grid = self.tile_grid()?;
        let tile_size = num_bytes(tile_grid.tile_num_elements(), element_size)?;
        let storage = self.context.storage();
        for tile_indices in self.tiles_in_subset(&tile_grid, &subset)?.indices() {
            let tile_subset = tile_grid
                .tile_subset(&tile_indices)
                .ok_or_else(|| ArrayError::InvalidTileIndices(tile_indices.clone()))?;
            let name = tile_name(attribute.name(), &tile_indices);
            let Some(&generation) = commit.tiles.get(&name) else {
                continue;
            };
            let key = tile_key(&self.path, &name, generation);
            let tile = storage
                .get(&key)?
                .ok_or_else(|| ArrayError::MissingTile(key.as_str().to_string()))?;
            if tile.len() != tile_size {
                return Err(ArrayError::UnexpectedTileSize(
                    key.as_str().to_string(),
                    tile.len(),
                    tile_size,
                ));
            }
            let overlap = subset.overlap(&tile_subset)?;
            copy_region(&tile, &tile_subset, &mut bytes, &subset, &overlap, element_size)?;
        }
        Ok(bytes)
    }
}

impl<TStorage: ?Sized + ReadableWritableStorageTraits> Array<'_, TStorage> {
    /// Store row-major `buffers` covering `subset` as a new generation of tiles, then commit.
    ///
    /// Partially covered tiles are built from their live generation, or the fill value.
    /// The commit document is replaced only after every tile is stored.
    fn store_subset(
        &self,
        subset: &ArraySubset,
        buffers: &[(&Attribute, Cow<[u8]>)],
    ) -> Result<(), ArrayError> {
        let mut commit = self.commit()?;
        let generation = commit.write_count + 1;
        let tile_grid = self.tile_grid()?;
        let tile_num_elements = num_bytes(tile_grid.tile_num_elements(), 1)?;
        let storage = self.context.storage();
        let mut written = Vec::new();
        for tile_indices in self.tiles_in_subset(&tile_grid, subset)?.indices() {
            let tile_subset = tile_grid
                .tile_subset(&tile_indices)
                .ok_or_else(|| ArrayError::InvalidTileIndices(tile_indices.clone()))?;
            let overlap = subset.overlap(&tile_subset)?;
            let covers_tile = overlap == tile_subset;
            for (attribute, bytes) in buffers {
                let element_size = attribute.data_type().size();
                let tile_size = num_bytes(tile_grid.tile_num_elements(), element_size)?;
                let name = tile_name(attribute.name(), &tile_indices);
                let live_generation = if covers_tile {
                    None
                } else {
                    commit.tiles.get(&name).copied()
                };
                let mut tile = if let Some(live_generation) = live_generation {
                    let key = tile_key(&self.path, &name, live_generation);
                    let tile = storage
                        .get(&key)?
                        .ok_or_else(|| ArrayError::MissingTile(key.as_str().to_string()))?;
                    if tile.len() != tile_size {
                        return Err(ArrayError::UnexpectedTileSize(
                            key.as_str().to_string(),
                            tile.len(),
                            tile_size,
                        ));
                    }
                    tile.to_vec()
                } else {
                    attribute.fill_value().repeat(tile_num_elements)
                };
                copy_region(bytes, subset, &mut tile, &tile_subset, &overlap, element_size)?;
                storage.set(&tile_key(&self.path, &name, generation), tile.into())?;
                written.push(name);
            }
        }

        commit.write_count = generation;
        commit
            .tiles
            .extend(written.into_iter().map(|name| (name, generation)));
        storage.set(&commit_key(&self.path), serde_json::to_vec(&commit)?.into())?;
        Ok(())
    }
}

impl<TStorage: ?Sized> Drop for Array<'_, TStorage> {
    fn drop(&mut self) {
        self.context.release(&self.path);
    }
}

/// Return the number of bytes of `num_elements` elements of `element_size`.
fn num_bytes(num_elements: Option<u64>, element_size: usize) -> Result<usize, ArrayError> {
    num_elements
        .and_then(|num_elements| num_elements.checked_mul(element_size as u64))
        .and_then(|num_bytes| usize::try_from(num_bytes).ok())
        .ok_or(ArrayError::TooManyElements)
}

fn usize_range(range: &Range<u64>) -> Option<Range<usize>> {
    Some(usize::try_from(range.start).ok()?..usize::try_from(range.end).ok()?)
}

/// Copy the elements of `region` from `src` (covering `src_subset`) to `dst` (covering `dst_subset`).
///
/// `src` and `dst` are row-major, and `region` must be within both subsets.
fn copy_region(
    src: &[u8],
    src_subset: &ArraySubset,
    dst: &mut [u8],
    dst_subset: &ArraySubset,
    region: &ArraySubset,
    element_size: usize,
) -> Result<(), ArrayError> {
    let src_ranges = region
        .relative_to(src_subset.start())?
        .byte_ranges(src_subset.shape(), element_size)?;
    let dst_ranges = region
        .relative_to(dst_subset.start())?
        .byte_ranges(dst_subset.shape(), element_size)?;
    let out_of_bounds = |subset: &ArraySubset| {
        IncompatibleArraySubsetAndShapeError::new(region.clone(), subset.shape().to_vec())
    };
    for (src_range, dst_range) in std::iter::zip(src_ranges, dst_ranges) {
        let src_bytes = usize_range(&src_range)
            .and_then(|range| src.get(range))
            .ok_or_else(|| out_of_bounds(src_subset))?;
        let dst_bytes = usize_range(&dst_range)
            .and_then(|range| dst.get_mut(range))
            .ok_or_else(|| out_of_bounds(dst_subset))?;
        dst_bytes.copy_from_slice(src_bytes);
    }
    Ok(())
}
