//! A rust library for persisting dense 2D rasters into a tiled, dense multidimensional array store.
//!
//! A raster is a `width` × `height` grid of [`u8`] pixels.
//! [`raster::store_raster_array`] writes one as a new dense array in a directory:
//!  - the input is validated before any storage access,
//!  - the array schema is built (dimensions `y` and `x`, attribute `pixel`),
//!  - the array is created, opened for writing, written with a single row-major query over its full extent, and closed.
//!
//! Every failure is returned as a [`raster::RasterError`] naming the failed step and the array location.
//!
//! ## Getting Started
//! - [`raster`] stores rasters.
//! - [`array`] is the dense array engine underneath: schemas, [`Array`](array::Array) handles and [`WriteQuery`](array::WriteQuery).
//! - [`storage`] holds the stores arrays live in, and storage adapters for observing storage access.
//!
//! ## Example
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let dir = tempfile::TempDir::new()?;
//! # let location = dir.path().join("raster");
//! let (width, height) = (4, 3);
//! let pixels: Vec<u8> = (0..12).collect();
//! rasterstore::raster::store_raster_array(&location, width, height, &pixels)?;
//!
//! // a second store at the same location is rejected
//! assert!(rasterstore::raster::store_raster_array(&location, width, height, &pixels).is_err());
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Features
//! #### Default
//!  - `filesystem`: the [`FilesystemStore`](storage::store::FilesystemStore) and [`raster::store_raster_array`].
//!
//! ## Examples
//! Examples can be run with `cargo run --example <EXAMPLE_NAME>`.
//!
//! Add `-- --usage-log` to see storage API calls during example execution.
//!
//! [`raster_write_read`](demos/raster_write_read.rs).
//!
//! ## Licence
//! `rasterstore` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod array;
pub mod array_subset;
pub mod config;
pub mod node;
pub mod raster;
pub mod storage;
