//! Node paths.
//!
//! Every array lives at a [`NodePath`] within a store, e.g. `/` (the store root) or `/rasters/dem`.

mod node_path;

pub use node_path::{NodePath, NodePathError};
