//! Stores.
//!
//! A [`MemoryStore`] is always available.
//! The [`FilesystemStore`] requires the `filesystem` feature.

mod memory_store;
pub use memory_store::MemoryStore;

#[cfg(feature = "filesystem")]
mod filesystem_store;
#[cfg(feature = "filesystem")]
pub use filesystem_store::{FilesystemStore, FilesystemStoreCreateError};
