//! Global configuration options.

use std::{num::NonZeroU64, sync::OnceLock};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the rasterstore crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// ## Default Tile Extent
///  > default: `256`
///
/// The tile extent of a [`Dimension`](crate::array::Dimension) created without an explicit one.
/// The extent is capped to the dimension extent, so small arrays are stored as a single tile.
///
/// ## Pretty Metadata
///  > default: [`true`]
///
/// If enabled, the array schema document (`__schema.json`) is pretty printed.
#[derive(Debug)]
pub struct Config {
    default_tile_extent: NonZeroU64,
    pretty_metadata: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_tile_extent: NonZeroU64::new(256).unwrap_or(NonZeroU64::MIN),
            pretty_metadata: true,
        }
    }
}

impl Config {
    /// Get the [default tile extent](#default-tile-extent) configuration.
    #[must_use]
    pub fn default_tile_extent(&self) -> NonZeroU64 {
        self.default_tile_extent
    }

    /// Set the [default tile extent](#default-tile-extent) configuration.
    pub fn set_default_tile_extent(&mut self, default_tile_extent: NonZeroU64) {
        self.default_tile_extent = default_tile_extent;
    }

    /// Get the [pretty metadata](#pretty-metadata) configuration.
    #[must_use]
    pub fn pretty_metadata(&self) -> bool {
        self.pretty_metadata
    }

    /// Set the [pretty metadata](#pretty-metadata) configuration.
    pub fn set_pretty_metadata(&mut self, pretty_metadata: bool) {
        self.pretty_metadata = pretty_metadata;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global rasterstore configuration.
///
/// This might deadlock if the global config is already held mutably by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default())).read()
}

/// Returns a mutable reference to the global rasterstore configuration.
///
/// This might deadlock if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default())).write()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_pretty_metadata() {
        assert!(global_config().pretty_metadata());
        global_config_mut().set_pretty_metadata(false);
        assert!(!global_config().pretty_metadata());
        global_config_mut().set_pretty_metadata(true);
    }

    #[test]
    fn config_default_tile_extent() {
        let config = Config::default();
        assert_eq!(config.default_tile_extent().get(), 256);
    }
}
