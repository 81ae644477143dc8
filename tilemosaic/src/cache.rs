//! In-memory cache of decoded tiles.

use std::future::Future;
use std::sync::Arc;

use quick_cache::sync::Cache;

use crate::decoded_image::DecodedImage;
use crate::tile_schema::TileIndex;

/// Number of tiles a [`TileCache`] holds by default.
pub const DEFAULT_CACHE_CAPACITY: usize = 5000;

/// State of a tile kept in the cache.
#[derive(Debug, Clone)]
pub enum TileState {
    /// The tile was fetched and decoded successfully.
    Loaded(Arc<DecodedImage>),
    /// The tile could not be loaded. Stored so the tile is not requested
    /// again while the entry stays resident.
    Error,
}

/// Cache of tile states shared by all tasks of a compositor.
///
/// The cache holds at most one entry per [`TileIndex`] and is bounded; least
/// recently used entries are evicted when the capacity is exceeded.
pub struct TileCache {
    tiles: Cache<TileIndex, TileState>,
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl TileCache {
    /// Creates a cache that holds up to `capacity` tiles.
    pub fn new(capacity: usize) -> Self {
        Self {
            tiles: Cache::new(capacity),
        }
    }

    /// Returns the cached state of the tile, if any.
    pub fn get(&self, index: &TileIndex) -> Option<TileState> {
        self.tiles.get(index)
    }

    /// Puts the state of a tile to the cache, replacing the previous entry.
    pub fn insert(&self, index: TileIndex, state: TileState) {
        self.tiles.insert(index, state);
    }

    /// Returns the cached state of the tile, resolving `load` to produce it
    /// on a miss.
    ///
    /// Concurrent calls for the same index are coalesced: only one caller
    /// runs `load`, the others wait for it and share the result.
    pub async fn get_or_load<F>(&self, index: TileIndex, load: F) -> TileState
    where
        F: Future<Output = TileState>,
    {
        match self.tiles.get_value_or_guard_async(&index).await {
            Ok(state) => state,
            Err(guard) => {
                let state = load.await;
                let _ = guard.insert(state.clone());
                state
            }
        }
    }
}
