//! Loading of tiles from remote servers.

use async_trait::async_trait;
use bytes::Bytes;

use crate::decoded_image::DecodedImage;
use crate::error::MosaicError;
use crate::persistent_cache::PersistentCacheController;
use crate::tile_schema::TileIndex;

/// Source of the url to load data identified by `Key` from.
pub trait UrlSource<Key: ?Sized>: (Fn(&Key) -> String) + Send + Sync {}
impl<Key: ?Sized, T: Fn(&Key) -> String + Send + Sync> UrlSource<Key> for T {}

/// Loads and decodes tiles by their index.
#[async_trait]
pub trait TileLoader: Send + Sync {
    /// Loads the tile with the given index.
    async fn load(&self, index: TileIndex) -> Result<DecodedImage, MosaicError>;
}

/// Tile loader that requests tiles one by one with REST HTTP GET requests.
///
/// This loader works with any protocol that uses a separate GET request for
/// each tile:
/// * OSM tile protocol
/// * OSG Tile Map Service (TMS)
/// * ArcGis TileService
/// * etc.
///
/// Every tile is requested exactly once. There is no retry; a transport
/// error or a non-success status code is reported to the caller as is.
///
/// If constructed with a [`PersistentCacheController`] it will cache the
/// loaded tile bytes and only request tiles from the source url if they are
/// not in the cache.
///
/// If configured to use offline mode, it will only use tiles from the cache
/// without attempting to load them from the source. Nevertheless, even in
/// this case url source must be correct to identify the correct files to
/// retrieve from the cache.
pub struct RestTileLoader {
    url_source: Box<dyn UrlSource<TileIndex>>,
    client: reqwest::Client,
    cache: Option<Box<dyn PersistentCacheController<str, Bytes>>>,
    offline_mode: bool,
}

impl RestTileLoader {
    /// Creates a new instance of the loader.
    ///
    /// The `user_agent` value is sent with every tile request; public tile
    /// servers usually require a descriptive one. Fails if the underlying
    /// HTTP client cannot be initialized.
    pub fn new(
        url_source: impl UrlSource<TileIndex> + 'static,
        user_agent: &str,
        cache: Option<Box<dyn PersistentCacheController<str, Bytes>>>,
        offline_mode: bool,
    ) -> Result<Self, MosaicError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;

        Ok(Self {
            url_source: Box::new(url_source),
            client,
            cache,
            offline_mode,
        })
    }

    async fn download_tile(&self, index: TileIndex) -> Result<Bytes, MosaicError> {
        let url = (self.url_source)(&index);

        if let Some(cache) = &self.cache {
            if let Some(data) = cache.get(&url) {
                return Ok(data);
            }
        }

        if self.offline_mode {
            return Err(MosaicError::NotFound);
        }

        log::info!("Loading {url}");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            log::info!("Failed to load {url}: {}", response.status());
            return Err(MosaicError::Io);
        }

        let data = response.bytes().await?;

        if let Some(cache) = &self.cache {
            if let Err(error) = cache.insert(&url, &data) {
                log::warn!("Failed to write persistent cache entry: {error:?}");
            }
        }

        Ok(data)
    }
}

#[async_trait]
impl TileLoader for RestTileLoader {
    async fn load(&self, index: TileIndex) -> Result<DecodedImage, MosaicError> {
        let bytes = self.download_tile(index).await?;
        DecodedImage::decode(&bytes)
    }
}
