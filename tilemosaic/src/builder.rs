//! Builder for the [`TileCompositor`].

use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::attribution::Attribution;
use crate::cache::{TileCache, DEFAULT_CACHE_CAPACITY};
use crate::compositor::TileCompositor;
use crate::error::MosaicError;
use crate::loader::{RestTileLoader, TileLoader, UrlSource};
use crate::persistent_cache::{FileCacheController, PersistentCacheController};
use crate::tile_schema::{TileIndex, TileSchema};

const DEFAULT_USER_AGENT: &str = "tilemosaic/0.1";

/// Constructor for a [`TileCompositor`].
///
/// ```
/// use tilemosaic::TileCompositorBuilder;
///
/// let compositor = TileCompositorBuilder::new_rest(
///     |index| {
///         format!(
///             "https://tile.openstreetmap.org/{}/{}/{}.png",
///             index.z, index.x, index.y
///         )
///     })
///     .build()?;
/// # Ok::<(), tilemosaic::error::MosaicError>(())
/// ```
pub struct TileCompositorBuilder {
    loader_type: LoaderType,
    tile_schema: Option<TileSchema>,
    user_agent: Option<String>,
    cache_capacity: Option<usize>,
    persistent_cache: CacheType,
    offline_mode: bool,
    attribution: Option<Attribution>,
}

enum LoaderType {
    Rest(Box<dyn UrlSource<TileIndex>>),
    Custom(Box<dyn TileLoader>),
}

enum CacheType {
    None,
    File(PathBuf),
    Custom(Box<dyn PersistentCacheController<str, Bytes>>),
}

impl std::fmt::Debug for CacheType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheType::None => f.write_str("None"),
            CacheType::File(path) => f.debug_tuple("File").field(path).finish(),
            CacheType::Custom(_) => f.debug_tuple("Custom").field(&"..").finish(),
        }
    }
}

impl TileCompositorBuilder {
    /// Initializes a builder for a compositor that requests tiles from the
    /// given url source.
    pub fn new_rest(tile_source: impl UrlSource<TileIndex> + 'static) -> Self {
        Self {
            loader_type: LoaderType::Rest(Box::new(tile_source)),
            tile_schema: None,
            user_agent: None,
            cache_capacity: None,
            persistent_cache: CacheType::None,
            offline_mode: false,
            attribution: None,
        }
    }

    #[allow(rustdoc::bare_urls)]
    /// Initializes a builder for a compositor with the Open Streets Map
    /// source.
    ///
    /// It uses the standard "https://tile.openstreetmap.org/z/x/y.png" URL
    /// pattern to retrieve the tiles, and carries the OSM attribution.
    pub fn new_osm() -> Self {
        Self {
            loader_type: LoaderType::Rest(Box::new(|index: &TileIndex| {
                format!(
                    "https://tile.openstreetmap.org/{}/{}/{}.png",
                    index.z, index.x, index.y
                )
            })),
            tile_schema: None,
            user_agent: None,
            cache_capacity: None,
            persistent_cache: CacheType::None,
            offline_mode: false,
            attribution: Some(Attribution::new(
                "© OpenStreetMap contributors",
                Some("https://www.openstreetmap.org/copyright".to_string()),
            )),
        }
    }

    /// Initializes a builder for a compositor with the given tile loader.
    pub fn new_with_loader(loader: impl TileLoader + 'static) -> Self {
        Self {
            loader_type: LoaderType::Custom(Box::new(loader)),
            tile_schema: None,
            user_agent: None,
            cache_capacity: None,
            persistent_cache: CacheType::None,
            offline_mode: false,
            attribution: None,
        }
    }

    /// Sets the compositor's tile schema.
    ///
    /// Defaults to [`TileSchema::default()`] (256 pixel tiles).
    pub fn with_tile_schema(mut self, tile_schema: TileSchema) -> Self {
        self.tile_schema = Some(tile_schema);
        self
    }

    /// Sets the user agent sent with every tile request.
    ///
    /// Public tile servers usually require a descriptive user agent. Applies
    /// only to the REST loader; a custom loader configures its own client.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the number of decoded tiles kept in memory.
    ///
    /// Defaults to [`DEFAULT_CACHE_CAPACITY`].
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Adds a file cache for raw tile data in the given folder.
    ///
    /// If the `path` folder doesn't exist it will be created. In case the
    /// creation of the folder fails, building the compositor will return an
    /// error.
    ///
    /// Cannot be used with a custom tile loader given by
    /// [`TileCompositorBuilder::new_with_loader()`], as such a loader must
    /// have been created with its cache already configured. In this case
    /// building will also return an error.
    ///
    /// Replaces the value set by the
    /// [`TileCompositorBuilder::with_cache_controller()`] method.
    pub fn with_file_cache(mut self, path: impl AsRef<Path>) -> Self {
        self.persistent_cache = CacheType::File(path.as_ref().into());
        self
    }

    /// Adds the given persistent cache for raw tile data.
    ///
    /// Cannot be used with a custom tile loader given by
    /// [`TileCompositorBuilder::new_with_loader()`]; see
    /// [`TileCompositorBuilder::with_file_cache()`].
    ///
    /// Replaces the value set by the
    /// [`TileCompositorBuilder::with_file_cache()`] method.
    pub fn with_cache_controller(
        mut self,
        cache: impl PersistentCacheController<str, Bytes> + 'static,
    ) -> Self {
        self.persistent_cache = CacheType::Custom(Box::new(cache));
        self
    }

    /// Sets the compositor to only use cached tiles without requesting them
    /// from the url source.
    ///
    /// Note that even in offline mode url source must be configured
    /// correctly as it will be used to identify tiles in the cache.
    ///
    /// If offline mode is set but there is no persistent cache configured,
    /// building will return a configuration error.
    pub fn with_offline_mode(mut self) -> Self {
        self.offline_mode = true;
        self
    }

    /// Sets the custom attribution with the given text and URL.
    pub fn with_attribution(mut self, text: String, url: String) -> Self {
        self.attribution = Some(Attribution::new(text, Some(url)));
        self
    }

    /// Consumes the builder and constructs the compositor.
    ///
    /// Will return an error if the compositor is configured incorrectly or
    /// if the cache controller fails to initialize.
    pub fn build(self) -> Result<TileCompositor, MosaicError> {
        let Self {
            loader_type,
            tile_schema,
            user_agent,
            cache_capacity,
            persistent_cache,
            offline_mode,
            attribution,
        } = self;

        let tile_schema = tile_schema.unwrap_or_default();

        let cache_controller: Option<Box<dyn PersistentCacheController<str, Bytes>>> =
            match persistent_cache {
                CacheType::None => None,
                CacheType::File(path) => Some(Box::new(FileCacheController::new(&path)?)),
                CacheType::Custom(controller) => Some(controller),
            };

        if cache_controller.is_none() && offline_mode {
            return Err(MosaicError::Configuration(
                "offline mode cannot be used without cache".into(),
            ));
        }

        let loader: Box<dyn TileLoader> = match loader_type {
            LoaderType::Rest(url_source) => {
                let user_agent = user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
                Box::new(RestTileLoader::new(
                    url_source,
                    user_agent,
                    cache_controller,
                    offline_mode,
                )?)
            }
            LoaderType::Custom(loader) => {
                if cache_controller.is_some() {
                    return Err(MosaicError::Configuration(
                        "custom tile loader cannot be used together with a cache controller"
                            .into(),
                    ));
                }

                loader
            }
        };

        let cache = TileCache::new(cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY));

        Ok(TileCompositor::new_raw(
            loader,
            cache,
            tile_schema,
            attribution,
        ))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::decoded_image::DecodedImage;

    struct NoopLoader;

    #[async_trait]
    impl TileLoader for NoopLoader {
        async fn load(&self, _index: TileIndex) -> Result<DecodedImage, MosaicError> {
            Err(MosaicError::NotFound)
        }
    }

    #[test]
    fn with_file_cache_replaces_cache_controller() {
        let cache = FileCacheController::new("target").unwrap();
        let builder = TileCompositorBuilder::new_rest(|_: &TileIndex| unimplemented!())
            .with_cache_controller(cache)
            .with_file_cache("target");

        assert_matches!(builder.persistent_cache, CacheType::File(_));
    }

    #[test]
    fn with_cache_controller_replaces_file_cache() {
        let cache = FileCacheController::new("target").unwrap();
        let builder = TileCompositorBuilder::new_rest(|_: &TileIndex| unimplemented!())
            .with_file_cache("target")
            .with_cache_controller(cache);

        assert_matches!(builder.persistent_cache, CacheType::Custom(_));
    }

    #[test]
    fn with_file_cache_fails_build_if_cannot_init_folder() {
        let result = TileCompositorBuilder::new_rest(|_: &TileIndex| unimplemented!())
            .with_file_cache("Cargo.toml")
            .build();

        assert_matches!(result, Err(MosaicError::FsIo(_)));
    }

    #[test]
    fn with_file_cache_fails_build_if_custom_loader() {
        let result = TileCompositorBuilder::new_with_loader(NoopLoader)
            .with_file_cache("target")
            .build();

        assert_matches!(result, Err(MosaicError::Configuration(_)));
    }

    #[test]
    fn with_offline_mode_does_not_work_without_cache() {
        let result = TileCompositorBuilder::new_rest(|_: &TileIndex| unimplemented!())
            .with_offline_mode()
            .build();

        assert_matches!(result, Err(MosaicError::Configuration(_)));
    }

    #[test]
    fn default_tile_schema() {
        let compositor = TileCompositorBuilder::new_rest(|_: &TileIndex| unimplemented!())
            .build()
            .unwrap();

        assert_eq!(*compositor.tile_schema(), TileSchema::default());
    }

    #[test]
    fn osm_source_carries_attribution() {
        let compositor = TileCompositorBuilder::new_osm().build().unwrap();
        let attribution = compositor.attribution().unwrap();

        assert_eq!(attribution.text(), "© OpenStreetMap contributors");
        assert_eq!(
            attribution.url(),
            Some("https://www.openstreetmap.org/copyright")
        );
    }
}
