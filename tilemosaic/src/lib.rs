//! Tilemosaic fetches raster tiles from slippy-map tile servers, decodes and
//! caches them, and composites them into single fixed-size RGBA images
//! suitable for display in an interactive viewer.
//!
//! # Quick start
//!
//! You can compose a map image around a geographic point with this code:
//!
//! ```no_run
//! use tilemosaic::{latlon, TileCompositorBuilder, Viewport};
//!
//! # tokio_test::block_on(async {
//! let compositor = TileCompositorBuilder::new_osm()
//!     .with_user_agent("my-map-viewer/1.0")
//!     .build()
//!     .expect("failed to initialize the compositor");
//!
//! let viewport = Viewport::new(latlon!(33.4251, -111.9400), 16, 600, 400);
//! let composite = compositor.compose(&viewport).await;
//!
//! // `composite.image()` is a 600x400 RGBA buffer, ready to be uploaded to
//! // a texture or encoded to a file.
//! assert_eq!(composite.image().bytes().len(), 600 * 400 * 4);
//! # });
//! ```
//!
//! The application around the compositor decides when to re-compose (on
//! drag, mouse wheel or a location selection), clamps the zoom level to the
//! range its tile server supports, and displays the returned buffer. The
//! compositor guarantees that every returned image is complete: tiles that
//! cannot be loaded leave the white background in their place instead of
//! failing the whole composite.
//!
//! # Main components
//!
//! * [`TileSchema`] maps geographic coordinates to the global pixel space of
//!   a zoom level and to indices of the tiles that cover a [`Viewport`].
//! * [`TileLoader`] (usually [`RestTileLoader`]) fetches a tile over HTTP
//!   and decodes it into a [`DecodedImage`].
//! * [`TileCache`] keeps decoded tiles in memory, shared by all concurrent
//!   tile tasks, so panning back over an area does not re-download it.
//! * [`TileCompositor`] ties the three together: it fans out one load task
//!   per covering tile, waits for all of them, and stitches the results
//!   into the output image.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

mod attribution;
mod builder;
mod cache;
mod compositor;
mod decoded_image;
pub mod error;
pub mod geo;
mod loader;
mod persistent_cache;
mod tile_schema;
mod view;

pub use attribution::Attribution;
pub use builder::TileCompositorBuilder;
pub use cache::{TileCache, TileState, DEFAULT_CACHE_CAPACITY};
pub use compositor::{Composite, TileCompositor, BACKGROUND_COLOR};
pub use decoded_image::DecodedImage;
pub use geo::GeoPoint2d;
pub use loader::{RestTileLoader, TileLoader, UrlSource};
pub use persistent_cache::{FileCacheController, PersistentCacheController};
pub use tile_schema::{Point2, TileIndex, TileSchema};
pub use view::Viewport;
