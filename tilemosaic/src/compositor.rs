//! Compositing of raster tiles into a single image.

use std::sync::Arc;

use crate::attribution::Attribution;
use crate::cache::{TileCache, TileState};
use crate::decoded_image::DecodedImage;
use crate::error::MosaicError;
use crate::loader::TileLoader;
use crate::tile_schema::{TileIndex, TileSchema};
use crate::view::Viewport;

/// Color the output buffer is filled with before any tile is drawn. Regions
/// not covered by tile data keep this color.
pub const BACKGROUND_COLOR: [u8; 4] = [255, 255, 255, 255];

/// A composed map image together with information about tiles that could not
/// be loaded.
#[derive(Debug, Clone)]
pub struct Composite {
    image: DecodedImage,
    failed_tiles: Vec<TileIndex>,
}

impl Composite {
    /// The composed image.
    pub fn image(&self) -> &DecodedImage {
        &self.image
    }

    /// Consumes the composite and returns the image.
    pub fn into_image(self) -> DecodedImage {
        self.image
    }

    /// Indices of the covering tiles that could not be loaded. Their regions
    /// of the image are left filled with [`BACKGROUND_COLOR`].
    pub fn failed_tiles(&self) -> &[TileIndex] {
        &self.failed_tiles
    }
}

/// Stitches raster tiles into ready-to-display RGBA images.
///
/// A compositor owns a [`TileLoader`] and a [`TileCache`]; tiles loaded for
/// one viewport are reused by any later viewport that covers them. Separate
/// compositor instances are fully independent.
pub struct TileCompositor {
    loader: Arc<dyn TileLoader>,
    cache: Arc<TileCache>,
    tile_schema: TileSchema,
    attribution: Option<Attribution>,
}

impl std::fmt::Debug for TileCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCompositor")
            .field("tile_schema", &self.tile_schema)
            .finish()
    }
}

impl TileCompositor {
    /// Creates a new compositor.
    pub fn new(
        loader: impl TileLoader + 'static,
        cache: TileCache,
        tile_schema: TileSchema,
    ) -> Self {
        Self {
            loader: Arc::new(loader),
            cache: Arc::new(cache),
            tile_schema,
            attribution: None,
        }
    }

    pub(crate) fn new_raw(
        loader: Box<dyn TileLoader>,
        cache: TileCache,
        tile_schema: TileSchema,
        attribution: Option<Attribution>,
    ) -> Self {
        Self {
            loader: loader.into(),
            cache: Arc::new(cache),
            tile_schema,
            attribution,
        }
    }

    /// Tile schema of the compositor.
    pub fn tile_schema(&self) -> &TileSchema {
        &self.tile_schema
    }

    /// Attribution of the data source, if any, for the application to
    /// display.
    pub fn attribution(&self) -> Option<&Attribution> {
        self.attribution.as_ref()
    }

    /// Composes the viewport into a single RGBA image.
    ///
    /// Every covering tile is loaded concurrently, through the cache. The
    /// returned future resolves only after each of them is either decoded or
    /// marked failed, so the image is always complete: tiles that could not
    /// be loaded leave [`BACKGROUND_COLOR`] in their place, and their
    /// indices are reported on the returned [`Composite`].
    pub async fn compose(&self, viewport: &Viewport) -> Composite {
        let origin = self.tile_schema.viewport_origin(viewport);
        let tile_size = self.tile_schema.tile_size();

        let mut tasks = Vec::new();
        for index in self.tile_schema.iter_tiles(viewport) {
            let loader = Arc::clone(&self.loader);
            let cache = Arc::clone(&self.cache);
            tasks.push((
                index,
                tokio::spawn(
                    async move { load_tile(index, tile_size, loader, cache).await },
                ),
            ));
        }

        let width = viewport.width();
        let height = viewport.height();
        let mut bytes = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            bytes.extend_from_slice(&BACKGROUND_COLOR);
        }

        let mut failed_tiles = Vec::new();
        for (index, task) in tasks {
            let state = match task.await {
                Ok(state) => state,
                Err(error) => {
                    log::warn!("Tile task for {index:?} did not finish: {error}");
                    TileState::Error
                }
            };

            match state {
                TileState::Loaded(tile) => {
                    let tile_origin = self.tile_schema.tile_origin(index);
                    let offset_x = (tile_origin.x() - origin.x()).floor() as i64;
                    let offset_y = (tile_origin.y() - origin.y()).floor() as i64;
                    blit(&mut bytes, width, height, &tile, offset_x, offset_y);
                }
                TileState::Error => failed_tiles.push(index),
            }
        }

        let image = DecodedImage::from_raw(bytes, width, height)
            .expect("buffer is allocated to match the dimensions");

        Composite {
            image,
            failed_tiles,
        }
    }
}

async fn load_tile(
    index: TileIndex,
    expected_size: u32,
    loader: Arc<dyn TileLoader>,
    cache: Arc<TileCache>,
) -> TileState {
    cache
        .get_or_load(index, async {
            match load_checked(index, expected_size, &*loader).await {
                Ok(image) => TileState::Loaded(image),
                Err(error) => {
                    log::warn!("Failed to load tile {index:?}: {error}");
                    TileState::Error
                }
            }
        })
        .await
}

async fn load_checked(
    index: TileIndex,
    expected_size: u32,
    loader: &dyn TileLoader,
) -> Result<Arc<DecodedImage>, MosaicError> {
    let image = loader.load(index).await?;
    if image.width() != expected_size || image.height() != expected_size {
        return Err(MosaicError::UnexpectedTileSize {
            expected: expected_size,
            width: image.width(),
            height: image.height(),
        });
    }

    Ok(Arc::new(image))
}

/// Copies the overlapping part of the tile into the target buffer, skipping
/// pixels that fall outside of it.
fn blit(
    target: &mut [u8],
    target_width: u32,
    target_height: u32,
    tile: &DecodedImage,
    offset_x: i64,
    offset_y: i64,
) {
    let tile_width = i64::from(tile.width());
    let tile_height = i64::from(tile.height());
    let target_width = i64::from(target_width);
    let target_height = i64::from(target_height);

    let dest_x_start = offset_x.max(0);
    let dest_y_start = offset_y.max(0);
    let dest_x_end = (offset_x + tile_width).min(target_width);
    let dest_y_end = (offset_y + tile_height).min(target_height);
    if dest_x_start >= dest_x_end || dest_y_start >= dest_y_end {
        return;
    }

    let tile_bytes = tile.bytes();
    let row_len = ((dest_x_end - dest_x_start) * 4) as usize;
    for dest_y in dest_y_start..dest_y_end {
        let src_y = dest_y - offset_y;
        let src_start = ((src_y * tile_width + (dest_x_start - offset_x)) * 4) as usize;
        let dest_start = ((dest_y * target_width + dest_x_start) * 4) as usize;
        target[dest_start..dest_start + row_len]
            .copy_from_slice(&tile_bytes[src_start..src_start + row_len]);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::latlon;

    const TILE_SIZE: u32 = 256;

    /// Produces solid-color tiles with the color derived from the index, so
    /// a composite can be checked pixel by pixel.
    struct TestTileLoader {
        load_count: Arc<AtomicUsize>,
        failing: Vec<TileIndex>,
        undersized: Vec<TileIndex>,
    }

    impl TestTileLoader {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let load_count = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    load_count: Arc::clone(&load_count),
                    failing: vec![],
                    undersized: vec![],
                },
                load_count,
            )
        }

        fn tile_color(index: TileIndex) -> [u8; 4] {
            [index.x as u8, index.y as u8, index.z as u8, 255]
        }
    }

    #[async_trait]
    impl TileLoader for TestTileLoader {
        async fn load(&self, index: TileIndex) -> Result<DecodedImage, MosaicError> {
            self.load_count.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&index) {
                return Err(MosaicError::Io);
            }

            let size = if self.undersized.contains(&index) {
                TILE_SIZE / 2
            } else {
                TILE_SIZE
            };
            Ok(DecodedImage::filled(size, size, Self::tile_color(index)))
        }
    }

    fn test_compositor(loader: TestTileLoader) -> TileCompositor {
        TileCompositor::new(loader, TileCache::new(64), TileSchema::default())
    }

    fn tempe_viewport() -> Viewport {
        Viewport::new(latlon!(33.4251, -111.9400), 16, 600, 400)
    }

    /// Index of the tile whose blitted region contains the given output
    /// pixel.
    fn tile_covering(compositor: &TileCompositor, viewport: &Viewport, px: u32, py: u32) -> TileIndex {
        let schema = compositor.tile_schema();
        let origin = schema.viewport_origin(viewport);
        for index in schema.iter_tiles(viewport) {
            let tile_origin = schema.tile_origin(index);
            let offset_x = (tile_origin.x() - origin.x()).floor() as i64;
            let offset_y = (tile_origin.y() - origin.y()).floor() as i64;
            let (px, py) = (i64::from(px), i64::from(py));
            if px >= offset_x
                && px < offset_x + i64::from(TILE_SIZE)
                && py >= offset_y
                && py < offset_y + i64::from(TILE_SIZE)
            {
                return index;
            }
        }

        panic!("pixel ({px}, {py}) is not covered by any tile");
    }

    fn pixel(image: &DecodedImage, px: u32, py: u32) -> [u8; 4] {
        let start = ((py * image.width() + px) * 4) as usize;
        image.bytes()[start..start + 4]
            .try_into()
            .expect("slice has exactly 4 bytes")
    }

    #[tokio::test]
    async fn composite_places_every_tile() {
        let (loader, load_count) = TestTileLoader::new();
        let compositor = test_compositor(loader);
        let viewport = tempe_viewport();

        let composite = compositor.compose(&viewport).await;
        let image = composite.image();

        assert_eq!((image.width(), image.height()), (600, 400));
        assert_eq!(image.bytes().len(), 600 * 400 * 4);
        assert_eq!(load_count.load(Ordering::SeqCst), 12);
        assert!(composite.failed_tiles().is_empty());

        // Corners come from partially visible edge tiles, the rest from
        // interior ones; all must carry the color of the covering tile.
        for (px, py) in [
            (0, 0),
            (599, 0),
            (0, 399),
            (599, 399),
            (300, 200),
            (57, 200),
            (58, 200),
            (300, 100),
            (300, 101),
        ] {
            let expected = TestTileLoader::tile_color(tile_covering(&compositor, &viewport, px, py));
            assert_eq!(pixel(image, px, py), expected, "pixel ({px}, {py})");
        }
    }

    #[tokio::test]
    async fn adjacent_tiles_meet_without_a_seam() {
        let (loader, _) = TestTileLoader::new();
        let compositor = test_compositor(loader);
        let viewport = tempe_viewport();

        let composite = compositor.compose(&viewport).await;

        // The column boundary between the two leftmost tiles of this
        // viewport falls between output pixels 57 and 58.
        let left = tile_covering(&compositor, &viewport, 57, 200);
        let right = tile_covering(&compositor, &viewport, 58, 200);
        assert_eq!(right.x, left.x + 1);
        assert_eq!(
            pixel(composite.image(), 57, 200),
            TestTileLoader::tile_color(left)
        );
        assert_eq!(
            pixel(composite.image(), 58, 200),
            TestTileLoader::tile_color(right)
        );
    }

    #[tokio::test]
    async fn warm_cache_composites_are_identical() {
        let (loader, load_count) = TestTileLoader::new();
        let compositor = test_compositor(loader);
        let viewport = tempe_viewport();

        let first = compositor.compose(&viewport).await;
        assert_eq!(load_count.load(Ordering::SeqCst), 12);

        let second = compositor.compose(&viewport).await;
        // Every tile is served from the cache, without new loads.
        assert_eq!(load_count.load(Ordering::SeqCst), 12);
        assert_eq!(first.image().bytes(), second.image().bytes());
    }

    #[tokio::test]
    async fn failed_tile_leaves_the_background() {
        let failing = TileIndex::new(12389, 26305, 16);
        let (mut loader, load_count) = TestTileLoader::new();
        loader.failing.push(failing);
        let compositor = test_compositor(loader);
        let viewport = tempe_viewport();

        let composite = compositor.compose(&viewport).await;

        assert_eq!(composite.failed_tiles(), &[failing]);
        let image = composite.image();
        assert_eq!((image.width(), image.height()), (600, 400));

        // The center of the viewport falls into the failed tile.
        assert_eq!(tile_covering(&compositor, &viewport, 300, 200), failing);
        assert_eq!(pixel(image, 300, 200), BACKGROUND_COLOR);

        // A neighboring tile is still placed correctly.
        let neighbor = tile_covering(&compositor, &viewport, 300, 50);
        assert_ne!(neighbor, failing);
        assert_eq!(pixel(image, 300, 50), TestTileLoader::tile_color(neighbor));

        // The failure is cached; a second composite does not retry the tile.
        let loads_after_first = load_count.load(Ordering::SeqCst);
        let second = compositor.compose(&viewport).await;
        assert_eq!(load_count.load(Ordering::SeqCst), loads_after_first);
        assert_eq!(second.failed_tiles(), &[failing]);
    }

    #[tokio::test]
    async fn mismatched_tile_dimensions_are_rejected() {
        let undersized = TileIndex::new(12389, 26305, 16);
        let (mut loader, _) = TestTileLoader::new();
        loader.undersized.push(undersized);
        let compositor = test_compositor(loader);
        let viewport = tempe_viewport();

        let composite = compositor.compose(&viewport).await;

        assert_eq!(composite.failed_tiles(), &[undersized]);
        assert_eq!(pixel(composite.image(), 300, 200), BACKGROUND_COLOR);
    }

    #[tokio::test]
    async fn viewport_smaller_than_a_tile_is_clipped() {
        let (loader, load_count) = TestTileLoader::new();
        let compositor = test_compositor(loader);
        let viewport = Viewport::new(latlon!(33.4251, -111.9400), 16, 100, 80);

        let composite = compositor.compose(&viewport).await;
        let image = composite.image();

        assert_eq!((image.width(), image.height()), (100, 80));
        // A 100x80 viewport at this center still straddles a vertical tile
        // boundary, so two tiles contribute partial columns.
        assert_eq!(load_count.load(Ordering::SeqCst), 2);
        for (px, py) in [(0, 0), (99, 0), (0, 79), (99, 79)] {
            let expected = TestTileLoader::tile_color(tile_covering(&compositor, &viewport, px, py));
            assert_eq!(pixel(image, px, py), expected, "pixel ({px}, {py})");
        }
    }

    #[test]
    fn blit_skips_out_of_range_rows_and_columns() {
        let tile = DecodedImage::filled(4, 4, [7, 7, 7, 255]);
        let mut target = vec![0u8; 4 * 4 * 4];

        // Entirely outside on each side.
        blit(&mut target, 4, 4, &tile, -4, 0);
        blit(&mut target, 4, 4, &tile, 0, -4);
        blit(&mut target, 4, 4, &tile, 4, 0);
        blit(&mut target, 4, 4, &tile, 0, 4);
        assert!(target.iter().all(|&b| b == 0));

        // Overlapping the bottom-right corner by one pixel.
        blit(&mut target, 4, 4, &tile, 3, 3);
        assert_eq!(&target[(3 * 4 + 3) * 4..(3 * 4 + 3) * 4 + 4], [7, 7, 7, 255]);
        assert_eq!(&target[..4], [0, 0, 0, 0]);
    }
}
