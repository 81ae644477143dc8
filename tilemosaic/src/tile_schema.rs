//! [`TileSchema`] maps between geographic coordinates, the global pixel space
//! of a zoom level, and [tile indices](TileIndex).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint2d;
use crate::view::Viewport;

/// Tile index.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
pub struct TileIndex {
    /// X index.
    pub x: i32,
    /// Y index.
    pub y: i32,
    /// Z index.
    pub z: u32,
}

impl TileIndex {
    /// Create a new index instance.
    pub fn new(x: i32, y: i32, z: u32) -> Self {
        Self { x, y, z }
    }
}

/// Point in the global pixel space of a zoom level.
///
/// At zoom level `z` the world is projected onto a square raster
/// `tile_size * 2^z` pixels on a side, with `(0, 0)` at the north-west corner
/// and `y` growing southwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    x: f64,
    y: f64,
}

impl Point2 {
    /// Creates a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// X coordinate.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Y coordinate.
    pub fn y(&self) -> f64 {
        self.y
    }
}

/// Tile schema specifies how tile indices are calculated from geographic
/// coordinates using the Web Mercator projection used by OSM-style slippy-map
/// tile servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSchema {
    tile_size: u32,
}

impl Default for TileSchema {
    fn default() -> Self {
        Self { tile_size: 256 }
    }
}

impl TileSchema {
    /// Creates a schema with the given tile side length in pixels.
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size }
    }

    /// Side length of a single tile in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn world_size(&self, zoom: u32) -> f64 {
        self.tile_size as f64 * (1u64 << zoom) as f64
    }

    /// Projects a geographic point into the global pixel space of the given
    /// zoom level.
    ///
    /// Longitude maps linearly, latitude through the Mercator transform. The
    /// result is not clamped; latitudes near the poles produce numerically
    /// large or non-finite `y` values.
    pub fn geo_to_global_pixel(&self, point: &GeoPoint2d, zoom: u32) -> Point2 {
        let world_size = self.world_size(zoom);
        let x = (point.lon() + 180.0) / 360.0 * world_size;
        let lat_rad = point.lat_rad();
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * world_size;
        Point2::new(x, y)
    }

    /// Index of the tile containing the given global pixel.
    pub fn tile_at(&self, point: Point2, zoom: u32) -> TileIndex {
        let tile_size = f64::from(self.tile_size);
        TileIndex::new(
            (point.x() / tile_size).floor() as i32,
            (point.y() / tile_size).floor() as i32,
            zoom,
        )
    }

    /// Global pixel position of the north-west corner of the tile.
    pub fn tile_origin(&self, index: TileIndex) -> Point2 {
        let tile_size = f64::from(self.tile_size);
        Point2::new(index.x as f64 * tile_size, index.y as f64 * tile_size)
    }

    /// Global pixel position of the north-west corner of the viewport.
    pub fn viewport_origin(&self, viewport: &Viewport) -> Point2 {
        let center = self.geo_to_global_pixel(viewport.center(), viewport.zoom());
        Point2::new(
            center.x() - f64::from(viewport.width()) / 2.0,
            center.y() - f64::from(viewport.height()) / 2.0,
        )
    }

    /// Iterate over indices of the tiles that cover the given viewport.
    ///
    /// The range is inclusive on both axes, so tiles that only touch the
    /// viewport edge are included. Indices are produced row by row, left to
    /// right.
    pub fn iter_tiles(&self, viewport: &Viewport) -> impl Iterator<Item = TileIndex> {
        let origin = self.viewport_origin(viewport);
        let tile_size = f64::from(self.tile_size);
        let zoom = viewport.zoom();

        let x_min = (origin.x() / tile_size).floor() as i32;
        let y_min = (origin.y() / tile_size).floor() as i32;
        let x_max = ((origin.x() + f64::from(viewport.width())) / tile_size).floor() as i32;
        let y_max = ((origin.y() + f64::from(viewport.height())) / tile_size).floor() as i32;

        (y_min..=y_max)
            .flat_map(move |y| (x_min..=x_max).map(move |x| TileIndex::new(x, y, zoom)))
    }
}
