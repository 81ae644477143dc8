//! [`Viewport`] describes the part of the map a composite request covers.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint2d;

/// Rectangular view of the map to be composed into an image.
///
/// A viewport is defined by the geographic point at its center, the zoom
/// level, and the output image size in pixels. The zoom level is used as is;
/// clamping it to the range supported by the tile server (usually `[1, 19]`)
/// is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    center: GeoPoint2d,
    zoom: u32,
    width: u32,
    height: u32,
}

impl Viewport {
    /// Creates a new viewport.
    pub fn new(center: GeoPoint2d, zoom: u32, width: u32, height: u32) -> Self {
        Self {
            center,
            zoom,
            width,
            height,
        }
    }

    /// Geographic point at the center of the view.
    pub fn center(&self) -> &GeoPoint2d {
        &self.center
    }

    /// Zoom level of the view.
    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    /// Width of the output image in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the output image in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}
