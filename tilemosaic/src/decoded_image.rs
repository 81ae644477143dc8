//! This module contains utilities for images decoded into memory.

use crate::error::MosaicError;

/// An image that has been decoded into memory.
///
/// Pixels are stored as RGBA8, row major, top to bottom. Once created the
/// image is never mutated, so it can be shared between tasks freely.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl DecodedImage {
    /// Decode an image from a byte slice.
    ///
    /// Attempts to guess the format of the image from the data. Non-RGBA
    /// images will be converted to RGBA.
    pub fn decode(bytes: &[u8]) -> Result<Self, MosaicError> {
        use image::GenericImageView;
        let decoded = image::load_from_memory(bytes)?;
        let (width, height) = decoded.dimensions();

        Ok(Self {
            bytes: decoded.to_rgba8().into_vec(),
            width,
            height,
        })
    }

    /// Creates an image from raw RGBA bytes.
    pub fn from_raw(bytes: Vec<u8>, width: u32, height: u32) -> Result<Self, MosaicError> {
        let expected_len = width as usize * height as usize * 4;
        if bytes.len() != expected_len {
            return Err(MosaicError::Generic(format!(
                "invalid image buffer size {} for dimensions {width}x{height}",
                bytes.len()
            )));
        }

        Ok(Self {
            bytes,
            width,
            height,
        })
    }

    /// Creates an image of the given size with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut bytes = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            bytes.extend_from_slice(&color);
        }

        Self {
            bytes,
            width,
            height,
        }
    }

    /// Width of the image in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the image in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw bytes of the image, in RGBA order.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the image and returns its raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
