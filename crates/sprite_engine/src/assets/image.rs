//! Decoded RGBA8 images
//!
//! Any format the `image` crate is built with can be decoded; pixels are
//! always converted to tightly packed RGBA8, the layout textures upload.

use std::path::Path;

use crate::assets::AssetError;

/// Immutable RGBA8 pixel buffer ready for GPU upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl Image {
    /// Decode an image from encoded bytes; `path` only labels errors
    pub fn from_bytes(path: &str, bytes: &[u8]) -> Result<Self, AssetError> {
        let decoded = image::load_from_memory(bytes).map_err(|source| AssetError::Decode {
            path: path.to_string(),
            source,
        })?;

        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("Decoded {path}: {width}x{height}");

        Ok(Self {
            pixels: rgba.into_raw(),
            width,
            height,
        })
    }

    /// Read and decode an image file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
            path: label.clone(),
            source,
        })?;
        Self::from_bytes(&label, &bytes)
    }

    /// Wrap raw RGBA8 pixels, checking the length against the dimensions
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, AssetError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(AssetError::InvalidData(format!(
                "{width}x{height} image needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self { pixels, width, height })
    }

    /// Fill an image with one colour (handy for tests and placeholders)
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        Self {
            pixels: color.repeat(pixel_count),
            width,
            height,
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major RGBA8 pixels, top row first
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(width, height, Rgba(color))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_solid_color_image() {
        let img = Image::solid_color(4, 2, [255, 0, 0, 255]);
        assert_eq!((img.width(), img.height()), (4, 2));
        assert_eq!(img.pixels().len(), 4 * 2 * 4);
        assert_eq!(&img.pixels()[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_png() {
        let img = Image::from_bytes("dot.png", &encode_png(3, 5, [1, 2, 3, 4])).unwrap();
        assert_eq!((img.width(), img.height()), (3, 5));
        assert_eq!(&img.pixels()[4..8], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_decode_garbage_names_the_path() {
        let err = Image::from_bytes("broken.png", b"not an image").unwrap_err();
        assert!(matches!(err, AssetError::Decode { ref path, .. } if path == "broken.png"));
        assert!(err.to_string().contains("broken.png"));
    }

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(Image::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            Image::from_rgba(2, 2, vec![0; 15]),
            Err(AssetError::InvalidData(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Image::from_file("definitely/not/here.png").unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }
}
