//! Fixed-cell bitmap fonts
//!
//! A grid font is a texture divided into equally sized cells. Cells are
//! numbered row by row starting at the top-left, and cell `n` holds the
//! glyph for ASCII code point `n`, so a font texture with 16 columns keeps
//! the space character in row 2, column 0.

use crate::render::batch::Batch;
use crate::render::region::Region;
use crate::render::texture::Texture;
use crate::render::{RenderError, RenderResult};

/// Number of ASCII code points a grid font can map
const ASCII_GLYPHS: usize = 128;

/// A bitmap font whose glyphs are fixed-size cells on one texture
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    texture: Texture,
    cell_width: u32,
    cell_height: u32,
    glyphs: Vec<Region>,
}

impl Font {
    /// Build a grid font from `texture` with `cell_width` x `cell_height` cells
    pub fn grid(texture: Texture, cell_width: u32, cell_height: u32) -> RenderResult<Self> {
        if cell_width == 0 || cell_height == 0 {
            return Err(RenderError::InvalidFont(format!(
                "cell size must be non-zero, got {cell_width}x{cell_height}"
            )));
        }

        let columns = texture.width() / cell_width;
        let rows = texture.height() / cell_height;
        if columns == 0 || rows == 0 {
            return Err(RenderError::InvalidFont(format!(
                "{cell_width}x{cell_height} cells do not fit a {}x{} texture",
                texture.width(),
                texture.height()
            )));
        }

        let mut glyphs = Vec::with_capacity(ASCII_GLYPHS);
        'rows: for row in 0..rows {
            for column in 0..columns {
                if glyphs.len() == ASCII_GLYPHS {
                    break 'rows;
                }
                glyphs.push(Region::new(
                    texture,
                    column * cell_width,
                    row * cell_height,
                    cell_width,
                    cell_height,
                )?);
            }
        }

        log::debug!(
            "Built grid font with {} glyphs of {cell_width}x{cell_height}",
            glyphs.len()
        );

        Ok(Self {
            texture,
            cell_width,
            cell_height,
            glyphs,
        })
    }

    /// Glyph region for `ch`, if the font has one
    pub fn glyph(&self, ch: char) -> Option<&Region> {
        if ch.is_ascii() {
            self.glyphs.get(ch as usize)
        } else {
            None
        }
    }

    /// Horizontal advance per glyph
    pub fn cell_width(&self) -> u32 {
        self.cell_width
    }

    /// Line height
    pub fn cell_height(&self) -> u32 {
        self.cell_height
    }

    /// Texture holding the glyphs
    pub fn texture(&self) -> Texture {
        self.texture
    }

    /// Width `text` occupies when printed; unknown characters take no space
    pub fn measure(&self, text: &str) -> f32 {
        let printable = text.chars().filter(|c| self.glyph(*c).is_some()).count();
        (printable as u32 * self.cell_width) as f32
    }

    /// Print `text` into an open batch with its top-left corner at `x`, `y`
    pub fn print(&self, batch: &mut Batch, text: &str, x: f32, y: f32, color: u32) -> RenderResult<()> {
        batch.print(self, text, x, y, color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Image;
    use crate::render::gpu::{Gpu, TextureFilter};
    use crate::render::headless::RecordingDevice;
    use crate::render::texture::Drawable;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn font_texture(width: u32, height: u32) -> Texture {
        let gpu: Gpu = Rc::new(RefCell::new(RecordingDevice::new()));
        let image = Image::solid_color(width, height, [255, 255, 255, 255]);
        Texture::upload(&gpu, &image, TextureFilter::Nearest).unwrap()
    }

    #[test]
    fn test_glyphs_follow_row_major_cells() {
        let font = Font::grid(font_texture(320, 160), 20, 20).unwrap();

        // 16 columns: 'A' (65) sits in row 4, column 1
        let a = font.glyph('A').unwrap();
        assert_eq!((a.x(), a.y()), (20, 80));
        assert_eq!(a.width(), 20.0);

        let space = font.glyph(' ').unwrap();
        assert_eq!((space.x(), space.y()), (0, 40));
    }

    #[test]
    fn test_missing_glyphs() {
        // Only 8 cells: code points 0..8
        let font = Font::grid(font_texture(80, 20), 10, 20).unwrap();

        assert!(font.glyph('\u{7}').is_some());
        assert!(font.glyph('A').is_none());
        assert!(font.glyph('é').is_none());
        assert_eq!(font.measure("\u{1}A\u{2}"), 20.0);
    }

    #[test]
    fn test_glyph_count_capped_at_ascii() {
        let font = Font::grid(font_texture(320, 320), 20, 20).unwrap();
        assert!(font.glyph('\u{7f}').is_some());
        assert_eq!(font.glyphs.len(), ASCII_GLYPHS);
    }

    #[test]
    fn test_invalid_cell_sizes() {
        assert!(matches!(
            Font::grid(font_texture(32, 32), 0, 8),
            Err(RenderError::InvalidFont(_))
        ));
        assert!(Font::grid(font_texture(32, 32), 64, 8).is_err());
    }
}
