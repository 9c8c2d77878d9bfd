//! Rectangular views into a texture, used for atlases

use crate::render::texture::{Drawable, Texture};
use crate::render::{RenderError, RenderResult};

/// A rectangular sub-view of a texture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    texture: Texture,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    uv: [f32; 4],
}

impl Region {
    /// Create a region, failing with [`RenderError::OutOfBounds`] when the
    /// rectangle does not fit inside `texture`
    pub fn new(texture: Texture, x: u32, y: u32, width: u32, height: u32) -> RenderResult<Self> {
        let fits_x = x.checked_add(width).is_some_and(|right| right <= texture.width());
        let fits_y = y.checked_add(height).is_some_and(|bottom| bottom <= texture.height());
        if !fits_x || !fits_y {
            return Err(RenderError::OutOfBounds {
                x,
                y,
                width,
                height,
                texture_width: texture.width(),
                texture_height: texture.height(),
            });
        }

        let tw = texture.width() as f32;
        let th = texture.height() as f32;
        let uv = [
            x as f32 / tw,
            y as f32 / th,
            (x + width) as f32 / tw,
            (y + height) as f32 / th,
        ];

        Ok(Self { texture, x, y, width, height, uv })
    }

    /// A region covering the whole texture
    pub fn full(texture: Texture) -> Self {
        Self {
            texture,
            x: 0,
            y: 0,
            width: texture.width(),
            height: texture.height(),
            uv: [0.0, 0.0, 1.0, 1.0],
        }
    }

    /// Left edge in texture pixels
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Top edge in texture pixels
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Left texture coordinate
    pub fn u(&self) -> f32 {
        self.uv[0]
    }

    /// Top texture coordinate
    pub fn v(&self) -> f32 {
        self.uv[1]
    }

    /// Right texture coordinate
    pub fn u2(&self) -> f32 {
        self.uv[2]
    }

    /// Bottom texture coordinate
    pub fn v2(&self) -> f32 {
        self.uv[3]
    }
}

impl Drawable for Region {
    fn texture(&self) -> Texture {
        self.texture
    }

    fn width(&self) -> f32 {
        self.width as f32
    }

    fn height(&self) -> f32 {
        self.height as f32
    }

    fn uv(&self) -> [f32; 4] {
        self.uv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Image;
    use crate::render::gpu::{Gpu, TextureFilter};
    use crate::render::headless::RecordingDevice;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn atlas(width: u32, height: u32) -> (Rc<RefCell<RecordingDevice>>, Texture) {
        let device = Rc::new(RefCell::new(RecordingDevice::new()));
        let gpu: Gpu = device.clone();
        let image = Image::solid_color(width, height, [255, 255, 255, 255]);
        let texture = Texture::upload(&gpu, &image, TextureFilter::Nearest).unwrap();
        (device, texture)
    }

    #[test]
    fn test_uv_normalized_against_whole_texture() {
        let (_, texture) = atlas(64, 128);
        let region = Region::new(texture, 16, 32, 16, 32).unwrap();

        assert_relative_eq!(region.u(), 0.25);
        assert_relative_eq!(region.v(), 0.25);
        assert_relative_eq!(region.u2(), 0.5);
        assert_relative_eq!(region.v2(), 0.5);
        assert_relative_eq!(region.width(), 16.0);
        assert_relative_eq!(region.height(), 32.0);
    }

    #[test]
    fn test_out_of_bounds_rejected_without_touching_gpu() {
        let (device, texture) = atlas(32, 32);
        let before = device.borrow().commands().len();

        let err = Region::new(texture, 20, 0, 16, 16).unwrap_err();
        assert!(matches!(err, RenderError::OutOfBounds { x: 20, width: 16, texture_width: 32, .. }));
        assert!(Region::new(texture, 0, 30, 1, 3).is_err());
        assert!(Region::new(texture, u32::MAX, 0, 2, 1).is_err());

        assert_eq!(device.borrow().commands().len(), before);
        assert_eq!(device.borrow().texture_count(), 1);
    }

    #[test]
    fn test_edge_aligned_region_is_valid() {
        let (_, texture) = atlas(32, 32);
        assert!(Region::new(texture, 16, 16, 16, 16).is_ok());
        assert_eq!(Region::full(texture).uv(), [0.0, 0.0, 1.0, 1.0]);
    }
}
