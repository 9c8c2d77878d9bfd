//! Sprites and quad geometry
//!
//! A quad corner is placed with
//!
//! ```text
//! corner = rotate(scale * (corner_offset - anchor * size), rotation) + position
//! ```
//!
//! Corners are always produced in the order top-left, top-right,
//! bottom-right, bottom-left (screen space, `y` down). Rotation is in
//! degrees, clockwise on screen.

use crate::foundation::math::{Point2, Rotation2, Vec2};
use crate::render::batch::Batch;
use crate::render::region::Region;
use crate::render::texture::Drawable;
use crate::render::RenderResult;

/// Compute the four corners of a quad
pub fn quad_corners(size: Vec2, position: Vec2, anchor: Vec2, scale: Vec2, rotation: f32) -> [Point2; 4] {
    let pivot = anchor.component_mul(&size);
    let offsets = [
        Vec2::new(0.0, 0.0),
        Vec2::new(size.x, 0.0),
        Vec2::new(size.x, size.y),
        Vec2::new(0.0, size.y),
    ];

    let rotation = (rotation != 0.0).then(|| Rotation2::new(rotation.to_radians()));
    offsets.map(|offset| {
        let local = (offset - pivot).component_mul(&scale);
        let local = rotation.map_or(local, |r| r * local);
        Point2::from(local + position)
    })
}

/// A positioned, scaled, rotated and tinted quad showing a [`Region`]
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    /// Texture region shown by the sprite
    pub region: Region,
    /// Position of the anchor point in pixels
    pub position: Vec2,
    /// Scale factors
    pub scale: Vec2,
    /// Pivot as a fraction of the region size; `(0.5, 0.5)` is the centre
    pub anchor: Vec2,
    /// Rotation about the anchor in degrees
    pub rotation: f32,
    /// Tint as `0xRRGGBB`
    pub color: u32,
    /// Opacity in `0.0..=1.0`
    pub alpha: f32,
}

impl Sprite {
    /// Create an untinted, unscaled sprite anchored at its top-left corner
    pub fn new(region: Region, x: f32, y: f32) -> Self {
        Self {
            region,
            position: Vec2::new(x, y),
            scale: Vec2::new(1.0, 1.0),
            anchor: Vec2::zeros(),
            rotation: 0.0,
            color: 0xffffff,
            alpha: 1.0,
        }
    }

    /// Set the anchor
    pub fn with_anchor(mut self, x: f32, y: f32) -> Self {
        self.anchor = Vec2::new(x, y);
        self
    }

    /// Scaled width in pixels
    pub fn width(&self) -> f32 {
        self.region.width() * self.scale.x
    }

    /// Scaled height in pixels
    pub fn height(&self) -> f32 {
        self.region.height() * self.scale.y
    }

    /// Screen-space corners, top-left first, clockwise
    pub fn corners(&self) -> [Point2; 4] {
        quad_corners(
            Vec2::new(self.region.width(), self.region.height()),
            self.position,
            self.anchor,
            self.scale,
            self.rotation,
        )
    }

    /// Queue the sprite into an open batch
    pub fn render(&self, batch: &mut Batch) -> RenderResult<()> {
        batch.draw(
            &self.region,
            self.position.x,
            self.position.y,
            self.anchor.x,
            self.anchor.y,
            self.scale.x,
            self.scale.y,
            self.rotation,
            self.color,
            self.alpha,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Image;
    use crate::render::batch::SpriteVertex;
    use crate::render::gpu::{Gpu, TextureFilter};
    use crate::render::headless::{GpuCommand, RecordingDevice};
    use crate::render::texture::Texture;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn assert_corners(actual: [Point2; 4], expected: [(f32, f32); 4]) {
        for (corner, (x, y)) in actual.iter().zip(expected) {
            assert_relative_eq!(corner.x, x, epsilon = 1e-4);
            assert_relative_eq!(corner.y, y, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_centered_quad_corners_are_exact() {
        let corners = quad_corners(
            Vec2::new(4.0, 4.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.5, 0.5),
            Vec2::new(1.0, 1.0),
            0.0,
        );

        assert_eq!(corners[0], Point2::new(8.0, 8.0));
        assert_eq!(corners[1], Point2::new(12.0, 8.0));
        assert_eq!(corners[2], Point2::new(12.0, 12.0));
        assert_eq!(corners[3], Point2::new(8.0, 12.0));
    }

    #[test]
    fn test_top_left_anchor_with_scale() {
        let corners = quad_corners(
            Vec2::new(10.0, 5.0),
            Vec2::new(100.0, 50.0),
            Vec2::zeros(),
            Vec2::new(2.0, 3.0),
            0.0,
        );

        assert_corners(corners, [(100.0, 50.0), (120.0, 50.0), (120.0, 65.0), (100.0, 65.0)]);
    }

    #[test]
    fn test_rotation_about_anchor() {
        // A 4x2 quad centred on the origin, rotated a quarter turn
        let corners = quad_corners(
            Vec2::new(4.0, 2.0),
            Vec2::zeros(),
            Vec2::new(0.5, 0.5),
            Vec2::new(1.0, 1.0),
            90.0,
        );

        assert_corners(corners, [(1.0, -2.0), (1.0, 2.0), (-1.0, 2.0), (-1.0, -2.0)]);
    }

    #[test]
    fn test_scale_applies_before_rotation() {
        let corners = quad_corners(
            Vec2::new(1.0, 1.0),
            Vec2::new(5.0, 5.0),
            Vec2::zeros(),
            Vec2::new(2.0, 1.0),
            180.0,
        );

        assert_corners(corners, [(5.0, 5.0), (3.0, 5.0), (3.0, 4.0), (5.0, 4.0)]);
    }

    #[test]
    fn test_render_forwards_every_field_to_the_batch() {
        let device = Rc::new(RefCell::new(RecordingDevice::new()));
        let gpu: Gpu = device.clone();
        let image = Image::solid_color(8, 8, [255, 255, 255, 255]);
        let atlas = Texture::upload(&gpu, &image, TextureFilter::Nearest).unwrap();

        let mut sprite = Sprite::new(Region::new(atlas, 0, 0, 4, 2).unwrap(), 20.0, 30.0).with_anchor(0.5, 0.5);
        sprite.scale = Vec2::new(2.0, 3.0);
        sprite.rotation = 180.0;
        sprite.color = 0x00ff00;
        sprite.alpha = 0.25;
        assert_relative_eq!(sprite.width(), 8.0);
        assert_relative_eq!(sprite.height(), 6.0);

        let mut batch = Batch::new(&gpu, 4).unwrap();
        batch.begin().unwrap();
        sprite.render(&mut batch).unwrap();
        batch.end().unwrap();

        let device = device.borrow();
        let bytes = device
            .commands()
            .iter()
            .rev()
            .find_map(|c| match c {
                GpuCommand::WriteBuffer { data, .. } => Some(data.clone()),
                _ => None,
            })
            .unwrap();
        let vertices: Vec<SpriteVertex> = bytes
            .chunks_exact(std::mem::size_of::<SpriteVertex>())
            .map(bytemuck::pod_read_unaligned)
            .collect();
        assert_eq!(vertices.len(), 4);

        let positions: Vec<Point2> = vertices.iter().map(|v| Point2::new(v.position[0], v.position[1])).collect();
        let expected = sprite.corners();
        for (actual, expected) in positions.iter().zip(expected.iter()) {
            assert_relative_eq!(actual.x, expected.x, epsilon = 1e-4);
            assert_relative_eq!(actual.y, expected.y, epsilon = 1e-4);
        }
        assert_corners(expected, [(24.0, 33.0), (16.0, 33.0), (16.0, 27.0), (24.0, 27.0)]);
        assert!(vertices.iter().all(|v| v.color == [0, 255, 0, 64]));
    }
}
