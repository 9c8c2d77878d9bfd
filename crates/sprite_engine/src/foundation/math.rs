//! Math utilities and types
//!
//! Provides the small set of 2D math types the renderer works with, plus
//! colour packing helpers shared by the batch and the clear pass.

pub use nalgebra::{Matrix4, Rotation2, Vector2};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 2D point type
pub type Point2 = nalgebra::Point2<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Orthographic projection for a viewport of `width` x `height` pixels.
///
/// The origin sits in the top-left corner and `y` grows downwards, matching
/// window and mouse coordinates.
pub fn screen_projection(width: f32, height: f32) -> Mat4 {
    Mat4::new_orthographic(0.0, width, height, 0.0, -1.0, 1.0)
}

/// Pack a 24-bit `0xRRGGBB` colour and a `0.0..=1.0` alpha into RGBA bytes.
pub fn pack_color(rgb: u32, alpha: f32) -> [u8; 4] {
    let alpha = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    [
        ((rgb >> 16) & 0xff) as u8,
        ((rgb >> 8) & 0xff) as u8,
        (rgb & 0xff) as u8,
        alpha,
    ]
}

/// Convert a 24-bit `0xRRGGBB` colour to opaque normalized RGBA floats.
pub fn rgb_to_f32(rgb: u32) -> [f32; 4] {
    let [r, g, b, _] = pack_color(rgb, 1.0);
    [
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        1.0,
    ]
}
