//! GPU textures and the [`Drawable`] abstraction

use crate::assets::Image;
use crate::render::gpu::{Gpu, TextureFilter, TextureId};
use crate::render::RenderResult;

/// A decoded image resident on the GPU
///
/// Textures are cheap handles; copying one does not duplicate GPU memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    /// Upload `image` through `gpu`
    pub fn upload(gpu: &Gpu, image: &Image, filter: TextureFilter) -> RenderResult<Self> {
        let id = gpu.borrow_mut().create_texture(image, filter)?;
        Ok(Self {
            id,
            width: image.width(),
            height: image.height(),
        })
    }

    /// GPU handle
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Anything the batch can draw as a textured quad
pub trait Drawable {
    /// Texture the quad samples from
    fn texture(&self) -> Texture;

    /// Unscaled width in pixels
    fn width(&self) -> f32;

    /// Unscaled height in pixels
    fn height(&self) -> f32;

    /// Texture coordinates as `[u, v, u2, v2]`, normalized against the
    /// whole texture
    fn uv(&self) -> [f32; 4];
}

impl Drawable for Texture {
    fn texture(&self) -> Texture {
        *self
    }

    fn width(&self) -> f32 {
        self.width as f32
    }

    fn height(&self) -> f32 {
        self.height as f32
    }

    fn uv(&self) -> [f32; 4] {
        [0.0, 0.0, 1.0, 1.0]
    }
}
