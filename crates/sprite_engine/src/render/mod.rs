//! # Rendering
//!
//! Sprite rendering is layered as follows:
//!
//! - [`gpu`]: the GPU command interface every backend implements
//! - [`gl`] / [`headless`]: the `glow` backend and the recording backend
//! - [`texture`] / [`region`]: GPU images and rectangular views into them
//! - [`sprite`]: positioned, scaled, rotated, tinted quads
//! - [`font`]: fixed-cell bitmap fonts
//! - [`batch`]: packs quads into one vertex buffer and issues the draw calls

pub mod gpu;
pub mod gl;
pub mod headless;
pub mod texture;
pub mod region;
pub mod sprite;
pub mod font;
pub mod batch;

pub use batch::{Batch, BatchStats, SpriteVertex};
pub use font::Font;
pub use gpu::{Gpu, GpuDevice, TextureFilter, TextureId};
pub use region::Region;
pub use sprite::Sprite;
pub use texture::{Drawable, Texture};

use thiserror::Error;

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering
#[derive(Debug, Error)]
pub enum RenderError {
    /// An API was used out of order, e.g. drawing outside `begin`/`end`
    #[error("Illegal state: {0}")]
    IllegalState(&'static str),

    /// A region rectangle does not fit inside its texture
    #[error("Region {x},{y} {width}x{height} exceeds {texture_width}x{texture_height} texture")]
    OutOfBounds {
        /// Requested left edge
        x: u32,
        /// Requested top edge
        y: u32,
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Texture width
        texture_width: u32,
        /// Texture height
        texture_height: u32,
    },

    /// Font parameters are unusable
    #[error("Invalid font: {0}")]
    InvalidFont(String),

    /// Batch capacity exceeds what 16-bit indices can address
    #[error("Batch capacity {requested} outside 1..={max}")]
    CapacityTooLarge {
        /// Requested sprite capacity
        requested: usize,
        /// Largest supported capacity
        max: usize,
    },

    /// A handle does not name a live GPU object
    #[error("Unknown {0} handle")]
    UnknownHandle(&'static str),

    /// The GPU or driver reported an error
    #[error("GPU error: {0}")]
    Gpu(String),
}
