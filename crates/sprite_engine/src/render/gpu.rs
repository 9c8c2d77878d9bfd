//! GPU command interface
//!
//! This module defines the narrow set of GPU operations the sprite renderer
//! needs. Every enum that crosses this boundary carries the standard
//! OpenGL / WebGL constant as its discriminant so values can be handed to
//! the driver untouched and shaders written against those constants keep
//! working.
//!
//! Two implementations exist:
//! - [`GlDevice`](super::gl::GlDevice): desktop OpenGL 2.1 and WebGL 1 via `glow`
//! - [`RecordingDevice`](super::headless::RecordingDevice): records commands
//!   for tests and headless runs

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::assets::Image;
use crate::render::RenderResult;

slotmap::new_key_type! {
    /// Handle to a texture owned by a [`GpuDevice`]
    pub struct TextureId;
    /// Handle to a vertex or index buffer owned by a [`GpuDevice`]
    pub struct BufferId;
    /// Handle to a linked shader program owned by a [`GpuDevice`]
    pub struct ProgramId;
}

/// Shared handle to the GPU device of the current context.
///
/// The context may only be driven by the thread that created it; `Rc` keeps
/// the handle `!Send` so that rule is enforced by the compiler.
pub type Gpu = Rc<RefCell<dyn GpuDevice>>;

/// Buffer binding targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BufferTarget {
    /// `GL_ARRAY_BUFFER`
    Array = 0x8892,
    /// `GL_ELEMENT_ARRAY_BUFFER`
    ElementArray = 0x8893,
}

/// Buffer usage hints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BufferUsage {
    /// `GL_STREAM_DRAW`
    StreamDraw = 0x88E0,
    /// `GL_STATIC_DRAW`
    StaticDraw = 0x88E4,
    /// `GL_DYNAMIC_DRAW`
    DynamicDraw = 0x88E8,
}

/// Blend factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BlendFactor {
    /// `GL_ZERO`
    Zero = 0,
    /// `GL_ONE`
    One = 1,
    /// `GL_SRC_COLOR`
    SrcColor = 0x0300,
    /// `GL_ONE_MINUS_SRC_COLOR`
    OneMinusSrcColor = 0x0301,
    /// `GL_SRC_ALPHA`
    SrcAlpha = 0x0302,
    /// `GL_ONE_MINUS_SRC_ALPHA`
    OneMinusSrcAlpha = 0x0303,
    /// `GL_DST_ALPHA`
    DstAlpha = 0x0304,
    /// `GL_ONE_MINUS_DST_ALPHA`
    OneMinusDstAlpha = 0x0305,
    /// `GL_DST_COLOR`
    DstColor = 0x0306,
    /// `GL_ONE_MINUS_DST_COLOR`
    OneMinusDstColor = 0x0307,
}

/// Primitive topologies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Primitive {
    /// `GL_TRIANGLES`
    Triangles = 0x0004,
}

/// Index element types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum IndexType {
    /// `GL_UNSIGNED_SHORT`, the only index type WebGL 1 guarantees
    UnsignedShort = 0x1403,
}

/// Vertex attribute component types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AttributeType {
    /// `GL_UNSIGNED_BYTE`
    UnsignedByte = 0x1401,
    /// `GL_FLOAT`
    Float = 0x1406,
}

/// Texture sampling filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum TextureFilter {
    /// `GL_NEAREST`
    Nearest = 0x2600,
    /// `GL_LINEAR`
    Linear = 0x2601,
}

/// `GL_TEXTURE0`; texture unit `n` is `TEXTURE0 + n`
pub const TEXTURE0: u32 = 0x84C0;

/// One attribute of an interleaved vertex layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute location, bound before the program is linked
    pub location: u32,
    /// Attribute name in the vertex shader
    pub name: &'static str,
    /// Component count (1 to 4)
    pub components: i32,
    /// Component type
    pub kind: AttributeType,
    /// Map integer components to `0.0..=1.0`
    pub normalized: bool,
    /// Byte offset within one vertex
    pub offset: i32,
}

/// Everything needed to compile and link a program
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    /// Vertex shader source
    pub vertex_source: &'a str,
    /// Fragment shader source
    pub fragment_source: &'a str,
    /// Attributes to bind to fixed locations before linking
    pub attributes: &'a [VertexAttribute],
}

/// GPU command interface
///
/// The minimal capability set the renderer relies on. Implementations own
/// the native objects behind the returned handles.
pub trait GpuDevice {
    /// Upload an RGBA8 image into a new 2D texture
    fn create_texture(&mut self, image: &Image, filter: TextureFilter) -> RenderResult<TextureId>;

    /// Release a texture
    fn delete_texture(&mut self, texture: TextureId);

    /// Bind a texture to texture unit `unit`
    fn bind_texture(&mut self, unit: u32, texture: TextureId) -> RenderResult<()>;

    /// Allocate a buffer of `size` bytes with undefined contents
    fn create_buffer(&mut self, target: BufferTarget, size: usize, usage: BufferUsage) -> RenderResult<BufferId>;

    /// Overwrite `data.len()` bytes of a buffer starting at `offset`
    fn write_buffer(&mut self, buffer: BufferId, offset: usize, data: &[u8]) -> RenderResult<()>;

    /// Release a buffer
    fn delete_buffer(&mut self, buffer: BufferId);

    /// Compile and link a shader program
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> RenderResult<ProgramId>;

    /// Release a program
    fn delete_program(&mut self, program: ProgramId);

    /// Make a program current
    fn use_program(&mut self, program: ProgramId) -> RenderResult<()>;

    /// Set a `mat4` uniform from column-major data
    fn set_uniform_mat4(&mut self, program: ProgramId, name: &str, value: &[f32; 16]) -> RenderResult<()>;

    /// Set an `int`/`sampler2D` uniform
    fn set_uniform_i32(&mut self, program: ProgramId, name: &str, value: i32) -> RenderResult<()>;

    /// Bind vertex and index buffers and describe the interleaved layout
    fn bind_vertex_layout(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        stride: i32,
        attributes: &[VertexAttribute],
    ) -> RenderResult<()>;

    /// Enable blending with the given factors, or disable it with `None`
    fn set_blend(&mut self, factors: Option<(BlendFactor, BlendFactor)>);

    /// Clear the colour buffer
    fn clear(&mut self, color: [f32; 4]);

    /// Set the viewport in framebuffer pixels
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);

    /// Draw `count` indices from the bound index buffer
    fn draw_indexed(&mut self, primitive: Primitive, count: u32, index_type: IndexType) -> RenderResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_values_match_gl_constants() {
        assert_eq!(BufferTarget::Array as u32, glow::ARRAY_BUFFER);
        assert_eq!(BufferTarget::ElementArray as u32, glow::ELEMENT_ARRAY_BUFFER);
        assert_eq!(BufferUsage::StreamDraw as u32, glow::STREAM_DRAW);
        assert_eq!(BufferUsage::StaticDraw as u32, glow::STATIC_DRAW);
        assert_eq!(BufferUsage::DynamicDraw as u32, glow::DYNAMIC_DRAW);
        assert_eq!(BlendFactor::Zero as u32, glow::ZERO);
        assert_eq!(BlendFactor::One as u32, glow::ONE);
        assert_eq!(BlendFactor::SrcColor as u32, glow::SRC_COLOR);
        assert_eq!(BlendFactor::OneMinusSrcColor as u32, glow::ONE_MINUS_SRC_COLOR);
        assert_eq!(BlendFactor::SrcAlpha as u32, glow::SRC_ALPHA);
        assert_eq!(BlendFactor::OneMinusSrcAlpha as u32, glow::ONE_MINUS_SRC_ALPHA);
        assert_eq!(BlendFactor::DstAlpha as u32, glow::DST_ALPHA);
        assert_eq!(BlendFactor::OneMinusDstAlpha as u32, glow::ONE_MINUS_DST_ALPHA);
        assert_eq!(BlendFactor::DstColor as u32, glow::DST_COLOR);
        assert_eq!(BlendFactor::OneMinusDstColor as u32, glow::ONE_MINUS_DST_COLOR);
        assert_eq!(Primitive::Triangles as u32, glow::TRIANGLES);
        assert_eq!(IndexType::UnsignedShort as u32, glow::UNSIGNED_SHORT);
        assert_eq!(AttributeType::UnsignedByte as u32, glow::UNSIGNED_BYTE);
        assert_eq!(AttributeType::Float as u32, glow::FLOAT);
        assert_eq!(TextureFilter::Nearest as u32, glow::NEAREST);
        assert_eq!(TextureFilter::Linear as u32, glow::LINEAR);
        assert_eq!(TEXTURE0, glow::TEXTURE0);
    }
}
