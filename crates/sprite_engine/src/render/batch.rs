//! # Sprite Batch
//!
//! Accumulates textured quads in a CPU staging buffer and submits them with
//! as few indexed draw calls as possible.
//!
//! ## Flush policy
//!
//! The batch is greedy: it keeps appending quads while the texture stays the
//! same, and flushes whenever
//!
//! - a quad samples a different texture than the staged ones,
//! - the staging buffer reaches capacity, or
//! - [`Batch::end`] closes the pass.
//!
//! Draws are never reordered, so alternating between two textures costs one
//! draw call per switch. Group draws by texture (or pack them into one atlas)
//! to keep the call count low.
//!
//! ## Geometry
//!
//! Each quad is four [`SpriteVertex`] values in top-left, top-right,
//! bottom-right, bottom-left order. The index buffer is built once with two
//! triangles per quad and never changes. Indices are 16-bit so WebGL 1 can
//! draw them, which limits a batch to [`MAX_CAPACITY`] quads.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{pack_color, screen_projection, Mat4, Vec2};
use crate::render::font::Font;
use crate::render::gpu::{
    AttributeType, BlendFactor, BufferId, BufferTarget, BufferUsage, Gpu, IndexType, Primitive,
    ProgramDesc, ProgramId, VertexAttribute,
};
use crate::render::sprite::quad_corners;
use crate::render::texture::{Drawable, Texture};
use crate::render::{RenderError, RenderResult};

/// Default number of sprites a batch holds before it must flush
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Largest capacity whose vertices 16-bit indices can address
pub const MAX_CAPACITY: usize = (u16::MAX as usize + 1) / VERTICES_PER_SPRITE;

const VERTICES_PER_SPRITE: usize = 4;
const INDICES_PER_SPRITE: usize = 6;

const VERTEX_SHADER: &str = r"
#ifdef GL_ES
precision mediump float;
#endif

attribute vec2 a_position;
attribute vec2 a_tex_coords;
attribute vec4 a_color;

uniform mat4 u_projection;

varying vec2 v_tex_coords;
varying vec4 v_color;

void main() {
    v_tex_coords = a_tex_coords;
    v_color = a_color;
    gl_Position = u_projection * vec4(a_position, 0.0, 1.0);
}
";

const FRAGMENT_SHADER: &str = r"
#ifdef GL_ES
precision mediump float;
#endif

uniform sampler2D u_texture;

varying vec2 v_tex_coords;
varying vec4 v_color;

void main() {
    gl_FragColor = texture2D(u_texture, v_tex_coords) * v_color;
}
";

/// Uniform holding the screen projection
pub const PROJECTION_UNIFORM: &str = "u_projection";

/// Sampler uniform, always bound to texture unit 0
pub const TEXTURE_UNIFORM: &str = "u_texture";

/// One corner of a sprite quad as laid out in the vertex buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    /// Screen position in pixels
    pub position: [f32; 2],
    /// Normalized texture coordinates
    pub tex_coords: [f32; 2],
    /// RGBA colour, normalized by the GPU
    pub color: [u8; 4],
}

impl SpriteVertex {
    const STRIDE: i32 = std::mem::size_of::<Self>() as i32;

    const ATTRIBUTES: [VertexAttribute; 3] = [
        VertexAttribute {
            location: 0,
            name: "a_position",
            components: 2,
            kind: AttributeType::Float,
            normalized: false,
            offset: 0,
        },
        VertexAttribute {
            location: 1,
            name: "a_tex_coords",
            components: 2,
            kind: AttributeType::Float,
            normalized: false,
            offset: 8,
        },
        VertexAttribute {
            location: 2,
            name: "a_color",
            components: 4,
            kind: AttributeType::UnsignedByte,
            normalized: true,
            offset: 16,
        },
    ];
}

/// Counters for one `begin`/`end` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Quads drawn
    pub sprites: usize,
    /// Indexed draw calls issued
    pub draw_calls: usize,
    /// Times a draw changed the texture of the staged quads
    pub texture_switches: usize,
}

/// Batched sprite renderer
pub struct Batch {
    gpu: Gpu,
    program: ProgramId,
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    capacity: usize,
    vertices: Vec<SpriteVertex>,
    texture: Option<Texture>,
    projection: Mat4,
    drawing: bool,
    stats: BatchStats,
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("capacity", &self.capacity)
            .field("staged", &self.staged())
            .field("drawing", &self.drawing)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Batch {
    /// Create a batch holding up to `capacity` sprites per draw call
    ///
    /// The projection starts as identity; call [`Batch::set_projection`]
    /// with the viewport size before the first pass.
    pub fn new(gpu: &Gpu, capacity: usize) -> RenderResult<Self> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(RenderError::CapacityTooLarge {
                requested: capacity,
                max: MAX_CAPACITY,
            });
        }

        let indices = quad_indices(capacity);
        let (program, vertex_buffer, index_buffer) = {
            let mut device = gpu.borrow_mut();
            let program = device.create_program(&ProgramDesc {
                vertex_source: VERTEX_SHADER,
                fragment_source: FRAGMENT_SHADER,
                attributes: &SpriteVertex::ATTRIBUTES,
            })?;
            let vertex_buffer = device.create_buffer(
                BufferTarget::Array,
                capacity * VERTICES_PER_SPRITE * std::mem::size_of::<SpriteVertex>(),
                BufferUsage::DynamicDraw,
            )?;
            let index_buffer = device.create_buffer(
                BufferTarget::ElementArray,
                indices.len() * std::mem::size_of::<u16>(),
                BufferUsage::StaticDraw,
            )?;
            device.write_buffer(index_buffer, 0, bytemuck::cast_slice(&indices))?;
            (program, vertex_buffer, index_buffer)
        };

        log::debug!("Created sprite batch with capacity {capacity}");

        Ok(Self {
            gpu: gpu.clone(),
            program,
            vertex_buffer,
            index_buffer,
            capacity,
            vertices: Vec::with_capacity(capacity * VERTICES_PER_SPRITE),
            texture: None,
            projection: Mat4::identity(),
            drawing: false,
            stats: BatchStats::default(),
        })
    }

    /// Sprites per draw call
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether a pass is open
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Sprites staged but not yet submitted
    pub fn staged(&self) -> usize {
        self.vertices.len() / VERTICES_PER_SPRITE
    }

    /// Counters of the current or most recent pass
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Projection applied at the next [`Batch::begin`]
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Use a pixel projection for a `width` x `height` viewport
    ///
    /// Non-positive sizes (a minimized window) are ignored.
    pub fn set_projection(&mut self, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            log::warn!("Ignoring projection for empty viewport {width}x{height}");
            return;
        }
        self.projection = screen_projection(width, height);
    }

    /// Open a pass
    pub fn begin(&mut self) -> RenderResult<()> {
        if self.drawing {
            return Err(RenderError::IllegalState("begin called while the batch is already drawing"));
        }

        self.vertices.clear();
        self.texture = None;
        self.stats = BatchStats::default();

        let mut projection = [0.0; 16];
        projection.copy_from_slice(self.projection.as_slice());

        let mut device = self.gpu.borrow_mut();
        device.use_program(self.program)?;
        device.set_blend(Some((BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha)));
        device.set_uniform_mat4(self.program, PROJECTION_UNIFORM, &projection)?;
        device.set_uniform_i32(self.program, TEXTURE_UNIFORM, 0)?;
        device.bind_vertex_layout(
            self.vertex_buffer,
            self.index_buffer,
            SpriteVertex::STRIDE,
            &SpriteVertex::ATTRIBUTES,
        )?;
        drop(device);

        self.drawing = true;
        Ok(())
    }

    /// Queue a quad showing `drawable`
    ///
    /// `x`/`y` place the anchor point, which is given as a fraction of the
    /// drawable's size. Rotation is in degrees about the anchor. `color` is a
    /// `0xRRGGBB` tint multiplied with the texture.
    pub fn draw(
        &mut self,
        drawable: &dyn Drawable,
        x: f32,
        y: f32,
        anchor_x: f32,
        anchor_y: f32,
        scale_x: f32,
        scale_y: f32,
        rotation: f32,
        color: u32,
        alpha: f32,
    ) -> RenderResult<()> {
        if !self.drawing {
            return Err(RenderError::IllegalState("draw called outside begin/end"));
        }

        let texture = drawable.texture();
        if self.texture != Some(texture) {
            if self.texture.is_some() {
                self.stats.texture_switches += 1;
            }
            self.flush()?;
            self.texture = Some(texture);
        }

        let corners = quad_corners(
            Vec2::new(drawable.width(), drawable.height()),
            Vec2::new(x, y),
            Vec2::new(anchor_x, anchor_y),
            Vec2::new(scale_x, scale_y),
            rotation,
        );
        let [u, v, u2, v2] = drawable.uv();
        let tex_coords = [[u, v], [u2, v], [u2, v2], [u, v2]];
        let color = pack_color(color, alpha);

        self.vertices.extend(corners.iter().zip(tex_coords).map(|(corner, tex_coords)| SpriteVertex {
            position: [corner.x, corner.y],
            tex_coords,
            color,
        }));
        self.stats.sprites += 1;

        if self.staged() >= self.capacity {
            self.flush()?;
        }
        Ok(())
    }

    /// Print `text` with its top-left corner at `x`, `y`
    ///
    /// Characters without a glyph are skipped and do not move the cursor.
    pub fn print(&mut self, font: &Font, text: &str, x: f32, y: f32, color: u32) -> RenderResult<()> {
        let advance = font.cell_width() as f32;
        let mut cursor = x;
        for ch in text.chars() {
            if let Some(glyph) = font.glyph(ch) {
                self.draw(glyph, cursor, y, 0.0, 0.0, 1.0, 1.0, 0.0, color, 1.0)?;
                cursor += advance;
            }
        }
        Ok(())
    }

    /// Submit staged quads with one draw call
    pub fn flush(&mut self) -> RenderResult<()> {
        if self.vertices.is_empty() {
            return Ok(());
        }
        let texture = self
            .texture
            .ok_or(RenderError::IllegalState("staged quads without a texture"))?;
        let count = self.staged() * INDICES_PER_SPRITE;

        let mut device = self.gpu.borrow_mut();
        device.write_buffer(self.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices))?;
        device.bind_texture(0, texture.id())?;
        device.draw_indexed(Primitive::Triangles, count as u32, IndexType::UnsignedShort)?;
        drop(device);

        self.vertices.clear();
        self.stats.draw_calls += 1;
        Ok(())
    }

    /// Flush remaining quads and close the pass
    pub fn end(&mut self) -> RenderResult<()> {
        if !self.drawing {
            return Err(RenderError::IllegalState("end called without begin"));
        }
        let result = self.flush();
        self.drawing = false;
        self.texture = None;
        result
    }
}

impl Drop for Batch {
    fn drop(&mut self) {
        if let Ok(mut device) = self.gpu.try_borrow_mut() {
            device.delete_buffer(self.vertex_buffer);
            device.delete_buffer(self.index_buffer);
            device.delete_program(self.program);
        }
    }
}

/// Two triangles per quad: `0 1 2` and `0 2 3`
fn quad_indices(capacity: usize) -> Vec<u16> {
    (0..capacity)
        .flat_map(|quad| {
            let base = (quad * VERTICES_PER_SPRITE) as u16;
            [base, base + 1, base + 2, base, base + 2, base + 3]
        })
        .collect()
}
