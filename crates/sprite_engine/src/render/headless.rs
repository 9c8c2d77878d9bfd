//! Recording implementation of the GPU command interface
//!
//! [`RecordingDevice`] keeps no GPU state beyond handle bookkeeping; it logs
//! every command it receives so tests (and headless runs) can inspect what
//! the renderer would have submitted.

use slotmap::SlotMap;

use crate::assets::Image;
use crate::render::gpu::{
    BlendFactor, BufferId, BufferTarget, BufferUsage, GpuDevice, IndexType, Primitive, ProgramDesc,
    ProgramId, TextureFilter, TextureId, VertexAttribute,
};
use crate::render::{RenderError, RenderResult};

/// A command received by a [`RecordingDevice`]
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    /// A texture was created
    CreateTexture {
        /// New handle
        texture: TextureId,
        /// Texture width
        width: u32,
        /// Texture height
        height: u32,
    },
    /// A texture was released
    DeleteTexture(TextureId),
    /// A texture was bound
    BindTexture {
        /// Texture unit
        unit: u32,
        /// Bound texture
        texture: TextureId,
    },
    /// A buffer was created
    CreateBuffer {
        /// New handle
        buffer: BufferId,
        /// Binding target
        target: BufferTarget,
        /// Size in bytes
        size: usize,
    },
    /// Bytes were written to a buffer
    WriteBuffer {
        /// Destination buffer
        buffer: BufferId,
        /// Byte offset
        offset: usize,
        /// Copy of the written bytes
        data: Vec<u8>,
    },
    /// A buffer was released
    DeleteBuffer(BufferId),
    /// A program was created
    CreateProgram(ProgramId),
    /// A program was released
    DeleteProgram(ProgramId),
    /// A program was made current
    UseProgram(ProgramId),
    /// A matrix uniform was set
    UniformMat4 {
        /// Uniform name
        name: String,
        /// Column-major value
        value: [f32; 16],
    },
    /// An integer uniform was set
    UniformI32 {
        /// Uniform name
        name: String,
        /// Value
        value: i32,
    },
    /// Vertex and index buffers were bound
    BindVertexLayout {
        /// Vertex buffer
        vertices: BufferId,
        /// Index buffer
        indices: BufferId,
        /// Vertex stride in bytes
        stride: i32,
    },
    /// Blend state changed
    SetBlend(Option<(BlendFactor, BlendFactor)>),
    /// The colour buffer was cleared
    Clear([f32; 4]),
    /// The viewport changed
    Viewport {
        /// Left edge
        x: i32,
        /// Bottom edge
        y: i32,
        /// Width
        width: i32,
        /// Height
        height: i32,
    },
    /// An indexed draw was issued
    DrawIndexed {
        /// Primitive topology
        primitive: Primitive,
        /// Index count
        count: u32,
    },
}

#[derive(Debug, Clone, Copy)]
struct RecordedBuffer {
    size: usize,
}

/// [`GpuDevice`] that records commands instead of executing them
#[derive(Debug, Default)]
pub struct RecordingDevice {
    textures: SlotMap<TextureId, (u32, u32)>,
    buffers: SlotMap<BufferId, RecordedBuffer>,
    programs: SlotMap<ProgramId, ()>,
    commands: Vec<GpuCommand>,
}

impl RecordingDevice {
    /// Create an empty recording device
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands received since creation or the last [`Self::clear_commands`]
    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Forget recorded commands, keeping live handles
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of draw calls recorded
    pub fn draw_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, GpuCommand::DrawIndexed { .. }))
            .count()
    }

    /// Index counts of every recorded draw call, in order
    pub fn draw_counts(&self) -> Vec<u32> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                GpuCommand::DrawIndexed { count, .. } => Some(*count),
                _ => None,
            })
            .collect()
    }

    /// Textures bound on unit 0, in order
    pub fn bound_textures(&self) -> Vec<TextureId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                GpuCommand::BindTexture { unit: 0, texture } => Some(*texture),
                _ => None,
            })
            .collect()
    }

    /// Bytes of the most recent write to `buffer`
    pub fn last_write(&self, buffer: BufferId) -> Option<&[u8]> {
        self.commands.iter().rev().find_map(|c| match c {
            GpuCommand::WriteBuffer { buffer: b, data, .. } if *b == buffer => Some(data.as_slice()),
            _ => None,
        })
    }

    /// Number of live programs
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Number of live textures
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

impl GpuDevice for RecordingDevice {
    fn create_texture(&mut self, image: &Image, _filter: TextureFilter) -> RenderResult<TextureId> {
        let (width, height) = (image.width(), image.height());
        let texture = self.textures.insert((width, height));
        self.commands.push(GpuCommand::CreateTexture { texture, width, height });
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if self.textures.remove(texture).is_some() {
            self.commands.push(GpuCommand::DeleteTexture(texture));
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) -> RenderResult<()> {
        if !self.textures.contains_key(texture) {
            return Err(RenderError::UnknownHandle("texture"));
        }
        self.commands.push(GpuCommand::BindTexture { unit, texture });
        Ok(())
    }

    fn create_buffer(&mut self, target: BufferTarget, size: usize, _usage: BufferUsage) -> RenderResult<BufferId> {
        let buffer = self.buffers.insert(RecordedBuffer { size });
        self.commands.push(GpuCommand::CreateBuffer { buffer, target, size });
        Ok(buffer)
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: usize, data: &[u8]) -> RenderResult<()> {
        let entry = self
            .buffers
            .get(buffer)
            .ok_or(RenderError::UnknownHandle("buffer"))?;
        if offset + data.len() > entry.size {
            return Err(RenderError::Gpu(format!(
                "write of {} bytes at offset {offset} overflows {}-byte buffer",
                data.len(),
                entry.size
            )));
        }
        self.commands.push(GpuCommand::WriteBuffer {
            buffer,
            offset,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(buffer).is_some() {
            self.commands.push(GpuCommand::DeleteBuffer(buffer));
        }
    }

    fn create_program(&mut self, _desc: &ProgramDesc<'_>) -> RenderResult<ProgramId> {
        let program = self.programs.insert(());
        self.commands.push(GpuCommand::CreateProgram(program));
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramId) {
        if self.programs.remove(program).is_some() {
            self.commands.push(GpuCommand::DeleteProgram(program));
        }
    }

    fn use_program(&mut self, program: ProgramId) -> RenderResult<()> {
        if !self.programs.contains_key(program) {
            return Err(RenderError::UnknownHandle("program"));
        }
        self.commands.push(GpuCommand::UseProgram(program));
        Ok(())
    }

    fn set_uniform_mat4(&mut self, _program: ProgramId, name: &str, value: &[f32; 16]) -> RenderResult<()> {
        self.commands.push(GpuCommand::UniformMat4 {
            name: name.to_string(),
            value: *value,
        });
        Ok(())
    }

    fn set_uniform_i32(&mut self, _program: ProgramId, name: &str, value: i32) -> RenderResult<()> {
        self.commands.push(GpuCommand::UniformI32 {
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    fn bind_vertex_layout(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        stride: i32,
        _attributes: &[VertexAttribute],
    ) -> RenderResult<()> {
        self.commands.push(GpuCommand::BindVertexLayout { vertices, indices, stride });
        Ok(())
    }

    fn set_blend(&mut self, factors: Option<(BlendFactor, BlendFactor)>) {
        self.commands.push(GpuCommand::SetBlend(factors));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.commands.push(GpuCommand::Clear(color));
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.commands.push(GpuCommand::Viewport { x, y, width, height });
    }

    fn draw_indexed(&mut self, primitive: Primitive, count: u32, _index_type: IndexType) -> RenderResult<()> {
        self.commands.push(GpuCommand::DrawIndexed { primitive, count });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_texture_lifecycle() {
        let mut device = RecordingDevice::new();
        let image = Image::solid_color(8, 4, [255, 255, 255, 255]);

        let texture = device.create_texture(&image, TextureFilter::Nearest).unwrap();
        device.bind_texture(0, texture).unwrap();
        device.delete_texture(texture);

        assert_eq!(
            device.commands(),
            &[
                GpuCommand::CreateTexture { texture, width: 8, height: 4 },
                GpuCommand::BindTexture { unit: 0, texture },
                GpuCommand::DeleteTexture(texture),
            ]
        );
        assert!(device.bind_texture(0, texture).is_err());
    }

    #[test]
    fn test_write_buffer_bounds_checked() {
        let mut device = RecordingDevice::new();
        let buffer = device
            .create_buffer(BufferTarget::Array, 8, BufferUsage::DynamicDraw)
            .unwrap();

        assert!(device.write_buffer(buffer, 4, &[0; 4]).is_ok());
        assert!(device.write_buffer(buffer, 5, &[0; 4]).is_err());
        assert_eq!(device.last_write(buffer), Some(&[0u8; 4][..]));
    }
}
