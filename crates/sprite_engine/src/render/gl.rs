//! OpenGL / WebGL implementation of the GPU command interface
//!
//! Built on `glow`, so the same code drives a desktop OpenGL 2.1 context
//! (through GLFW's loader) and a browser WebGL 1 context.

#![allow(unsafe_code)]

use std::collections::HashMap;

use glow::HasContext;
use slotmap::SlotMap;

use crate::assets::Image;
use crate::render::gpu::{
    BlendFactor, BufferId, BufferTarget, BufferUsage, GpuDevice, IndexType, Primitive, ProgramDesc,
    ProgramId, TextureFilter, TextureId, VertexAttribute, TEXTURE0,
};
use crate::render::{RenderError, RenderResult};

struct GlBuffer {
    raw: glow::Buffer,
    target: BufferTarget,
    size: usize,
}

struct GlProgram {
    raw: glow::Program,
    uniforms: HashMap<String, glow::UniformLocation>,
}

/// [`GpuDevice`] backed by a `glow` context
pub struct GlDevice {
    gl: glow::Context,
    textures: SlotMap<TextureId, glow::Texture>,
    buffers: SlotMap<BufferId, GlBuffer>,
    programs: SlotMap<ProgramId, GlProgram>,
    current_program: Option<ProgramId>,
}

impl GlDevice {
    /// Wrap a current `glow` context
    pub fn new(gl: glow::Context) -> Self {
        let version = unsafe { gl.get_parameter_string(glow::VERSION) };
        log::info!("OpenGL context: {version}");

        Self {
            gl,
            textures: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            current_program: None,
        }
    }

    /// Access the raw context, e.g. to query extensions
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    fn compile_shader(&self, kind: u32, source: &str) -> RenderResult<glow::Shader> {
        unsafe {
            let shader = self.gl.create_shader(kind).map_err(RenderError::Gpu)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let info = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(RenderError::Gpu(format!("shader compilation failed: {info}")));
            }
            Ok(shader)
        }
    }

    fn program(&self, program: ProgramId) -> RenderResult<&GlProgram> {
        self.programs
            .get(program)
            .ok_or(RenderError::UnknownHandle("program"))
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> RenderResult<glow::UniformLocation> {
        self.use_program(program)?;
        let entry = self
            .programs
            .get_mut(program)
            .ok_or(RenderError::UnknownHandle("program"))?;

        if let Some(location) = entry.uniforms.get(name) {
            return Ok(location.clone());
        }

        let location = unsafe { self.gl.get_uniform_location(entry.raw, name) }
            .ok_or_else(|| RenderError::Gpu(format!("uniform `{name}` not found")))?;
        entry.uniforms.insert(name.to_string(), location.clone());
        Ok(location)
    }
}

impl GpuDevice for GlDevice {
    fn create_texture(&mut self, image: &Image, filter: TextureFilter) -> RenderResult<TextureId> {
        let raw = unsafe {
            let raw = self.gl.create_texture().map_err(RenderError::Gpu)?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(raw));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter as i32);
            // WebGL 1 only samples non-power-of-two textures with clamped wrapping
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                image.width() as i32,
                image.height() as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(image.pixels()),
            );
            raw
        };

        log::debug!("Uploaded {}x{} texture", image.width(), image.height());
        Ok(self.textures.insert(raw))
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if let Some(raw) = self.textures.remove(texture) {
            unsafe { self.gl.delete_texture(raw) };
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) -> RenderResult<()> {
        let raw = *self
            .textures
            .get(texture)
            .ok_or(RenderError::UnknownHandle("texture"))?;
        unsafe {
            self.gl.active_texture(TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(raw));
        }
        Ok(())
    }

    fn create_buffer(&mut self, target: BufferTarget, size: usize, usage: BufferUsage) -> RenderResult<BufferId> {
        let raw = unsafe {
            let raw = self.gl.create_buffer().map_err(RenderError::Gpu)?;
            self.gl.bind_buffer(target as u32, Some(raw));
            self.gl.buffer_data_size(target as u32, size as i32, usage as u32);
            raw
        };

        log::debug!("Created {target:?} buffer of {size} bytes");
        Ok(self.buffers.insert(GlBuffer { raw, target, size }))
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

        unsafe {
            self.gl.bind_buffer(entry.target as u32, Some(entry.raw));
            self.gl.buffer_sub_data_u8_slice(entry.target as u32, offset as i32, data);
        }
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(entry) = self.buffers.remove(buffer) {
            unsafe { self.gl.delete_buffer(entry.raw) };
        }
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> RenderResult<ProgramId> {
        let vertex = self.compile_shader(glow::VERTEX_SHADER, desc.vertex_source)?;
        let fragment = match self.compile_shader(glow::FRAGMENT_SHADER, desc.fragment_source) {
            Ok(fragment) => fragment,
            Err(e) => {
                unsafe { self.gl.delete_shader(vertex) };
                return Err(e);
            }
        };

        let raw = unsafe {
            let raw = match self.gl.create_program() {
                Ok(raw) => raw,
                Err(e) => {
                    self.gl.delete_shader(vertex);
                    self.gl.delete_shader(fragment);
                    return Err(RenderError::Gpu(e));
                }
            };
            self.gl.attach_shader(raw, vertex);
            self.gl.attach_shader(raw, fragment);
            for attribute in desc.attributes {
                self.gl.bind_attrib_location(raw, attribute.location, attribute.name);
            }
            self.gl.link_program(raw);

            self.gl.detach_shader(raw, vertex);
            self.gl.detach_shader(raw, fragment);
            self.gl.delete_shader(vertex);
            self.gl.delete_shader(fragment);

            if !self.gl.get_program_link_status(raw) {
                let info = self.gl.get_program_info_log(raw);
                self.gl.delete_program(raw);
                return Err(RenderError::Gpu(format!("program link failed: {info}")));
            }
            raw
        };

        Ok(self.programs.insert(GlProgram {
            raw,
            uniforms: HashMap::new(),
        }))
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(entry) = self.programs.remove(program) {
            if self.current_program == Some(program) {
                unsafe { self.gl.use_program(None) };
                self.current_program = None;
            }
            unsafe { self.gl.delete_program(entry.raw) };
        }
    }

    fn use_program(&mut self, program: ProgramId) -> RenderResult<()> {
        if self.current_program == Some(program) {
            return Ok(());
        }
        let raw = self.program(program)?.raw;
        unsafe { self.gl.use_program(Some(raw)) };
        self.current_program = Some(program);
        Ok(())
    }

    fn set_uniform_mat4(&mut self, program: ProgramId, name: &str, value: &[f32; 16]) -> RenderResult<()> {
        let location = self.uniform_location(program, name)?;
        unsafe { self.gl.uniform_matrix_4_f32_slice(Some(&location), false, value) };
        Ok(())
    }

    fn set_uniform_i32(&mut self, program: ProgramId, name: &str, value: i32) -> RenderResult<()> {
        let location = self.uniform_location(program, name)?;
        unsafe { self.gl.uniform_1_i32(Some(&location), value) };
        Ok(())
    }

    fn bind_vertex_layout(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        stride: i32,
        attributes: &[VertexAttribute],
    ) -> RenderResult<()> {
        let vertex_raw = self
            .buffers
            .get(vertices)
            .ok_or(RenderError::UnknownHandle("buffer"))?
            .raw;
        let index_raw = self
            .buffers
            .get(indices)
            .ok_or(RenderError::UnknownHandle("buffer"))?
            .raw;

        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_raw));
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index_raw));
            for attribute in attributes {
                self.gl.enable_vertex_attrib_array(attribute.location);
                self.gl.vertex_attrib_pointer_f32(
                    attribute.location,
                    attribute.components,
                    attribute.kind as u32,
                    attribute.normalized,
                    stride,
                    attribute.offset,
                );
            }
        }
        Ok(())
    }

    fn set_blend(&mut self, factors: Option<(BlendFactor, BlendFactor)>) {
        unsafe {
            match factors {
                Some((src, dst)) => {
                    self.gl.enable(glow::BLEND);
                    self.gl.blend_func(src as u32, dst as u32);
                }
                None => self.gl.disable(glow::BLEND),
            }
        }
    }

    fn clear(&mut self, color: [f32; 4]) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) };
    }

    fn draw_indexed(&mut self, primitive: Primitive, count: u32, index_type: IndexType) -> RenderResult<()> {
        unsafe {
            self.gl
                .draw_elements(primitive as u32, count as i32, index_type as u32, 0);
        }
        Ok(())
    }
}

impl Drop for GlDevice {
    fn drop(&mut self) {
        unsafe {
            for (_, raw) in self.textures.drain() {
                self.gl.delete_texture(raw);
            }
            for (_, entry) in self.buffers.drain() {
                self.gl.delete_buffer(entry.raw);
            }
            for (_, entry) in self.programs.drain() {
                self.gl.delete_program(entry.raw);
            }
        }
    }
}
