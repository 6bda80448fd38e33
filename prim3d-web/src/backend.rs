//! [`GpuApi`] over a WebGL2 rendering context.

use prim3d_core::{Attribute, BufferUsage, DrawMode, GpuApi, ShaderCompiler, Uniform, UniformValue};
use web_sys::{WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader};

/// A GPU buffer; `None` when the context refused to allocate one.
#[derive(Debug)]
pub struct GlBuffer(Option<WebGlBuffer>);

pub struct WebGlBackend {
    gl: Gl,
}

impl WebGlBackend {
    pub fn new(gl: Gl) -> Self {
        Self { gl }
    }

    pub fn context(&self) -> &Gl {
        &self.gl
    }

    fn attribute_location(&self, program: &WebGlProgram, attribute: Attribute) -> Option<u32> {
        let location = self.gl.get_attrib_location(program, attribute.name());
        if location < 0 {
            log::warn!("program has no `{}` attribute", attribute.name());
            return None;
        }
        Some(location as u32)
    }
}

impl GpuApi for WebGlBackend {
    type Buffer = GlBuffer;
    type Program = WebGlProgram;

    fn init_raster_state(&mut self) {
        self.gl.enable(Gl::CULL_FACE);
        self.gl.cull_face(Gl::BACK);
        self.gl.front_face(Gl::CCW);
        self.gl.enable(Gl::DEPTH_TEST);
        self.gl.depth_func(Gl::LEQUAL);
    }

    fn use_program(&mut self, program: &WebGlProgram) {
        self.gl.use_program(Some(program));
    }

    fn create_buffer(&mut self) -> GlBuffer {
        let buffer = self.gl.create_buffer();
        if buffer.is_none() {
            log::error!("WebGL refused to create a buffer");
        }
        GlBuffer(buffer)
    }

    fn upload_buffer(&mut self, buffer: &GlBuffer, data: &[f32], usage: BufferUsage) {
        let usage = match usage {
            BufferUsage::Static => Gl::STATIC_DRAW,
            BufferUsage::Dynamic => Gl::DYNAMIC_DRAW,
        };
        self.bind_buffer(buffer);
        self.gl
            .buffer_data_with_u8_array(Gl::ARRAY_BUFFER, bytemuck::cast_slice(data), usage);
    }

    fn bind_buffer(&mut self, buffer: &GlBuffer) {
        self.gl.bind_buffer(Gl::ARRAY_BUFFER, buffer.0.as_ref());
    }

    fn enable_attribute(
        &mut self,
        program: &WebGlProgram,
        attribute: Attribute,
        offset_bytes: usize,
    ) {
        if let Some(location) = self.attribute_location(program, attribute) {
            let offset = offset_bytes as i32;
            self.gl
                .vertex_attrib_pointer_with_i32(location, 3, Gl::FLOAT, false, 0, offset);
            self.gl.enable_vertex_attrib_array(location);
        }
    }

    fn disable_attribute(&mut self, program: &WebGlProgram, attribute: Attribute) {
        if let Some(location) = self.attribute_location(program, attribute) {
            self.gl.disable_vertex_attrib_array(location);
        }
    }

    fn set_uniform(&mut self, program: &WebGlProgram, uniform: Uniform, value: UniformValue) {
        // A missing location turns the upload into a no-op, as in GL
        let location = self.gl.get_uniform_location(program, uniform.name());
        let location = location.as_ref();
        match value {
            UniformValue::Mat4(m) => self.gl.uniform_matrix4fv_with_f32_array(location, false, &m),
            UniformValue::Mat3(m) => self.gl.uniform_matrix3fv_with_f32_array(location, false, &m),
            UniformValue::Vec4(v) => self.gl.uniform4fv_with_f32_array(location, &v),
            UniformValue::Float(f) => self.gl.uniform1f(location, f),
            UniformValue::Int(i) => self.gl.uniform1i(location, i),
        }
    }

    fn blend_enabled(&self) -> bool {
        self.gl.is_enabled(Gl::BLEND)
    }

    fn set_blend(&mut self, enabled: bool) {
        if enabled {
            self.gl.enable(Gl::BLEND);
            self.gl.blend_func(Gl::SRC_ALPHA, Gl::ONE_MINUS_SRC_ALPHA);
        } else {
            self.gl.disable(Gl::BLEND);
        }
    }

    fn draw_arrays(&mut self, mode: DrawMode, count: usize) {
        let mode = match mode {
            DrawMode::Triangles => Gl::TRIANGLES,
            DrawMode::LineStrip => Gl::LINE_STRIP,
            DrawMode::Points => Gl::POINTS,
        };
        self.gl.draw_arrays(mode, 0, count as i32);
    }
}

/// Compiles and links programs on a WebGL2 context.
pub struct GlShaderCompiler {
    gl: Gl,
}

impl GlShaderCompiler {
    pub fn new(gl: Gl) -> Self {
        Self { gl }
    }

    fn compile(&self, kind: u32, source: &str) -> Result<WebGlShader, String> {
        let shader = self
            .gl
            .create_shader(kind)
            .ok_or_else(|| "unable to create shader object".to_string())?;
        self.gl.shader_source(&shader, source);
        self.gl.compile_shader(&shader);

        let compiled = self
            .gl
            .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false);
        if compiled {
            Ok(shader)
        } else {
            let info = self.gl.get_shader_info_log(&shader).unwrap_or_default();
            self.gl.delete_shader(Some(&shader));
            Err(format!("error compiling shader: {info}"))
        }
    }
}

impl ShaderCompiler for GlShaderCompiler {
    type Program = WebGlProgram;

    fn link(&mut self, vertex_source: &str, fragment_source: &str) -> Result<WebGlProgram, String> {
        let vertex = self.compile(Gl::VERTEX_SHADER, vertex_source)?;
        let fragment = self.compile(Gl::FRAGMENT_SHADER, fragment_source)?;

        let program = self
            .gl
            .create_program()
            .ok_or_else(|| "unable to create program object".to_string())?;
        self.gl.attach_shader(&program, &vertex);
        self.gl.attach_shader(&program, &fragment);
        self.gl.link_program(&program);

        // Linked programs keep their own copy of the shaders
        self.gl.delete_shader(Some(&vertex));
        self.gl.delete_shader(Some(&fragment));

        let linked = self
            .gl
            .get_program_parameter(&program, Gl::LINK_STATUS)
            .as_bool()
            .unwrap_or(false);
        if linked {
            log::debug!("shader program linked");
            Ok(program)
        } else {
            let info = self.gl.get_program_info_log(&program).unwrap_or_default();
            self.gl.delete_program(Some(&program));
            Err(info)
        }
    }
}
