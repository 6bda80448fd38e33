//! The seam between the render core and a concrete graphics API.
//!
//! Backends implement [`GpuApi`] for buffer, uniform and draw commands and
//! [`ShaderCompiler`] for turning shader sources into a linked program. The
//! names returned by [`Attribute::name`] and [`Uniform::name`] are the
//! identifiers the shader program must declare.

/// Vertex attributes fed from the bound buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Position,
    Normal,
}

impl Attribute {
    pub fn name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Normal => "normal",
        }
    }
}

/// Uniforms written for every draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniform {
    ModelView,
    Projection,
    InvTransModelView,
    UsePhong,
    DrawPoint,
    PointSize,
    LightPosition,
    Shininess,
    AmbientProduct,
    DiffuseProduct,
    SpecularProduct,
}

impl Uniform {
    pub fn name(self) -> &'static str {
        match self {
            Self::ModelView => "ModelView",
            Self::Projection => "Projection",
            Self::InvTransModelView => "InvTransModelView",
            Self::UsePhong => "usePhong",
            Self::DrawPoint => "drawPoint",
            Self::PointSize => "pointSize",
            Self::LightPosition => "lightPosition",
            Self::Shininess => "shininess",
            Self::AmbientProduct => "ambientProd",
            Self::DiffuseProduct => "diffuseProd",
            Self::SpecularProduct => "specularProd",
        }
    }
}

/// A uniform payload. Matrices are already flattened column-major.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Mat4(Vec<f32>),
    Mat3(Vec<f32>),
    Vec4([f32; 4]),
    Float(f32),
    Int(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Uploaded once and drawn many times.
    Static,
    /// Re-uploaded before every draw.
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Triangles,
    LineStrip,
    Points,
}

/// Compiles and links a vertex/fragment shader pair.
pub trait ShaderCompiler {
    type Program;

    /// Link a program, or return the compiler/linker log on failure.
    fn link(&mut self, vertex_source: &str, fragment_source: &str) -> Result<Self::Program, String>;
}

/// Buffer, state and draw commands the render core issues.
///
/// Vertex attributes are three 32-bit floats with stride 0; `offset_bytes`
/// locates the attribute inside the bound buffer.
pub trait GpuApi {
    type Buffer;
    type Program;

    /// Back-face culling with counter-clockwise front faces and a `LEQUAL`
    /// depth test.
    fn init_raster_state(&mut self);

    fn use_program(&mut self, program: &Self::Program);

    fn create_buffer(&mut self) -> Self::Buffer;

    /// Bind `buffer` and replace its contents with `data`.
    fn upload_buffer(&mut self, buffer: &Self::Buffer, data: &[f32], usage: BufferUsage);

    fn bind_buffer(&mut self, buffer: &Self::Buffer);

    fn enable_attribute(
        &mut self,
        program: &Self::Program,
        attribute: Attribute,
        offset_bytes: usize,
    );

    fn disable_attribute(&mut self, program: &Self::Program, attribute: Attribute);

    fn set_uniform(&mut self, program: &Self::Program, uniform: Uniform, value: UniformValue);

    fn blend_enabled(&self) -> bool;

    /// Toggle source-alpha blending (`SRC_ALPHA`, `ONE_MINUS_SRC_ALPHA`).
    fn set_blend(&mut self, enabled: bool);

    /// Draw `count` vertices from the bound buffer, starting at the first.
    fn draw_arrays(&mut self, mode: DrawMode, count: usize);
}
