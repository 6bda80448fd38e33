//! Draw-call assembly: per-solid buffer cache and uniform upload.

use crate::error::{Error, Result};
use crate::geometry::SolidKind;
use crate::gpu::{Attribute, BufferUsage, DrawMode, GpuApi, ShaderCompiler, Uniform, UniformValue};
use crate::math::{Mat44, Vec3, Vec4};
use crate::shading::{Material, ShadingUniforms, LIGHT};
use crate::transform::Transform;

/// Components per position or normal.
const ELEMENTS_PER_VERTEX: usize = 3;
const BYTES_PER_FLOAT: usize = std::mem::size_of::<f32>();

/// Point size used when the caller gives none (or a non-positive one).
pub const DEFAULT_POINT_SIZE: f32 = 10.0;

/// A solid's vertex data living on the GPU.
#[derive(Debug)]
struct GeometryBuffer<B> {
    buffer: B,
    vertex_count: usize,
}

/// Turns solids, paths and point sets into draw calls on a [`GpuApi`].
///
/// The mesh for each [`SolidKind`] is tessellated and uploaded the first time
/// it is drawn and reused afterwards; solids have no parameters, so cached
/// buffers are never rebuilt.
pub struct RenderCore<G: GpuApi> {
    gpu: G,
    program: G::Program,
    material: Material,
    solids: [Option<GeometryBuffer<G::Buffer>>; 4],
    sequence: Option<G::Buffer>,
}

impl<G: GpuApi> RenderCore<G> {
    /// Link the shader program and set up the raster state.
    pub fn new<C>(
        gpu: G,
        compiler: &mut C,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self>
    where
        C: ShaderCompiler<Program = G::Program>,
    {
        let program = compiler
            .link(vertex_source, fragment_source)
            .map_err(Error::ShaderLink)?;
        Ok(Self::with_program(gpu, program))
    }

    /// Wrap an already linked program.
    pub fn with_program(mut gpu: G, program: G::Program) -> Self {
        gpu.use_program(&program);
        gpu.init_raster_state();
        Self {
            gpu,
            program,
            material: Material::default(),
            solids: [None, None, None, None],
            sequence: None,
        }
    }

    pub fn program(&self) -> &G::Program {
        &self.program
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Change the material color; see [`Material::set_color`].
    pub fn set_material(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.material.set_color(r, g, b, a);
    }

    pub fn set_material_rgb(&mut self, r: f32, g: f32, b: f32) {
        self.set_material(r, g, b, 1.0);
    }

    pub fn set_material_v(&mut self, rgba: &Vec4) {
        self.set_material(rgba.x, rgba.y, rgba.z, rgba.w);
    }

    pub fn set_shininess(&mut self, shininess: f32) {
        self.material.shininess = shininess.max(0.0);
    }

    /// Vertex count of a cached solid, or `None` if it was never drawn.
    pub fn cached_vertex_count(&self, kind: SolidKind) -> Option<usize> {
        self.solids[kind.index()].as_ref().map(|g| g.vertex_count)
    }

    /// Draw one of the unit solids with Phong shading.
    pub fn draw_solid(
        &mut self,
        kind: SolidKind,
        projection: &Mat44,
        view: &Mat44,
        model: &Mat44,
    ) -> Result<()> {
        let uniforms =
            ShadingUniforms::compute(projection, view, model, &self.material, &LIGHT, true)?;
        let blend = self.begin_blend();

        let vertex_count = self.bind_solid(kind);
        let normal_offset = vertex_count * ELEMENTS_PER_VERTEX * BYTES_PER_FLOAT;
        self.gpu.enable_attribute(&self.program, Attribute::Position, 0);
        self.gpu.enable_attribute(&self.program, Attribute::Normal, normal_offset);

        self.send_shading(&uniforms);
        log::trace!("drawing {kind:?} ({vertex_count} vertices)");
        self.gpu.draw_arrays(DrawMode::Triangles, vertex_count);

        self.gpu.disable_attribute(&self.program, Attribute::Position);
        self.gpu.disable_attribute(&self.program, Attribute::Normal);
        self.end_blend(blend);
        Ok(())
    }

    pub fn draw_cube(&mut self, projection: &Mat44, view: &Mat44, model: &Mat44) -> Result<()> {
        self.draw_solid(SolidKind::Cube, projection, view, model)
    }

    pub fn draw_sphere(&mut self, projection: &Mat44, view: &Mat44, model: &Mat44) -> Result<()> {
        self.draw_solid(SolidKind::Sphere, projection, view, model)
    }

    pub fn draw_cylinder(&mut self, projection: &Mat44, view: &Mat44, model: &Mat44) -> Result<()> {
        self.draw_solid(SolidKind::Cylinder, projection, view, model)
    }

    pub fn draw_prism(&mut self, projection: &Mat44, view: &Mat44, model: &Mat44) -> Result<()> {
        self.draw_solid(SolidKind::Prism, projection, view, model)
    }

    /// Draw an open polyline through `vertices`, unlit.
    pub fn draw_path(
        &mut self,
        projection: &Mat44,
        view: &Mat44,
        model: &Mat44,
        vertices: &[Vec3],
    ) -> Result<()> {
        let uniforms =
            ShadingUniforms::compute(projection, view, model, &self.material, &LIGHT, false)?;
        let blend = self.begin_blend();

        self.bind_sequence(vertices);
        self.send_shading(&uniforms);
        self.gpu.draw_arrays(DrawMode::LineStrip, vertices.len());

        self.gpu.disable_attribute(&self.program, Attribute::Position);
        self.end_blend(blend);
        Ok(())
    }

    /// Draw `vertices` as points of `point_size` pixels, unlit.
    pub fn draw_points(
        &mut self,
        projection: &Mat44,
        view: &Mat44,
        model: &Mat44,
        vertices: &[Vec3],
        point_size: Option<f32>,
    ) -> Result<()> {
        let size = match point_size {
            Some(size) if size > 0.0 => size,
            _ => DEFAULT_POINT_SIZE,
        };
        let uniforms =
            ShadingUniforms::compute(projection, view, model, &self.material, &LIGHT, false)?;
        let blend = self.begin_blend();

        self.bind_sequence(vertices);
        self.send_shading(&uniforms);
        self.gpu.set_uniform(&self.program, Uniform::PointSize, UniformValue::Float(size));
        self.gpu.set_uniform(&self.program, Uniform::DrawPoint, UniformValue::Int(1));
        self.gpu.draw_arrays(DrawMode::Points, vertices.len());

        self.gpu.disable_attribute(&self.program, Attribute::Position);
        self.end_blend(blend);
        Ok(())
    }

    /// Bind the cached buffer for `kind`, building it on first use.
    fn bind_solid(&mut self, kind: SolidKind) -> usize {
        let slot = &mut self.solids[kind.index()];
        if let Some(cached) = slot.as_ref() {
            self.gpu.bind_buffer(&cached.buffer);
            return cached.vertex_count;
        }

        let mesh = kind.build();
        let vertex_count = mesh.vertex_count();
        log::debug!("uploading {kind:?} mesh ({vertex_count} vertices)");

        let buffer = self.gpu.create_buffer();
        self.gpu.upload_buffer(&buffer, &mesh.to_vertex_data(), BufferUsage::Static);
        *slot = Some(GeometryBuffer { buffer, vertex_count });
        vertex_count
    }

    /// Re-upload the shared dynamic buffer with `vertices` and point the
    /// position attribute at it.
    fn bind_sequence(&mut self, vertices: &[Vec3]) {
        let data: Vec<f32> = vertices.iter().flat_map(|v| [v.x, v.y, v.z]).collect();

        let buffer = self.sequence.get_or_insert_with(|| self.gpu.create_buffer());
        self.gpu.upload_buffer(buffer, &data, BufferUsage::Dynamic);
        self.gpu.enable_attribute(&self.program, Attribute::Position, 0);
    }

    fn send_shading(&mut self, uniforms: &ShadingUniforms) {
        let program = &self.program;
        let gpu = &mut self.gpu;

        gpu.set_uniform(
            program,
            Uniform::ModelView,
            UniformValue::Mat4(Transform::to_column_major(&uniforms.model_view)),
        );
        gpu.set_uniform(
            program,
            Uniform::Projection,
            UniformValue::Mat4(Transform::to_column_major(&uniforms.projection)),
        );
        if let Some(normal_matrix) = &uniforms.inv_trans_model_view {
            gpu.set_uniform(
                program,
                Uniform::InvTransModelView,
                UniformValue::Mat3(Transform::to_column_major(normal_matrix)),
            );
        }

        let use_phong = uniforms.inv_trans_model_view.is_some();
        gpu.set_uniform(program, Uniform::UsePhong, UniformValue::Int(i32::from(use_phong)));
        gpu.set_uniform(program, Uniform::DrawPoint, UniformValue::Int(0));

        gpu.set_uniform(program, Uniform::LightPosition, vec4(&uniforms.light_position));
        gpu.set_uniform(program, Uniform::Shininess, UniformValue::Float(uniforms.shininess));
        gpu.set_uniform(program, Uniform::AmbientProduct, vec4(&uniforms.ambient_product));
        gpu.set_uniform(program, Uniform::DiffuseProduct, vec4(&uniforms.diffuse_product));
        gpu.set_uniform(program, Uniform::SpecularProduct, vec4(&uniforms.specular_product));
    }

    /// Enable blending for a translucent material; returns the state to restore.
    fn begin_blend(&mut self) -> Option<bool> {
        if !self.material.is_translucent() {
            return None;
        }
        let previous = self.gpu.blend_enabled();
        self.gpu.set_blend(true);
        Some(previous)
    }

    fn end_blend(&mut self, previous: Option<bool>) {
        if let Some(enabled) = previous {
            self.gpu.set_blend(enabled);
        }
    }
}

fn vec4(v: &Vec4) -> UniformValue {
    UniformValue::Vec4([v.x, v.y, v.z, v.w])
}
