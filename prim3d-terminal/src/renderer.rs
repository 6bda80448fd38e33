//! Software GPU backend that rasterizes draw calls into terminal cells.
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use prim3d_core::{
    Attribute, BufferUsage, DrawMode, GpuApi, Mat33, Mat44, ShaderCompiler, Uniform, UniformValue,
    Vec3, Vec4,
};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells per point-size pixel unit.
const POINT_SIZE_PER_CELL: f32 = 10.0;

/// Handle to a buffer owned by [`AsciiGpu`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferId(usize);

/// The software pipeline has fixed-function Phong shading built in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwareProgram;

/// Accepts any shader pair; sources are ignored by the software pipeline.
#[derive(Debug, Default)]
pub struct SoftwareShaders;

impl ShaderCompiler for SoftwareShaders {
    type Program = SoftwareProgram;

    fn link(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<SoftwareProgram, String> {
        log::debug!(
            "software pipeline ignores shader sources ({} + {} bytes)",
            vertex_source.len(),
            fragment_source.len()
        );
        Ok(SoftwareProgram)
    }
}

/// Last values written through `set_uniform`.
#[derive(Debug, Clone)]
struct UniformState {
    model_view: Mat44,
    projection: Mat44,
    normal_matrix: Mat33,
    use_phong: bool,
    draw_point: bool,
    point_size: f32,
    light_position: Vec4,
    shininess: f32,
    ambient: Vec4,
    diffuse: Vec4,
    specular: Vec4,
}

impl Default for UniformState {
    fn default() -> Self {
        Self {
            model_view: Mat44::identity(),
            projection: Mat44::identity(),
            normal_matrix: Mat33::identity(),
            use_phong: false,
            draw_point: false,
            point_size: 1.0,
            light_position: Vec4::new(0.0, 0.0, 1.0, 0.0),
            shininess: 1.0,
            ambient: Vec4::zeros(),
            diffuse: Vec4::new(1.0, 1.0, 1.0, 1.0),
            specular: Vec4::zeros(),
        }
    }
}

/// A projected vertex: screen x, screen y and NDC depth.
type ScreenVertex = (f32, f32, f32);

/// ASCII rasterizer exposing the [`GpuApi`] the render core drives.
pub struct AsciiGpu {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    buffers: Vec<Vec<f32>>,
    bound: Option<usize>,
    position_offset: Option<usize>,
    normal_offset: Option<usize>,
    uniforms: UniformState,
    culling: bool,
    blend: bool,
}

impl AsciiGpu {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            buffers: Vec::new(),
            bound: None,
            position_offset: None,
            normal_offset: None,
            uniforms: UniformState::default(),
            culling: false,
            blend: false,
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Resize the target; clears the frame.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.depth_buffer = vec![f32::INFINITY; width * height];
        self.char_buffer = vec![' '; width * height];
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Character at a cell, for inspection.
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    /// Number of non-blank cells in the current frame.
    pub fn coverage(&self) -> usize {
        self.char_buffer.iter().filter(|c| **c != ' ').count()
    }

    fn attribute(&self, offset: Option<usize>, index: usize) -> Option<Vec3> {
        let data = self.buffers.get(self.bound?)?;
        let start = offset? + index * 3;
        let v = data.get(start..start + 3)?;
        Some(Vec3::new(v[0], v[1], v[2]))
    }

    /// Model-space position to screen cell coordinates, or `None` when the
    /// vertex is behind the eye.
    fn project(&self, position: &Vec3) -> Option<ScreenVertex> {
        let clip = self.uniforms.projection
            * self.uniforms.model_view
            * Vec4::new(position.x, position.y, position.z, 1.0);
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        let screen_x = (ndc.x + 1.0) * 0.5 * self.width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * self.height as f32;
        Some((screen_x, screen_y, ndc.z))
    }

    /// Phong intensity in `[0, 1]` at an eye-space point.
    fn shade(&self, eye_position: &Vec3, normal: &Vec3) -> f32 {
        let u = &self.uniforms;
        if !u.use_phong {
            return luminance(&u.diffuse);
        }

        let n = normal.try_normalize(1e-9).unwrap_or(*normal);
        let to_light = if u.light_position.w == 0.0 {
            u.light_position.xyz()
        } else {
            u.light_position.xyz() - eye_position
        };
        let l = to_light.try_normalize(1e-9).unwrap_or(to_light);
        let e = (-eye_position).try_normalize(1e-9).unwrap_or(Vec3::z());
        let h = (l + e).try_normalize(1e-9).unwrap_or(l);

        let kd = l.dot(&n).max(0.0);
        let ks = if kd > 0.0 { h.dot(&n).max(0.0).powf(u.shininess) } else { 0.0 };
        let color = u.ambient + u.diffuse * kd + u.specular * ks;
        luminance(&color).clamp(0.0, 1.0)
    }

    fn ramp(intensity: f32) -> char {
        let index = (intensity * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
        // Lit geometry never disappears into the background character
        LUMINOSITY_RAMP[index.clamp(1, LUMINOSITY_RAMP.len() - 1)]
    }

    fn draw_triangles(&mut self, count: usize) {
        for first in (0..count.saturating_sub(2)).step_by(3) {
            let mut points = [Vec3::zeros(); 3];
            let mut normals = [Vec3::zeros(); 3];
            for k in 0..3 {
                let (Some(p), n) = (
                    self.attribute(self.position_offset, first + k),
                    self.attribute(self.normal_offset, first + k),
                ) else {
                    return;
                };
                points[k] = p;
                normals[k] = n.unwrap_or(Vec3::zeros());
            }
            self.render_triangle(&points, &normals);
        }
    }

    fn render_triangle(&mut self, points: &[Vec3; 3], normals: &[Vec3; 3]) {
        // Project vertices to screen space
        let mut screen = [(0.0, 0.0, 0.0); 3];
        for (slot, p) in screen.iter_mut().zip(points) {
            match self.project(p) {
                Some(s) => *slot = s,
                None => return, // Triangle is clipped
            }
        }

        // Screen y grows downwards, so counter-clockwise faces have negative area here
        let area = (screen[1].0 - screen[0].0) * (screen[2].1 - screen[0].1)
            - (screen[2].0 - screen[0].0) * (screen[1].1 - screen[0].1);
        if self.culling && area >= 0.0 {
            return;
        }

        let centroid = (points[0] + points[1] + points[2]) / 3.0;
        let eye = (self.uniforms.model_view * centroid.push(1.0)).xyz();
        let normal = self.uniforms.normal_matrix * (normals[0] + normals[1] + normals[2]);
        let character = Self::ramp(self.shade(&eye, &normal));

        self.rasterize_triangle(&screen, character);
    }

    fn rasterize_triangle(&mut self, coords: &[ScreenVertex; 3], character: char) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box, clipped to screen bounds
        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i32).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i32).min(self.width as i32 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i32).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let weights = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py));
                if let Some((w0, w1, w2)) = weights {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                        self.plot(x, y, depth, character);
                    }
                }
            }
        }
    }

    fn draw_line_strip(&mut self, count: usize) {
        let character = Self::ramp(self.shade(&Vec3::zeros(), &Vec3::zeros()));
        let projected: Vec<Option<ScreenVertex>> = (0..count)
            .map(|i| self.attribute(self.position_offset, i).and_then(|p| self.project(&p)))
            .collect();
        for pair in projected.windows(2) {
            if let [Some(a), Some(b)] = pair {
                self.rasterize_line(*a, *b, character);
            }
        }
    }

    fn rasterize_line(&mut self, a: ScreenVertex, b: ScreenVertex, character: char) {
        let Some((a, b)) = self.clip_to_frame(a, b) else {
            return;
        };
        let steps = (b.0 - a.0).abs().max((b.1 - a.1).abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (a.0 + (b.0 - a.0) * t).floor() as i32;
            let y = (a.1 + (b.1 - a.1) * t).floor() as i32;
            let depth = a.2 + (b.2 - a.2) * t;
            self.plot(x, y, depth, character);
        }
    }

    /// Liang-Barsky clip of a screen-space segment against the frame.
    fn clip_to_frame(
        &self,
        a: ScreenVertex,
        b: ScreenVertex,
    ) -> Option<(ScreenVertex, ScreenVertex)> {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let (width, height) = (self.width as f32, self.height as f32);
        let (mut t0, mut t1) = (0.0f32, 1.0f32);

        for (p, q) in [(-dx, a.0), (dx, width - a.0), (-dy, a.1), (dy, height - a.1)] {
            if !q.is_finite() {
                return None;
            }
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 > t1 {
                return None;
            }
        }

        let at = |t: f32| (a.0 + dx * t, a.1 + dy * t, a.2 + (b.2 - a.2) * t);
        Some((at(t0), at(t1)))
    }

    fn draw_point_list(&mut self, count: usize) {
        let character = Self::ramp(self.shade(&Vec3::zeros(), &Vec3::zeros()).max(0.9));
        // A point never needs to reach past the frame
        let max_radius = self.width.max(self.height) as f32;
        let radius = if self.uniforms.draw_point {
            (self.uniforms.point_size / POINT_SIZE_PER_CELL / 2.0)
                .floor()
                .clamp(0.0, max_radius) as i32
        } else {
            0
        };
        let (last_x, last_y) = (self.width as i32 - 1, self.height as i32 - 1);

        for i in 0..count {
            let Some((sx, sy, depth)) =
                self.attribute(self.position_offset, i).and_then(|p| self.project(&p))
            else {
                continue;
            };
            let (cx, cy) = (sx.floor() as i32, sy.floor() as i32);
            let x0 = cx.saturating_sub(radius).max(0);
            let x1 = cx.saturating_add(radius).min(last_x);
            let y0 = cy.saturating_sub(radius).max(0);
            let y1 = cy.saturating_add(radius).min(last_y);
            for y in y0..=y1 {
                for x in x0..=x1 {
                    self.plot(x, y, depth, character);
                }
            }
        }
    }

    /// Depth-tested write of one cell. Blended draws do not occlude.
    fn plot(&mut self, x: i32, y: i32, depth: f32, character: char) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if depth <= self.depth_buffer[idx] {
            if !self.blend {
                self.depth_buffer[idx] = depth;
            }
            self.char_buffer[idx] = character;
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let c = self.char_buffer[idx];

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl GpuApi for AsciiGpu {
    type Buffer = BufferId;
    type Program = SoftwareProgram;

    fn init_raster_state(&mut self) {
        self.culling = true;
    }

    fn use_program(&mut self, _program: &SoftwareProgram) {}

    fn create_buffer(&mut self) -> BufferId {
        self.buffers.push(Vec::new());
        BufferId(self.buffers.len() - 1)
    }

    fn upload_buffer(&mut self, buffer: &BufferId, data: &[f32], usage: BufferUsage) {
        log::trace!("buffer {} <- {} floats ({usage:?})", buffer.0, data.len());
        self.bind_buffer(buffer);
        if let Some(storage) = self.buffers.get_mut(buffer.0) {
            storage.clear();
            storage.extend_from_slice(data);
        }
    }

    fn bind_buffer(&mut self, buffer: &BufferId) {
        self.bound = Some(buffer.0);
    }

    fn enable_attribute(
        &mut self,
        _program: &SoftwareProgram,
        attribute: Attribute,
        offset_bytes: usize,
    ) {
        let offset = Some(offset_bytes / std::mem::size_of::<f32>());
        match attribute {
            Attribute::Position => self.position_offset = offset,
            Attribute::Normal => self.normal_offset = offset,
        }
    }

    fn disable_attribute(&mut self, _program: &SoftwareProgram, attribute: Attribute) {
        match attribute {
            Attribute::Position => self.position_offset = None,
            Attribute::Normal => self.normal_offset = None,
        }
    }

    fn set_uniform(&mut self, _program: &SoftwareProgram, uniform: Uniform, value: UniformValue) {
        let u = &mut self.uniforms;
        match (uniform, value) {
            (Uniform::ModelView, UniformValue::Mat4(m)) => {
                u.model_view = Mat44::from_column_slice(&m)
            }
            (Uniform::Projection, UniformValue::Mat4(m)) => {
                u.projection = Mat44::from_column_slice(&m)
            }
            (Uniform::InvTransModelView, UniformValue::Mat3(m)) => {
                u.normal_matrix = Mat33::from_column_slice(&m)
            }
            (Uniform::UsePhong, UniformValue::Int(flag)) => u.use_phong = flag != 0,
            (Uniform::DrawPoint, UniformValue::Int(flag)) => u.draw_point = flag != 0,
            (Uniform::PointSize, UniformValue::Float(size)) => u.point_size = size,
            (Uniform::Shininess, UniformValue::Float(s)) => u.shininess = s,
            (Uniform::LightPosition, UniformValue::Vec4(v)) => u.light_position = Vec4::from(v),
            (Uniform::AmbientProduct, UniformValue::Vec4(v)) => u.ambient = Vec4::from(v),
            (Uniform::DiffuseProduct, UniformValue::Vec4(v)) => u.diffuse = Vec4::from(v),
            (Uniform::SpecularProduct, UniformValue::Vec4(v)) => u.specular = Vec4::from(v),
            (uniform, value) => log::warn!("uniform {} cannot take {value:?}", uniform.name()),
        }
    }

    fn blend_enabled(&self) -> bool {
        self.blend
    }

    fn set_blend(&mut self, enabled: bool) {
        self.blend = enabled;
    }

    fn draw_arrays(&mut self, mode: DrawMode, count: usize) {
        match mode {
            DrawMode::Triangles => self.draw_triangles(count),
            DrawMode::LineStrip => self.draw_line_strip(count),
            DrawMode::Points => self.draw_point_list(count),
        }
    }
}

fn luminance(color: &Vec4) -> f32 {
    0.299 * color.x + 0.587 * color.y + 0.114 * color.z
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prim3d_core::{Camera, CameraConfig, RenderCore, Transform};

    fn setup(width: usize, height: usize) -> (RenderCore<AsciiGpu>, Camera) {
        let gpu = AsciiGpu::new(width, height);
        let core = RenderCore::new(gpu, &mut SoftwareShaders, "", "").unwrap();
        let camera = Camera::new(CameraConfig {
            width: width as u32,
            height: height as u32,
            ..CameraConfig::default()
        })
        .unwrap();
        (core, camera)
    }

    #[test]
    fn test_cube_covers_center() {
        let (mut core, camera) = setup(40, 40);
        let model = Transform::scale_uniform(4.0);
        core.draw_cube(camera.projection(), camera.view(), &model).unwrap();

        let gpu = core.gpu();
        assert!(gpu.coverage() > 0);
        assert_ne!(gpu.cell(20, 20), Some(' '));
        assert_eq!(gpu.cell(0, 0), Some(' '));
    }

    #[test]
    fn test_every_solid_draws_something() {
        for kind in prim3d_core::SolidKind::ALL {
            let (mut core, camera) = setup(40, 40);
            let model = Transform::scale_uniform(4.0);
            core.draw_solid(kind, camera.projection(), camera.view(), &model).unwrap();
            assert!(core.gpu().coverage() > 0, "{kind:?} left the frame empty");
        }
    }

    #[test]
    fn test_back_faces_are_culled() {
        let mut gpu = AsciiGpu::new(20, 20);
        gpu.init_raster_state();
        let buffer = gpu.create_buffer();
        // One triangle facing away from a camera looking down -z
        let data = [
            -0.5, -0.5, 0.0, 0.0, 0.5, 0.0, 0.5, -0.5, 0.0, //
            0.0, 0.0, -1.0, 0.0, 0.0, -1.0, 0.0, 0.0, -1.0,
        ];
        gpu.upload_buffer(&buffer, &data, BufferUsage::Static);
        gpu.enable_attribute(&SoftwareProgram, Attribute::Position, 0);
        gpu.enable_attribute(&SoftwareProgram, Attribute::Normal, 9 * 4);
        gpu.draw_arrays(DrawMode::Triangles, 3);
        assert_eq!(gpu.coverage(), 0);

        // The same triangle wound the other way is visible
        let flipped = [
            -0.5, -0.5, 0.0, 0.5, -0.5, 0.0, 0.0, 0.5, 0.0, //
            0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0,
        ];
        gpu.upload_buffer(&buffer, &flipped, BufferUsage::Static);
        gpu.draw_arrays(DrawMode::Triangles, 3);
        assert!(gpu.coverage() > 0);
    }

    #[test]
    fn test_depth_test_keeps_nearest() {
        let mut gpu = AsciiGpu::new(4, 4);
        gpu.plot(1, 1, 0.5, '#');
        gpu.plot(1, 1, 0.9, '.');
        assert_eq!(gpu.cell(1, 1), Some('#'));
        gpu.plot(1, 1, 0.1, '=');
        assert_eq!(gpu.cell(1, 1), Some('='));
    }

    #[test]
    fn test_path_draws_a_line() {
        let (mut core, camera) = setup(30, 30);
        let path = [Vec3::new(-3.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0)];
        core.draw_path(camera.projection(), camera.view(), &Mat44::identity(), &path).unwrap();
        let gpu = core.gpu();
        let row: Vec<char> = (0..30).filter_map(|x| gpu.cell(x, 15)).collect();
        assert!(row.iter().filter(|c| **c != ' ').count() >= 5);
    }

    #[test]
    fn test_points_scale_with_size() {
        let (mut core, camera) = setup(30, 30);
        let points = [Vec3::zeros()];
        core.draw_points(camera.projection(), camera.view(), &Mat44::identity(), &points, Some(1.0))
            .unwrap();
        assert_eq!(core.gpu().coverage(), 1);

        core.gpu_mut().clear();
        core.draw_points(
            camera.projection(),
            camera.view(),
            &Mat44::identity(),
            &points,
            Some(30.0),
        )
        .unwrap();
        assert_eq!(core.gpu().coverage(), 9);
    }

    #[test]
    fn test_oversized_points_fill_the_frame() {
        let (mut core, camera) = setup(30, 30);
        let points = [Vec3::zeros()];
        core.draw_points(
            camera.projection(),
            camera.view(),
            &Mat44::identity(),
            &points,
            Some(f32::MAX),
        )
        .unwrap();
        assert_eq!(core.gpu().coverage(), 30 * 30);
    }

    #[test]
    fn test_far_off_screen_line_is_clipped() {
        let mut gpu = AsciiGpu::new(20, 10);
        gpu.rasterize_line((-1e6, 5.5, 0.0), (1e6, 5.5, 0.0), '#');
        assert_eq!(gpu.coverage(), 20);
        assert!((0..20).all(|x| gpu.cell(x, 5) == Some('#')));

        gpu.clear();
        gpu.rasterize_line((-1e6, -3.0, 0.0), (1e6, -3.0, 0.0), '#');
        assert_eq!(gpu.coverage(), 0);
    }

    #[test]
    fn test_uniforms_round_trip_column_major() {
        let mut gpu = AsciiGpu::new(1, 1);
        let m = Transform::translate(1.0, 2.0, 3.0);
        let value = UniformValue::Mat4(Transform::to_column_major(&m));
        gpu.set_uniform(&SoftwareProgram, Uniform::ModelView, value);
        assert_eq!(gpu.uniforms.model_view, m);
    }
}
