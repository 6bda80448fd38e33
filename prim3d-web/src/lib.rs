/// prim3d Web - WebGL2 renderer for browsers
///
/// Wraps the core camera and render core in a `wasm_bindgen` facade. Matrices
/// cross the JS boundary as column-major `Float32Array`s of 16 values and
/// vertex lists as flat `x, y, z` runs.
use prim3d_core::{Camera, CameraConfig, Mat44, RenderCore, SolidKind, Vec3};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, WebGl2RenderingContext};

pub mod backend;
pub mod error;
pub mod shaders;

pub use backend::{GlBuffer, GlShaderCompiler, WebGlBackend};
pub use error::WebError;
pub use shaders::ShaderSource;

/// Column-major 4x4 matrix from a JS float array.
pub fn model_from_slice(values: &[f32]) -> error::Result<Mat44> {
    if values.len() != 16 {
        return Err(WebError::MatrixLength {
            expected: 16,
            actual: values.len(),
        });
    }
    Ok(Mat44::from_column_slice(values))
}

/// Points from a flat `x, y, z` float array.
pub fn points_from_slice(values: &[f32]) -> error::Result<Vec<Vec3>> {
    if values.len() % 3 != 0 {
        return Err(WebError::VertexLength(values.len()));
    }
    Ok(values.chunks_exact(3).map(|p| Vec3::new(p[0], p[1], p[2])).collect())
}

fn vector_from_slice(values: &[f32]) -> error::Result<Vec3> {
    match points_from_slice(values)?.as_slice() {
        [v] => Ok(*v),
        _ => Err(WebError::VertexLength(values.len())),
    }
}

/// Route panics and `log` records to the browser console.
#[wasm_bindgen(start)]
pub fn start() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        let message = format!("prim3d logger not installed: {err}");
        web_sys::console::warn_1(&JsValue::from_str(&message));
    }
}

#[wasm_bindgen]
pub struct WebRenderer {
    canvas: HtmlCanvasElement,
    camera: Camera,
    core: RenderCore<WebGlBackend>,
}

#[wasm_bindgen]
impl WebRenderer {
    /// Attach to the canvas with id `canvas_id` using the built-in shaders.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<WebRenderer, JsValue> {
        Ok(Self::create(canvas_id, &ShaderSource::default())?)
    }

    /// Attach to a canvas with a caller-supplied shader pair.
    #[wasm_bindgen(js_name = withShaders)]
    pub fn with_shaders(
        canvas_id: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<WebRenderer, JsValue> {
        Ok(Self::create(canvas_id, &ShaderSource::new(vertex_source, fragment_source))?)
    }

    /// Resize the canvas drawing buffer and the camera viewport together.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.camera.set_projection(width, height);
        let (width, height) = self.camera.viewport();
        self.gl().viewport(0, 0, width as i32, height as i32);
    }

    /// Clear color and depth.
    pub fn clear(&mut self, r: f32, g: f32, b: f32) {
        let gl = self.gl();
        gl.clear_color(r, g, b, 1.0);
        gl.clear(
            WebGl2RenderingContext::COLOR_BUFFER_BIT | WebGl2RenderingContext::DEPTH_BUFFER_BIT,
        );
    }

    /// Move the camera along its own axes.
    pub fn slide(&mut self, du: f32, dv: f32, dn: f32) {
        self.camera.slide(du, dv, dn);
    }

    #[wasm_bindgen(js_name = lookAt)]
    pub fn look_at(&mut self, eye: &[f32], look: &[f32], up: &[f32]) -> Result<(), JsValue> {
        let eye = vector_from_slice(eye)?;
        let look = vector_from_slice(look)?;
        let up = vector_from_slice(up)?;
        self.camera.set_view(&eye, &look, &up).map_err(WebError::from)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = setColor)]
    pub fn set_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.core.set_material(r, g, b, a);
    }

    #[wasm_bindgen(js_name = setShininess)]
    pub fn set_shininess(&mut self, shininess: f32) {
        self.core.set_shininess(shininess);
    }

    #[wasm_bindgen(js_name = drawCube)]
    pub fn draw_cube(&mut self, model: &[f32]) -> Result<(), JsValue> {
        Ok(self.draw_solid(SolidKind::Cube, model)?)
    }

    #[wasm_bindgen(js_name = drawSphere)]
    pub fn draw_sphere(&mut self, model: &[f32]) -> Result<(), JsValue> {
        Ok(self.draw_solid(SolidKind::Sphere, model)?)
    }

    #[wasm_bindgen(js_name = drawCylinder)]
    pub fn draw_cylinder(&mut self, model: &[f32]) -> Result<(), JsValue> {
        Ok(self.draw_solid(SolidKind::Cylinder, model)?)
    }

    #[wasm_bindgen(js_name = drawPrism)]
    pub fn draw_prism(&mut self, model: &[f32]) -> Result<(), JsValue> {
        Ok(self.draw_solid(SolidKind::Prism, model)?)
    }

    #[wasm_bindgen(js_name = drawPath)]
    pub fn draw_path(&mut self, model: &[f32], vertices: &[f32]) -> Result<(), JsValue> {
        let model = model_from_slice(model)?;
        let vertices = points_from_slice(vertices)?;
        self.core
            .draw_path(self.camera.projection(), self.camera.view(), &model, &vertices)
            .map_err(WebError::from)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = drawPoints)]
    pub fn draw_points(
        &mut self,
        model: &[f32],
        vertices: &[f32],
        size: Option<f32>,
    ) -> Result<(), JsValue> {
        let model = model_from_slice(model)?;
        let vertices = points_from_slice(vertices)?;
        self.core
            .draw_points(self.camera.projection(), self.camera.view(), &model, &vertices, size)
            .map_err(WebError::from)?;
        Ok(())
    }

    /// World-space point under a canvas pixel, `distance` units from the eye.
    #[wasm_bindgen(js_name = viewportToWorld)]
    pub fn viewport_to_world(
        &self,
        x: f32,
        y: f32,
        distance: Option<f32>,
    ) -> Result<Vec<f32>, JsValue> {
        let point = self.camera.unproject(x, y, distance, None).map_err(WebError::from)?;
        Ok(vec![point.x, point.y, point.z])
    }
}

impl WebRenderer {
    fn create(canvas_id: &str, source: &ShaderSource) -> error::Result<Self> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or(WebError::NoDocument)?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .and_then(|element| element.dyn_into::<HtmlCanvasElement>().ok())
            .ok_or_else(|| WebError::CanvasNotFound(canvas_id.to_string()))?;
        let gl = canvas
            .get_context("webgl2")
            .ok()
            .flatten()
            .and_then(|context| context.dyn_into::<WebGl2RenderingContext>().ok())
            .ok_or(WebError::NoWebGl2)?;

        let mut compiler = GlShaderCompiler::new(gl.clone());
        let core = RenderCore::new(
            WebGlBackend::new(gl),
            &mut compiler,
            &source.vertex,
            &source.fragment,
        )?;
        let camera = Camera::new(CameraConfig {
            width: canvas.width(),
            height: canvas.height(),
            ..CameraConfig::default()
        })?;

        let mut renderer = Self { canvas, camera, core };
        let (width, height) = renderer.camera.viewport();
        renderer.resize(width, height);
        log::info!("WebGL2 renderer attached to #{canvas_id} ({width}x{height})");
        Ok(renderer)
    }

    fn gl(&self) -> &WebGl2RenderingContext {
        self.core.gpu().context()
    }

    fn draw_solid(&mut self, kind: SolidKind, model: &[f32]) -> error::Result<()> {
        let model = model_from_slice(model)?;
        self.core
            .draw_solid(kind, self.camera.projection(), self.camera.view(), &model)?;
        Ok(())
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn core_mut(&mut self) -> &mut RenderCore<WebGlBackend> {
        &mut self.core
    }
}
