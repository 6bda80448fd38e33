//! prim3d core library - camera, transforms, primitive solids and draw assembly
//!
//! This library holds the backend-independent part of the renderer: the
//! transformation math, the camera model, procedural tessellation of the
//! supported solids and the render core that turns them into draw calls on
//! any [`GpuApi`] implementation.

pub mod camera;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod math;
pub mod render;
pub mod shading;
pub mod transform;

// Re-export commonly used types
pub use camera::{Camera, CameraConfig};
pub use error::{Error, Result};
pub use geometry::{Mesh, SolidKind};
pub use gpu::{Attribute, BufferUsage, DrawMode, GpuApi, ShaderCompiler, Uniform, UniformValue};
pub use math::{Mat33, Mat44, Vec3, Vec4};
pub use render::RenderCore;
pub use shading::{Light, Material, ShadingUniforms, LIGHT};
pub use transform::Transform;
