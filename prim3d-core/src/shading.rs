//! Material, light and the per-draw Phong uniform set.

use crate::error::{Error, Result};
use crate::math::{self, Mat33, Mat44, Vec4};

/// Surface reflectance used by the Phong model.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vec4::new(0.8, 0.8, 0.8, 1.0),
            diffuse: Vec4::new(0.8, 0.8, 0.8, 1.0),
            specular: Vec4::new(0.8, 0.8, 0.8, 1.0),
            shininess: 64.0,
        }
    }
}

impl Material {
    /// Set the surface color. Channels are clamped to `[0, 1]`; the specular
    /// hue is left alone and only its alpha follows `a`.
    pub fn set_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        let color = Vec4::new(clamp_unit(r), clamp_unit(g), clamp_unit(b), clamp_unit(a));
        self.ambient = color;
        self.diffuse = color;
        self.specular.w = color.w;
    }

    pub fn alpha(&self) -> f32 {
        self.ambient.w
    }

    pub fn is_translucent(&self) -> bool {
        self.alpha() < 1.0
    }
}

fn clamp_unit(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// A point light in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub position: Vec4,
}

/// The scene's single light source.
pub const LIGHT: Light = Light {
    ambient: Vec4::new(0.4, 0.4, 0.4, 1.0),
    diffuse: Vec4::new(0.9, 0.9, 0.9, 1.0),
    specular: Vec4::new(0.8, 0.8, 0.8, 1.0),
    position: Vec4::new(-7.0, 10.0, 20.0, 1.0),
};

/// Everything the shader needs for one draw, before flattening.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadingUniforms {
    pub model_view: Mat44,
    pub projection: Mat44,
    /// Normal matrix; only present when Phong shading is on.
    pub inv_trans_model_view: Option<Mat33>,
    /// Light position in eye space.
    pub light_position: Vec4,
    pub ambient_product: Vec4,
    pub diffuse_product: Vec4,
    pub specular_product: Vec4,
    pub shininess: f32,
}

impl ShadingUniforms {
    /// Derive the uniform set for a draw.
    ///
    /// With `use_phong` the normal matrix is computed. A model-view that
    /// flattens one axis (a ground plane made with a zero scale) falls back to
    /// its cofactor matrix; one that collapses two or more axes fails with
    /// `SingularMatrix`.
    pub fn compute(
        projection: &Mat44,
        view: &Mat44,
        model: &Mat44,
        material: &Material,
        light: &Light,
        use_phong: bool,
    ) -> Result<Self> {
        let model_view = math::mat_mul(view, model);
        let inv_trans_model_view = if use_phong {
            Some(normal_matrix(&model_view)?)
        } else {
            None
        };

        Ok(Self {
            model_view,
            projection: *projection,
            inv_trans_model_view,
            light_position: view * light.position,
            ambient_product: material.ambient.component_mul(&light.ambient),
            diffuse_product: material.diffuse.component_mul(&light.diffuse),
            specular_product: material.specular.component_mul(&light.specular),
            shininess: material.shininess,
        })
    }
}

fn normal_matrix(model_view: &Mat44) -> Result<Mat33> {
    if let Ok(inverse_transpose) = math::inverse_transpose_3x3(model_view) {
        return Ok(inverse_transpose);
    }

    // Cofactor entries scale with the square of the matrix entries
    let cofactor = math::cofactor_3x3(model_view);
    let scale = math::upper_left_3x3(model_view).amax();
    let largest = cofactor.amax();
    if !largest.is_finite() || largest <= f32::EPSILON * scale * scale {
        return Err(Error::SingularMatrix);
    }
    log::warn!("model-view flattens an axis; shading with its cofactor matrix");
    Ok(cofactor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::transform::Transform;

    fn uniforms(view: &Mat44, model: &Mat44, lit: bool) -> Result<ShadingUniforms> {
        let id = Mat44::identity();
        ShadingUniforms::compute(&id, view, model, &Material::default(), &LIGHT, lit)
    }

    #[test]
    fn test_set_color_clamps() {
        let mut material = Material::default();
        material.set_color(1.5, -0.2, 0.5, 2.0);
        assert_eq!(material.ambient, Vec4::new(1.0, 0.0, 0.5, 1.0));
        assert_eq!(material.diffuse, material.ambient);
        assert!(!material.is_translucent());
    }

    #[test]
    fn test_set_color_only_touches_specular_alpha() {
        let mut material = Material::default();
        material.set_color(0.1, 0.2, 0.3, 0.5);
        assert_eq!(material.specular, Vec4::new(0.8, 0.8, 0.8, 0.5));
        assert!(material.is_translucent());
    }

    #[test]
    fn test_products_are_componentwise() {
        let material = Material::default();
        let id = Mat44::identity();
        let u = ShadingUniforms::compute(&id, &id, &id, &material, &LIGHT, true).unwrap();
        assert!((u.ambient_product - Vec4::new(0.32, 0.32, 0.32, 1.0)).norm() < 1e-6);
        assert!((u.diffuse_product - Vec4::new(0.72, 0.72, 0.72, 1.0)).norm() < 1e-6);
        assert!((u.specular_product - Vec4::new(0.64, 0.64, 0.64, 1.0)).norm() < 1e-6);
        assert_eq!(u.shininess, 64.0);
    }

    #[test]
    fn test_light_moves_with_view_not_model() {
        let view = Transform::translate(0.0, 0.0, -10.0);
        let model = Transform::translate(5.0, 0.0, 0.0);
        let u = uniforms(&view, &model, true).unwrap();
        assert_eq!(u.light_position, Vec4::new(-7.0, 10.0, 10.0, 1.0));
        assert_eq!(u.model_view, view * model);
    }

    #[test]
    fn test_normal_matrix_under_nonuniform_scale() {
        let model = Transform::scale(2.0, 1.0, 1.0);
        let id = Mat44::identity();
        let u = uniforms(&id, &model, true).unwrap();
        let n = u.inv_trans_model_view.unwrap();
        assert!((n[(0, 0)] - 0.5).abs() < 1e-6);
        assert!((n[(1, 1)] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_flat_draws_skip_normal_matrix() {
        let line = Transform::scale(0.0, 0.0, 1.0);
        let id = Mat44::identity();
        let u = uniforms(&id, &line, false).unwrap();
        assert!(u.inv_trans_model_view.is_none());

        let err = uniforms(&id, &line, true);
        assert_eq!(err, Err(Error::SingularMatrix));
    }

    #[test]
    fn test_flattened_model_keeps_its_face_normal() {
        let ground = Transform::scale(1.0, 0.0, 1.0);
        let id = Mat44::identity();
        let u = uniforms(&id, &ground, true).unwrap();
        let n = u.inv_trans_model_view.unwrap();
        assert!((n * Vec3::new(0.0, 1.0, 0.0) - Vec3::new(0.0, 1.0, 0.0)).norm() < 1e-6);
        assert!((n * Vec3::new(1.0, 0.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_tiny_scale_has_a_normal_matrix() {
        let tiny = Transform::scale_uniform(1e-4);
        let id = Mat44::identity();
        let u = uniforms(&id, &tiny, true).unwrap();
        let n = u.inv_trans_model_view.unwrap();
        assert!((n[(0, 0)] - 1e4).abs() < 1.0);
    }
}
