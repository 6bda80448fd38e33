//! Camera pose, projection and viewport unprojection.

use crate::error::Result;
use crate::math::{self, Mat44, Vec3, Vec4};
use crate::transform::Transform;

/// Vertical field of view used by every camera projection (60 degrees).
pub const FIELD_OF_VIEW: f32 = std::f32::consts::PI / 3.0;

/// Eye-space distance used by [`Camera::unproject`] when the caller does not
/// ask for one beyond the near plane.
pub const DEFAULT_UNPROJECT_DISTANCE: f32 = 10.0;

const DEFAULT_NEAR: f32 = 1.0;
const DEFAULT_FAR: f32 = 100.0;
const DEFAULT_VIEWPORT: u32 = 1000;

/// Initial camera configuration.
///
/// Values are sanitized by [`Camera::new`]: the near plane is made positive,
/// the far plane is pushed past it and zero-sized viewports fall back to
/// 1000×1000.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub look: Vec3,
    pub up: Vec3,
    pub near: f32,
    pub far: f32,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 10.0),
            look: Vec3::zeros(),
            up: math::Y_AXIS,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            width: DEFAULT_VIEWPORT,
            height: DEFAULT_VIEWPORT,
        }
    }
}

/// A perspective camera with its own orthonormal `(u, v, n)` frame.
///
/// `n` points from the look-at target back to the eye, so the camera looks
/// down `-n`. The view and projection matrices are derived values: they are
/// rebuilt from the eye, basis and plane state every time one of those
/// changes.
#[derive(Debug, Clone)]
pub struct Camera {
    eye: Vec3,
    u: Vec3,
    v: Vec3,
    n: Vec3,
    near: f32,
    far: f32,
    width: u32,
    height: u32,
    view: Mat44,
    projection: Mat44,
}

impl Camera {
    /// Build a camera from `config`, sanitizing planes and viewport.
    ///
    /// Fails only when `eye == look` or `up` is parallel to the line of sight.
    pub fn new(config: CameraConfig) -> Result<Self> {
        let near = if config.near.abs() > 0.0 && config.near.is_finite() {
            config.near.abs()
        } else {
            DEFAULT_NEAR
        };
        let far = if config.far > near && config.far.is_finite() {
            config.far
        } else {
            DEFAULT_FAR.max(near * DEFAULT_FAR)
        };
        let width = if config.width > 0 { config.width } else { DEFAULT_VIEWPORT };
        let height = if config.height > 0 { config.height } else { DEFAULT_VIEWPORT };

        let mut camera = Self {
            eye: config.eye,
            u: math::X_AXIS,
            v: math::Y_AXIS,
            n: math::Z_AXIS,
            near,
            far,
            width,
            height,
            view: Mat44::identity(),
            projection: Mat44::identity(),
        };
        camera.set_view(&config.eye, &config.look, &config.up)?;
        camera.set_projection(width, height);
        Ok(camera)
    }

    /// Re-derive the camera frame from eye, target and up (Gram-Schmidt).
    ///
    /// On failure the camera keeps its previous pose.
    pub fn set_view(&mut self, eye: &Vec3, look: &Vec3, up: &Vec3) -> Result<()> {
        let n = math::normalize(&(eye - look))?;
        let u = math::normalize(&math::cross(up, &n))?;
        let v = math::normalize(&math::cross(&n, &u))?;

        self.eye = *eye;
        self.u = u;
        self.v = v;
        self.n = n;
        self.rebuild_view();
        Ok(())
    }

    /// Move the eye along the camera's own axes; the orientation is kept.
    pub fn slide(&mut self, du: f32, dv: f32, dn: f32) {
        self.eye += self.u * du + self.v * dv + self.n * dn;
        self.rebuild_view();
    }

    /// Set the viewport size and rebuild the perspective projection.
    pub fn set_projection(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("ignoring zero viewport dimension in {width}x{height}");
        }
        self.width = width.max(1);
        self.height = height.max(1);
        let aspect = self.width as f32 / self.height as f32;
        self.projection = Transform::perspective(FIELD_OF_VIEW, aspect, self.near, self.far);
    }

    /// Map a viewport pixel back to a world-space point.
    ///
    /// `(screen_x, screen_y)` has its origin at the top-left corner and is
    /// clamped to the viewport. The returned point lies `distance` units in
    /// front of the eye when `distance` exceeds the near plane, otherwise
    /// [`DEFAULT_UNPROJECT_DISTANCE`] units. `custom_view` replaces the
    /// camera's own view matrix for the inversion.
    pub fn unproject(
        &self,
        screen_x: f32,
        screen_y: f32,
        distance: Option<f32>,
        custom_view: Option<&Mat44>,
    ) -> Result<Vec3> {
        let width = self.width as f32;
        let height = self.height as f32;
        let x = screen_x.clamp(0.0, width);
        let y = screen_y.clamp(0.0, height);

        let z = -match distance {
            Some(d) if d > self.near => d,
            _ => DEFAULT_UNPROJECT_DISTANCE,
        };

        // Screen origin is top-left; NDC origin is the center with y up
        let ndc_x = x * 2.0 / width - 1.0;
        let ndc_y = 1.0 - y * 2.0 / height;

        let a = -(self.far + self.near) / (self.far - self.near);
        let b = -2.0 * self.far * self.near / (self.far - self.near);
        let depth = (a * z + b) / -z;

        let view = custom_view.unwrap_or(&self.view);
        let inverse = math::mat_inverse(&math::mat_mul(&self.projection, view))?;

        let world = inverse * Vec4::new(ndc_x, ndc_y, depth, 1.0);
        Ok(world.xyz() / world.w)
    }

    fn rebuild_view(&mut self) {
        self.view = Transform::view_from_basis(&self.eye, &self.u, &self.v, &self.n);
    }

    pub fn view(&self) -> &Mat44 {
        &self.view
    }

    pub fn projection(&self) -> &Mat44 {
        &self.projection
    }

    pub fn eye(&self) -> &Vec3 {
        &self.eye
    }

    /// The camera frame as `(u, v, n)`.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.u, self.v, self.n)
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Default for Camera {
    fn default() -> Self {
        let config = CameraConfig::default();
        let mut camera = Self {
            eye: config.eye,
            u: math::X_AXIS,
            v: math::Y_AXIS,
            n: math::Z_AXIS,
            near: config.near,
            far: config.far,
            width: config.width,
            height: config.height,
            view: Mat44::identity(),
            projection: Mat44::identity(),
        };
        // The default pose already has this frame; only the matrices are missing
        camera.rebuild_view();
        camera.set_projection(config.width, config.height);
        camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn assert_orthonormal(camera: &Camera) {
        let (u, v, n) = camera.basis();
        assert!(u.dot(&v).abs() < 1e-5);
        assert!(u.dot(&n).abs() < 1e-5);
        assert!(v.dot(&n).abs() < 1e-5);
        for axis in [u, v, n] {
            assert!((axis.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(CameraConfig::default()).unwrap();
        assert_eq!(camera.viewport(), (1000, 1000));
        assert_eq!(camera.near(), 1.0);
        assert_eq!(camera.far(), 100.0);
        assert!((camera.view() - Camera::default().view()).norm() < 1e-6);
        assert!((camera.projection() - Camera::default().projection()).norm() < 1e-6);
    }

    #[test]
    fn test_config_is_sanitized() {
        let camera = Camera::new(CameraConfig {
            near: -2.0,
            far: 1.0,
            width: 0,
            height: 0,
            ..CameraConfig::default()
        })
        .unwrap();
        assert_eq!(camera.near(), 2.0);
        assert!(camera.far() > camera.near());
        assert_eq!(camera.viewport(), (1000, 1000));
    }

    #[test]
    fn test_set_view_default_pose() {
        let mut camera = Camera::default();
        camera
            .set_view(&Vec3::new(0.0, 0.0, 10.0), &Vec3::zeros(), &math::Y_AXIS)
            .unwrap();
        let (u, v, n) = camera.basis();
        assert!((n - Vec3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
        assert!((u - Vec3::new(1.0, 0.0, 0.0)).norm() < 1e-6);
        assert!((v - Vec3::new(0.0, 1.0, 0.0)).norm() < 1e-6);

        let view = camera.view();
        assert!((view[(0, 3)]).abs() < 1e-6);
        assert!((view[(1, 3)]).abs() < 1e-6);
        assert!((view[(2, 3)] + 10.0).abs() < 1e-6);
        assert_eq!(view[(3, 3)], 1.0);
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let mut camera = Camera::default();
        let poses = [
            (Vec3::new(3.0, 4.0, 5.0), Vec3::new(-1.0, 0.5, 2.0), Vec3::new(0.0, 1.0, 0.0)),
            (Vec3::new(-7.0, 2.0, 1.0), Vec3::zeros(), Vec3::new(0.3, 1.0, 0.2)),
            (Vec3::new(0.0, 10.0, 0.1), Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0)),
        ];
        for (eye, look, up) in poses {
            camera.set_view(&eye, &look, &up).unwrap();
            assert_orthonormal(&camera);
        }
    }

    #[test]
    fn test_set_view_matches_look_at() {
        let mut camera = Camera::default();
        let (eye, look, up) = (Vec3::new(2.0, 3.0, 4.0), Vec3::new(0.0, 1.0, 0.0), math::Y_AXIS);
        camera.set_view(&eye, &look, &up).unwrap();
        let expected = Transform::look_at(&eye, &look, &up).unwrap();
        assert!((camera.view() - expected).norm() < 1e-5);
    }

    #[test]
    fn test_set_view_rejects_parallel_up() {
        let mut camera = Camera::default();
        let before = *camera.view();
        let result = camera.set_view(&Vec3::new(0.0, 5.0, 0.0), &Vec3::zeros(), &math::Y_AXIS);
        assert_eq!(result, Err(Error::DegenerateVector));
        assert_eq!(*camera.view(), before);
    }

    #[test]
    fn test_slide_moves_along_camera_axes() {
        let mut camera = Camera::default();
        camera
            .set_view(&Vec3::new(10.0, 0.0, 0.0), &Vec3::zeros(), &math::Y_AXIS)
            .unwrap();
        // n = +X, u = -Z; sliding on n backs away along world X
        camera.slide(0.0, 0.0, 2.0);
        assert!((camera.eye() - Vec3::new(12.0, 0.0, 0.0)).norm() < 1e-5);
        camera.slide(1.0, 0.0, 0.0);
        assert!((camera.eye() - Vec3::new(12.0, 0.0, -1.0)).norm() < 1e-5);
        assert_orthonormal(&camera);

        let origin = camera.view() * Vec4::new(12.0, 0.0, -1.0, 1.0);
        assert!(origin.xyz().norm() < 1e-5);
    }

    #[test]
    fn test_projection_uses_fixed_fov() {
        let mut camera = Camera::default();
        camera.set_projection(800, 400);
        let p = camera.projection();
        let f = 1.0 / (FIELD_OF_VIEW / 2.0).tan();
        assert!((p[(1, 1)] - f).abs() < 1e-5);
        assert!((p[(0, 0)] - f / 2.0).abs() < 1e-5);
        assert_eq!(p[(3, 2)], -1.0);
    }

    #[test]
    fn test_unproject_inverts_projection() {
        let mut camera = Camera::default();
        camera
            .set_view(&Vec3::new(4.0, 3.0, 12.0), &Vec3::new(0.0, 1.0, 0.0), &math::Y_AXIS)
            .unwrap();
        camera.set_projection(640, 480);

        let world = Vec3::new(-1.5, 2.0, -3.0);
        let eye_space = camera.view() * math::to_point4(&world);
        let clip = camera.projection() * eye_space;
        let ndc = clip.xyz() / clip.w;

        let (w, h) = camera.viewport();
        let sx = (ndc.x + 1.0) / 2.0 * w as f32;
        let sy = (1.0 - ndc.y) / 2.0 * h as f32;

        let recovered = camera.unproject(sx, sy, Some(-eye_space.z), None).unwrap();
        assert!((recovered - world).norm() < 1e-2, "recovered {recovered:?}");
    }

    #[test]
    fn test_unproject_viewport_center_uses_default_distance() {
        let camera = Camera::default();
        let p = camera.unproject(500.0, 500.0, None, None).unwrap();
        assert!((p - Vec3::zeros()).norm() < 1e-2, "got {p:?}");

        // A distance inside the near plane falls back to the default too
        let q = camera.unproject(500.0, 500.0, Some(0.5), None).unwrap();
        assert!((q - p).norm() < 1e-3);

        let r = camera.unproject(500.0, 500.0, Some(4.0), None).unwrap();
        assert!((r - Vec3::new(0.0, 0.0, 6.0)).norm() < 1e-2, "got {r:?}");
    }

    #[test]
    fn test_unproject_clamps_to_viewport() {
        let camera = Camera::default();
        let inside = camera.unproject(1000.0, 0.0, None, None).unwrap();
        let outside = camera.unproject(5000.0, -300.0, None, None).unwrap();
        assert!((inside - outside).norm() < 1e-4);
        // Top-right corner of the viewport is +x, +y in world space here
        assert!(inside.x > 0.0 && inside.y > 0.0);
    }

    #[test]
    fn test_unproject_with_custom_view() {
        let camera = Camera::default();
        let eye = Vec3::new(5.0, 0.0, 10.0);
        let shifted = Transform::look_at(&eye, &Vec3::new(5.0, 0.0, 0.0), &math::Y_AXIS).unwrap();
        let p = camera.unproject(500.0, 500.0, None, Some(&shifted)).unwrap();
        assert!((p - Vec3::new(5.0, 0.0, 0.0)).norm() < 1e-2, "got {p:?}");
    }

    #[test]
    fn test_unproject_singular_view_fails() {
        let camera = Camera::default();
        let singular = Mat44::zeros();
        assert_eq!(
            camera.unproject(10.0, 10.0, None, Some(&singular)),
            Err(Error::SingularMatrix)
        );
    }
}
