//! Affine and projective transformation matrices.
//!
//! All builders return row-major `Mat44` values that act on column vectors
//! (`M · p`). Use [`Transform::to_column_major`] before uploading one as a
//! shader uniform.

use nalgebra::SMatrix;

use crate::error::Result;
use crate::math::{self, Mat33, Mat44, Vec3};

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Translation by individual displacements
    pub fn translate(x: f32, y: f32, z: f32) -> Mat44 {
        Mat44::new(
            1.0, 0.0, 0.0, x, //
            0.0, 1.0, 0.0, y, //
            0.0, 0.0, 1.0, z, //
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn translate_v(d: &Vec3) -> Mat44 {
        Self::translate(d.x, d.y, d.z)
    }

    /// Scaling with individual factors
    pub fn scale(x: f32, y: f32, z: f32) -> Mat44 {
        Mat44::new(
            x, 0.0, 0.0, 0.0, //
            0.0, y, 0.0, 0.0, //
            0.0, 0.0, z, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn scale_uniform(s: f32) -> Mat44 {
        Self::scale(s, s, s)
    }

    pub fn scale_v(s: &Vec3) -> Mat44 {
        Self::scale(s.x, s.y, s.z)
    }

    /// Rotation of `theta` radians around `axis` (Rodrigues' formula).
    ///
    /// The axis does not need to be unit length; a zero axis is rejected.
    pub fn rotate(theta: f32, axis: &Vec3) -> Result<Mat44> {
        let a = math::normalize(axis)?;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let (x, y, z) = (a.x, a.y, a.z);

        // Cross product matrix
        let c = Mat33::new(
            0.0, -z, y, //
            z, 0.0, -x, //
            -y, x, 0.0,
        );
        // Tensor product matrix
        let t = Mat33::new(
            x * x, x * y, x * z, //
            x * y, y * y, y * z, //
            x * z, y * z, z * z,
        );

        let r = Mat33::identity() * cos_theta + c * sin_theta + t * (1.0 - cos_theta);

        let mut m = Mat44::identity();
        for row in 0..3 {
            for col in 0..3 {
                m[(row, col)] = r[(row, col)];
            }
        }
        Ok(m)
    }

    /// View matrix looking from `eye` towards `target`.
    ///
    /// Rows are the camera axes `u`, `v`, `n`; the last column holds each
    /// axis' negated projection of the eye, i.e. `R · T(-eye)`.
    pub fn look_at(eye: &Vec3, target: &Vec3, up: &Vec3) -> Result<Mat44> {
        let n = math::normalize(&(eye - target))?;
        let u = math::normalize(&math::cross(up, &n))?;
        let v = math::cross(&n, &u);
        Ok(Self::view_from_basis(eye, &u, &v, &n))
    }

    /// Assemble a view matrix from an orthonormal camera basis.
    pub(crate) fn view_from_basis(eye: &Vec3, u: &Vec3, v: &Vec3, n: &Vec3) -> Mat44 {
        Mat44::new(
            u.x, u.y, u.z, -math::dot(u, eye), //
            v.x, v.y, v.z, -math::dot(v, eye), //
            n.x, n.y, n.z, -math::dot(n, eye), //
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Asymmetric perspective frustum.
    ///
    /// Degenerate planes (zero width/height/depth, or a negative near/far)
    /// produce the identity matrix.
    pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat44 {
        if Self::is_degenerate_volume(left, right, bottom, top, near, far) {
            let planes = (left, right, bottom, top, near, far);
            log::warn!("degenerate frustum {planes:?}; using identity");
            return Mat44::identity();
        }

        Mat44::new(
            2.0 * near / (right - left),
            0.0,
            (right + left) / (right - left),
            0.0,
            //
            0.0,
            2.0 * near / (top - bottom),
            (top + bottom) / (top - bottom),
            0.0,
            //
            0.0,
            0.0,
            (near + far) / (near - far),
            2.0 * near * far / (near - far),
            //
            0.0,
            0.0,
            -1.0,
            0.0,
        )
    }

    /// Symmetric perspective projection from a vertical field of view.
    pub fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Mat44 {
        let top = (fovy / 2.0).tan() * near;
        Self::frustum(-top * aspect, top * aspect, -top, top, near, far)
    }

    /// Orthographic projection; same degenerate-input policy as [`Self::frustum`].
    pub fn orthographic(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Mat44 {
        if Self::is_degenerate_volume(left, right, bottom, top, near, far) {
            let planes = (left, right, bottom, top, near, far);
            log::warn!("degenerate orthographic volume {planes:?}; using identity");
            return Mat44::identity();
        }

        Mat44::new(
            2.0 / (right - left),
            0.0,
            0.0,
            -(left + right) / (right - left),
            //
            0.0,
            2.0 / (top - bottom),
            0.0,
            -(bottom + top) / (top - bottom),
            //
            0.0,
            0.0,
            -2.0 / (far - near),
            -(far + near) / (far - near),
            //
            0.0,
            0.0,
            0.0,
            1.0,
        )
    }

    // TODO: decide whether degenerate volumes should become an `Error` variant
    // once callers can handle a fallible projection.
    fn is_degenerate_volume(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> bool {
        right == left || top == bottom || near == far || near < 0.0 || far < 0.0
    }

    /// Flatten a matrix into the column-major layout expected by GPU uniforms.
    pub fn to_column_major<const R: usize, const C: usize>(
        source: &SMatrix<f32, R, C>,
    ) -> Vec<f32> {
        let mut destination = vec![0.0; R * C];
        for c in 0..C {
            for r in 0..R {
                destination[c * R + r] = source[(r, c)];
            }
        }
        destination
    }

    pub fn degrees_to_radians(degrees: f32) -> f32 {
        degrees * (2.0 * std::f32::consts::PI) / 360.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec4, Z_AXIS};
    use std::f32::consts::PI;

    #[test]
    fn test_translation_moves_points() {
        let m = Transform::translate(1.0, 2.0, 3.0);
        let p = m * Vec4::new(1.0, 1.0, 1.0, 1.0);
        assert!((p - Vec4::new(2.0, 3.0, 4.0, 1.0)).norm() < 1e-6);

        // Directions are unaffected
        let d = m * Vec4::new(1.0, 0.0, 0.0, 0.0);
        assert!((d - Vec4::new(1.0, 0.0, 0.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_scale_variants_agree() {
        let a = Transform::scale(2.0, 2.0, 2.0);
        let b = Transform::scale_uniform(2.0);
        let c = Transform::scale_v(&Vec3::new(2.0, 2.0, 2.0));
        assert!((a - b).norm() < 1e-6);
        assert!((a - c).norm() < 1e-6);
        assert_eq!(a[(3, 3)], 1.0);
    }

    #[test]
    fn test_rotate_quarter_turn_about_z() {
        let r = Transform::rotate(PI / 2.0, &Z_AXIS).unwrap();
        let p = r * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p - Vec4::new(0.0, 1.0, 0.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_rotate_normalizes_axis() {
        let a = Transform::rotate(0.7, &Vec3::new(0.0, 0.0, 5.0)).unwrap();
        let b = Transform::rotate(0.7, &Z_AXIS).unwrap();
        assert!((a - b).norm() < 1e-6);
    }

    #[test]
    fn test_rotate_zero_axis_fails() {
        assert!(Transform::rotate(1.0, &Vec3::zeros()).is_err());
    }

    #[test]
    fn test_look_at_down_negative_z() {
        let view = Transform::look_at(
            &Vec3::new(0.0, 0.0, 10.0),
            &Vec3::zeros(),
            &Vec3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        let expected = Transform::translate(0.0, 0.0, -10.0);
        assert!((view - expected).norm() < 1e-6);
    }

    #[test]
    fn test_frustum_maps_near_and_far_planes() {
        let p = Transform::frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        let near = p * Vec4::new(0.0, 0.0, -1.0, 1.0);
        let far = p * Vec4::new(0.0, 0.0, -10.0, 1.0);
        assert!((near.z / near.w + 1.0).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_projections_are_identity() {
        let id = Mat44::identity();
        assert_eq!(Transform::frustum(-1.0, 1.0, -1.0, 1.0, 5.0, 5.0), id);
        assert_eq!(Transform::frustum(1.0, 1.0, -1.0, 1.0, 1.0, 5.0), id);
        assert_eq!(Transform::frustum(-1.0, 1.0, 2.0, 2.0, 1.0, 5.0), id);
        assert_eq!(Transform::frustum(-1.0, 1.0, -1.0, 1.0, -1.0, 5.0), id);
        assert_eq!(Transform::orthographic(-1.0, 1.0, -1.0, 1.0, 5.0, 5.0), id);
        assert_eq!(Transform::orthographic(3.0, 3.0, -1.0, 1.0, 1.0, 5.0), id);
        assert_eq!(Transform::orthographic(-1.0, 1.0, 0.5, 0.5, 1.0, 5.0), id);
        assert_eq!(Transform::perspective(PI / 3.0, 1.0, 2.0, 2.0), id);
    }

    #[test]
    fn test_negative_planes_are_identity() {
        let id = Mat44::identity();
        assert_eq!(Transform::frustum(-1.0, 1.0, -1.0, 1.0, 1.0, -5.0), id);
        assert_eq!(Transform::frustum(-1.0, 1.0, -1.0, 1.0, -2.0, -5.0), id);
        assert_eq!(Transform::orthographic(-1.0, 1.0, -1.0, 1.0, -1.0, 5.0), id);
        assert_eq!(Transform::orthographic(-1.0, 1.0, -1.0, 1.0, 1.0, -5.0), id);
        assert_eq!(Transform::perspective(PI / 3.0, 1.0, -1.0, 10.0), id);
        assert_eq!(Transform::perspective(PI / 3.0, 1.0, 1.0, -10.0), id);
        // A zero near plane is still a valid orthographic box
        assert_ne!(Transform::orthographic(-1.0, 1.0, -1.0, 1.0, 0.0, 5.0), id);
    }

    #[test]
    fn test_orthographic_maps_box_to_ndc_cube() {
        let o = Transform::orthographic(-2.0, 2.0, -1.0, 1.0, 1.0, 11.0);
        let corner = o * Vec4::new(2.0, 1.0, -11.0, 1.0);
        assert!((corner - Vec4::new(1.0, 1.0, 1.0, 1.0)).norm() < 1e-5);
        let other = o * Vec4::new(-2.0, -1.0, -1.0, 1.0);
        assert!((other - Vec4::new(-1.0, -1.0, -1.0, 1.0)).norm() < 1e-5);
    }

    #[test]
    fn test_column_major_ordering() {
        let m = Mat44::new(
            1.0, 2.0, 3.0, 4.0, //
            5.0, 6.0, 7.0, 8.0, //
            9.0, 10.0, 11.0, 12.0, //
            13.0, 14.0, 15.0, 16.0,
        );
        let flat = Transform::to_column_major(&m);
        assert_eq!(
            flat,
            vec![
                1.0, 5.0, 9.0, 13.0, 2.0, 6.0, 10.0, 14.0, 3.0, 7.0, 11.0, 15.0, 4.0, 8.0, 12.0,
                16.0
            ]
        );

        // Translation ends up in the last four elements, as GL expects
        let t = Transform::to_column_major(&Transform::translate(7.0, 8.0, 9.0));
        assert_eq!(&t[12..], &[7.0, 8.0, 9.0, 1.0]);
    }

    #[test]
    fn test_column_major_3x3() {
        let m = Mat33::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        assert_eq!(
            Transform::to_column_major(&m),
            vec![1.0, 4.0, 7.0, 2.0, 5.0, 8.0, 3.0, 6.0, 9.0]
        );
    }

    #[test]
    fn test_degrees_to_radians() {
        assert!((Transform::degrees_to_radians(180.0) - PI).abs() < 1e-6);
        assert!((Transform::degrees_to_radians(90.0) - PI / 2.0).abs() < 1e-6);
    }
}
