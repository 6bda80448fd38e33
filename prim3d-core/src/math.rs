//! Vector and matrix primitives.
//!
//! Thin, stateless wrappers over `nalgebra` that add the fallible operations
//! the camera and render layers rely on. Matrices are indexed `(row, column)`.

use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

use crate::error::{Error, Result};

pub type Vec3 = Vector3<f32>;
pub type Vec4 = Vector4<f32>;
pub type Mat33 = Matrix3<f32>;
pub type Mat44 = Matrix4<f32>;

/// Vector norms at or below this magnitude are treated as zero.
pub const EPSILON: f32 = 1e-12;

/// Largest entry of `m · m⁻¹ − I` accepted from an inversion.
const INVERSE_RESIDUAL: f32 = 1e-3;

pub const X_AXIS: Vec3 = Vec3::new(1.0, 0.0, 0.0);
pub const Y_AXIS: Vec3 = Vec3::new(0.0, 1.0, 0.0);
pub const Z_AXIS: Vec3 = Vec3::new(0.0, 0.0, 1.0);
pub const NEG_X_AXIS: Vec3 = Vec3::new(-1.0, 0.0, 0.0);
pub const NEG_Y_AXIS: Vec3 = Vec3::new(0.0, -1.0, 0.0);
pub const NEG_Z_AXIS: Vec3 = Vec3::new(0.0, 0.0, -1.0);

pub fn dot(a: &Vec3, b: &Vec3) -> f32 {
    a.dot(b)
}

/// Right-handed cross product `a × b`.
pub fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
    Vec3::new(
        a.y * b.z - a.z * b.y,
        a.z * b.x - a.x * b.z,
        a.x * b.y - a.y * b.x,
    )
}

/// Unit vector in the direction of `v`.
pub fn normalize(v: &Vec3) -> Result<Vec3> {
    let norm = v.norm();
    if norm <= EPSILON || !norm.is_finite() {
        return Err(Error::DegenerateVector);
    }
    Ok(v / norm)
}

pub fn add(a: &Vec3, b: &Vec3) -> Vec3 {
    a + b
}

pub fn scale(v: &Vec3, s: f32) -> Vec3 {
    v * s
}

/// Matrix product `a · b`.
pub fn mat_mul(a: &Mat44, b: &Mat44) -> Mat44 {
    a * b
}

/// General 4×4 inverse.
///
/// Singularity is judged by how well the computed inverse reproduces the
/// identity, not by the raw determinant, so uniformly small or large scales
/// invert fine.
pub fn mat_inverse(m: &Mat44) -> Result<Mat44> {
    let inverse = m.try_inverse().ok_or(Error::SingularMatrix)?;
    let residual = (m * inverse - Mat44::identity()).amax();
    if is_usable_inverse(inverse.iter(), residual) {
        Ok(inverse)
    } else {
        Err(Error::SingularMatrix)
    }
}

pub fn transpose(m: &Mat44) -> Mat44 {
    m.transpose()
}

/// Upper-left 3×3 block of a 4×4 matrix.
pub fn upper_left_3x3(m: &Mat44) -> Mat33 {
    Mat33::from_fn(|r, c| m[(r, c)])
}

/// Inverse-transpose of the upper-left 3×3 of `m`.
///
/// This is the matrix that carries surface normals through `m` when `m`
/// contains non-uniform scaling.
pub fn inverse_transpose_3x3(m: &Mat44) -> Result<Mat33> {
    let upper = upper_left_3x3(m);
    let inverse = upper.try_inverse().ok_or(Error::SingularMatrix)?;
    let residual = (upper * inverse - Mat33::identity()).amax();
    if is_usable_inverse(inverse.iter(), residual) {
        Ok(inverse.transpose())
    } else {
        Err(Error::SingularMatrix)
    }
}

/// Cofactor matrix of the upper-left 3×3 of `m`.
///
/// Equal to `det · inverse_transpose_3x3(m)`, but defined for singular
/// matrices too: a transform that flattens one axis still maps normals onto
/// that axis.
pub fn cofactor_3x3(m: &Mat44) -> Mat33 {
    let upper = upper_left_3x3(m);
    let column = |i: usize| -> Vec3 { upper.column(i).into_owned() };
    let (c0, c1, c2) = (column(0), column(1), column(2));
    Mat33::from_columns(&[cross(&c1, &c2), cross(&c2, &c0), cross(&c0, &c1)])
}

fn is_usable_inverse<'a>(mut entries: impl Iterator<Item = &'a f32>, residual: f32) -> bool {
    residual.is_finite() && residual <= INVERSE_RESIDUAL && entries.all(|v| v.is_finite())
}

/// Promote a point to homogeneous coordinates (`w = 1`).
pub fn to_point4(p: &Vec3) -> Vec4 {
    Vec4::new(p.x, p.y, p.z, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_is_right_handed() {
        let z = cross(&X_AXIS, &Y_AXIS);
        assert!((z - Z_AXIS).norm() < 1e-6);
        let x = cross(&Y_AXIS, &Z_AXIS);
        assert!((x - X_AXIS).norm() < 1e-6);
        let neg = cross(&Y_AXIS, &X_AXIS);
        assert!((neg - NEG_Z_AXIS).norm() < 1e-6);
    }

    #[test]
    fn test_normalize() {
        let v = normalize(&Vec3::new(3.0, 0.0, 4.0)).unwrap();
        assert!((v.norm() - 1.0).abs() < 1e-6);
        assert!((v.x - 0.6).abs() < 1e-6);
        assert!((v.z - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector_fails() {
        assert_eq!(normalize(&Vec3::zeros()), Err(Error::DegenerateVector));
    }

    #[test]
    fn test_inverse_roundtrip() {
        let m = Mat44::new(
            2.0, 0.0, 0.0, 1.0, //
            0.0, 3.0, 0.0, 2.0, //
            0.0, 0.0, 4.0, 3.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        let inv = mat_inverse(&m).unwrap();
        assert!((mat_mul(&m, &inv) - Mat44::identity()).norm() < 1e-5);
    }

    #[test]
    fn test_singular_inverse_fails() {
        let mut m = Mat44::identity();
        m[(2, 2)] = 0.0;
        assert_eq!(mat_inverse(&m), Err(Error::SingularMatrix));
        assert_eq!(inverse_transpose_3x3(&m), Err(Error::SingularMatrix));
    }

    #[test]
    fn test_tiny_uniform_scale_is_invertible() {
        let mut m = Mat44::identity();
        for i in 0..3 {
            m[(i, i)] = 1e-4;
        }
        let inv = mat_inverse(&m).unwrap();
        assert!((inv[(0, 0)] - 1e4).abs() < 1.0);
        assert!((mat_mul(&m, &inv) - Mat44::identity()).norm() < 1e-4);

        let it = inverse_transpose_3x3(&m).unwrap();
        assert!((it[(2, 2)] - 1e4).abs() < 1.0);
    }

    #[test]
    fn test_huge_uniform_scale_is_invertible() {
        let mut m = Mat44::identity();
        for i in 0..3 {
            m[(i, i)] = 1e5;
        }
        let it = inverse_transpose_3x3(&m).unwrap();
        assert!((it[(1, 1)] - 1e-5).abs() < 1e-9);
    }

    #[test]
    fn test_cofactor_of_flattened_axis() {
        let mut m = Mat44::identity();
        m[(1, 1)] = 0.0;
        let c = cofactor_3x3(&m);
        assert!((c * Y_AXIS - Y_AXIS).norm() < 1e-6);
        assert!((c * X_AXIS).norm() < 1e-6);
        assert!((c * Z_AXIS).norm() < 1e-6);
    }

    #[test]
    fn test_cofactor_matches_scaled_inverse_transpose() {
        let mut m = Mat44::identity();
        m[(0, 0)] = 2.0;
        m[(1, 1)] = 3.0;
        m[(0, 1)] = 0.5;
        let det = upper_left_3x3(&m).determinant();
        let expected = inverse_transpose_3x3(&m).unwrap() * det;
        assert!((cofactor_3x3(&m) - expected).norm() < 1e-5);
    }

    #[test]
    fn test_inverse_transpose_of_scaling() {
        let mut m = Mat44::identity();
        m[(0, 0)] = 2.0;
        m[(1, 1)] = 4.0;
        m[(0, 3)] = 7.0;
        let it = inverse_transpose_3x3(&m).unwrap();
        assert!((it[(0, 0)] - 0.5).abs() < 1e-6);
        assert!((it[(1, 1)] - 0.25).abs() < 1e-6);
        assert!((it[(2, 2)] - 1.0).abs() < 1e-6);
    }
}
