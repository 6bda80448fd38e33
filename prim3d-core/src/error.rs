//! Error types shared by the math, camera and render layers.

use thiserror::Error;

/// Failures surfaced by prim3d operations.
///
/// Only numeric degeneracies and shader linking can fail. Cosmetic inputs
/// such as geometry radii are clamped instead of raising errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A zero-length vector was passed where a direction is required.
    #[error("cannot normalize a zero-length vector")]
    DegenerateVector,

    /// A matrix that must be inverted has a (numerically) zero determinant.
    #[error("matrix is singular and cannot be inverted")]
    SingularMatrix,

    /// The shader collaborator failed to compile or link the program.
    #[error("shader program failed to link: {0}")]
    ShaderLink(String),
}

/// Alias for `Result<T, prim3d_core::Error>`.
pub type Result<T> = std::result::Result<T, Error>;
