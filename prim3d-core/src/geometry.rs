//! Procedural tessellation of the primitive solids.
//!
//! Every builder emits a flat triangle list whose triangles wind
//! counter-clockwise when seen from outside the solid, so back-face culling
//! with a CCW front face shows only the outer surface.

use std::f32::consts::PI;

use crate::math::{self, Vec3, NEG_X_AXIS, NEG_Y_AXIS, NEG_Z_AXIS, X_AXIS, Y_AXIS, Z_AXIS};

/// Sides used to approximate the cylinder's circular caps.
pub const CYLINDER_SIDES: usize = 50;

/// Deepest sphere subdivision accepted; deeper requests are clamped.
pub const MAX_SPHERE_SUBDIVISIONS: u32 = 8;

/// Subdivision level used for the cached unit sphere.
pub const DEFAULT_SPHERE_SUBDIVISIONS: u32 = 4;

pub const DEFAULT_CUBE_SIDE: f32 = 1.0;
pub const DEFAULT_CYLINDER_RADIUS: f32 = 1.0;
pub const DEFAULT_CYLINDER_LENGTH: f32 = 1.0;
pub const DEFAULT_PRISM_RADIUS: f32 = 0.5;
pub const DEFAULT_PRISM_LENGTH: f32 = 1.0;
pub const DEFAULT_PRISM_BASE_FRACTION: f32 = 0.3;

/// The closed set of solids the render core knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolidKind {
    Cube,
    Sphere,
    Cylinder,
    Prism,
}

impl SolidKind {
    pub const ALL: [SolidKind; 4] = [Self::Cube, Self::Sphere, Self::Cylinder, Self::Prism];

    /// Dense index used by per-kind caches.
    pub fn index(self) -> usize {
        match self {
            Self::Cube => 0,
            Self::Sphere => 1,
            Self::Cylinder => 2,
            Self::Prism => 3,
        }
    }

    /// Tessellate the unit version of this solid.
    pub fn build(self) -> Mesh {
        match self {
            Self::Cube => Mesh::cube(DEFAULT_CUBE_SIDE),
            Self::Sphere => Mesh::sphere(DEFAULT_SPHERE_SUBDIVISIONS),
            Self::Cylinder => Mesh::cylinder(DEFAULT_CYLINDER_RADIUS, DEFAULT_CYLINDER_LENGTH),
            Self::Prism => Mesh::prism(
                DEFAULT_PRISM_RADIUS,
                DEFAULT_PRISM_LENGTH,
                DEFAULT_PRISM_BASE_FRACTION,
            ),
        }
    }
}

/// A triangle list stored as parallel position and normal arrays.
///
/// `normals[i]` is the outward normal at `positions[i]`; every three
/// consecutive entries form one triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(triangles * 3),
            normals: Vec::with_capacity(triangles * 3),
        }
    }

    /// Append one triangle. Points must be given counter-clockwise as seen
    /// from the side the normals face.
    pub fn add_triangle(&mut self, points: [Vec3; 3], normals: [Vec3; 3]) {
        self.positions.extend_from_slice(&points);
        self.normals.extend_from_slice(&normals);
    }

    fn add_flat_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, normal: Vec3) {
        self.add_triangle([a, b, c], [normal; 3]);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Iterate over `(points, normals)` per triangle.
    pub fn triangles(&self) -> impl Iterator<Item = (&[Vec3], &[Vec3])> + '_ {
        self.positions.chunks_exact(3).zip(self.normals.chunks_exact(3))
    }

    /// Pack the mesh for a single GPU buffer: every position (x, y, z), then
    /// every normal (x, y, z).
    pub fn to_vertex_data(&self) -> Vec<f32> {
        let mut data = Vec::with_capacity(self.positions.len() * 6);
        for p in self.positions.iter().chain(self.normals.iter()) {
            data.extend_from_slice(&[p.x, p.y, p.z]);
        }
        data
    }

    /// Axis-aligned cube of edge `side` centered at the origin, flat shaded.
    pub fn cube(side: f32) -> Self {
        let side = sanitize_length("cube side", side, DEFAULT_CUBE_SIDE);
        let s = side / 2.0;
        let mut mesh = Self::with_capacity(12);

        //      p7----------p5
        //     /|          /|
        //    p3-+--------p2 |
        //    |  |        |  |
        //    | p6- - - - +-p4
        //    |/          |/
        //    p0----------p1
        let p0 = Vec3::new(-s, -s, s);
        let p1 = Vec3::new(s, -s, s);
        let p2 = Vec3::new(s, s, s);
        let p3 = Vec3::new(-s, s, s);
        let p4 = Vec3::new(s, -s, -s);
        let p5 = Vec3::new(s, s, -s);
        let p6 = Vec3::new(-s, -s, -s);
        let p7 = Vec3::new(-s, s, -s);

        // Front
        mesh.add_flat_triangle(p0, p1, p2, Z_AXIS);
        mesh.add_flat_triangle(p2, p3, p0, Z_AXIS);
        // Right
        mesh.add_flat_triangle(p1, p4, p2, X_AXIS);
        mesh.add_flat_triangle(p4, p5, p2, X_AXIS);
        // Back
        mesh.add_flat_triangle(p4, p6, p5, NEG_Z_AXIS);
        mesh.add_flat_triangle(p6, p7, p5, NEG_Z_AXIS);
        // Left
        mesh.add_flat_triangle(p0, p3, p7, NEG_X_AXIS);
        mesh.add_flat_triangle(p0, p7, p6, NEG_X_AXIS);
        // Top
        mesh.add_flat_triangle(p2, p5, p7, Y_AXIS);
        mesh.add_flat_triangle(p7, p3, p2, Y_AXIS);
        // Bottom
        mesh.add_flat_triangle(p1, p6, p4, NEG_Y_AXIS);
        mesh.add_flat_triangle(p1, p0, p6, NEG_Y_AXIS);

        mesh
    }

    /// Unit sphere approximated by recursively subdividing a tetrahedron.
    ///
    /// Level 0 is the tetrahedron itself; each level quadruples the triangle
    /// count. Normals equal positions since every vertex is on the unit sphere.
    pub fn sphere(subdivisions: u32) -> Self {
        let level = if subdivisions > MAX_SPHERE_SUBDIVISIONS {
            log::warn!(
                "sphere subdivision level {subdivisions} clamped to {MAX_SPHERE_SUBDIVISIONS}"
            );
            MAX_SPHERE_SUBDIVISIONS
        } else {
            subdivisions
        };

        let third = 1.0 / 3.0;
        let v = [
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 2.0 * 2.0_f32.sqrt() / 3.0, -third),
            Vec3::new(-(6.0_f32.sqrt()) / 3.0, -(2.0_f32.sqrt()) / 3.0, -third),
            Vec3::new(6.0_f32.sqrt() / 3.0, -(2.0_f32.sqrt()) / 3.0, -third),
        ];

        let mut mesh = Self::with_capacity(4 * 4usize.pow(level));
        mesh.divide_triangle(v[0], v[1], v[2], level);
        mesh.divide_triangle(v[3], v[2], v[1], level);
        mesh.divide_triangle(v[0], v[3], v[1], level);
        mesh.divide_triangle(v[0], v[2], v[3], level);
        mesh
    }

    fn divide_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, level: u32) {
        if level == 0 {
            self.add_triangle([a, b, c], [a, b, c]);
            return;
        }

        // Midpoints of two unit vectors that are never antipodal
        let ab = (a + b).normalize();
        let bc = (b + c).normalize();
        let ca = (c + a).normalize();

        self.divide_triangle(a, ab, ca, level - 1);
        self.divide_triangle(b, bc, ab, level - 1);
        self.divide_triangle(c, ca, bc, level - 1);
        self.divide_triangle(ab, bc, ca, level - 1);
    }

    /// Cylinder along +Z with its base on the XY plane.
    ///
    /// Caps are flat shaded; the side uses radial per-vertex normals.
    pub fn cylinder(radius: f32, length: f32) -> Self {
        let radius = sanitize_length("cylinder radius", radius, DEFAULT_CYLINDER_RADIUS);
        let length = sanitize_length("cylinder length", length, DEFAULT_CYLINDER_LENGTH);
        let mut mesh = Self::with_capacity(CYLINDER_SIDES * 4);

        let step = 2.0 * PI / CYLINDER_SIDES as f32;
        let lift = Z_AXIS * length;
        let bottom_center = Vec3::zeros();
        let top_center = lift;

        let mut n1 = X_AXIS;
        let mut p1 = n1 * radius;
        for i in 1..=CYLINDER_SIDES {
            // Close the loop on exactly the starting point
            let angle = (i % CYLINDER_SIDES) as f32 * step;
            let n2 = Vec3::new(angle.cos(), angle.sin(), 0.0);
            let p2 = n2 * radius;
            let (p1_top, p2_top) = (p1 + lift, p2 + lift);

            mesh.add_flat_triangle(bottom_center, p2, p1, NEG_Z_AXIS);
            mesh.add_flat_triangle(top_center, p1_top, p2_top, Z_AXIS);

            mesh.add_triangle([p2_top, p1_top, p1], [n2, n1, n1]);
            mesh.add_triangle([p1, p2, p2_top], [n1, n2, n2]);

            n1 = n2;
            p1 = p2;
        }

        mesh
    }

    /// Two square pyramids glued base to base along +Z.
    ///
    /// The first apex sits at the origin, the second at `(0, 0, length)`, and
    /// the shared base at `length * base_fraction`.
    pub fn prism(radius: f32, length: f32, base_fraction: f32) -> Self {
        let radius = sanitize_length("prism radius", radius, DEFAULT_PRISM_RADIUS);
        let length = sanitize_length("prism length", length, DEFAULT_PRISM_LENGTH);
        let base_fraction = if base_fraction > 0.0 && base_fraction < 1.0 {
            base_fraction
        } else {
            log::warn!(
                "prism base fraction {base_fraction} outside (0, 1); using default {}",
                DEFAULT_PRISM_BASE_FRACTION
            );
            DEFAULT_PRISM_BASE_FRACTION
        };

        let base_z = base_fraction * length;
        let low_apex = Vec3::zeros();
        let high_apex = Vec3::new(0.0, 0.0, length);
        let corner = |angle: f32| Vec3::new(radius * angle.cos(), radius * angle.sin(), base_z);

        let mut mesh = Self::with_capacity(8);
        let mut angle = -PI / 4.0;
        let mut p1 = corner(angle);
        for _ in 0..4 {
            angle += PI / 2.0;
            let p2 = corner(angle);

            mesh.add_flat_triangle(p1, low_apex, p2, face_normal(&p1, &low_apex, &p2));
            mesh.add_flat_triangle(p1, p2, high_apex, face_normal(&p1, &p2, &high_apex));

            p1 = p2;
        }

        mesh
    }
}

/// Unit normal of the triangle `abc` wound counter-clockwise.
fn face_normal(a: &Vec3, b: &Vec3, c: &Vec3) -> Vec3 {
    let n = math::cross(&(b - a), &(c - a));
    math::normalize(&n).unwrap_or(n)
}

fn sanitize_length(what: &str, value: f32, default: f32) -> f32 {
    if value > 0.0 && value.is_finite() {
        value
    } else {
        log::warn!("{what} {value} is not positive; using {default}");
        default
    }
}
