#![warn(missing_docs)]

//! Math types for muscle mesh measurement.
//!
//! Thin wrappers around nalgebra providing the domain types used by the
//! measurement pipeline: points, vectors, directions, coordinate axes,
//! cutting planes and tolerance constants.

use nalgebra::{Unit, Vector3};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in the 2D frame of a cutting plane.
pub type Point2 = nalgebra::Point2<f64>;

/// A coordinate axis of the mesh frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// The X coordinate.
    X,
    /// The Y coordinate.
    Y,
    /// The Z coordinate (vertical in scanner space).
    #[default]
    Z,
}

impl Axis {
    /// Index of this axis in a coordinate triple.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Coordinate of `p` along this axis.
    pub fn component(self, p: &Point3) -> f64 {
        p[self.index()]
    }

    /// Unit vector along this axis.
    pub fn unit(self) -> Dir3 {
        match self {
            Axis::X => Vec3::x_axis(),
            Axis::Y => Vec3::y_axis(),
            Axis::Z => Vec3::z_axis(),
        }
    }
}

/// An oriented cutting plane with an orthonormal in-plane frame.
///
/// The frame `(u, v, normal)` is right-handed, so loops projected with
/// [`Plane::project`] keep the winding they have when seen from the tip of
/// the normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// A point on the plane.
    pub origin: Point3,
    /// Unit normal.
    pub normal: Dir3,
    u: Vec3,
    v: Vec3,
}

impl Plane {
    /// Plane through `origin` with the given normal.
    ///
    /// Returns `None` if the normal has zero length or any input is not finite.
    pub fn new(origin: Point3, normal: Vec3) -> Option<Self> {
        let finite = origin.iter().chain(normal.iter()).all(|c| c.is_finite());
        if !finite {
            return None;
        }
        let normal = Unit::try_new(normal, 1e-12)?;

        // Helper axis least aligned with the normal keeps the cross product well conditioned.
        let n = normal.as_ref();
        let helper = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
            Vec3::x()
        } else if n.y.abs() <= n.z.abs() {
            Vec3::y()
        } else {
            Vec3::z()
        };
        let u = helper.cross(n).normalize();
        let v = n.cross(&u);

        Some(Self {
            origin,
            normal,
            u,
            v,
        })
    }

    /// Signed distance from `p` to the plane (positive on the normal side).
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&(p - self.origin))
    }

    /// First in-plane basis vector.
    pub fn u(&self) -> Vec3 {
        self.u
    }

    /// Second in-plane basis vector.
    pub fn v(&self) -> Vec3 {
        self.v
    }

    /// Coordinates of `p` in the plane frame (the normal component is dropped).
    pub fn project(&self, p: &Point3) -> Point2 {
        let d = p - self.origin;
        Point2::new(d.dot(&self.u), d.dot(&self.v))
    }
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Linear distance tolerance in mm.
    pub linear: f64,
}

impl Tolerance {
    /// Default tolerance (1e-6 mm).
    pub const DEFAULT: Self = Self { linear: 1e-6 };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
