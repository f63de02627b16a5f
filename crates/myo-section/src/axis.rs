//! Origin/insertion estimation from vertex extremes.

use myo_math::{Axis, Dir3, Point3, Tolerance, Vec3};
use myo_mesh::TriangleMesh;

use crate::error::{Result, SectionError};

/// The two extreme points standing in for a muscle's origin and insertion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisPair {
    /// Vertex with the largest coordinate along the designated axis.
    pub origin: Point3,
    /// Vertex with the smallest coordinate along the designated axis.
    pub insertion: Point3,
}

impl AxisPair {
    /// `origin - insertion`.
    pub fn vector(&self) -> Vec3 {
        self.origin - self.insertion
    }

    /// Distance between origin and insertion (mm).
    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    /// Unit direction from origin towards insertion.
    pub fn direction(&self) -> Option<Dir3> {
        Dir3::try_new(self.insertion - self.origin, 1e-12)
    }
}

/// Find origin (argmax) and insertion (argmin) along `axis`.
///
/// Vertices are scanned in index order with strict comparisons, so when
/// several vertices share the extreme coordinate the one with the lowest
/// index wins.
pub fn estimate_axis(mesh: &TriangleMesh, axis: Axis, tolerance: &Tolerance) -> Result<AxisPair> {
    let mut points = mesh.points();
    let first = points.next().ok_or(SectionError::EmptyMesh)?;

    let (mut origin, mut insertion) = (first, first);
    for p in points {
        let c = axis.component(&p);
        if c > axis.component(&origin) {
            origin = p;
        }
        if c < axis.component(&insertion) {
            insertion = p;
        }
    }

    let pair = AxisPair { origin, insertion };
    if tolerance.points_equal(&pair.origin, &pair.insertion) {
        return Err(SectionError::DegenerateAxis {
            length: pair.length(),
        });
    }
    Ok(pair)
}
