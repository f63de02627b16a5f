//! Enclosed volume of a triangulated surface.

use std::collections::HashMap;

use myo_math::Point3;
use myo_mesh::{TriangleMesh, VertexKey};
use serde::Serialize;

/// Cubic millimetres per cubic centimetre.
pub const MM3_PER_CM3: f64 = 1000.0;

/// Volume of a mesh together with the closedness check it relies on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumeReport {
    /// Enclosed volume (mm³).
    pub volume_mm3: f64,
    /// Enclosed volume (cm³).
    pub volume_cm3: f64,
    /// Number of faces integrated.
    pub face_count: usize,
    /// Edges used by a single face.
    pub boundary_edges: usize,
    /// Edges used by more than two faces.
    pub non_manifold_edges: usize,
}

impl VolumeReport {
    /// True when the surface is watertight, so the volume is exact.
    pub fn is_closed(&self) -> bool {
        self.face_count > 0 && self.boundary_edges == 0 && self.non_manifold_edges == 0
    }
}

/// Volume via the divergence theorem: the sum of signed tetrahedra spanned
/// by each face and a reference point (the first vertex).
///
/// Only exact for closed surfaces; for open ones the result depends on the
/// reference point and [`VolumeReport::is_closed`] is false.
pub fn compute_volume(mesh: &TriangleMesh, weld_tolerance: f64) -> VolumeReport {
    let reference = mesh.points().next().unwrap_or_else(Point3::origin);

    let signed: f64 = mesh
        .triangles()
        .map(|[v0, v1, v2]| {
            let (a, b, c) = (v0 - reference, v1 - reference, v2 - reference);
            a.dot(&b.cross(&c))
        })
        .sum::<f64>()
        / 6.0;
    let volume_mm3 = if signed.is_finite() { signed.abs() } else { 0.0 };

    let (boundary_edges, non_manifold_edges) = edge_usage(mesh, weld_tolerance);

    VolumeReport {
        volume_mm3,
        volume_cm3: volume_mm3 / MM3_PER_CM3,
        face_count: mesh.num_triangles(),
        boundary_edges,
        non_manifold_edges,
    }
}

/// Count edges used once and edges used more than twice.
fn edge_usage(mesh: &TriangleMesh, weld_tolerance: f64) -> (usize, usize) {
    if !(weld_tolerance > 0.0 && weld_tolerance.is_finite()) {
        return (0, 0);
    }
    let keys: Vec<VertexKey> = (0..mesh.num_vertices())
        .map(|i| mesh.vertex_key(i, weld_tolerance))
        .collect();

    let mut uses: HashMap<(VertexKey, VertexKey), usize> = HashMap::new();
    for t in 0..mesh.num_triangles() {
        let [a, b, c] = mesh.triangle_indices(t).map(|i| keys[i]);
        for (p, q) in [(a, b), (b, c), (c, a)] {
            // collapsed edges of sliver triangles
            if p == q {
                continue;
            }
            *uses.entry((p.min(q), p.max(q))).or_default() += 1;
        }
    }

    let boundary = uses.values().filter(|&&n| n == 1).count();
    let non_manifold = uses.values().filter(|&&n| n > 2).count();
    (boundary, non_manifold)
}
