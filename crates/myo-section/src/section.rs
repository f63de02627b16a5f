//! Cross-sections: intersect a triangle mesh with an arbitrary plane.
//!
//! Each triangle that straddles the plane contributes one segment whose
//! endpoints lie on two of its edges. Endpoints are identified by the mesh
//! edge they sit on (keyed by welded vertex positions), so chaining the
//! segments into loops is a walk over shared edges rather than a
//! nearest-point search. A vertex lying exactly on the plane is classified
//! as being on the positive side; this keeps every crossing a proper edge
//! crossing and gives at most one segment per triangle.

use std::collections::HashMap;

use myo_math::{Plane, Point3};
use myo_mesh::{TriangleMesh, VertexKey};
use tracing::trace;

use crate::error::{Result, SectionError};
use crate::path::{region_area, Polygon};

/// Result of cutting a mesh with one plane.
#[derive(Debug, Clone)]
pub struct CrossSection {
    /// The cutting plane; loop coordinates are in its 2D frame.
    pub plane: Plane,
    /// Closed boundary loops, largest first.
    pub loops: Vec<Polygon>,
    /// Chains that could not be closed (holes or non-manifold edges in the
    /// surface). They contribute no area.
    pub open_chains: usize,
    /// Enclosed area of the section under the even-odd rule (mm²).
    pub area: f64,
}

impl CrossSection {
    /// A section that touches nothing.
    pub fn empty(plane: Plane) -> Self {
        Self {
            plane,
            loops: Vec::new(),
            open_chains: 0,
            area: 0.0,
        }
    }

    /// Check if the plane missed the mesh.
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty() && self.open_chains == 0
    }

    /// Total boundary length of the closed loops.
    pub fn perimeter(&self) -> f64 {
        self.loops.iter().map(Polygon::perimeter).sum()
    }
}

/// Plane/mesh intersection capability.
pub trait PlaneCutter {
    /// Intersect `mesh` with `plane`.
    fn cut(&self, mesh: &TriangleMesh, plane: &Plane) -> Result<CrossSection>;
}

/// Default cutter working directly on the triangle buffers.
#[derive(Debug, Clone, Copy)]
pub struct MeshPlaneCutter {
    /// Grid spacing used to weld coincident vertices (mm).
    pub weld_tolerance: f64,
}

impl Default for MeshPlaneCutter {
    fn default() -> Self {
        Self {
            weld_tolerance: 1e-6,
        }
    }
}

impl MeshPlaneCutter {
    /// Cutter welding vertices on a grid of `weld_tolerance` mm.
    pub fn new(weld_tolerance: f64) -> Self {
        Self { weld_tolerance }
    }
}

/// Undirected mesh edge, identified by its welded endpoint keys (sorted).
type EdgeKey = (VertexKey, VertexKey);

/// Piece of the section inside one triangle.
#[derive(Debug, Clone, Copy)]
struct Segment {
    keys: [EdgeKey; 2],
    points: [Point3; 2],
}

impl Segment {
    /// End of the segment opposite to the one on `key`.
    fn other_end(&self, key: &EdgeKey) -> usize {
        if self.keys[0] == *key {
            1
        } else {
            0
        }
    }
}

impl PlaneCutter for MeshPlaneCutter {
    fn cut(&self, mesh: &TriangleMesh, plane: &Plane) -> Result<CrossSection> {
        if !(self.weld_tolerance > 0.0 && self.weld_tolerance.is_finite()) {
            return Err(SectionError::InvalidSettings(format!(
                "weld tolerance must be positive, got {}",
                self.weld_tolerance
            )));
        }
        if mesh.num_triangles() == 0 {
            return Ok(CrossSection::empty(*plane));
        }

        let distances: Vec<f64> = mesh.points().map(|p| plane.signed_distance(&p)).collect();
        if let Some(vertex) = distances.iter().position(|d| !d.is_finite()) {
            return Err(SectionError::InvalidPlane(format!(
                "non-finite distance to vertex {vertex}"
            )));
        }
        let keys: Vec<VertexKey> = (0..mesh.num_vertices())
            .map(|i| mesh.vertex_key(i, self.weld_tolerance))
            .collect();

        let segments = collect_segments(mesh, &distances, &keys);
        let (chains, open_chains) = chain_segments(&segments);

        let mut loops: Vec<Polygon> = chains
            .into_iter()
            .filter(|chain| chain.len() >= 3)
            .map(|chain| Polygon::new(chain.iter().map(|p| plane.project(p)).collect()))
            .collect();
        loops.sort_by(|a, b| b.area().total_cmp(&a.area()));

        let area = region_area(&loops);
        trace!(
            segments = segments.len(),
            loops = loops.len(),
            open_chains,
            area,
            "plane cut"
        );

        Ok(CrossSection {
            plane: *plane,
            loops,
            open_chains,
            area,
        })
    }
}

/// One segment for every triangle with corners on both sides of the plane.
fn collect_segments(mesh: &TriangleMesh, distances: &[f64], keys: &[VertexKey]) -> Vec<Segment> {
    let mut segments = Vec::new();

    for t in 0..mesh.num_triangles() {
        let corners = mesh.triangle_indices(t);
        let above = corners.map(|i| distances[i] >= 0.0);
        if above[0] == above[1] && above[1] == above[2] {
            continue;
        }

        let mut found: Vec<(EdgeKey, Point3)> = Vec::with_capacity(2);
        for (a, b) in [(0, 1), (1, 2), (2, 0)] {
            if above[a] != above[b] {
                found.push(edge_crossing(mesh, distances, keys, corners[a], corners[b]));
            }
        }

        // a straddling triangle always has exactly two crossing edges
        if let [(k0, p0), (k1, p1)] = found.as_slice() {
            segments.push(Segment {
                keys: [*k0, *k1],
                points: [*p0, *p1],
            });
        }
    }

    segments
}

/// Where the plane crosses edge `(a, b)`.
///
/// The endpoints are put in key order first, so both triangles sharing the
/// edge compute bit-identical points.
fn edge_crossing(
    mesh: &TriangleMesh,
    distances: &[f64],
    keys: &[VertexKey],
    a: usize,
    b: usize,
) -> (EdgeKey, Point3) {
    let (lo, hi) = if (keys[a], a) <= (keys[b], b) {
        (a, b)
    } else {
        (b, a)
    };
    let (d_lo, d_hi) = (distances[lo], distances[hi]);
    // sides differ, so one distance is strictly negative and the other is not
    let t = d_lo / (d_lo - d_hi);
    let (p_lo, p_hi) = (mesh.vertex(lo), mesh.vertex(hi));
    let point = p_lo + (p_hi - p_lo) * t;
    ((keys[lo], keys[hi]), point)
}

/// Chain segments through shared edges.
///
/// Returns the closed chains (as point loops without a repeated endpoint) and
/// the number of chains that ended without closing.
fn chain_segments(segments: &[Segment]) -> (Vec<Vec<Point3>>, usize) {
    let mut by_edge: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
    for (i, seg) in segments.iter().enumerate() {
        by_edge.entry(seg.keys[0]).or_default().push(i);
        if seg.keys[1] != seg.keys[0] {
            by_edge.entry(seg.keys[1]).or_default().push(i);
        }
    }

    let next_unused = |key: &EdgeKey, used: &[bool]| -> Option<usize> {
        by_edge
            .get(key)
            .and_then(|candidates| candidates.iter().copied().find(|&s| !used[s]))
    };

    let mut used = vec![false; segments.len()];
    let mut closed = Vec::new();
    let mut open = 0;

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;

        let first = segments[start];
        let start_key = first.keys[0];
        let mut chain = vec![first.points[0], first.points[1]];
        let mut current = first.keys[1];
        let mut is_closed = current == start_key;

        // Extend forward until the walk returns to the start edge
        while !is_closed {
            let Some(s) = next_unused(&current, &used) else {
                break;
            };
            used[s] = true;
            let end = segments[s].other_end(&current);
            current = segments[s].keys[end];
            if current == start_key {
                is_closed = true;
            } else {
                chain.push(segments[s].points[end]);
            }
        }

        if is_closed {
            closed.push(chain);
            continue;
        }

        // Consume the rest of an open chain backwards so it is counted once
        let mut current = start_key;
        while let Some(s) = next_unused(&current, &used) {
            used[s] = true;
            current = segments[s].keys[segments[s].other_end(&current)];
        }
        open += 1;
    }

    (closed, open)
}
