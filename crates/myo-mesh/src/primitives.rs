//! Closed, outward-oriented primitive meshes.
//!
//! These are the analytic shapes used to check volume and cross-section
//! measurements against closed-form values.

use std::f64::consts::PI;

use crate::TriangleMesh;

fn push(vertices: &mut Vec<f32>, x: f64, y: f64, z: f64) {
    vertices.extend_from_slice(&[x as f32, y as f32, z as f32]);
}

/// Axis-aligned box spanning `min` to `max`.
pub fn box_mesh(min: [f64; 3], max: [f64; 3]) -> TriangleMesh {
    let mut vertices = Vec::with_capacity(24);
    for z in [min[2], max[2]] {
        push(&mut vertices, min[0], min[1], z);
        push(&mut vertices, max[0], min[1], z);
        push(&mut vertices, max[0], max[1], z);
        push(&mut vertices, min[0], max[1], z);
    }
    let indices = vec![
        // Bottom
        0, 2, 1, 0, 3, 2, // Top
        4, 5, 6, 4, 6, 7, // Front
        0, 1, 5, 0, 5, 4, // Back
        2, 3, 7, 2, 7, 6, // Left
        0, 4, 7, 0, 7, 3, // Right
        1, 2, 6, 1, 6, 5,
    ];
    TriangleMesh { vertices, indices }
}

/// Capped cylinder of `radius` standing on the XY plane, from `z = 0` to
/// `z = height`, with `segments` sides.
pub fn cylinder(radius: f64, height: f64, segments: u32) -> TriangleMesh {
    sheared_cylinder(radius, height, [0.0, 0.0], segments)
}

/// Capped cylinder whose top cap is shifted by `offset` in XY.
///
/// Every horizontal section is the same circle, so sections perpendicular to
/// the slanted centre line have area `πr² · cos θ`, with θ the tilt from Z.
///
/// Vertex order is bottom ring, top ring, bottom centre, top centre; ring
/// vertex 0 sits at angle 0.
pub fn sheared_cylinder(radius: f64, height: f64, offset: [f64; 2], segments: u32) -> TriangleMesh {
    let n = segments.max(3);
    let mut vertices = Vec::with_capacity((2 * n as usize + 2) * 3);
    for (z, [ox, oy]) in [(0.0, [0.0, 0.0]), (height, offset)] {
        for i in 0..n {
            let theta = 2.0 * PI * i as f64 / n as f64;
            push(
                &mut vertices,
                ox + radius * theta.cos(),
                oy + radius * theta.sin(),
                z,
            );
        }
    }
    push(&mut vertices, 0.0, 0.0, 0.0);
    push(&mut vertices, offset[0], offset[1], height);

    let bottom_center = 2 * n;
    let top_center = 2 * n + 1;
    let mut indices = Vec::with_capacity(n as usize * 12);
    for i in 0..n {
        let j = (i + 1) % n;
        let (b0, b1, t0, t1) = (i, j, n + i, n + j);
        indices.extend_from_slice(&[b0, b1, t1, b0, t1, t0]);
        indices.extend_from_slice(&[bottom_center, b1, b0]);
        indices.extend_from_slice(&[top_center, t0, t1]);
    }

    TriangleMesh { vertices, indices }
}

/// Hollow capped tube between radii `inner` and `outer`, from `z = 0` to
/// `z = height`.
pub fn tube(outer: f64, inner: f64, height: f64, segments: u32) -> TriangleMesh {
    let n = segments.max(3);
    let mut vertices = Vec::with_capacity(4 * n as usize * 3);
    for radius in [outer, inner] {
        for z in [0.0, height] {
            for i in 0..n {
                let theta = 2.0 * PI * i as f64 / n as f64;
                push(&mut vertices, radius * theta.cos(), radius * theta.sin(), z);
            }
        }
    }

    // ring starts: outer bottom, outer top, inner bottom, inner top
    let (ob, ot, ib, it) = (0, n, 2 * n, 3 * n);
    let mut indices = Vec::with_capacity(n as usize * 24);
    for i in 0..n {
        let j = (i + 1) % n;
        // outer wall faces away from the axis
        indices.extend_from_slice(&[ob + i, ob + j, ot + j, ob + i, ot + j, ot + i]);
        // inner wall faces the axis
        indices.extend_from_slice(&[ib + i, it + j, ib + j, ib + i, it + i, it + j]);
        // bottom annulus faces down
        indices.extend_from_slice(&[ob + i, ib + i, ib + j, ob + i, ib + j, ob + j]);
        // top annulus faces up
        indices.extend_from_slice(&[ot + i, it + j, it + i, ot + i, ot + j, it + j]);
    }

    TriangleMesh { vertices, indices }
}
