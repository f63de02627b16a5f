//! Planar section loops.

use myo_math::Point2;

/// A closed 2D loop in the frame of a cutting plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Vertices of the polygon in order; the closing edge is implicit.
    pub points: Vec<Point2>,
}

impl Polygon {
    /// Create a new polygon from points.
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Check if the polygon is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Signed area of the polygon.
    /// Positive for counter-clockwise, negative for clockwise.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            area += self.points[i].x * self.points[j].y;
            area -= self.points[j].x * self.points[i].y;
        }
        area / 2.0
    }

    /// Unsigned enclosed area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Is the polygon counter-clockwise?
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Perimeter length.
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| (self.points[(i + 1) % n] - self.points[i]).norm())
            .sum()
    }

    /// Even-odd point containment (ray cast along +x).
    pub fn contains(&self, p: &Point2) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (self.points[i], self.points[j]);
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

/// Area of the region bounded by `loops` under the even-odd rule.
///
/// A loop nested inside an even number of other loops adds its area, one
/// nested inside an odd number (a hole) subtracts it. Loops must not cross
/// each other, which holds for sections of a closed surface.
pub fn region_area(loops: &[Polygon]) -> f64 {
    let total: f64 = loops
        .iter()
        .enumerate()
        .filter(|(_, poly)| poly.len() >= 3)
        .map(|(i, poly)| {
            let probe = poly.points[0];
            let depth = loops
                .iter()
                .enumerate()
                .filter(|&(j, other)| j != i && other.contains(&probe))
                .count();
            if depth % 2 == 0 {
                poly.area()
            } else {
                -poly.area()
            }
        })
        .sum();

    // an empty sum is -0.0
    if total.is_finite() && total > 0.0 {
        total
    } else {
        0.0
    }
}
