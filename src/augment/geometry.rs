//! Quadrilateral geometry for warped object rectangles.

use crate::foundation::core::{Homography, Point, Rect};

/// Tolerance used by the point-in-quadrilateral test, in pixels.
pub const QUAD_EPSILON: f64 = 1e-6;

/// Image of a rectangle under a [`Homography`].
///
/// Corners are ordered top-left, top-right, bottom-right, bottom-left with respect to the source
/// rectangle, so edge `i` runs from `corners[i]` to `corners[(i + 1) % 4]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Quad {
    /// Warped corners in source order.
    pub corners: [Point; 4],
}

impl Quad {
    /// Build from corners in top-left, top-right, bottom-right, bottom-left order.
    pub fn new(corners: [Point; 4]) -> Self {
        Self { corners }
    }

    /// The axis-aligned quad covering `rect`.
    pub fn from_rect(rect: Rect) -> Self {
        Self::new([
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ])
    }

    /// Directed edges in corner order.
    pub fn edges(&self) -> [(Point, Point); 4] {
        let c = &self.corners;
        [(c[0], c[1]), (c[1], c[2]), (c[2], c[3]), (c[3], c[0])]
    }

    /// Returns `true` when every corner is finite.
    pub fn is_finite(&self) -> bool {
        self.corners.iter().all(|p| p.x.is_finite() && p.y.is_finite())
    }

    /// Smallest axis-aligned rectangle containing all corners.
    pub fn bounding_box(&self) -> Rect {
        let mut r = Rect::from_points(self.corners[0], self.corners[0]);
        for p in &self.corners[1..] {
            r = r.union_pt(*p);
        }
        r
    }

    /// Shoelace area; positive for clockwise corners in y-down image space.
    pub fn signed_area(&self) -> f64 {
        self.edges()
            .iter()
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum::<f64>()
            * 0.5
    }

    /// Returns `true` when all turns share one orientation and the quad has area.
    pub fn is_convex(&self) -> bool {
        if !self.is_finite() || self.signed_area().abs() <= QUAD_EPSILON {
            return false;
        }
        let c = &self.corners;
        let mut sign = 0.0f64;
        for i in 0..4 {
            let turn = cross(c[i], c[(i + 1) % 4], c[(i + 2) % 4]);
            if turn.abs() <= QUAD_EPSILON {
                continue;
            }
            if sign == 0.0 {
                sign = turn.signum();
            } else if turn.signum() != sign {
                return false;
            }
        }
        sign != 0.0
    }

    /// Closed point-in-quad test for convex quads of either winding.
    ///
    /// Points within [`QUAD_EPSILON`] of an edge count as inside.
    pub fn contains(&self, p: Point) -> bool {
        let orientation = self.signed_area().signum();
        if orientation == 0.0 {
            return false;
        }
        self.edges()
            .iter()
            .all(|(a, b)| edge_distance(*a, *b, p) * orientation >= -QUAD_EPSILON)
    }

    /// Returns `true` when the quad's bounding box intersects `rect` with non-zero area.
    pub fn overlaps(&self, rect: Rect) -> bool {
        let inter = self.bounding_box().intersect(rect);
        inter.width() > 0.0 && inter.height() > 0.0
    }
}

/// Apply `transform` to the four corners of `source_rect`.
///
/// Corners are visited in the fixed order `(x0, y0)`, `(x1, y0)`, `(x1, y1)`, `(x0, y1)`.
pub fn compute_warped_corners(transform: &Homography, source_rect: Rect) -> Quad {
    let src = Quad::from_rect(source_rect);
    Quad::new(src.corners.map(|p| transform.apply(p)))
}

fn cross(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x)
}

/// Signed distance from `p` to the line through `a -> b`; positive on the right in y-down space.
fn edge_distance(a: Point, b: Point, p: Point) -> f64 {
    let len = (b - a).hypot();
    if len <= 0.0 {
        return 0.0;
    }
    ((b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)) / len
}

#[cfg(test)]
#[path = "../../tests/unit/augment/geometry.rs"]
mod tests;
