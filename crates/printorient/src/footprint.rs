//! 2D footprint polygons on the build plate.

use printorient_math::Point2;

/// A closed 2D polygon.
#[derive(Debug, Clone, Default)]
pub struct Polygon {
    /// Vertices in order.
    pub points: Vec<Point2>,
}

impl Polygon {
    /// Create a polygon from points.
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Signed area, positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let p0 = self.points[0];
        let mut twice = 0.0;
        for w in self.points[1..].windows(2) {
            twice += (w[0] - p0).perp(&(w[1] - p0));
        }
        twice / 2.0
    }

    /// Unsigned area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }
}

/// Convex hull of a 2D point set by Andrew's monotone chain.
///
/// Collinear points are dropped. The result is counter-clockwise and empty
/// when fewer than three non-collinear points are given.
pub fn convex_hull(mut points: Vec<Point2>) -> Polygon {
    if points.len() < 3 {
        return Polygon::default();
    }
    points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

    let turn = |a: Point2, b: Point2, c: Point2| (b - a).perp(&(c - a));

    let mut hull: Vec<Point2> = Vec::with_capacity(points.len() + 1);
    for &p in &points {
        while hull.len() >= 2 && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower = hull.len();
    for &p in points.iter().rev().skip(1) {
        while hull.len() > lower && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();

    if hull.len() < 3 {
        return Polygon::default();
    }
    Polygon::new(hull)
}

/// Area of the convex hull of `points`.
pub fn convex_hull_area(points: Vec<Point2>) -> f64 {
    convex_hull(points).area()
}
