//! Planar polygon representation.

use cogsuite_core::GeometryError;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::VERTEX_EPSILON;

pub type Point = Point2<f64>;
pub type Vector = Vector2<f64>;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn shorter_side(&self) -> f64 {
        self.width.min(self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.min_x + self.width / 2.0, self.min_y + self.height / 2.0)
    }
}

/// A simple polygon given by an ordered, cyclic list of at least three vertices.
///
/// Orientation is not significant, but it is consistent along the vertex list,
/// which is all the inside/outside tests rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    /// Builds a polygon, collapsing consecutive duplicate vertices
    /// (including the wrap-around pair).
    ///
    /// Fails with [`GeometryError::Degenerate`] if fewer than three distinct
    /// vertices remain.
    pub fn new(vertices: Vec<Point>) -> Result<Self, GeometryError> {
        let mut cleaned: Vec<Point> = Vec::with_capacity(vertices.len());
        for v in vertices {
            if cleaned
                .last()
                .is_none_or(|last| nalgebra::distance(last, &v) > VERTEX_EPSILON)
            {
                cleaned.push(v);
            }
        }
        while cleaned.len() > 1 {
            let (first, last) = (cleaned[0], cleaned[cleaned.len() - 1]);
            if nalgebra::distance(&first, &last) > VERTEX_EPSILON {
                break;
            }
            cleaned.pop();
        }

        if cleaned.len() < 3 {
            return Err(GeometryError::Degenerate {
                vertices: cleaned.len(),
            });
        }
        Ok(Self { vertices: cleaned })
    }

    /// Axis-aligned rectangle with its top-left corner at `(x, y)`.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Result<Self, GeometryError> {
        if !(width > 0.0 && height > 0.0) {
            return Err(GeometryError::InvalidSurface { width, height });
        }
        Self::new(vec![
            Point::new(x, y),
            Point::new(x + width, y),
            Point::new(x + width, y + height),
            Point::new(x, y + height),
        ])
    }

    #[inline]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false for a constructed polygon.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterates `(start, end)` pairs, closing the loop.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Shoelace sum halved. Sign depends on winding.
    pub fn signed_area(&self) -> f64 {
        self.edges().map(|(a, b)| a.x * b.y - b.x * a.y).sum::<f64>() / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Area centroid. May fall outside a non-convex polygon.
    ///
    /// Falls back to the vertex average when the area vanishes.
    pub fn centroid(&self) -> Point {
        let a = self.signed_area();
        if a.abs() < VERTEX_EPSILON {
            let sum: Vector = self.vertices.iter().map(|p| p.coords).sum();
            return Point::from(sum / self.vertices.len() as f64);
        }
        let (mut cx, mut cy) = (0.0, 0.0);
        for (p, q) in self.edges() {
            let cross = p.x * q.y - q.x * p.y;
            cx += (p.x + q.x) * cross;
            cy += (p.y + q.y) * cross;
        }
        Point::new(cx / (6.0 * a), cy / (6.0 * a))
    }

    pub fn bounds(&self) -> Bounds {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in &self.vertices {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Bounds {
            min_x,
            min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    /// Even-odd ray casting test. Points exactly on an edge may go either way.
    pub fn contains(&self, point: &Point) -> bool {
        let n = self.vertices.len();
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (pi, pj) = (self.vertices[i], self.vertices[j]);
            if (pi.y > point.y) != (pj.y > point.y)
                && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// A point guaranteed to be inside for label placement.
    ///
    /// Uses the centroid when it is inside; otherwise the middle of the widest
    /// horizontal run through the centroid's row (or the bounds' middle row).
    pub fn interior_point(&self) -> Point {
        let centroid = self.centroid();
        if self.contains(&centroid) {
            return centroid;
        }
        [centroid.y, self.bounds().center().y]
            .into_iter()
            .find_map(|y| self.widest_run_midpoint(y))
            .unwrap_or(centroid)
    }

    fn widest_run_midpoint(&self, y: f64) -> Option<Point> {
        let mut xs: Vec<f64> = self
            .edges()
            .filter(|(a, b)| (a.y > y) != (b.y > y))
            .map(|(a, b)| a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y))
            .collect();
        xs.sort_by(f64::total_cmp);
        xs.chunks_exact(2)
            .max_by(|l, r| (l[1] - l[0]).total_cmp(&(r[1] - r[0])))
            .map(|run| Point::new((run[0] + run[1]) / 2.0, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::rectangle(0.0, 0.0, 10.0, 10.0).unwrap()
    }

    #[test]
    fn rectangle_area_and_centroid() {
        let sq = square();
        assert_eq!(sq.area(), 100.0);
        let c = sq.centroid();
        assert!((c.x - 5.0).abs() < 1e-12 && (c.y - 5.0).abs() < 1e-12);
        let b = sq.bounds();
        assert_eq!((b.min_x, b.min_y, b.width, b.height), (0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn orientation_flips_sign_only() {
        let mut pts = square().vertices().to_vec();
        pts.reverse();
        let rev = Polygon::new(pts).unwrap();
        assert_eq!(rev.signed_area(), -square().signed_area());
        assert_eq!(rev.area(), 100.0);
    }

    #[test]
    fn duplicate_vertices_collapse() {
        let p = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 3.0),
            Point::new(0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p.area(), 6.0);
    }

    #[test]
    fn too_few_vertices_is_degenerate() {
        let err = Polygon::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]).unwrap_err();
        assert_eq!(err, GeometryError::Degenerate { vertices: 2 });
        assert!(Polygon::rectangle(0.0, 0.0, 0.0, 5.0).is_err());
    }

    #[test]
    fn contains_uses_ray_casting() {
        let sq = square();
        assert!(sq.contains(&Point::new(5.0, 5.0)));
        assert!(!sq.contains(&Point::new(15.0, 5.0)));
        assert!(!sq.contains(&Point::new(-0.1, 5.0)));
    }

    #[test]
    fn interior_point_of_concave_shape_is_inside() {
        // A "C" shape whose centroid sits in the notch.
        let c = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 2.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 8.0),
            Point::new(10.0, 8.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ])
        .unwrap();
        assert!(!c.contains(&c.centroid()));
        assert!(c.contains(&c.interior_point()));
    }
}
