//! Splitting a polygon with a straight line or a circle.
//!
//! Both cuts walk the polygon's edges in order (Sutherland-Hodgman style),
//! sorting each vertex to one or both output lists and inserting the crossing
//! point wherever an edge changes side.

use std::f64::consts::PI;

use cogsuite_core::GeometryError;
use serde::{Deserialize, Serialize};

use crate::polygon::{Point, Polygon, Vector};

/// A half-plane boundary: all points `p` with `normal · (p - point) = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub point: Point,
    normal: Vector,
}

impl Line {
    /// Line through `point` with the given normal. The normal is normalized.
    ///
    /// # Panics
    /// Panics if the normal has zero length.
    pub fn new(point: Point, normal: Vector) -> Self {
        let norm = normal.norm();
        assert!(norm > f64::EPSILON, "Line normal cannot be zero");
        Self {
            point,
            normal: normal / norm,
        }
    }

    /// Line through `point` whose normal points at `angle` radians.
    pub fn from_angle(point: Point, angle: f64) -> Self {
        Self {
            point,
            normal: Vector::new(angle.cos(), angle.sin()),
        }
    }

    #[inline]
    pub fn normal(&self) -> Vector {
        self.normal
    }

    /// Positive on the side the normal points to.
    #[inline]
    pub fn signed_distance(&self, p: &Point) -> f64 {
        self.normal.dot(&(p - self.point))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

impl Circle {
    /// Squared distance to the center minus radius squared: negative inside.
    #[inline]
    pub fn power(&self, p: &Point) -> f64 {
        (p - self.center).norm_squared() - self.radius * self.radius
    }

    fn is_near(&self, p: &Point, arc: &ArcSampling) -> bool {
        (nalgebra::distance(p, &self.center) - self.radius).abs() < arc.tolerance_px
    }

    fn angle_of(&self, p: &Point) -> f64 {
        (p.y - self.center.y).atan2(p.x - self.center.x)
    }

    fn point_at(&self, angle: f64) -> Point {
        self.center + Vector::new(angle.cos(), angle.sin()) * self.radius
    }

    /// Parameters `t` in `[0, 1]` where the segment `a -> b` meets the circle,
    /// in increasing order.
    fn segment_crossings(&self, a: &Point, b: &Point) -> Vec<f64> {
        let d = b - a;
        let f = a - self.center;
        let qa = d.norm_squared();
        let qb = 2.0 * f.dot(&d);
        let qc = f.norm_squared() - self.radius * self.radius;
        let delta = qb * qb - 4.0 * qa * qc;
        if qa <= f64::EPSILON || delta < 0.0 {
            return Vec::new();
        }
        let root = delta.sqrt();
        [(-qb - root) / (2.0 * qa), (-qb + root) / (2.0 * qa)]
            .into_iter()
            .filter(|t| (-1e-9..=1.0 + 1e-9).contains(t))
            .map(|t| t.clamp(0.0, 1.0))
            .collect()
    }
}

/// Which piece of a cut a polygon belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Non-negative signed distance to a line.
    Front,
    /// Non-positive signed distance to a line.
    Back,
    Inside,
    Outside,
}

/// How the circular part of a cut boundary is approximated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcSampling {
    /// Target length of one polyline segment along the arc.
    pub segment_px: f64,
    /// Two emitted points bracket an arc only if both are this close to the
    /// circle.
    pub tolerance_px: f64,
}

impl Default for ArcSampling {
    fn default() -> Self {
        Self {
            segment_px: 5.0,
            tolerance_px: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Cut {
    Line(Line),
    Circle { circle: Circle, arc: ArcSampling },
}

impl Cut {
    /// Sides of the `(first, second)` pieces returned by [`Cuttable::cut`].
    pub fn sides(&self) -> (Side, Side) {
        match self {
            Cut::Line(_) => (Side::Front, Side::Back),
            Cut::Circle { .. } => (Side::Inside, Side::Outside),
        }
    }
}

/// Geometry that can be cut in two.
pub trait Cuttable {
    /// Returns `(first, second)` pieces in the order given by [`Cut::sides`].
    /// A piece is `None` when it would have fewer than three vertices.
    fn cut(&self, cut: &Cut) -> (Option<Polygon>, Option<Polygon>);

    /// Like [`Cuttable::cut`] but demands that both pieces exist.
    fn split(&self, cut: &Cut) -> Result<(Polygon, Polygon), GeometryError> {
        match self.cut(cut) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(GeometryError::NoStraddle),
        }
    }
}

impl Cuttable for Polygon {
    fn cut(&self, cut: &Cut) -> (Option<Polygon>, Option<Polygon>) {
        let (a, b) = match cut {
            Cut::Line(line) => cut_with_line(self, line),
            Cut::Circle { circle, arc } => {
                match cut_with_circle(self, circle, arc) {
                    Some(pieces) => pieces,
                    None => return (None, None),
                }
            }
        };
        (Polygon::new(a).ok(), Polygon::new(b).ok())
    }
}

/// Raw vertex lists on each side of `line`.
///
/// Vertices on the line go to both lists. When the polygon lies entirely on
/// one side the other list is empty or degenerate; callers treat that as
/// "no cut".
pub fn cut_with_line(polygon: &Polygon, line: &Line) -> (Vec<Point>, Vec<Point>) {
    let vertices = polygon.vertices();
    let n = vertices.len();
    let dists: Vec<f64> = vertices.iter().map(|v| line.signed_distance(v)).collect();

    let mut front = Vec::with_capacity(n + 2);
    let mut back = Vec::with_capacity(n + 2);

    for i in 0..n {
        let j = (i + 1) % n;
        let (curr, next) = (vertices[i], vertices[j]);
        let (d_curr, d_next) = (dists[i], dists[j]);

        if d_curr >= 0.0 {
            front.push(curr);
        }
        if d_curr <= 0.0 {
            back.push(curr);
        }

        if (d_curr > 0.0 && d_next < 0.0) || (d_curr < 0.0 && d_next > 0.0) {
            let t = d_curr / (d_curr - d_next);
            let crossing = curr + (next - curr) * t;
            front.push(crossing);
            back.push(crossing);
        }
    }

    (front, back)
}

/// Tracks, per output list, whether vertices were skipped since the last
/// emitted point. A skipped run is where the circle replaces the original
/// boundary.
struct ArcTracker {
    points: Vec<Point>,
    arc_before: Vec<bool>,
    skipped: bool,
}

impl ArcTracker {
    fn new(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            arc_before: Vec::with_capacity(capacity),
            skipped: false,
        }
    }

    fn push(&mut self, p: Point) {
        self.points.push(p);
        self.arc_before.push(self.skipped);
        self.skipped = false;
    }

    fn skip(&mut self) {
        self.skipped = true;
    }

    /// Closes the loop and replaces every skipped run with arc samples.
    fn finish(mut self, circle: &Circle, original: &Polygon, arc: &ArcSampling) -> Vec<Point> {
        if self.points.is_empty() {
            return self.points;
        }
        if self.skipped {
            self.arc_before[0] = true;
        }
        let n = self.points.len();
        let mut out = Vec::with_capacity(n * 2);
        for i in 0..n {
            let next = (i + 1) % n;
            out.push(self.points[i]);
            let (from, to) = (&self.points[i], &self.points[next]);
            if self.arc_before[next] && circle.is_near(from, arc) && circle.is_near(to, arc) {
                out.extend(arc_points(circle, from, to, original, arc.segment_px));
            }
        }
        out
    }
}

/// Samples the arc from `from` to `to` (both on the circle), excluding the
/// endpoints. Takes the direction whose midpoint lies inside `original`,
/// preferring the shorter way.
fn arc_points(
    circle: &Circle,
    from: &Point,
    to: &Point,
    original: &Polygon,
    segment_px: f64,
) -> Vec<Point> {
    let start = circle.angle_of(from);
    let mut diff = circle.angle_of(to) - start;
    while diff <= -PI {
        diff += 2.0 * PI;
    }
    while diff > PI {
        diff -= 2.0 * PI;
    }

    let short_mid = circle.point_at(start + diff / 2.0);
    if !original.contains(&short_mid) {
        let long = diff - diff.signum() * 2.0 * PI;
        if original.contains(&circle.point_at(start + long / 2.0)) {
            diff = long;
        }
    }

    let count = (diff.abs() * circle.radius / segment_px.max(f64::EPSILON)).ceil() as usize;
    (1..count)
        .map(|k| circle.point_at(start + diff * k as f64 / count as f64))
        .collect()
}

/// Raw `(inside, outside)` vertex lists for a circle cut, with the cut
/// boundary sampled as a polyline along the circle.
///
/// Returns `None` when the polygon does not straddle the circle (all of its
/// vertices lie on the same side), or when the circle crosses the boundary
/// more than twice, which would leave one side in several pieces.
pub fn cut_with_circle(
    polygon: &Polygon,
    circle: &Circle,
    arc: &ArcSampling,
) -> Option<(Vec<Point>, Vec<Point>)> {
    let vertices = polygon.vertices();
    let n = vertices.len();
    let powers: Vec<f64> = vertices.iter().map(|v| circle.power(v)).collect();

    if powers.iter().all(|d| *d <= 0.0) || powers.iter().all(|d| *d >= 0.0) {
        return None;
    }

    let mut inside = ArcTracker::new(n + 8);
    let mut outside = ArcTracker::new(n + 8);
    let mut crossings_seen = 0;

    for i in 0..n {
        let j = (i + 1) % n;
        let (curr, next) = (vertices[i], vertices[j]);
        let (d_curr, d_next) = (powers[i], powers[j]);

        if d_curr <= 0.0 {
            inside.push(curr);
        } else {
            inside.skip();
        }
        if d_curr >= 0.0 {
            outside.push(curr);
        } else {
            outside.skip();
        }

        let at = |t: f64| curr + (next - curr) * t;
        if (d_curr < 0.0 && d_next > 0.0) || (d_curr > 0.0 && d_next < 0.0) {
            let crossings = circle.segment_crossings(&curr, &next);
            // Leaving the disc meets the larger root, entering the smaller.
            let t = if d_curr < 0.0 {
                crossings.last()
            } else {
                crossings.first()
            };
            if let Some(&t) = t {
                crossings_seen += 1;
                let crossing = at(t);
                inside.push(crossing);
                outside.push(crossing);
            }
        } else if d_curr > 0.0 && d_next > 0.0 {
            // An edge can dip into the disc between two outside vertices.
            let crossings = circle.segment_crossings(&curr, &next);
            if let [t0, t1] = crossings[..] {
                if t1 - t0 > f64::EPSILON {
                    crossings_seen += 2;
                    inside.push(at(t0));
                    inside.push(at(t1));
                    outside.push(at(t0));
                    outside.skip();
                    outside.push(at(t1));
                }
            }
        }
    }

    if crossings_seen > 2 {
        return None;
    }

    Some((
        inside.finish(circle, polygon, arc),
        outside.finish(circle, polygon, arc),
    ))
}
