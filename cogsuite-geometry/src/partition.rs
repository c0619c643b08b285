//! Recursive area-balanced partitioning of a polygon.
//!
//! Each step cuts a polygon roughly through its centroid (usually with a
//! straight line, sometimes with a large circle for a curved edge) and hands
//! the two pieces a share of the remaining quota proportional to their area.
//! Under-generation is fixed afterwards by splitting the largest leaves.

use std::f64::consts::{FRAC_PI_2, TAU};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cut::{ArcSampling, Circle, Cut, Cuttable, Line};
use crate::polygon::{Point, Polygon, Vector};

/// Tunables for [`Partitioner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Probability of trying a circle cut before the line cut.
    pub circle_probability: f64,
    /// Width of the band (as a fraction of the shorter bounding-box side)
    /// from which the cut's anchor is drawn, centred on the centroid.
    pub offset_fraction: f64,
    /// Circle radius range as multiples of the shorter bounding-box side.
    pub radius_min: f64,
    pub radius_max: f64,
    pub arc_segment_px: f64,
    pub arc_tolerance_px: f64,
    /// A circle cut is discarded, and a line is cut instead, when either
    /// child's area per quota unit deviates from the parent's by more than
    /// this fraction. This is checked on top of the degenerate-piece
    /// fallback. `None` accepts every non-degenerate circle cut.
    pub balance_tolerance: Option<f64>,
    /// Maximum number of forced splits in the repair pass.
    pub repair_budget: usize,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            circle_probability: 0.3,
            offset_fraction: 0.1,
            radius_min: 0.8,
            radius_max: 2.3,
            arc_segment_px: 5.0,
            arc_tolerance_px: 1.0,
            balance_tolerance: Some(0.15),
            repair_budget: 100,
        }
    }
}

impl PartitionConfig {
    pub fn arc(&self) -> ArcSampling {
        ArcSampling {
            segment_px: self.arc_segment_px,
            tolerance_px: self.arc_tolerance_px,
        }
    }
}

/// Requested versus achieved leaf count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionReport {
    pub requested: usize,
    pub achieved: usize,
    /// Forced splits performed by the repair pass.
    pub repairs: usize,
}

impl PartitionReport {
    pub fn is_short(&self) -> bool {
        self.achieved < self.requested
    }
}

#[derive(Debug, Clone)]
pub struct Partition {
    pub cells: Vec<Polygon>,
    pub report: PartitionReport,
}

/// Splits polygons into area-balanced cells.
#[derive(Debug, Clone, Default)]
pub struct Partitioner {
    config: PartitionConfig,
}

/// Partitions `polygon` into `n` cells with the default configuration.
pub fn partition<R: Rng + ?Sized>(polygon: &Polygon, n: usize, rng: &mut R) -> Partition {
    Partitioner::default().partition(polygon, n, rng)
}

impl Partitioner {
    pub fn new(config: PartitionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// Recursive split followed by the repair pass.
    pub fn partition<R: Rng + ?Sized>(&self, polygon: &Polygon, n: usize, rng: &mut R) -> Partition {
        let mut cells = self.split(polygon, n, rng);
        let repairs = self.repair(&mut cells, n, rng);

        let report = PartitionReport {
            requested: n,
            achieved: cells.len(),
            repairs,
        };
        if report.is_short() {
            warn!(
                requested = report.requested,
                achieved = report.achieved,
                "partition short of requested count"
            );
        } else {
            debug!(cells = report.achieved, repairs, "partition complete");
        }
        Partition { cells, report }
    }

    /// The recursive part: one cut, quota allocation, recursion.
    ///
    /// A polygon that cannot be cut is returned whole even if its quota is
    /// larger than one; [`Partitioner::repair`] deals with that.
    pub fn split<R: Rng + ?Sized>(&self, polygon: &Polygon, n: usize, rng: &mut R) -> Vec<Polygon> {
        if n <= 1 {
            return vec![polygon.clone()];
        }
        match self.cut_once(polygon, n, rng) {
            Some((a, b)) => {
                let n1 = allocate(a.area(), b.area(), n);
                let mut cells = self.split(&a, n1, rng);
                cells.extend(self.split(&b, n - n1, rng));
                cells
            }
            None => {
                debug!(quota = n, area = polygon.area(), "no valid cut, keeping leaf");
                vec![polygon.clone()]
            }
        }
    }

    fn cut_once<R: Rng + ?Sized>(
        &self,
        polygon: &Polygon,
        n: usize,
        rng: &mut R,
    ) -> Option<(Polygon, Polygon)> {
        let centroid = polygon.centroid();
        let span = polygon.bounds().shorter_side();
        let angle = rng.random_range(0.0..TAU);
        let normal = Vector::new(angle.cos(), angle.sin());
        let along = Vector::new((angle + FRAC_PI_2).cos(), (angle + FRAC_PI_2).sin());

        let use_circle = rng.random_bool(self.config.circle_probability.clamp(0.0, 1.0));
        let offset = (rng.random::<f64>() - 0.5) * span * self.config.offset_fraction;
        let anchor = centroid + along * offset;

        if use_circle {
            if let Some(pieces) = self.circle_cut(polygon, anchor, normal, span, n, rng) {
                return Some(pieces);
            }
        }

        if let Ok(pieces) = polygon.split(&Cut::Line(Line::new(anchor, normal))) {
            return Some(pieces);
        }
        if offset != 0.0 {
            if let Ok(pieces) = polygon.split(&Cut::Line(Line::new(centroid, normal))) {
                return Some(pieces);
            }
        }
        None
    }

    /// A circle tangent to the cut line at `anchor`, bending to a random side.
    fn circle_cut<R: Rng + ?Sized>(
        &self,
        polygon: &Polygon,
        anchor: Point,
        normal: Vector,
        span: f64,
        n: usize,
        rng: &mut R,
    ) -> Option<(Polygon, Polygon)> {
        let curvature = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let (lo, hi) = (self.config.radius_min, self.config.radius_max);
        let radius = span * if hi > lo { rng.random_range(lo..hi) } else { lo };
        let circle = Circle {
            center: anchor + normal * (curvature * radius),
            radius,
        };

        let (a, b) = polygon
            .split(&Cut::Circle {
                circle,
                arc: self.config.arc(),
            })
            .ok()?;

        if !self.is_balanced(polygon.area(), a.area(), b.area(), n) {
            debug!(radius, "circle cut too uneven, falling back to line");
            return None;
        }
        Some((a, b))
    }

    fn is_balanced(&self, total: f64, a1: f64, a2: f64, n: usize) -> bool {
        let Some(tolerance) = self.config.balance_tolerance else {
            return true;
        };
        let n1 = allocate(a1, a2, n);
        let per_cell = total / n as f64;
        [(a1, n1), (a2, n - n1)]
            .iter()
            .all(|(area, quota)| ((area / *quota as f64) / per_cell - 1.0).abs() <= tolerance)
    }

    /// Splits the largest cell in two until `cells` reaches `n` or the
    /// budget runs out. Returns the number of splits performed.
    pub fn repair<R: Rng + ?Sized>(&self, cells: &mut Vec<Polygon>, n: usize, rng: &mut R) -> usize {
        let mut repairs = 0;
        for _ in 0..self.config.repair_budget {
            if cells.len() >= n {
                break;
            }
            let Some(largest) = largest_index(cells) else {
                break;
            };
            match self.force_split(&cells[largest], rng) {
                Some((a, b)) => {
                    cells.splice(largest..=largest, [a, b]);
                    repairs += 1;
                }
                None => {
                    warn!(cells = cells.len(), "largest cell cannot be split, giving up");
                    break;
                }
            }
        }
        repairs
    }

    /// A fresh random two-way split, then [`centroid_split`].
    pub fn force_split<R: Rng + ?Sized>(
        &self,
        polygon: &Polygon,
        rng: &mut R,
    ) -> Option<(Polygon, Polygon)> {
        if let [a, b] = self.split(polygon, 2, rng).as_slice() {
            return Some((a.clone(), b.clone()));
        }
        centroid_split(polygon)
    }
}

/// Cuts through the centroid across the longer bounding-box axis.
pub fn centroid_split(polygon: &Polygon) -> Option<(Polygon, Polygon)> {
    let bounds = polygon.bounds();
    let normal = if bounds.width > bounds.height {
        Vector::new(1.0, 0.0)
    } else {
        Vector::new(0.0, 1.0)
    };
    polygon
        .split(&Cut::Line(Line::new(polygon.centroid(), normal)))
        .ok()
}

/// Quota for the first piece: proportional to area, never zero on either side.
fn allocate(a1: f64, a2: f64, n: usize) -> usize {
    let total = a1 + a2;
    let share = if total > 0.0 { a1 / total } else { 0.5 };
    ((n as f64 * share).round() as usize).clamp(1, n - 1)
}

fn largest_index(cells: &[Polygon]) -> Option<usize> {
    cells
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.area().total_cmp(&b.area()))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn area_sum(cells: &[Polygon]) -> f64 {
        cells.iter().map(Polygon::area).sum()
    }

    #[test]
    fn single_quota_is_identity() {
        let rect = Polygon::rectangle(0.0, 0.0, 30.0, 20.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for n in [0, 1] {
            let p = partition(&rect, n, &mut rng);
            assert_eq!(p.cells, vec![rect.clone()]);
        }
    }

    #[test]
    fn allocation_is_proportional_and_clamped() {
        assert_eq!(allocate(1.0, 1.0, 10), 5);
        assert_eq!(allocate(3.0, 1.0, 4), 3);
        assert_eq!(allocate(1000.0, 1.0, 4), 3);
        assert_eq!(allocate(1.0, 1000.0, 4), 1);
        assert_eq!(allocate(0.0, 0.0, 2), 1);
    }

    #[test]
    fn partition_reaches_requested_count() {
        let rect = Polygon::rectangle(0.0, 0.0, 800.0, 600.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let p = partition(&rect, 37, &mut rng);
        assert_eq!(p.cells.len(), 37);
        assert_eq!(p.report.achieved, 37);
        assert!(!p.report.is_short());
        assert!((area_sum(&p.cells) - rect.area()).abs() < 1e-6 * rect.area());
    }

    #[test]
    fn line_only_configuration_still_covers() {
        let config = PartitionConfig {
            circle_probability: 0.0,
            ..PartitionConfig::default()
        };
        let rect = Polygon::rectangle(10.0, 10.0, 200.0, 50.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let p = Partitioner::new(config).partition(&rect, 12, &mut rng);
        assert_eq!(p.cells.len(), 12);
        assert!((area_sum(&p.cells) - rect.area()).abs() < 1e-6);
    }

    #[test]
    fn repair_splits_largest_cell() {
        let big = Polygon::rectangle(0.0, 0.0, 100.0, 100.0).unwrap();
        let small = Polygon::rectangle(100.0, 0.0, 10.0, 10.0).unwrap();
        let mut cells = vec![small.clone(), big];
        let mut rng = StdRng::seed_from_u64(9);
        let repairs = Partitioner::default().repair(&mut cells, 3, &mut rng);
        assert_eq!(repairs, 1);
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0], small);
        assert!((area_sum(&cells) - 10_100.0).abs() < 1e-6);
    }

    #[test]
    fn repair_respects_budget() {
        let config = PartitionConfig {
            repair_budget: 2,
            ..PartitionConfig::default()
        };
        let mut cells = vec![Polygon::rectangle(0.0, 0.0, 100.0, 100.0).unwrap()];
        let mut rng = StdRng::seed_from_u64(5);
        let repairs = Partitioner::new(config).repair(&mut cells, 10, &mut rng);
        assert_eq!(repairs, 2);
        assert_eq!(cells.len(), 3);
    }

    /// Zero-area polygon: every line through it leaves a degenerate side.
    fn sliver() -> Polygon {
        Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
        ])
        .unwrap()
    }

    fn lines_only() -> Partitioner {
        Partitioner::new(PartitionConfig {
            circle_probability: 0.0,
            ..PartitionConfig::default()
        })
    }

    #[test]
    fn centroid_split_halves_across_longer_axis() {
        let wide = Polygon::rectangle(0.0, 0.0, 200.0, 50.0).unwrap();
        let (a, b) = centroid_split(&wide).unwrap();
        assert!((a.area() - 5000.0).abs() < 1e-6);
        assert!((b.area() - 5000.0).abs() < 1e-6);
        for piece in [&a, &b] {
            let bounds = piece.bounds();
            assert!((bounds.width - 100.0).abs() < 1e-9);
            assert!((bounds.height - 50.0).abs() < 1e-9);
        }

        let tall = Polygon::rectangle(0.0, 0.0, 40.0, 120.0).unwrap();
        let (a, b) = centroid_split(&tall).unwrap();
        for piece in [&a, &b] {
            assert!((piece.bounds().height - 60.0).abs() < 1e-9);
            assert!((piece.bounds().width - 40.0).abs() < 1e-9);
        }
    }

    #[test]
    fn unsplittable_cell_has_no_forced_split() {
        let mut rng = StdRng::seed_from_u64(4);
        assert!(centroid_split(&sliver()).is_none());
        assert!(lines_only().force_split(&sliver(), &mut rng).is_none());
    }

    #[test]
    fn repair_gives_up_on_unsplittable_cell() {
        let mut cells = vec![sliver()];
        let mut rng = StdRng::seed_from_u64(6);
        let repairs = lines_only().repair(&mut cells, 5, &mut rng);
        assert_eq!(repairs, 0);
        assert_eq!(cells, vec![sliver()]);
    }

    #[test]
    fn shortfall_is_reported_when_repair_gives_up() {
        let mut rng = StdRng::seed_from_u64(8);
        let p = lines_only().partition(&sliver(), 4, &mut rng);
        assert_eq!(p.cells.len(), 1);
        assert!(p.report.is_short());
        assert_eq!(
            p.report,
            PartitionReport {
                requested: 4,
                achieved: 1,
                repairs: 0,
            }
        );
    }

    #[test]
    fn balance_check_can_be_disabled() {
        let strict = Partitioner::default();
        assert!(strict.is_balanced(100.0, 50.0, 50.0, 2));
        assert!(!strict.is_balanced(100.0, 90.0, 10.0, 2));

        let loose = Partitioner::new(PartitionConfig {
            balance_tolerance: None,
            ..PartitionConfig::default()
        });
        assert!(loose.is_balanced(100.0, 90.0, 10.0, 2));
    }

    #[test]
    fn unchecked_circle_cuts_still_cover() {
        let config = PartitionConfig {
            circle_probability: 1.0,
            balance_tolerance: None,
            ..PartitionConfig::default()
        };
        let rect = Polygon::rectangle(0.0, 0.0, 800.0, 600.0).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let p = Partitioner::new(config).partition(&rect, 30, &mut rng);
        assert!(!p.report.is_short());
        assert_eq!(p.cells.len(), 30);
        assert!((area_sum(&p.cells) - rect.area()).abs() < 1e-6 * rect.area());
    }

    #[test]
    fn config_reads_null_tolerance_as_disabled() {
        let config: PartitionConfig =
            serde_json::from_str(r#"{"balance_tolerance": null}"#).unwrap();
        assert_eq!(config.balance_tolerance, None);
        let config: PartitionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PartitionConfig::default());
    }
}
