//! Property tests for cutting and partitioning.

use std::f64::consts::TAU;

use cogsuite_geometry::cut::{cut_with_circle, cut_with_line};
use cogsuite_geometry::{
    ArcSampling, Circle, Cut, Cuttable, Layout, Line, PartitionConfig, Point, Polygon, Vector,
    partition,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Strategy: a convex polygon with vertices on an ellipse.
fn convex_polygon() -> impl Strategy<Value = Polygon> {
    (
        20.0..800.0f64,
        20.0..800.0f64,
        prop::collection::btree_set(0..360u32, 3..16),
    )
        .prop_filter_map("degenerate polygon", |(rx, ry, degrees)| {
            let points = degrees
                .into_iter()
                .map(|d| {
                    let a = (d as f64).to_radians();
                    Point::new(rx * (1.0 + a.cos()), ry * (1.0 + a.sin()))
                })
                .collect();
            Polygon::new(points).ok().filter(|p| p.area() > 1.0)
        })
}

fn rectangle() -> impl Strategy<Value = Polygon> {
    (10.0..1200.0f64, 10.0..1200.0f64)
        .prop_map(|(w, h)| Polygon::rectangle(0.0, 0.0, w, h).expect("positive size"))
}

fn any_polygon() -> impl Strategy<Value = Polygon> {
    prop_oneof![rectangle(), convex_polygon()]
}

fn relative_gap(total: f64, expected: f64) -> f64 {
    (total - expected).abs() / expected
}

fn coefficient_of_variation(areas: &[f64]) -> f64 {
    let n = areas.len() as f64;
    let mean = areas.iter().sum::<f64>() / n;
    let var = areas.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;
    var.sqrt() / mean
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // 1. Cells cover the polygon and the count is either exact or reported short
    #[test]
    fn partition_preserves_area(poly in any_polygon(), n in 1..=200usize, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let result = partition(&poly, n, &mut rng);
        let total: f64 = result.cells.iter().map(Polygon::area).sum();
        prop_assert!(relative_gap(total, poly.area()) < 1e-6, "total={total} area={}", poly.area());
        prop_assert_eq!(result.report.achieved, result.cells.len());
        prop_assert!(result.cells.len() == n || result.report.is_short());
    }

    // 2. A straddling line cut loses no area and no original vertex
    #[test]
    fn line_cut_conserves(poly in any_polygon(), angle in 0.0..TAU) {
        let line = Line::from_angle(poly.interior_point(), angle);
        let (a, b) = cut_with_line(&poly, &line);
        if let Ok((pa, pb)) = poly.split(&Cut::Line(line)) {
            prop_assert!(relative_gap(pa.area() + pb.area(), poly.area()) < 1e-9);
        }
        for v in poly.vertices() {
            prop_assert!(a.contains(v) || b.contains(v));
        }
    }

    // 2b. Same for circle cuts, where both pieces share the sampled arc
    #[test]
    fn circle_cut_conserves(poly in convex_polygon(), scale in 0.3..1.5f64) {
        let bounds = poly.bounds();
        let circle = Circle {
            center: Point::new(bounds.min_x, bounds.min_y),
            radius: bounds.shorter_side() * scale,
        };
        let cut = Cut::Circle { circle, arc: ArcSampling::default() };
        if let Ok((inside, outside)) = poly.split(&cut) {
            prop_assert!(relative_gap(inside.area() + outside.area(), poly.area()) < 1e-6);
        }
    }

    // 4. Circles that swallow or miss the polygon do not cut it
    #[test]
    fn circle_without_straddle_is_no_cut(poly in any_polygon(), angle in 0.0..TAU) {
        let bounds = poly.bounds();
        let center = bounds.center();
        let reach = bounds.width.hypot(bounds.height);
        let swallow = Circle { center, radius: reach };
        prop_assert!(cut_with_circle(&poly, &swallow, &ArcSampling::default()).is_none());

        let far = Circle {
            center: center + Vector::new(angle.cos(), angle.sin()) * reach * 3.0,
            radius: reach,
        };
        prop_assert!(cut_with_circle(&poly, &far, &ArcSampling::default()).is_none());
        let (a, b) = poly.cut(&Cut::Circle { circle: far, arc: ArcSampling::default() });
        prop_assert!(a.is_none() && b.is_none());
    }

    // 3. Leaf areas stay reasonably even for any seed
    #[test]
    fn leaf_areas_are_balanced(poly in rectangle(), n in 2..=64usize, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let result = partition(&poly, n, &mut rng);
        let areas: Vec<f64> = result.cells.iter().map(Polygon::area).collect();
        prop_assert!(coefficient_of_variation(&areas) < 1.0);
    }
}

#[test]
fn power_of_two_counts_are_tightly_balanced() {
    let poly = Polygon::rectangle(0.0, 0.0, 800.0, 600.0).unwrap();
    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        let result = partition(&poly, 16, &mut rng);
        assert_eq!(result.cells.len(), 16);
        let areas: Vec<f64> = result.cells.iter().map(Polygon::area).collect();
        let cv = coefficient_of_variation(&areas);
        assert!(cv < 0.5, "seed {seed}: cv={cv}");
    }
}

#[test]
fn square_board_of_four_is_balanced() {
    let target = 300.0 * 300.0 / 4.0;
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let layout = Layout::shattered(300.0, 300.0, 4, &PartitionConfig::default(), &mut rng).unwrap();
        assert_eq!(layout.cells.len(), 4);
        assert_eq!(layout.effective_count(), 4);
        for cell in &layout.cells {
            let area = cell.polygon.area();
            assert!(
                (area - target).abs() <= 0.35 * target,
                "seed {seed}: cell area {area}"
            );
        }
    }
}
