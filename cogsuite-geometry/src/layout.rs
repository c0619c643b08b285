//! Labelled boards built from partitions or regular grids.

use cogsuite_core::GeometryError;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::partition::{PartitionConfig, PartitionReport, Partitioner};
use crate::polygon::{Point, Polygon};

const MIN_FONT_PX: f64 = 12.0;
const MAX_FONT_PX: f64 = 60.0;
const MAX_LABEL_TILT_DEG: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutKind {
    /// Irregular cells from the recursive partitioner.
    Shattered,
    /// A `k × k` grid of rectangles.
    Grid,
}

/// One clickable region of a board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub polygon: Polygon,
    /// `None` only for surplus cells beyond the effective label count.
    pub label: Option<u32>,
    /// Where the label is drawn; always inside the polygon.
    pub anchor: Point,
    /// Label tilt in degrees.
    pub rotation_deg: f64,
}

/// A board: cells covering a `width × height` surface, labelled `1..=effective_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    pub kind: LayoutKind,
    pub width: f64,
    pub height: f64,
    pub cells: Vec<Cell>,
    pub report: PartitionReport,
    pub font_px: f64,
}

fn check_surface(width: f64, height: f64) -> Result<Polygon, GeometryError> {
    if !(width.is_finite() && height.is_finite()) {
        return Err(GeometryError::InvalidSurface { width, height });
    }
    Polygon::rectangle(0.0, 0.0, width, height)
}

impl Layout {
    /// Partitions the surface into `count` irregular cells.
    ///
    /// If the partitioner falls short, only the achieved number of labels is
    /// handed out so that every label `1..=effective_count` has a cell.
    pub fn shattered<R: Rng + ?Sized>(
        width: f64,
        height: f64,
        count: usize,
        config: &PartitionConfig,
        rng: &mut R,
    ) -> Result<Self, GeometryError> {
        let surface = check_surface(width, height)?;
        let partition = Partitioner::new(config.clone()).partition(&surface, count, rng);

        let avg_area = width * height / count.max(1) as f64;
        let font_px = (avg_area.sqrt() * 0.4).clamp(MIN_FONT_PX, MAX_FONT_PX);

        let layout = Self::label(
            LayoutKind::Shattered,
            width,
            height,
            partition.cells,
            partition.report,
            font_px,
            rng,
        );
        info!(
            requested = count,
            effective = layout.effective_count(),
            "shattered layout ready"
        );
        Ok(layout)
    }

    /// A `k × k` grid of equal rectangles.
    pub fn grid<R: Rng + ?Sized>(
        width: f64,
        height: f64,
        k: usize,
        rng: &mut R,
    ) -> Result<Self, GeometryError> {
        check_surface(width, height)?;
        let k = k.max(1);
        let (w, h) = (width / k as f64, height / k as f64);
        let cells = (0..k * k)
            .map(|i| Polygon::rectangle((i % k) as f64 * w, (i / k) as f64 * h, w, h))
            .collect::<Result<Vec<_>, _>>()?;
        let report = PartitionReport {
            requested: k * k,
            achieved: k * k,
            repairs: 0,
        };
        let mut layout = Self::label(LayoutKind::Grid, width, height, cells, report, w.min(h) * 0.5, rng);
        for cell in &mut layout.cells {
            cell.rotation_deg = 0.0;
        }
        Ok(layout)
    }

    fn label<R: Rng + ?Sized>(
        kind: LayoutKind,
        width: f64,
        height: f64,
        polygons: Vec<Polygon>,
        report: PartitionReport,
        font_px: f64,
        rng: &mut R,
    ) -> Self {
        let effective = report.requested.min(polygons.len());
        let mut labels: Vec<u32> = (1..=effective as u32).collect();
        labels.shuffle(rng);

        let cells = polygons
            .into_iter()
            .enumerate()
            .map(|(i, polygon)| Cell {
                anchor: polygon.interior_point(),
                label: labels.get(i).copied(),
                rotation_deg: rng.random_range(-MAX_LABEL_TILT_DEG..=MAX_LABEL_TILT_DEG),
                polygon,
            })
            .collect();

        Self {
            kind,
            width,
            height,
            cells,
            report,
            font_px,
        }
    }

    /// Number of labels in play: the requested count, reduced to the number
    /// of cells when partitioning fell short.
    pub fn effective_count(&self) -> usize {
        self.report.requested.min(self.cells.len())
    }

    /// The cell under `point`, if any.
    pub fn cell_at(&self, point: &Point) -> Option<usize> {
        self.cells.iter().position(|c| c.polygon.contains(point))
    }

    pub fn cell_for_label(&self, label: u32) -> Option<usize> {
        self.cells.iter().position(|c| c.label == Some(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn rejects_empty_surface() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = Layout::shattered(0.0, 300.0, 4, &PartitionConfig::default(), &mut rng);
        assert!(matches!(err, Err(GeometryError::InvalidSurface { .. })));
        assert!(Layout::grid(100.0, f64::NAN, 3, &mut rng).is_err());
    }

    #[test]
    fn labels_are_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let layout = Layout::shattered(600.0, 400.0, 25, &PartitionConfig::default(), &mut rng).unwrap();
        let mut labels: Vec<u32> = layout.cells.iter().filter_map(|c| c.label).collect();
        labels.sort_unstable();
        let expected: Vec<u32> = (1..=layout.effective_count() as u32).collect();
        assert_eq!(labels, expected);
        for cell in &layout.cells {
            assert!(cell.polygon.contains(&cell.anchor));
            assert!(cell.rotation_deg.abs() <= MAX_LABEL_TILT_DEG);
        }
        assert!((MIN_FONT_PX..=MAX_FONT_PX).contains(&layout.font_px));
    }

    #[test]
    fn shortfall_shrinks_effective_count() {
        let polygons = vec![
            Polygon::rectangle(0.0, 0.0, 10.0, 10.0).unwrap(),
            Polygon::rectangle(10.0, 0.0, 10.0, 10.0).unwrap(),
        ];
        let report = PartitionReport {
            requested: 5,
            achieved: 2,
            repairs: 0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let layout = Layout::label(LayoutKind::Shattered, 20.0, 10.0, polygons, report, 12.0, &mut rng);
        assert_eq!(layout.effective_count(), 2);
        assert!(layout.cell_for_label(1).is_some());
        assert!(layout.cell_for_label(2).is_some());
        assert!(layout.cell_for_label(3).is_none());
    }

    #[test]
    fn grid_routes_clicks() {
        let mut rng = StdRng::seed_from_u64(2);
        let layout = Layout::grid(300.0, 300.0, 3, &mut rng).unwrap();
        assert_eq!(layout.cells.len(), 9);
        assert_eq!(layout.effective_count(), 9);
        assert_eq!(layout.font_px, 50.0);
        assert_eq!(layout.cell_at(&Point::new(150.0, 150.0)), Some(4));
        assert_eq!(layout.cell_at(&Point::new(250.0, 50.0)), Some(2));
        assert_eq!(layout.cell_at(&Point::new(400.0, 50.0)), None);
        let five = layout.cell_for_label(5).unwrap();
        assert_eq!(layout.cells[five].label, Some(5));
    }
}
