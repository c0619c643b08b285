//! Matrix-reasoning figures as paths in a 100 × 100 cell.

use cogsuite_tasks::matrix::{MatrixFigure, ShapeKind};
use tiny_skia::{Path, PathBuilder, Rect};

const C: f32 = 50.0;

const STAR: [(f32, f32); 10] = [
    (0.0, -1.0),
    (0.235, -0.324),
    (0.951, -0.309),
    (0.380, 0.124),
    (0.588, 0.809),
    (0.0, 0.400),
    (-0.588, 0.809),
    (-0.380, 0.124),
    (-0.951, -0.309),
    (-0.235, -0.324),
];

fn rect(x: f32, y: f32, w: f32, h: f32) -> Option<Path> {
    Rect::from_xywh(x, y, w, h).map(PathBuilder::from_rect)
}

fn polygon(points: &[(f32, f32)]) -> Option<Path> {
    let (&(x, y), rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(x, y);
    for &(x, y) in rest {
        pb.line_to(x, y);
    }
    pb.close();
    pb.finish()
}

/// Outline of `figure` in cell coordinates, unrotated.
pub fn figure_path(figure: &MatrixFigure) -> Option<Path> {
    let s = f32::from(figure.size);
    let half = s / 2.0;
    match figure.kind {
        ShapeKind::Square => rect(C - half, C - half, s, s),
        ShapeKind::Circle => PathBuilder::from_circle(C, C, half),
        ShapeKind::Triangle => {
            let h = s * 3f32.sqrt() / 2.0;
            polygon(&[(C, C - h / 2.0), (C + half, C + h / 2.0), (C - half, C + h / 2.0)])
        }
        ShapeKind::Diamond => {
            polygon(&[(C, C - half), (C + half, C), (C, C + half), (C - half, C)])
        }
        ShapeKind::Cross => {
            let arm = s / 3.0;
            let mut pb = PathBuilder::new();
            pb.push_rect(Rect::from_xywh(C - arm / 2.0, C - half, arm, s)?);
            pb.push_rect(Rect::from_xywh(C - half, C - arm / 2.0, s, arm)?);
            pb.finish()
        }
        ShapeKind::Star => {
            let r = s * 0.7;
            let points: Vec<(f32, f32)> = STAR.iter().map(|&(x, y)| (C + x * r, C + y * r)).collect();
            polygon(&points)
        }
        ShapeKind::LeftHalf => rect(C - half, C - half, half, s),
        ShapeKind::RightHalf => rect(C, C - half, half, s),
        ShapeKind::TopHalf => rect(C - half, C - half, s, half),
        ShapeKind::BottomHalf => rect(C - half, C, s, half),
        ShapeKind::VerticalBar => rect(C - s / 8.0, C - half, s / 4.0, s),
        ShapeKind::HorizontalBar => rect(C - half, C - s / 8.0, s, s / 4.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [ShapeKind; 12] = [
        ShapeKind::Square,
        ShapeKind::Circle,
        ShapeKind::Triangle,
        ShapeKind::Diamond,
        ShapeKind::Cross,
        ShapeKind::Star,
        ShapeKind::LeftHalf,
        ShapeKind::RightHalf,
        ShapeKind::TopHalf,
        ShapeKind::BottomHalf,
        ShapeKind::VerticalBar,
        ShapeKind::HorizontalBar,
    ];

    #[test]
    fn every_kind_fits_the_cell() {
        for kind in KINDS {
            let path = figure_path(&MatrixFigure::new(kind).sized(70)).unwrap();
            let b = path.bounds();
            assert!(b.left() >= 0.0 && b.right() <= 100.0, "{kind:?}");
            assert!(b.top() >= 0.0 && b.bottom() <= 100.0, "{kind:?}");
        }
    }

    #[test]
    fn halves_sit_on_their_side() {
        let left = figure_path(&MatrixFigure::new(ShapeKind::LeftHalf)).unwrap().bounds();
        let right = figure_path(&MatrixFigure::new(ShapeKind::RightHalf)).unwrap().bounds();
        assert!(left.right() <= C && right.left() >= C);
        let top = figure_path(&MatrixFigure::new(ShapeKind::TopHalf)).unwrap().bounds();
        assert!(top.bottom() <= C);
    }

    #[test]
    fn size_scales_the_square() {
        let b = figure_path(&MatrixFigure::new(ShapeKind::Square).sized(20)).unwrap().bounds();
        assert!((b.width() - 20.0).abs() < 1e-3);
    }
}
