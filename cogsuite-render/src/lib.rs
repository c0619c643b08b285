//! Rasterizes boards and matrix puzzles into `tiny_skia` pixmaps.
//!
//! Nothing here feeds back into the games; the renderer only reads layouts,
//! cell states and figures.

pub mod digits;
pub mod figure;

use std::collections::HashMap;
use std::path::Path as FsPath;

use anyhow::{Context, Result};
use cogsuite_geometry::Layout;
use cogsuite_tasks::matrix::{Fill, MatrixFigure, MatrixPuzzle};
use cogsuite_tasks::search::{CellState, SearchBoard};
use tiny_skia::{
    Color, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};
use tracing::{debug, info};

/// Cell units of a matrix figure.
const FIGURE_UNITS: f32 = 100.0;
const FIGURE_STROKE: f32 = 3.0;
const OUTLINE_PX: f32 = 1.5;
/// Label stroke width relative to its height.
const LABEL_WEIGHT: f32 = 0.12;

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub idle: Color,
    pub found: Color,
    pub flash: Color,
    pub outline: Color,
    pub label: Color,
    pub found_label: Color,
    pub figure: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            idle: Color::from_rgba8(249, 249, 249, 255),
            found: Color::from_rgba8(221, 221, 221, 255),
            flash: Color::from_rgba8(255, 204, 204, 255),
            outline: Color::from_rgba8(51, 51, 51, 255),
            label: Color::BLACK,
            found_label: Color::from_rgba8(170, 170, 170, 255),
            figure: Color::from_rgba8(30, 30, 30, 255),
        }
    }
}

impl Palette {
    fn cell(&self, state: CellState) -> Color {
        match state {
            CellState::Idle => self.idle,
            CellState::Found => self.found,
            CellState::Flash => self.flash,
        }
    }
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

fn stroke(width: f32) -> Stroke {
    Stroke {
        width,
        ..Stroke::default()
    }
}

pub trait Renderer {
    fn clear(&mut self);
    fn draw_layout(&mut self, layout: &Layout, state: &dyn Fn(usize) -> CellState);
    /// Draws `figure` scaled into the `px × px` square at `(x, y)`.
    fn draw_figure(&mut self, figure: &MatrixFigure, x: f32, y: f32, px: u32);
}

pub struct SkiaRenderer {
    canvas: Pixmap,
    palette: Palette,
    figures: HashMap<(MatrixFigure, u32), Pixmap>,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let canvas = Pixmap::new(width, height)
            .with_context(|| format!("cannot allocate a {width}x{height} canvas"))?;
        let mut renderer = Self {
            canvas,
            palette: Palette::default(),
            figures: HashMap::new(),
        };
        renderer.clear();
        Ok(renderer)
    }

    /// A canvas the size of the layout's surface.
    pub fn for_layout(layout: &Layout) -> Result<Self> {
        Self::new(layout.width.ceil() as u32, layout.height.ceil() as u32)
    }

    /// A canvas holding the 3 × 3 matrix above one row of options.
    pub fn for_puzzle(puzzle: &MatrixPuzzle, cell_px: u32) -> Result<Self> {
        let columns = puzzle.options.len().max(3) as u32;
        Self::new(columns * cell_px, 4 * cell_px + cell_px / 2)
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self.clear();
        self
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.canvas
    }

    pub fn draw_board(&mut self, board: &SearchBoard, now_ns: u64) {
        self.draw_layout(board.layout(), &|cell| board.cell_state(cell, now_ns));
    }

    pub fn draw_puzzle(&mut self, puzzle: &MatrixPuzzle, cell_px: u32) {
        let px = cell_px as f32;
        let left = (self.canvas.width() as f32 - 3.0 * px) / 2.0;
        for (i, cell) in puzzle.cells.iter().enumerate() {
            let (x, y) = (left + (i % 3) as f32 * px, (i / 3) as f32 * px);
            self.frame(x, y, px);
            if let Some(figure) = cell {
                self.draw_figure(figure, x, y, cell_px);
            }
        }
        let top = 3.5 * px;
        for (i, option) in puzzle.options.iter().enumerate() {
            let x = i as f32 * px;
            self.frame(x, top, px);
            self.draw_figure(option, x, top, cell_px);
        }
    }

    fn frame(&mut self, x: f32, y: f32, px: f32) {
        if let Some(rect) = Rect::from_xywh(x, y, px, px) {
            let path = PathBuilder::from_rect(rect);
            self.canvas.stroke_path(
                &path,
                &paint(self.palette.outline),
                &stroke(1.0),
                Transform::identity(),
                None,
            );
        }
    }

    fn figure_pixmap(&self, figure: &MatrixFigure, px: u32) -> Option<Pixmap> {
        let mut pixmap = Pixmap::new(px, px)?;
        let path = figure::figure_path(figure)?;
        let scale = px as f32 / FIGURE_UNITS;
        let half = FIGURE_UNITS / 2.0;
        let transform = Transform::from_rotate_at(f32::from(figure.rotation_deg), half, half)
            .post_scale(scale, scale);
        let color = paint(self.palette.figure);
        if figure.fill == Fill::Solid {
            pixmap.fill_path(&path, &color, FillRule::Winding, transform, None);
        }
        pixmap.stroke_path(&path, &color, &stroke(FIGURE_STROKE), transform, None);
        Some(pixmap)
    }

    pub fn save_png(&self, path: impl AsRef<FsPath>) -> Result<()> {
        let path = path.as_ref();
        self.canvas
            .save_png(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "saved png");
        Ok(())
    }
}

impl Renderer for SkiaRenderer {
    fn clear(&mut self) {
        self.canvas.fill(self.palette.background);
    }

    fn draw_layout(&mut self, layout: &Layout, state: &dyn Fn(usize) -> CellState) {
        let outline = paint(self.palette.outline);
        let label_height = (layout.font_px * 0.8) as f32;
        let label_stroke = stroke((label_height * LABEL_WEIGHT).max(1.0));

        for (i, cell) in layout.cells.iter().enumerate() {
            let mut pb = PathBuilder::new();
            let mut vertices = cell.polygon.vertices().iter();
            let Some(first) = vertices.next() else {
                continue;
            };
            pb.move_to(first.x as f32, first.y as f32);
            for v in vertices {
                pb.line_to(v.x as f32, v.y as f32);
            }
            pb.close();
            let Some(path) = pb.finish() else {
                debug!(cell = i, "skipping degenerate cell");
                continue;
            };

            let cell_state = state(i);
            self.canvas.fill_path(
                &path,
                &paint(self.palette.cell(cell_state)),
                FillRule::EvenOdd,
                Transform::identity(),
                None,
            );
            self.canvas
                .stroke_path(&path, &outline, &stroke(OUTLINE_PX), Transform::identity(), None);

            let Some(label) = cell.label else {
                continue;
            };
            let (ax, ay) = (cell.anchor.x as f32, cell.anchor.y as f32);
            if let Some(numeral) = digits::numeral_path(&label.to_string(), ax, ay, label_height) {
                let color = match cell_state {
                    CellState::Found => self.palette.found_label,
                    _ => self.palette.label,
                };
                let tilt = Transform::from_rotate_at(cell.rotation_deg as f32, ax, ay);
                self.canvas
                    .stroke_path(&numeral, &paint(color), &label_stroke, tilt, None);
            }
        }
        debug!(cells = layout.cells.len(), "layout drawn");
    }

    fn draw_figure(&mut self, figure: &MatrixFigure, x: f32, y: f32, px: u32) {
        let key = (*figure, px);
        if !self.figures.contains_key(&key) {
            match self.figure_pixmap(figure, px) {
                Some(pixmap) => {
                    self.figures.insert(key, pixmap);
                }
                None => {
                    debug!(?figure, "figure has no path");
                    return;
                }
            }
        }
        if let Some(pixmap) = self.figures.get(&key) {
            self.canvas.draw_pixmap(
                x.round() as i32,
                y.round() as i32,
                pixmap.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
    }
}

/// Paints `layout` with every cell in the state `state` reports for it.
pub fn render_layout(layout: &Layout, state: impl Fn(usize) -> CellState) -> Result<Pixmap> {
    let mut renderer = SkiaRenderer::for_layout(layout)?;
    renderer.draw_layout(layout, &state);
    Ok(renderer.into_pixmap())
}

pub fn render_puzzle(puzzle: &MatrixPuzzle, cell_px: u32) -> Result<Pixmap> {
    let mut renderer = SkiaRenderer::for_puzzle(puzzle, cell_px)?;
    renderer.draw_puzzle(puzzle, cell_px);
    Ok(renderer.into_pixmap())
}
