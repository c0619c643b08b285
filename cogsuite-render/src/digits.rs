//! Seven-segment numerals, so labels need no font.

use tiny_skia::{Path, PathBuilder};

// Segment bits: a=top, b=top right, c=bottom right, d=bottom, e=bottom left,
// f=top left, g=middle.
const DIGITS: [u8; 10] = [0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F];

/// Width of a digit relative to its height.
pub const ASPECT: f32 = 0.5;
/// Gap between digits relative to the height.
const SPACING: f32 = 0.25;

/// Segment endpoints in a `ASPECT × 1` box.
fn segment(bit: u8) -> ((f32, f32), (f32, f32)) {
    let w = ASPECT;
    match bit {
        0 => ((0.0, 0.0), (w, 0.0)),
        1 => ((w, 0.0), (w, 0.5)),
        2 => ((w, 0.5), (w, 1.0)),
        3 => ((0.0, 1.0), (w, 1.0)),
        4 => ((0.0, 0.5), (0.0, 1.0)),
        5 => ((0.0, 0.0), (0.0, 0.5)),
        _ => ((0.0, 0.5), (w, 0.5)),
    }
}

/// Number of lit segments for a decimal digit.
pub fn lit_segments(digit: char) -> usize {
    digit
        .to_digit(10)
        .map_or(0, |d| DIGITS[d as usize].count_ones() as usize)
}

/// Width of `text` rendered at `height` px.
pub fn text_width(text: &str, height: f32) -> f32 {
    let n = text.chars().filter(char::is_ascii_digit).count() as f32;
    if n == 0.0 {
        return 0.0;
    }
    height * (n * ASPECT + (n - 1.0) * SPACING)
}

/// Stroke path for the digits of `text`, centred on `(cx, cy)`. Non-digits
/// are skipped.
pub fn numeral_path(text: &str, cx: f32, cy: f32, height: f32) -> Option<Path> {
    let mut x = cx - text_width(text, height) / 2.0;
    let y = cy - height / 2.0;
    let mut pb = PathBuilder::new();
    for d in text.chars().filter_map(|c| c.to_digit(10)) {
        let bits = DIGITS[d as usize];
        for bit in (0..7).filter(|b| bits & (1 << b) != 0) {
            let ((x0, y0), (x1, y1)) = segment(bit);
            pb.move_to(x + x0 * height, y + y0 * height);
            pb.line_to(x + x1 * height, y + y1 * height);
        }
        x += height * (ASPECT + SPACING);
    }
    pb.finish()
}
