use serde::Serialize;
use std::fmt::Debug;

/// Anything a task can put in front of the participant.
pub trait Stimulus: Clone + Debug + Serialize {
    /// Short human readable form used in logs and result files.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
pub enum ArrowDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ArrowDirection {
    pub fn opposite(self) -> Self {
        match self {
            ArrowDirection::Up => ArrowDirection::Down,
            ArrowDirection::Down => ArrowDirection::Up,
            ArrowDirection::Left => ArrowDirection::Right,
            ArrowDirection::Right => ArrowDirection::Left,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            ArrowDirection::Up => '^',
            ArrowDirection::Down => 'v',
            ArrowDirection::Left => '<',
            ArrowDirection::Right => '>',
        }
    }
}

impl Stimulus for ArrowDirection {
    fn describe(&self) -> String {
        self.glyph().to_string()
    }
}

impl Stimulus for char {
    fn describe(&self) -> String {
        self.to_string()
    }
}

impl Stimulus for u8 {
    fn describe(&self) -> String {
        self.to_string()
    }
}
