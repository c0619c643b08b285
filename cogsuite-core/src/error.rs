use thiserror::Error;

/// A cut or surface that cannot produce valid polygons.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("cut produced a piece with {vertices} vertices")]
    Degenerate { vertices: usize },

    #[error("polygon lies entirely on one side of the cut")]
    NoStraddle,

    #[error("drawing surface must be positive, got {width}x{height}")]
    InvalidSurface { width: f64, height: f64 },
}

/// Why a response was discarded without being scored.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRejected {
    #[error("no session is running")]
    NotRunning,

    #[error("response window is not open")]
    WindowClosed,

    #[error("response after {reaction_ms} ms is below the plausible minimum")]
    TooEarly { reaction_ms: u64 },

    #[error("trial already has a response")]
    AlreadyResponded,

    #[error("response arrived at or after the deadline")]
    AfterDeadline,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("a session is already running")]
    AlreadyRunning,

    #[error("no session is running")]
    NotRunning,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
