pub mod error;
pub mod phase;
pub mod render;
pub mod stimulus;
pub mod trial;

pub use error::{ConfigError, GeometryError, InputRejected, SessionError};
pub use phase::{RunningPhase, SessionPhase};
pub use render::RenderInstruction;
pub use stimulus::{ArrowDirection, Stimulus};
pub use trial::{Outcome, ResponseMode, ResponseRecord, ResponseWindow, Trial, TrialTiming};
