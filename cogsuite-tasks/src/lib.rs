//! The games of the suite. Every timed task implements
//! [`cogsuite_session::Task`]; the search board is driven directly by the host.

pub mod cpt;
pub mod flanker;
pub mod go_no_go;
pub mod matrix;
pub mod mental_rotation;
pub mod nback;
pub mod search;
pub mod sequence_recall;
pub mod task_switching;

use cogsuite_core::ConfigError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub use cpt::{Cpt, CptConfig};
pub use flanker::{Flanker, FlankerConfig};
pub use go_no_go::{GoNoGo, GoNoGoConfig};
pub use matrix::{MatrixConfig, MatrixFigure, MatrixReasoning, ShapeKind};
pub use mental_rotation::{MentalRotation, MentalRotationConfig};
pub use nback::{NBack, NBackConfig};
pub use search::{HighlightPolicy, SearchBoard, SearchConfig};
pub use sequence_recall::{SequenceRecall, SequenceRecallConfig};
pub use task_switching::{TaskSwitching, TaskSwitchingConfig};

/// The single key of detection tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Press;

/// Verbal performance band shown at the end of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    Excellent,
    Good,
    Average,
    Pass,
    Poor,
}

/// Per-task settings, one section per game. Missing sections keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    pub digit_span: SequenceRecallConfig,
    #[serde(deserialize_with = "corsi_section")]
    pub corsi: SequenceRecallConfig,
    pub nback: NBackConfig,
    pub go_no_go: GoNoGoConfig,
    pub task_switching: TaskSwitchingConfig,
    pub mental_rotation: MentalRotationConfig,
    pub cpt: CptConfig,
    pub flanker: FlankerConfig,
    pub matrix: MatrixConfig,
    pub search: SearchConfig,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            digit_span: SequenceRecallConfig::digits(),
            corsi: SequenceRecallConfig::corsi(),
            nback: NBackConfig::default(),
            go_no_go: GoNoGoConfig::default(),
            task_switching: TaskSwitchingConfig::default(),
            mental_rotation: MentalRotationConfig::default(),
            cpt: CptConfig::default(),
            flanker: FlankerConfig::default(),
            matrix: MatrixConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

/// Fields given for the Corsi section override the Corsi defaults rather
/// than the digit-span ones.
fn corsi_section<'de, D: Deserializer<'de>>(d: D) -> Result<SequenceRecallConfig, D::Error> {
    let overrides = serde_json::Value::deserialize(d)?;
    let mut merged = serde_json::to_value(SequenceRecallConfig::corsi()).map_err(D::Error::custom)?;
    match (merged.as_object_mut(), overrides) {
        (Some(base), serde_json::Value::Object(fields)) => base.extend(fields),
        _ => return Err(D::Error::custom("corsi section must be an object")),
    }
    serde_json::from_value(merged).map_err(D::Error::custom)
}

impl TasksConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.digit_span.validate()?;
        self.corsi.validate()?;
        self.nback.validate()?;
        self.go_no_go.validate()?;
        self.task_switching.validate()?;
        self.mental_rotation.validate()?;
        self.cpt.validate()?;
        self.flanker.validate()?;
        self.matrix.validate()?;
        self.search.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_fall_back_to_defaults() {
        let cfg: TasksConfig =
            serde_json::from_str(r#"{ "nback": { "n": 3 }, "corsi": { "alphabet": 12 } }"#).unwrap();
        assert_eq!(cfg.nback.n, 3);
        assert_eq!(cfg.nback.rounds, 20);
        assert_eq!(cfg.corsi.alphabet, 12);
        assert_eq!(cfg.go_no_go, GoNoGoConfig::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn invalid_section_is_reported() {
        let cfg: TasksConfig = serde_json::from_str(r#"{ "go_no_go": { "trials": 0 } }"#).unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }
}
