//! Command stages and their policies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One ordered step of the per-device command sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SetMode,
    Arm,
    Takeoff,
}

impl Stage {
    /// Fixed execution order within a device's task
    pub const SEQUENCE: [Stage; 3] = [Stage::SetMode, Stage::Arm, Stage::Takeoff];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::SetMode => "set_mode",
            Stage::Arm => "arm",
            Stage::Takeoff => "takeoff",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far a device's task got. `Dispatch` covers the jitter wait before the
/// first stage starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageReached {
    Dispatch,
    SetMode,
    Arm,
    Takeoff,
}

impl From<Stage> for StageReached {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::SetMode => StageReached::SetMode,
            Stage::Arm => StageReached::Arm,
            Stage::Takeoff => StageReached::Takeoff,
        }
    }
}

impl fmt::Display for StageReached {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageReached::Dispatch => f.write_str("dispatch"),
            StageReached::SetMode => f.write_str("set_mode"),
            StageReached::Arm => f.write_str("arm"),
            StageReached::Takeoff => f.write_str("takeoff"),
        }
    }
}

/// Timing and failure tolerance for one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePolicy {
    /// A failure aborts the remaining stages for the device
    pub required: bool,
    /// Wait after a successful stage before the next one starts
    pub settle: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_order() {
        assert_eq!(
            Stage::SEQUENCE,
            [Stage::SetMode, Stage::Arm, Stage::Takeoff]
        );
    }

    #[test]
    fn test_serialized_names_match_display() {
        for stage in Stage::SEQUENCE {
            let json = serde_json::to_value(stage).unwrap();
            assert_eq!(json, serde_json::json!(stage.to_string()));
            assert_eq!(StageReached::from(stage).to_string(), stage.to_string());
        }
        assert_eq!(
            serde_json::to_value(StageReached::Dispatch).unwrap(),
            serde_json::json!("dispatch")
        );
    }
}
