//! # Orchestration Types
//!
//! Parameters passed into a fan-out run and the per-device outcomes it produces.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::stage::StageReached;
use crate::constants::CANCELLED_ERROR;
use crate::device::DeviceId;

/// Per-request parameters shared by every device task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandParams {
    /// Takeoff altitude relative to the launch point, in metres
    pub altitude_m: f64,
    /// Bypass pre-arm safety checks
    pub force_arm: bool,
    /// Mode requested during the SetMode stage
    pub guided_mode: String,
}

/// Terminal record for one device in one orchestration run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceOutcome {
    pub ok: bool,
    pub stage: StageReached,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeviceOutcome {
    /// Every stage ran; takeoff was accepted by the device.
    pub fn succeeded() -> Self {
        Self {
            ok: true,
            stage: StageReached::Takeoff,
            error: None,
        }
    }

    pub fn failed(stage: impl Into<StageReached>, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            stage: stage.into(),
            error: Some(error.into()),
        }
    }

    pub fn cancelled(stage: StageReached) -> Self {
        Self::failed(stage, CANCELLED_ERROR)
    }

    pub fn is_cancelled(&self) -> bool {
        !self.ok && self.error.as_deref() == Some(CANCELLED_ERROR)
    }
}

/// Outcome per targeted device, keyed by device id
pub type OrchestrationResults = HashMap<DeviceId, DeviceOutcome>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::stage::Stage;
    use serde_json::json;

    #[test]
    fn test_success_serialization_omits_error() {
        let value = serde_json::to_value(DeviceOutcome::succeeded()).unwrap();
        assert_eq!(value, json!({"ok": true, "stage": "takeoff"}));
    }

    #[test]
    fn test_failure_serialization() {
        let outcome = DeviceOutcome::failed(Stage::Arm, "arm failed: link lost");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            value,
            json!({"ok": false, "stage": "arm", "error": "arm failed: link lost"})
        );
        assert!(!outcome.is_cancelled());
    }

    #[test]
    fn test_cancelled_outcome() {
        let outcome = DeviceOutcome::cancelled(StageReached::Dispatch);
        assert!(outcome.is_cancelled());
        assert_eq!(outcome.stage, StageReached::Dispatch);
    }
}
