//! # Fleet Orchestrator Configuration
//!
//! Layered configuration for the orchestration engine. Values come from, in
//! increasing precedence:
//!
//! - compiled-in defaults ([`FleetConfig::default`])
//! - `config/fleet.toml`
//! - `config/fleet.{environment}.toml`
//! - `FLEET_*` environment variables (`__` separates sections, e.g.
//!   `FLEET_ORCHESTRATION__FORCE_ARM=true`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fleet_orchestrator::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let jitter = manager.config().orchestration.jitter_window();
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::defaults;
use crate::error::{FleetError, FleetResult};
use crate::orchestration::stage::{Stage, StagePolicy};

pub use loader::ConfigManager;

/// Root configuration structure mirroring `config/fleet.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Stage timing and device command settings
    pub orchestration: OrchestrationConfig,

    /// Request validation limits
    pub validation: ValidationConfig,

    /// Command processor settings
    pub messaging: MessagingConfig,
}

/// Timing and policy for the per-device stage sequence
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    /// Upper bound (exclusive) of the random dispatch delay per device
    pub jitter_window_ms: u64,
    /// Wait after a mode change so the device can report its new mode
    pub mode_settle_ms: u64,
    /// Wait after arming so safety interlock state can propagate
    pub arm_settle_ms: u64,
    /// Bound on each capability call; 0 disables the bound
    pub stage_timeout_ms: u64,
    /// Bypass pre-arm safety checks. Only for simulation.
    pub force_arm: bool,
    /// Flight mode requested before arming
    pub guided_mode: String,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            jitter_window_ms: defaults::JITTER_WINDOW_MS,
            mode_settle_ms: defaults::MODE_SETTLE_MS,
            arm_settle_ms: defaults::ARM_SETTLE_MS,
            stage_timeout_ms: defaults::STAGE_TIMEOUT_MS,
            force_arm: false,
            guided_mode: defaults::GUIDED_MODE.to_string(),
        }
    }
}

impl OrchestrationConfig {
    pub fn jitter_window(&self) -> Duration {
        Duration::from_millis(self.jitter_window_ms)
    }

    pub fn stage_timeout(&self) -> Option<Duration> {
        (self.stage_timeout_ms > 0).then(|| Duration::from_millis(self.stage_timeout_ms))
    }

    /// Derive the policy for a stage from the configured settle delays.
    pub fn stage_policy(&self, stage: Stage) -> StagePolicy {
        match stage {
            Stage::SetMode => StagePolicy {
                required: false,
                settle: Duration::from_millis(self.mode_settle_ms),
            },
            Stage::Arm => StagePolicy {
                required: true,
                settle: Duration::from_millis(self.arm_settle_ms),
            },
            Stage::Takeoff => StagePolicy {
                required: true,
                settle: Duration::ZERO,
            },
        }
    }

    /// Policy table in execution order
    pub fn stage_policies(&self) -> [(Stage, StagePolicy); 3] {
        Stage::SEQUENCE.map(|stage| (stage, self.stage_policy(stage)))
    }

    /// Configuration with every delay zeroed, for simulations and tests.
    pub fn immediate() -> Self {
        Self {
            jitter_window_ms: 0,
            mode_settle_ms: 0,
            arm_settle_ms: 0,
            ..Self::default()
        }
    }
}

/// Altitude bounds applied to inbound requests
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Exclusive lower bound in metres
    pub min_altitude_m: f64,
    /// Inclusive upper bound in metres
    pub max_altitude_m: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_altitude_m: defaults::MIN_ALTITUDE_M,
            max_altitude_m: defaults::MAX_ALTITUDE_M,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MessagingConfig {
    pub command_buffer_size: usize,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            command_buffer_size: defaults::COMMAND_BUFFER_SIZE,
        }
    }
}

impl FleetConfig {
    /// Reject values that would make the orchestrator misbehave.
    pub fn validate(&self) -> FleetResult<()> {
        let validation = &self.validation;
        if !validation.min_altitude_m.is_finite() || !validation.max_altitude_m.is_finite() {
            return Err(FleetError::Configuration(
                "altitude bounds must be finite".to_string(),
            ));
        }
        if validation.max_altitude_m <= validation.min_altitude_m {
            return Err(FleetError::Configuration(format!(
                "max_altitude_m ({}) must exceed min_altitude_m ({})",
                validation.max_altitude_m, validation.min_altitude_m
            )));
        }
        if self.orchestration.guided_mode.trim().is_empty() {
            return Err(FleetError::Configuration(
                "guided_mode must not be empty".to_string(),
            ));
        }
        if self.messaging.command_buffer_size == 0 {
            return Err(FleetError::Configuration(
                "command_buffer_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = FleetConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.orchestration.force_arm);
        assert_eq!(config.orchestration.guided_mode, "guided");
        assert_eq!(config.orchestration.jitter_window(), Duration::from_millis(1_500));
    }

    #[test]
    fn test_stage_policies() {
        let config = OrchestrationConfig::default();
        let set_mode = config.stage_policy(Stage::SetMode);
        assert!(!set_mode.required);
        assert_eq!(set_mode.settle, Duration::from_millis(1_500));

        let arm = config.stage_policy(Stage::Arm);
        assert!(arm.required);
        assert_eq!(arm.settle, Duration::from_millis(2_000));

        assert!(config.stage_policy(Stage::Takeoff).required);

        let table = config.stage_policies();
        assert_eq!(table.map(|(stage, _)| stage), Stage::SEQUENCE);
        assert_eq!(table[2].1.settle, Duration::ZERO);
    }

    #[test]
    fn test_zero_timeout_disables_bound() {
        let config = OrchestrationConfig {
            stage_timeout_ms: 0,
            ..OrchestrationConfig::default()
        };
        assert_eq!(config.stage_timeout(), None);
    }

    #[test]
    fn test_inverted_altitude_bounds_rejected() {
        let mut config = FleetConfig::default();
        config.validation.max_altitude_m = -1.0;
        assert!(matches!(
            config.validate(),
            Err(FleetError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_guided_mode_rejected() {
        let mut config = FleetConfig::default();
        config.orchestration.guided_mode = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
