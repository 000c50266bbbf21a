//! # Orchestration Request Handler
//!
//! Validates an inbound arm/takeoff body, resolves its targets from the
//! registry, runs the fan-out and shapes the response body.
//!
//! Only validation failures produce a rejected (`ok: false`) response. Once
//! dispatch begins the response is `ok: true` even if every device failed;
//! failure detail lives in each device's outcome.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::cancellation::CancellationSignal;
use super::fan_out::FanOutCoordinator;
use super::types::{CommandParams, DeviceOutcome};
use crate::config::{FleetConfig, ValidationConfig};
use crate::constants::{message_types, DeviceGroup};
use crate::device::{collect_targets, DeviceId, DeviceRegistry};
use crate::error::{FleetError, ValidationError};

/// Inbound command kinds this handler serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Arm and take off every connected device
    ArmTakeoff,
    /// Arm and take off one device group; `group` is required
    GroupTakeoff,
}

impl CommandKind {
    pub fn message_type(&self) -> &'static str {
        match self {
            CommandKind::ArmTakeoff => message_types::ARM_TAKEOFF,
            CommandKind::GroupTakeoff => message_types::GROUP_TAKEOFF,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message_type())
    }
}

impl FromStr for CommandKind {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            message_types::ARM_TAKEOFF => Ok(CommandKind::ArmTakeoff),
            message_types::GROUP_TAKEOFF => Ok(CommandKind::GroupTakeoff),
            other => Err(FleetError::UnknownMessageType(other.to_string())),
        }
    }
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub kind: CommandKind,
    pub altitude_m: f64,
    pub group: DeviceGroup,
}

/// Body of a request that was dispatched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmTakeoffReport {
    pub ok: bool,
    #[serde(rename = "type")]
    pub message_type: String,
    pub alt: f64,
    pub count: usize,
    pub targets: Vec<DeviceId>,
    pub results: BTreeMap<DeviceId, DeviceOutcome>,
}

/// Body of a request rejected before dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedResponse {
    pub ok: bool,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandResponse {
    Dispatched(ArmTakeoffReport),
    Rejected(RejectedResponse),
}

impl CommandResponse {
    pub fn rejected(error: impl Into<String>) -> Self {
        CommandResponse::Rejected(RejectedResponse {
            ok: false,
            error: error.into(),
        })
    }

    pub fn is_ok(&self) -> bool {
        match self {
            CommandResponse::Dispatched(report) => report.ok,
            CommandResponse::Rejected(_) => false,
        }
    }

    pub fn report(&self) -> Option<&ArmTakeoffReport> {
        match self {
            CommandResponse::Dispatched(report) => Some(report),
            CommandResponse::Rejected(_) => None,
        }
    }

    pub fn to_body(&self) -> Result<Value, FleetError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Parse and range-check the `alt` field. Numbers and numeric strings are
/// accepted; the range is `(min, max]`.
pub fn validate_altitude(
    alt: Option<&Value>,
    limits: &ValidationConfig,
) -> Result<f64, ValidationError> {
    let altitude = match alt {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|a| !a.is_nan())
    .ok_or(ValidationError::AltitudeNotANumber)?;

    if altitude <= limits.min_altitude_m || altitude > limits.max_altitude_m {
        return Err(ValidationError::AltitudeOutOfRange {
            value: altitude,
            min: limits.min_altitude_m,
            max: limits.max_altitude_m,
        });
    }
    Ok(altitude)
}

/// Parse the optional `group` field. Group takeoffs must name one.
pub fn validate_group(
    group: Option<&Value>,
    kind: CommandKind,
) -> Result<DeviceGroup, ValidationError> {
    match (group, kind) {
        (None | Some(Value::Null), CommandKind::GroupTakeoff) => Err(ValidationError::MissingGroup),
        (None | Some(Value::Null), CommandKind::ArmTakeoff) => Ok(DeviceGroup::All),
        (Some(Value::String(name)), _) => name.parse(),
        (Some(other), _) => Err(ValidationError::UnknownGroup(other.to_string())),
    }
}

pub struct OrchestrationRequestHandler {
    registry: Arc<dyn DeviceRegistry>,
    coordinator: FanOutCoordinator,
    config: FleetConfig,
}

impl OrchestrationRequestHandler {
    pub fn new(registry: Arc<dyn DeviceRegistry>, config: FleetConfig) -> Self {
        Self {
            registry,
            coordinator: FanOutCoordinator::new(&config.orchestration),
            config,
        }
    }

    /// Swap the coordinator, e.g. to disable jitter in simulations.
    pub fn with_coordinator(mut self, coordinator: FanOutCoordinator) -> Self {
        self.coordinator = coordinator;
        self
    }

    pub fn validate(&self, kind: CommandKind, body: &Value) -> Result<CommandRequest, ValidationError> {
        let altitude_m = validate_altitude(body.get("alt"), &self.config.validation)?;
        let group = validate_group(body.get("group"), kind)?;
        Ok(CommandRequest {
            kind,
            altitude_m,
            group,
        })
    }

    pub async fn handle(&self, kind: CommandKind, body: &Value) -> CommandResponse {
        self.handle_with_cancellation(kind, body, CancellationSignal::never())
            .await
    }

    #[instrument(skip(self, body, cancel))]
    pub async fn handle_with_cancellation(
        &self,
        kind: CommandKind,
        body: &Value,
        cancel: CancellationSignal,
    ) -> CommandResponse {
        let request = match self.validate(kind, body) {
            Ok(request) => request,
            Err(error) => {
                warn!(error = %error, "Rejecting request before dispatch");
                return CommandResponse::rejected(error.to_string());
            }
        };

        let targets = collect_targets(self.registry.as_ref(), request.group);
        let target_ids: Vec<DeviceId> = targets.iter().map(|d| d.id().to_string()).collect();

        info!(
            altitude_m = request.altitude_m,
            group = %request.group,
            count = target_ids.len(),
            "Dispatching arm/takeoff"
        );

        let params = CommandParams {
            altitude_m: request.altitude_m,
            force_arm: self.config.orchestration.force_arm,
            guided_mode: self.config.orchestration.guided_mode.clone(),
        };
        let results = self
            .coordinator
            .orchestrate_with_cancellation(targets, params, cancel)
            .await;

        CommandResponse::Dispatched(ArmTakeoffReport {
            ok: true,
            message_type: kind.message_type().to_string(),
            alt: request.altitude_m,
            count: target_ids.len(),
            targets: target_ids,
            results: results.into_iter().collect(),
        })
    }
}
