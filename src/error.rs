//! Error types for the fleet orchestrator.
//!
//! Errors are layered the same way failures are contained at runtime:
//! [`DeviceError`] comes out of the capability layer, [`StageError`] ties it to
//! the stage that produced it, [`ValidationError`] rejects a request before any
//! device is contacted, and [`FleetError`] is what escapes to the caller.

use crate::orchestration::stage::Stage;
use std::time::Duration;
use thiserror::Error;

/// Crate-level error. Only validation and whole-system faults end up here;
/// per-device failures are recorded as outcomes instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FleetError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Messaging error: {0}")]
    Messaging(String),
    #[error("unsupported message type: {0}")]
    UnknownMessageType(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for FleetError {
    fn from(error: serde_json::Error) -> Self {
        FleetError::Serialization(error.to_string())
    }
}

impl From<config::ConfigError> for FleetError {
    fn from(error: config::ConfigError) -> Self {
        FleetError::Configuration(error.to_string())
    }
}

pub type FleetResult<T> = Result<T, FleetError>;

/// Request validation failures. The `Display` text is what the caller sees in
/// the rejected response body.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("alt must be a number")]
    AltitudeNotANumber,
    #[error("alt out of allowed range ({min}..{max}m)")]
    AltitudeOutOfRange { value: f64, min: f64, max: f64 },
    #[error("unknown device group '{0}' (expected all, odd or even)")]
    UnknownGroup(String),
    #[error("group is required for group takeoff")]
    MissingGroup,
}

/// Failure reported by (or on behalf of) a single device's capability layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    #[error("device does not support {capability}")]
    Unsupported { capability: &'static str },
    #[error("device rejected command: {0}")]
    Rejected(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("driver returned no result for device {0}")]
    MissingResult(String),
    #[error("{stage} did not complete within {after:?}")]
    Timeout { stage: Stage, after: Duration },
    #[error("device task panicked: {0}")]
    Panicked(String),
}

/// A [`DeviceError`] attributed to the stage that produced it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: DeviceError,
}

impl StageError {
    pub fn new(stage: Stage, source: DeviceError) -> Self {
        Self { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_match_wire_text() {
        assert_eq!(
            ValidationError::AltitudeNotANumber.to_string(),
            "alt must be a number"
        );
        let out_of_range = ValidationError::AltitudeOutOfRange {
            value: 250.0,
            min: 0.0,
            max: 200.0,
        };
        assert_eq!(
            out_of_range.to_string(),
            "alt out of allowed range (0..200m)"
        );
    }

    #[test]
    fn stage_error_names_the_stage() {
        let err = StageError::new(Stage::Arm, DeviceError::Rejected("pre-arm check".into()));
        assert_eq!(err.to_string(), "arm failed: device rejected command: pre-arm check");
    }

    #[test]
    fn validation_error_converts_into_fleet_error() {
        let err: FleetError = ValidationError::UnknownGroup("north".into()).into();
        assert!(matches!(err, FleetError::Validation(_)));
    }
}
