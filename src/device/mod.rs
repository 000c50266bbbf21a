//! # Device Capability Layer
//!
//! Uniform interface over heterogeneous remote devices. The orchestrator only
//! talks to devices through [`Device`]; how a command is physically sent and
//! acknowledged belongs to the implementor.
//!
//! Driver-level calls answer with a per-device [`DriverResult`] map, which may
//! hold a pending acknowledgement, an error, or a ready value. [`resolve_driver_result`]
//! is the single place that collapses those shapes into success or failure.

pub mod registry;

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;

use crate::error::DeviceError;

pub use registry::{collect_targets, DeviceRegistry, InMemoryDeviceRegistry};

pub type DeviceId = String;

/// Per-device answers returned by a driver-level call
pub type DriverResults = HashMap<DeviceId, DriverResult>;

/// One device's answer to a driver-level command
pub enum DriverResult {
    /// Acknowledgement still in flight
    Pending(BoxFuture<'static, Result<serde_json::Value, DeviceError>>),
    /// The driver already knows the command failed
    Failed(DeviceError),
    /// The command completed synchronously
    Ready(serde_json::Value),
}

impl fmt::Debug for DriverResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverResult::Pending(_) => f.write_str("Pending(..)"),
            DriverResult::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
            DriverResult::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
        }
    }
}

/// Take `device_id`'s entry out of a driver answer and resolve it.
///
/// A missing entry is a failure: the driver never acknowledged the device.
pub async fn resolve_driver_result(
    mut results: DriverResults,
    device_id: &str,
) -> Result<serde_json::Value, DeviceError> {
    match results.remove(device_id) {
        Some(DriverResult::Pending(ack)) => ack.await,
        Some(DriverResult::Failed(err)) => Err(err),
        Some(DriverResult::Ready(value)) => Ok(value),
        None => Err(DeviceError::MissingResult(device_id.to_string())),
    }
}

/// Optional capabilities, resolved once per device when its task starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Device accepts explicit flight mode changes
    pub mode_control: bool,
    /// Device exposes a high-level "take off to relative altitude" command
    pub relative_takeoff: bool,
}

/// A remotely commanded device as seen by the orchestrator
#[async_trait]
pub trait Device: Send + Sync {
    fn id(&self) -> &str;

    fn capabilities(&self) -> DeviceCapabilities;

    /// `None` means the device does not report connectivity and is assumed connected.
    fn is_connected(&self) -> Option<bool> {
        None
    }

    async fn set_mode(&self, _mode: &str) -> Result<(), DeviceError> {
        Err(DeviceError::Unsupported {
            capability: "set_mode",
        })
    }

    /// Driver-level motor start/stop
    fn start_actuation(&self, targets: &[DeviceId], start: bool, force: bool) -> DriverResults;

    async fn takeoff_to_relative_altitude(&self, _altitude_m: f64) -> Result<(), DeviceError> {
        Err(DeviceError::Unsupported {
            capability: "takeoff_to_relative_altitude",
        })
    }

    /// Driver-level takeoff signal, used when relative takeoff is unavailable
    fn send_takeoff_signal(&self, targets: &[DeviceId]) -> DriverResults;
}
