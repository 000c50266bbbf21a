//! # System Constants
//!
//! Message types, defaults and limits that define the operational boundaries
//! of the fleet orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Inbound message types routed by the command processor
pub mod message_types {
    pub const ARM_TAKEOFF: &str = "X-BOTLAB-ARM-TAKEOFF";
    pub const GROUP_TAKEOFF: &str = "X-BOTLAB-GROUP-TAKEOFF";
}

/// Defaults applied when no configuration source overrides them
pub mod defaults {
    pub const JITTER_WINDOW_MS: u64 = 1_500;
    pub const MODE_SETTLE_MS: u64 = 1_500;
    pub const ARM_SETTLE_MS: u64 = 2_000;
    pub const STAGE_TIMEOUT_MS: u64 = 15_000;
    pub const GUIDED_MODE: &str = "guided";
    pub const MIN_ALTITUDE_M: f64 = 0.0;
    pub const MAX_ALTITUDE_M: f64 = 200.0;
    pub const COMMAND_BUFFER_SIZE: usize = 64;
}

/// Error text recorded for devices whose request was cancelled mid-flight
pub const CANCELLED_ERROR: &str = "cancelled";

/// Subset of connected devices a request targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceGroup {
    #[default]
    All,
    Odd,
    Even,
}

impl DeviceGroup {
    /// Whether a device id belongs to this group. Odd/even membership is taken
    /// from the trailing decimal number of the id (`uav-7` is odd); ids not
    /// ending in a digit only belong to [`DeviceGroup::All`].
    pub fn contains(&self, device_id: &str) -> bool {
        match self {
            DeviceGroup::All => true,
            DeviceGroup::Odd => trailing_parity(device_id) == Some(true),
            DeviceGroup::Even => trailing_parity(device_id) == Some(false),
        }
    }
}

impl fmt::Display for DeviceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceGroup::All => write!(f, "all"),
            DeviceGroup::Odd => write!(f, "odd"),
            DeviceGroup::Even => write!(f, "even"),
        }
    }
}

impl FromStr for DeviceGroup {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(DeviceGroup::All),
            "odd" => Ok(DeviceGroup::Odd),
            "even" => Ok(DeviceGroup::Even),
            _ => Err(ValidationError::UnknownGroup(s.to_string())),
        }
    }
}

/// Parity of the id's trailing decimal number: `Some(true)` when odd.
/// Only the last digit matters, so arbitrarily long numbers are fine.
fn trailing_parity(device_id: &str) -> Option<bool> {
    let last = device_id.bytes().last().filter(u8::is_ascii_digit)?;
    Some((last - b'0') % 2 == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_membership_uses_trailing_number() {
        assert!(DeviceGroup::Odd.contains("uav-3"));
        assert!(DeviceGroup::Even.contains("uav-12"));
        assert!(!DeviceGroup::Odd.contains("uav-12"));
        assert!(DeviceGroup::Even.contains("40"));
    }

    #[test]
    fn test_long_trailing_numbers_keep_their_parity() {
        assert!(DeviceGroup::Odd.contains("uav-18446744073709551617"));
        assert!(DeviceGroup::Even.contains("uav-1844674407370955161718446744073709551616"));
        assert!(!DeviceGroup::Even.contains("uav-18446744073709551617"));
    }

    #[test]
    fn test_ids_without_number_only_in_all() {
        assert!(DeviceGroup::All.contains("alpha"));
        assert!(!DeviceGroup::Odd.contains("alpha"));
        assert!(!DeviceGroup::Even.contains("alpha"));
    }

    #[test]
    fn test_group_parsing() {
        assert_eq!("ODD".parse::<DeviceGroup>(), Ok(DeviceGroup::Odd));
        assert_eq!(" even ".parse::<DeviceGroup>(), Ok(DeviceGroup::Even));
        assert_eq!(
            "north".parse::<DeviceGroup>(),
            Err(ValidationError::UnknownGroup("north".to_string()))
        );
    }
}
