//! Registry, config and handler builders shared by integration tests.

use fleet_orchestrator::config::{FleetConfig, OrchestrationConfig};
use fleet_orchestrator::device::{Device, InMemoryDeviceRegistry};
use fleet_orchestrator::orchestration::OrchestrationRequestHandler;
use std::sync::Arc;

use super::mock_device::MockDevice;

/// Config with every delay zeroed so tests run at full speed
pub fn immediate_config() -> FleetConfig {
    FleetConfig {
        orchestration: OrchestrationConfig::immediate(),
        ..FleetConfig::default()
    }
}

/// `count` healthy devices named `uav-1..=uav-count`
pub fn healthy_fleet(count: usize) -> Vec<Arc<MockDevice>> {
    (1..=count)
        .map(|n| MockDevice::new(&format!("uav-{n}")).shared())
        .collect()
}

pub fn registry_with(devices: &[Arc<MockDevice>]) -> Arc<InMemoryDeviceRegistry> {
    let registry = Arc::new(InMemoryDeviceRegistry::new());
    for device in devices {
        registry.register(device.clone() as Arc<dyn Device>);
    }
    registry
}

pub fn handler_for(devices: &[Arc<MockDevice>], config: FleetConfig) -> OrchestrationRequestHandler {
    OrchestrationRequestHandler::new(registry_with(devices), config)
}

pub fn as_targets(devices: &[Arc<MockDevice>]) -> Vec<Arc<dyn Device>> {
    devices
        .iter()
        .map(|device| device.clone() as Arc<dyn Device>)
        .collect()
}
