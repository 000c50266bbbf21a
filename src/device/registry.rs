//! Device registry seam and target collection.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::{Device, DeviceId};
use crate::constants::DeviceGroup;

/// Source of known devices. Owned by the host; the orchestrator only borrows
/// device handles for the duration of one request.
pub trait DeviceRegistry: Send + Sync {
    fn list_device_ids(&self) -> Vec<DeviceId>;

    fn find_device(&self, id: &str) -> Option<Arc<dyn Device>>;
}

/// Registry for hosts that manage their devices in-process
#[derive(Default)]
pub struct InMemoryDeviceRegistry {
    devices: RwLock<BTreeMap<DeviceId, Arc<dyn Device>>>,
}

impl InMemoryDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a device, replacing any previous entry with the same id.
    pub fn register(&self, device: Arc<dyn Device>) {
        let id = device.id().to_string();
        self.devices.write().insert(id, device);
    }

    pub fn remove(&self, id: &str) -> Option<Arc<dyn Device>> {
        self.devices.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}

impl DeviceRegistry for InMemoryDeviceRegistry {
    fn list_device_ids(&self) -> Vec<DeviceId> {
        self.devices.read().keys().cloned().collect()
    }

    fn find_device(&self, id: &str) -> Option<Arc<dyn Device>> {
        self.devices.read().get(id).cloned()
    }
}

/// Resolve the devices a request should target.
///
/// Ids the registry can no longer resolve are skipped, as are devices that
/// report themselves disconnected. Devices that do not report connectivity are
/// assumed connected. The result is ordered by id.
pub fn collect_targets(registry: &dyn DeviceRegistry, group: DeviceGroup) -> Vec<Arc<dyn Device>> {
    let mut targets: Vec<Arc<dyn Device>> = registry
        .list_device_ids()
        .into_iter()
        .filter(|id| group.contains(id))
        .filter_map(|id| {
            let device = registry.find_device(&id);
            if device.is_none() {
                debug!(device_id = %id, "Device id listed but not resolvable - skipping");
            }
            device
        })
        .filter(|device| {
            let connected = device.is_connected().unwrap_or(true);
            if !connected {
                debug!(device_id = %device.id(), "Device disconnected - skipping");
            }
            connected
        })
        .collect();

    targets.sort_by(|a, b| a.id().cmp(b.id()));
    targets
}
