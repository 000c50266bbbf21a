//! Shared per-run outcome map.
//!
//! Device tasks each write their own slot under a single lock. The coordinator
//! reads the map once, after every task has joined.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::warn;

use super::types::{DeviceOutcome, OrchestrationResults};
use crate::device::DeviceId;

#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Mutex<HashMap<DeviceId, DeviceOutcome>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the outcome for `device_id`.
    pub fn record(&self, device_id: impl Into<DeviceId>, outcome: DeviceOutcome) {
        let device_id = device_id.into();
        let previous = self.results.lock().insert(device_id.clone(), outcome);
        if previous.is_some() {
            warn!(device_id = %device_id, "Outcome recorded twice for device - keeping latest");
        }
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.results.lock().contains_key(device_id)
    }

    /// Take the collected outcomes. Called once by the coordinator after the
    /// join barrier, so the lock is uncontended.
    pub fn snapshot(&self) -> OrchestrationResults {
        self.results.lock().clone()
    }
}
