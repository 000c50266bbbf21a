//! Scriptable device double for orchestration tests.

use async_trait::async_trait;
use fleet_orchestrator::device::{
    Device, DeviceCapabilities, DeviceId, DriverResult, DriverResults,
};
use fleet_orchestrator::error::DeviceError;
use fleet_orchestrator::orchestration::Stage;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// How a mocked stage call behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Answers success immediately
    Succeed,
    /// Acknowledges success after yielding
    PendingSucceed,
    /// Answers failure immediately
    Fail,
    /// Acknowledges failure after yielding
    PendingFail,
    /// Panics inside the call
    Panic,
    /// Never answers
    Hang,
}

pub struct MockDevice {
    id: String,
    connected: Option<bool>,
    capabilities: DeviceCapabilities,
    set_mode: Behavior,
    arm: Behavior,
    takeoff: Behavior,
    set_mode_calls: AtomicUsize,
    arm_calls: AtomicUsize,
    takeoff_calls: AtomicUsize,
    last_force: AtomicUsize,
}

impl MockDevice {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            connected: None,
            capabilities: DeviceCapabilities {
                mode_control: true,
                relative_takeoff: false,
            },
            set_mode: Behavior::Succeed,
            arm: Behavior::Succeed,
            takeoff: Behavior::Succeed,
            set_mode_calls: AtomicUsize::new(0),
            arm_calls: AtomicUsize::new(0),
            takeoff_calls: AtomicUsize::new(0),
            last_force: AtomicUsize::new(0),
        }
    }

    pub fn with_behavior(mut self, stage: Stage, behavior: Behavior) -> Self {
        match stage {
            Stage::SetMode => self.set_mode = behavior,
            Stage::Arm => self.arm = behavior,
            Stage::Takeoff => self.takeoff = behavior,
        }
        self
    }

    pub fn failing(self, stage: Stage) -> Self {
        self.with_behavior(stage, Behavior::Fail)
    }

    pub fn connected(mut self, connected: bool) -> Self {
        self.connected = Some(connected);
        self
    }

    pub fn without_mode_control(mut self) -> Self {
        self.capabilities.mode_control = false;
        self
    }

    pub fn with_relative_takeoff(mut self) -> Self {
        self.capabilities.relative_takeoff = true;
        self
    }

    pub fn shared(self) -> Arc<MockDevice> {
        Arc::new(self)
    }

    pub fn calls(&self, stage: Stage) -> usize {
        match stage {
            Stage::SetMode => self.set_mode_calls.load(Ordering::SeqCst),
            Stage::Arm => self.arm_calls.load(Ordering::SeqCst),
            Stage::Takeoff => self.takeoff_calls.load(Ordering::SeqCst),
        }
    }

    pub fn total_calls(&self) -> usize {
        Stage::SEQUENCE.iter().map(|stage| self.calls(*stage)).sum()
    }

    /// Whether the last arm call asked to bypass pre-arm checks
    pub fn last_arm_forced(&self) -> bool {
        self.last_force.load(Ordering::SeqCst) == 1
    }

    fn rejection(&self, stage: Stage) -> DeviceError {
        DeviceError::Rejected(format!("{} refused {stage}", self.id))
    }

    async fn answer(&self, stage: Stage, behavior: Behavior) -> Result<(), DeviceError> {
        match behavior {
            Behavior::Succeed => Ok(()),
            Behavior::PendingSucceed => {
                tokio::task::yield_now().await;
                Ok(())
            }
            Behavior::Fail => Err(self.rejection(stage)),
            Behavior::PendingFail => {
                tokio::task::yield_now().await;
                Err(self.rejection(stage))
            }
            Behavior::Panic => panic!("{} blew up during {stage}", self.id),
            Behavior::Hang => std::future::pending().await,
        }
    }

    fn driver_answer(&self, stage: Stage, behavior: Behavior, targets: &[DeviceId]) -> DriverResults {
        let result = match behavior {
            Behavior::Succeed => DriverResult::Ready(serde_json::json!(true)),
            Behavior::PendingSucceed => DriverResult::Pending(Box::pin(async {
                tokio::task::yield_now().await;
                Ok::<_, DeviceError>(serde_json::json!(true))
            })),
            Behavior::Fail => DriverResult::Failed(self.rejection(stage)),
            Behavior::PendingFail => {
                let error = self.rejection(stage);
                DriverResult::Pending(Box::pin(async move {
                    tokio::task::yield_now().await;
                    Err::<serde_json::Value, _>(error)
                }))
            }
            Behavior::Panic => panic!("{} driver blew up during {stage}", self.id),
            Behavior::Hang => DriverResult::Pending(Box::pin(std::future::pending::<Result<serde_json::Value, DeviceError>>())),
        };
        let mut results = HashMap::new();
        if targets.iter().any(|target| target == &self.id) {
            results.insert(self.id.clone(), result);
        }
        results
    }
}

#[async_trait]
impl Device for MockDevice {
    fn id(&self) -> &str {
        &self.id
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn is_connected(&self) -> Option<bool> {
        self.connected
    }

    async fn set_mode(&self, _mode: &str) -> Result<(), DeviceError> {
        self.set_mode_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(Stage::SetMode, self.set_mode).await
    }

    fn start_actuation(&self, targets: &[DeviceId], _start: bool, force: bool) -> DriverResults {
        self.arm_calls.fetch_add(1, Ordering::SeqCst);
        self.last_force.store(usize::from(force), Ordering::SeqCst);
        self.driver_answer(Stage::Arm, self.arm, targets)
    }

    async fn takeoff_to_relative_altitude(&self, _altitude_m: f64) -> Result<(), DeviceError> {
        self.takeoff_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(Stage::Takeoff, self.takeoff).await
    }

    fn send_takeoff_signal(&self, targets: &[DeviceId]) -> DriverResults {
        self.takeoff_calls.fetch_add(1, Ordering::SeqCst);
        self.driver_answer(Stage::Takeoff, self.takeoff, targets)
    }
}
