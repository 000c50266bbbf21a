//! # Stage Executor
//!
//! Runs one stage of the command sequence against one device and applies that
//! stage's policy: the bounded capability call, the settle wait after success,
//! and whether a failure is tolerated or ends the device's sequence.
//!
//! Every capability call goes through the same guard. Panics raised by a
//! device implementation are caught and reported as [`DeviceError::Panicked`],
//! and an optional per-stage timeout turns an unresponsive device into a
//! [`DeviceError::Timeout`].

use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{debug, instrument, warn};

use super::stage::{Stage, StagePolicy};
use super::types::CommandParams;
use crate::config::OrchestrationConfig;
use crate::device::{resolve_driver_result, Device, DeviceCapabilities};
use crate::error::{DeviceError, StageError};
use crate::logging::log_stage_operation;

/// What a single stage did for a device
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// Capability call succeeded and the settle wait elapsed
    Completed,
    /// Device lacks the optional capability this stage needs
    Skipped,
    /// Stage failed but its policy lets the sequence continue
    Tolerated(StageError),
    /// Stage failed and the device's sequence must stop here
    Failed(StageError),
}

#[derive(Debug, Clone)]
pub struct StageExecutor {
    config: OrchestrationConfig,
}

impl StageExecutor {
    pub fn new(config: OrchestrationConfig) -> Self {
        Self { config }
    }

    pub fn policy(&self, stage: Stage) -> StagePolicy {
        self.config.stage_policy(stage)
    }

    #[instrument(skip(self, device, capabilities, params), fields(device_id = %device.id(), stage = %stage))]
    pub async fn execute(
        &self,
        device: &dyn Device,
        capabilities: DeviceCapabilities,
        stage: Stage,
        params: &CommandParams,
    ) -> StageOutcome {
        let policy = self.policy(stage);

        if stage == Stage::SetMode && !capabilities.mode_control {
            debug!("Device has no mode control - skipping");
            return StageOutcome::Skipped;
        }

        let started = Instant::now();
        let call = Self::capability_call(device, capabilities, stage, params);

        match self.guarded(stage, call).await {
            Ok(()) => {
                if !policy.settle.is_zero() {
                    tokio::time::sleep(policy.settle).await;
                }
                log_stage_operation(
                    device.id(),
                    stage.as_str(),
                    "completed",
                    Some(elapsed_ms(started)),
                    None,
                );
                StageOutcome::Completed
            }
            Err(source) => {
                let error = StageError::new(stage, source);
                if policy.required {
                    log_stage_operation(
                        device.id(),
                        stage.as_str(),
                        "failed",
                        Some(elapsed_ms(started)),
                        Some(&error.to_string()),
                    );
                    StageOutcome::Failed(error)
                } else {
                    warn!(device_id = %device.id(), error = %error, "Non-fatal stage failure - continuing");
                    StageOutcome::Tolerated(error)
                }
            }
        }
    }

    fn capability_call<'a>(
        device: &'a dyn Device,
        capabilities: DeviceCapabilities,
        stage: Stage,
        params: &'a CommandParams,
    ) -> BoxFuture<'a, Result<(), DeviceError>> {
        match stage {
            Stage::SetMode => device.set_mode(&params.guided_mode),
            Stage::Arm => async move {
                let targets = [device.id().to_string()];
                let results = device.start_actuation(&targets, true, params.force_arm);
                resolve_driver_result(results, device.id()).await.map(|_| ())
            }
            .boxed(),
            Stage::Takeoff if capabilities.relative_takeoff => {
                device.takeoff_to_relative_altitude(params.altitude_m)
            }
            Stage::Takeoff => async move {
                let targets = [device.id().to_string()];
                let results = device.send_takeoff_signal(&targets);
                resolve_driver_result(results, device.id()).await.map(|_| ())
            }
            .boxed(),
        }
    }

    /// Apply the panic guard and the optional timeout to a capability call.
    async fn guarded(
        &self,
        stage: Stage,
        call: BoxFuture<'_, Result<(), DeviceError>>,
    ) -> Result<(), DeviceError> {
        let caught = async {
            match AssertUnwindSafe(call).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(DeviceError::Panicked(panic_message(payload.as_ref()))),
            }
        };

        match self.config.stage_timeout() {
            Some(limit) => tokio::time::timeout(limit, caught)
                .await
                .unwrap_or(Err(DeviceError::Timeout { stage, after: limit })),
            None => caught.await,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
