//! # Fan-Out Coordinator
//!
//! Spawns one task per target device, drives each through
//! SetMode → Arm → Takeoff, and returns once every task has terminated.
//!
//! Failure isolation is the central property here. A device task never
//! affects its siblings: stage failures become that device's outcome, panics
//! inside capability calls are caught by the [`StageExecutor`], and a task that
//! still dies is recorded as a failure for its device after the join barrier.
//!
//! ```rust
//! use fleet_orchestrator::config::OrchestrationConfig;
//! use fleet_orchestrator::orchestration::{CommandParams, FanOutCoordinator};
//!
//! # tokio_test::block_on(async {
//! let coordinator = FanOutCoordinator::new(&OrchestrationConfig::immediate());
//! let params = CommandParams {
//!     altitude_m: 10.0,
//!     force_arm: false,
//!     guided_mode: "guided".to_string(),
//! };
//! let results = coordinator.orchestrate(Vec::new(), params).await;
//! assert!(results.is_empty());
//! # });
//! ```

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn, Instrument};
use uuid::Uuid;

use super::cancellation::CancellationSignal;
use super::jitter::JitterScheduler;
use super::result_aggregator::ResultAggregator;
use super::stage::{Stage, StageReached};
use super::stage_executor::{StageExecutor, StageOutcome};
use super::types::{CommandParams, DeviceOutcome, OrchestrationResults};
use crate::config::OrchestrationConfig;
use crate::device::Device;
use crate::logging::{log_device_operation, log_error};

#[derive(Debug, Clone)]
pub struct FanOutCoordinator {
    executor: StageExecutor,
    jitter: JitterScheduler,
}

impl FanOutCoordinator {
    pub fn new(config: &OrchestrationConfig) -> Self {
        Self {
            executor: StageExecutor::new(config.clone()),
            jitter: JitterScheduler::new(config.jitter_window()),
        }
    }

    /// Replace the dispatch jitter, e.g. with [`JitterScheduler::disabled`].
    pub fn with_jitter(mut self, jitter: JitterScheduler) -> Self {
        self.jitter = jitter;
        self
    }

    /// Run the stage sequence on every device and collect one outcome each.
    pub async fn orchestrate(
        &self,
        devices: Vec<Arc<dyn Device>>,
        params: CommandParams,
    ) -> OrchestrationResults {
        self.orchestrate_with_cancellation(devices, params, CancellationSignal::never())
            .await
    }

    /// Like [`orchestrate`](Self::orchestrate), abandoning outstanding stages
    /// once `cancel` fires. Devices interrupted that way are recorded as
    /// cancelled at the stage they had reached.
    #[instrument(skip_all, fields(run_id = %Uuid::new_v4(), device_count = devices.len(), altitude_m = params.altitude_m))]
    pub async fn orchestrate_with_cancellation(
        &self,
        devices: Vec<Arc<dyn Device>>,
        params: CommandParams,
        cancel: CancellationSignal,
    ) -> OrchestrationResults {
        let aggregator = Arc::new(ResultAggregator::new());
        let params = Arc::new(params);

        let mut seen = HashSet::with_capacity(devices.len());
        let mut device_ids = Vec::with_capacity(devices.len());
        let mut handles = Vec::with_capacity(devices.len());

        for device in devices {
            let device_id = device.id().to_string();
            if !seen.insert(device_id.clone()) {
                warn!(device_id = %device_id, "Duplicate device in target set - dispatching once");
                continue;
            }

            let coordinator = self.clone();
            let aggregator = aggregator.clone();
            let params = params.clone();
            let cancel = cancel.clone();
            let handle = tokio::spawn(
                async move {
                    coordinator
                        .run_device(device, &params, &aggregator, cancel)
                        .await;
                }
                .in_current_span(),
            );

            device_ids.push(device_id);
            handles.push(handle);
        }

        debug!(tasks = handles.len(), "Device tasks spawned - waiting for all to finish");

        // Join barrier: nothing reads the aggregator before every task is done
        let joined = join_all(handles).await;

        for (device_id, result) in device_ids.into_iter().zip(joined) {
            if let Err(join_error) = result {
                log_error(
                    "fan_out",
                    "device_task",
                    &join_error.to_string(),
                    Some(&device_id),
                );
                if !aggregator.contains(&device_id) {
                    aggregator.record(
                        device_id,
                        DeviceOutcome::failed(
                            StageReached::Dispatch,
                            format!("device task aborted: {join_error}"),
                        ),
                    );
                }
            }
        }

        let results = aggregator.snapshot();
        let succeeded = results.values().filter(|outcome| outcome.ok).count();
        info!(
            succeeded,
            failed = results.len() - succeeded,
            "Fan-out complete"
        );
        results
    }

    async fn run_device(
        &self,
        device: Arc<dyn Device>,
        params: &CommandParams,
        aggregator: &ResultAggregator,
        mut cancel: CancellationSignal,
    ) {
        let device_id = device.id().to_string();
        let delay = self.jitter.draw();
        let mut reached = StageReached::Dispatch;

        let finished = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            outcome = self.drive_stages(device.as_ref(), params, delay, &mut reached) => Some(outcome),
        };

        let outcome = finished.unwrap_or_else(|| {
            info!(device_id = %device_id, stage = %reached, "Request cancelled - abandoning remaining stages");
            DeviceOutcome::cancelled(reached)
        });

        log_device_operation(
            "arm_takeoff",
            &device_id,
            if outcome.ok { "succeeded" } else { "failed" },
            outcome.error.as_deref(),
        );
        aggregator.record(device_id, outcome);
    }

    async fn drive_stages(
        &self,
        device: &dyn Device,
        params: &CommandParams,
        delay: Duration,
        reached: &mut StageReached,
    ) -> DeviceOutcome {
        if !delay.is_zero() {
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            debug!(device_id = %device.id(), delay_ms, "Dispatch jitter");
            tokio::time::sleep(delay).await;
        }

        let capabilities = device.capabilities();
        for stage in Stage::SEQUENCE {
            *reached = stage.into();
            if let StageOutcome::Failed(error) = self
                .executor
                .execute(device, capabilities, stage, params)
                .await
            {
                return DeviceOutcome::failed(stage, error.to_string());
            }
        }

        DeviceOutcome::succeeded()
    }
}
