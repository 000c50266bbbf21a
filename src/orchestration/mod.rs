//! # Orchestration Engine
//!
//! Concurrent staged-command orchestration across a fleet of devices.
//!
//! ## Core Components
//!
//! - **OrchestrationRequestHandler**: validates a request, resolves targets, shapes the report
//! - **FanOutCoordinator**: one task per device, join barrier, failure isolation
//! - **StageExecutor**: one stage for one device, with settle delay, timeout and failure policy
//! - **JitterScheduler**: randomized dispatch delay per device task
//! - **ResultAggregator**: lock-guarded outcome map written by device tasks
//!
//! ## Flow
//!
//! ```text
//! handler ──► coordinator ──┬─► task(uav-1): jitter → SetMode → Arm → Takeoff ─┐
//!                           ├─► task(uav-2): jitter → SetMode → Arm ✗          ├─► aggregator
//!                           └─► task(uav-N): ...                               ┘
//!                join barrier ──► snapshot ──► report
//! ```

pub mod cancellation;
pub mod fan_out;
pub mod jitter;
pub mod request_handler;
pub mod result_aggregator;
pub mod stage;
pub mod stage_executor;
pub mod types;

pub use cancellation::{cancellation_pair, CancellationSignal, CancellationTrigger};
pub use fan_out::FanOutCoordinator;
pub use jitter::JitterScheduler;
pub use request_handler::{
    validate_altitude, validate_group, ArmTakeoffReport, CommandKind, CommandRequest,
    CommandResponse, OrchestrationRequestHandler, RejectedResponse,
};
pub use result_aggregator::ResultAggregator;
pub use stage::{Stage, StagePolicy, StageReached};
pub use stage_executor::{StageExecutor, StageOutcome};
pub use types::{CommandParams, DeviceOutcome, OrchestrationResults};
