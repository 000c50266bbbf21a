#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! # Fleet Orchestrator
//!
//! Concurrent staged-command orchestration for fleets of remotely commanded
//! vehicles.
//!
//! ## Overview
//!
//! Given a set of independently addressable devices, the orchestrator drives
//! each one through SetMode → Arm → Takeoff concurrently, keeps one device's
//! fault from blocking or corrupting another's progress, and returns a
//! structured per-device outcome report.
//!
//! ## Module Organization
//!
//! - [`orchestration`] - request handler, fan-out coordinator, stage executor, jitter, aggregation
//! - [`device`] - capability interface over devices and the registry seam
//! - [`messaging`] - message envelope and command processor
//! - [`config`] - layered configuration
//! - [`error`] - structured error handling
//! - [`logging`] - structured logging setup and helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fleet_orchestrator::config::FleetConfig;
//! use fleet_orchestrator::device::InMemoryDeviceRegistry;
//! use fleet_orchestrator::orchestration::{CommandKind, OrchestrationRequestHandler};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(InMemoryDeviceRegistry::new());
//! // registry.register(Arc::new(my_vehicle));
//!
//! let handler = OrchestrationRequestHandler::new(registry, FleetConfig::default());
//! let response = handler
//!     .handle(CommandKind::ArmTakeoff, &serde_json::json!({"alt": 10}))
//!     .await;
//! println!("{}", response.to_body()?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod orchestration;

pub use config::{ConfigManager, FleetConfig, MessagingConfig, OrchestrationConfig, ValidationConfig};
pub use constants::{message_types, DeviceGroup};
pub use device::{
    collect_targets, resolve_driver_result, Device, DeviceCapabilities, DeviceId, DeviceRegistry,
    DriverResult, DriverResults, InMemoryDeviceRegistry,
};
pub use error::{DeviceError, FleetError, FleetResult, StageError, ValidationError};
pub use messaging::{FleetCommandProcessor, FleetCommandSender, FleetMessage, FleetResponse};
pub use orchestration::{
    CommandKind, CommandResponse, DeviceOutcome, FanOutCoordinator, OrchestrationRequestHandler,
    Stage, StageReached,
};
