//! # Messaging Module
//!
//! Message envelope and the command processor that routes inbound messages to
//! the orchestration request handler.

pub mod command_processor;
pub mod message;

pub use command_processor::{FleetCommand, FleetCommandProcessor, FleetCommandSender, ProcessorStats};
pub use message::{FleetMessage, FleetResponse};
