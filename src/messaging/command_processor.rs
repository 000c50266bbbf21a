//! # Fleet Command Processor
//!
//! Command-pattern front door for the orchestrator. The transport pushes
//! inbound messages through a [`FleetCommandSender`]; the processor routes
//! them by `body.type` to the request handler and answers over a oneshot.
//!
//! Each dispatch runs on its own task, so concurrent requests proceed
//! concurrently. If the caller stops waiting for its response, the request's
//! device tasks are cancelled.

use futures::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn, Instrument};

use super::message::{FleetMessage, FleetResponse};
use crate::config::MessagingConfig;
use crate::error::{FleetError, FleetResult};
use crate::orchestration::{
    cancellation_pair, CancellationSignal, CommandKind, CommandResponse,
    OrchestrationRequestHandler,
};

/// Command responder type
type CommandResponder<T> = oneshot::Sender<FleetResult<T>>;

/// Commands that can be sent to the [`FleetCommandProcessor`]
#[derive(Debug)]
pub enum FleetCommand {
    /// Route an inbound message and answer with its correlated response
    Dispatch {
        message: FleetMessage,
        resp: CommandResponder<FleetResponse>,
    },
    /// Current processor statistics
    GetStats { resp: CommandResponder<ProcessorStats> },
    /// Wait for in-flight dispatches, then stop
    Shutdown { resp: CommandResponder<()> },
}

/// Processor statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessorStats {
    pub requests_received: u64,
    pub requests_rejected: u64,
    pub requests_completed: u64,
    pub devices_succeeded: u64,
    pub devices_failed: u64,
}

#[derive(Debug, Default)]
struct StatsCounters {
    requests_received: AtomicU64,
    requests_rejected: AtomicU64,
    requests_completed: AtomicU64,
    devices_succeeded: AtomicU64,
    devices_failed: AtomicU64,
}

impl StatsCounters {
    fn record_response(&self, response: &CommandResponse) {
        match response {
            CommandResponse::Dispatched(report) => {
                let succeeded = report.results.values().filter(|o| o.ok).count() as u64;
                let failed = report.results.len() as u64 - succeeded;
                self.requests_completed.fetch_add(1, Ordering::Relaxed);
                self.devices_succeeded.fetch_add(succeeded, Ordering::Relaxed);
                self.devices_failed.fetch_add(failed, Ordering::Relaxed);
            }
            CommandResponse::Rejected(_) => {
                self.requests_rejected.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn snapshot(&self) -> ProcessorStats {
        ProcessorStats {
            requests_received: self.requests_received.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            requests_completed: self.requests_completed.load(Ordering::Relaxed),
            devices_succeeded: self.devices_succeeded.load(Ordering::Relaxed),
            devices_failed: self.devices_failed.load(Ordering::Relaxed),
        }
    }
}

/// Cloneable handle used by the transport to talk to the processor
#[derive(Debug, Clone)]
pub struct FleetCommandSender {
    sender: mpsc::Sender<FleetCommand>,
}

impl FleetCommandSender {
    /// Route a message and wait for its correlated response.
    pub async fn dispatch(&self, message: FleetMessage) -> FleetResult<FleetResponse> {
        let (resp, rx) = oneshot::channel();
        self.send(FleetCommand::Dispatch { message, resp }).await?;
        Self::receive(rx).await
    }

    pub async fn stats(&self) -> FleetResult<ProcessorStats> {
        let (resp, rx) = oneshot::channel();
        self.send(FleetCommand::GetStats { resp }).await?;
        Self::receive(rx).await
    }

    pub async fn shutdown(&self) -> FleetResult<()> {
        let (resp, rx) = oneshot::channel();
        self.send(FleetCommand::Shutdown { resp }).await?;
        Self::receive(rx).await
    }

    /// Enqueue a raw command, e.g. when the caller manages its own responder.
    pub async fn send(&self, command: FleetCommand) -> FleetResult<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| FleetError::Messaging("command processor is not running".to_string()))
    }

    async fn receive<T>(rx: oneshot::Receiver<FleetResult<T>>) -> FleetResult<T> {
        rx.await.map_err(|_| {
            FleetError::Messaging("command processor dropped the response".to_string())
        })?
    }
}

pub struct FleetCommandProcessor {
    handler: Arc<OrchestrationRequestHandler>,
    receiver: mpsc::Receiver<FleetCommand>,
    stats: Arc<StatsCounters>,
    in_flight: Vec<JoinHandle<()>>,
}

impl FleetCommandProcessor {
    /// Start the processor loop on the current runtime.
    pub fn spawn(
        handler: Arc<OrchestrationRequestHandler>,
        config: &MessagingConfig,
    ) -> (FleetCommandSender, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.command_buffer_size.max(1));
        let processor = Self {
            handler,
            receiver,
            stats: Arc::new(StatsCounters::default()),
            in_flight: Vec::new(),
        };
        let join = tokio::spawn(processor.run());
        (FleetCommandSender { sender }, join)
    }

    async fn run(mut self) {
        info!("Fleet command processor started");

        while let Some(command) = self.receiver.recv().await {
            self.in_flight.retain(|handle| !handle.is_finished());

            match command {
                FleetCommand::Dispatch { message, resp } => self.start_dispatch(message, resp),
                FleetCommand::GetStats { resp } => {
                    if resp.send(Ok(self.stats.snapshot())).is_err() {
                        debug!("Stats requester went away");
                    }
                }
                FleetCommand::Shutdown { resp } => {
                    info!(in_flight = self.in_flight.len(), "Shutting down - draining dispatches");
                    join_all(self.in_flight.drain(..)).await;
                    if resp.send(Ok(())).is_err() {
                        debug!("Shutdown requester went away");
                    }
                    return;
                }
            }
        }

        join_all(self.in_flight.drain(..)).await;
        info!("Fleet command processor stopped - all senders dropped");
    }

    fn start_dispatch(&mut self, message: FleetMessage, mut resp: CommandResponder<FleetResponse>) {
        self.stats.requests_received.fetch_add(1, Ordering::Relaxed);
        let handler = self.handler.clone();
        let stats = self.stats.clone();

        let task = async move {
            let (trigger, signal) = cancellation_pair();
            let work = Self::route(&handler, &message, signal);
            tokio::pin!(work);

            let routed = tokio::select! {
                biased;
                routed = &mut work => Some(routed),
                _ = resp.closed() => None,
            };

            let Some(routed) = routed else {
                warn!(message_id = %message.id, "Requester disconnected - cancelling device tasks");
                trigger.cancel();
                let routed = work.await;
                stats.record_response(&routed);
                return;
            };

            stats.record_response(&routed);
            let response = routed
                .to_body()
                .map(|body| FleetResponse::in_response_to(&message, body));
            if resp.send(response).is_err() {
                debug!(message_id = %message.id, "Requester went away before the response was sent");
            }
        };

        self.in_flight.push(tokio::spawn(task.in_current_span()));
    }

    /// Messages without a `type`, or with one no handler serves, are answered
    /// with a rejection body rather than an error.
    #[instrument(skip(handler, message, cancel), fields(message_id = %message.id))]
    async fn route(
        handler: &OrchestrationRequestHandler,
        message: &FleetMessage,
        cancel: CancellationSignal,
    ) -> CommandResponse {
        let kind = message
            .message_type()
            .ok_or_else(|| FleetError::UnknownMessageType("<missing type>".to_string()))
            .and_then(|message_type| message_type.parse::<CommandKind>());

        match kind {
            Ok(kind) => {
                handler
                    .handle_with_cancellation(kind, &message.body, cancel)
                    .await
            }
            Err(error) => {
                warn!(error = %error, "Rejecting message with unsupported type");
                CommandResponse::rejected(error.to_string())
            }
        }
    }
}
