//! Request-level cancellation shared by all device tasks of one run.

use tokio::sync::watch;

/// Fires the cancellation for every [`CancellationSignal`] cloned from its pair
#[derive(Debug)]
pub struct CancellationTrigger {
    sender: watch::Sender<bool>,
}

/// Observed by device tasks; cheap to clone
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    receiver: watch::Receiver<bool>,
}

pub fn cancellation_pair() -> (CancellationTrigger, CancellationSignal) {
    let (sender, receiver) = watch::channel(false);
    (
        CancellationTrigger { sender },
        CancellationSignal { receiver },
    )
}

impl CancellationTrigger {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

impl CancellationSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        cancellation_pair().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancellation is requested. If the trigger is dropped
    /// without cancelling, this never resolves.
    pub async fn cancelled(&mut self) {
        if self.receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
