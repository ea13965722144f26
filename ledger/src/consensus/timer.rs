//! Round timer seam.
//!
//! A round timer is armed when the engine votes or rotates the leader
//! and denied once the round reaches commit or reject. Deny is
//! idempotent; a denied timer never fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Arms and cancels the per-round timeout.
pub trait RoundTimer {
    /// Arms the timer. An already-armed timer is re-armed from now.
    fn start(&mut self, delay: Duration);

    /// Cancels the pending timeout, if any. Idempotent.
    fn deny(&mut self);
}

/// Tokio-backed [`RoundTimer`] that runs a callback on expiry.
///
/// `start` spawns an abortable sleep task, so it must be called from
/// within a tokio runtime. The callback typically enqueues a timeout
/// event into the engine's mailbox.
pub struct TokioTimer {
    on_expiry: Arc<dyn Fn() + Send + Sync>,
    pending: Option<JoinHandle<()>>,
}

impl TokioTimer {
    pub fn new(on_expiry: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            on_expiry: Arc::new(on_expiry),
            pending: None,
        }
    }
}

impl RoundTimer for TokioTimer {
    fn start(&mut self, delay: Duration) {
        self.deny();
        let on_expiry = self.on_expiry.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_expiry();
        }));
    }

    fn deny(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        self.deny();
    }
}
