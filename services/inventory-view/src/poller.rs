//! Fixed-interval poller that owns its timer
//!
//! The poll task is tied to a [`PollerHandle`]: stopping or dropping the
//! handle cancels the timer. Cycles run inline on the timer task, so one
//! poller never overlaps itself; ticks missed while a cycle runs are skipped.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::PollConfig;
use crate::controller::InventoryController;

/// Handle to a running poll task
#[derive(Debug)]
pub struct PollerHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Cancel the timer and wait for the task to finish
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Poll task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start polling. The first cycle fires one interval after start, the
/// initial load being the caller's job.
///
/// The task also stops when `parent` is cancelled.
pub fn start(
    controller: Arc<InventoryController>,
    settings: &PollConfig,
    parent: &CancellationToken,
) -> PollerHandle {
    let cancel = parent.child_token();
    let period = settings.interval();
    let rundown = settings.rundown;
    let delay = settings.rundown_delay();
    let task_cancel = cancel.clone();

    tracing::info!(
        "Polling inventory every {:?} (rundown={}, delay={:?})",
        period,
        rundown,
        delay
    );

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = task_cancel.cancelled() => {
                    tracing::debug!("Poller stopped");
                    break;
                }
            }

            tokio::select! {
                outcome = controller.poll_cycle(rundown, delay) => {
                    tracing::debug!("Poll cycle finished: {:?}", outcome);
                }
                _ = task_cancel.cancelled() => {
                    tracing::debug!("Poller stopped during a cycle");
                    break;
                }
            }
        }
    });

    PollerHandle {
        cancel,
        task: Some(task),
    }
}
