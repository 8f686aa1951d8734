use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::gateway::MeetingGateway;
use crate::store::SessionStore;

struct PollHandle {
    meeting_id: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollHandle {
    fn cancel(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.task.abort();
    }
}

/// Refreshes the active meeting's messages on a fixed period.
///
/// At most one schedule exists at a time. A fetch result is written through
/// [`SessionStore::replace_messages`], which discards it if the meeting was
/// deselected while the fetch was in flight, or if a reload issued after it
/// already landed.
pub struct MessagePoller {
    gateway: Arc<dyn MeetingGateway>,
    store: Arc<SessionStore>,
    interval: Duration,
    current: Mutex<Option<PollHandle>>,
}

impl MessagePoller {
    pub fn new(gateway: Arc<dyn MeetingGateway>, store: Arc<SessionStore>, interval: Duration) -> Self {
        Self {
            gateway,
            store,
            interval,
            current: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn lock(&self) -> MutexGuard<'_, Option<PollHandle>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Polls `meeting_id`, replacing any previous schedule. Re-targeting the
    /// meeting already being polled leaves its schedule running.
    pub fn watch(&self, meeting_id: &str) {
        let mut current = self.lock();

        if let Some(handle) = current.as_ref() {
            if handle.meeting_id == meeting_id && !handle.task.is_finished() {
                return;
            }
        }

        if let Some(previous) = current.take() {
            debug!(meeting_id = %previous.meeting_id, "Cancelling message polling");
            previous.cancel();
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(poll_loop(
            self.gateway.clone(),
            self.store.clone(),
            meeting_id.to_string(),
            self.interval,
            shutdown_rx,
        ));

        info!(
            meeting_id = %meeting_id,
            interval_ms = self.interval.as_millis() as u64,
            "Message polling started"
        );

        *current = Some(PollHandle {
            meeting_id: meeting_id.to_string(),
            shutdown_tx: Some(shutdown_tx),
            task,
        });
    }

    pub fn stop(&self) {
        if let Some(handle) = self.lock().take() {
            info!(meeting_id = %handle.meeting_id, "Message polling stopped");
            handle.cancel();
        }
    }

    pub fn current_target(&self) -> Option<String> {
        self.lock().as_ref().map(|h| h.meeting_id.clone())
    }

    pub fn is_running(&self) -> bool {
        self.lock()
            .as_ref()
            .map(|h| !h.task.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for MessagePoller {
    fn drop(&mut self) {
        let current = self.current.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = current.take() {
            handle.cancel();
        }
    }
}

async fn poll_loop(
    gateway: Arc<dyn MeetingGateway>,
    store: Arc<SessionStore>,
    meeting_id: String,
    period: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately; the caller has just loaded.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = ticker.tick() => {}
        }

        let ticket = store.begin_fetch(&meeting_id);
        let result = tokio::select! {
            _ = &mut shutdown_rx => break,
            result = gateway.get_messages(&meeting_id) => result,
        };

        match result {
            Ok(messages) => {
                store.replace_messages(&ticket, messages);
            }
            Err(e) => {
                warn!(
                    meeting_id = %meeting_id,
                    error_code = e.error_code(),
                    "Message poll failed: {}",
                    e
                );
            }
        }
    }

    debug!(meeting_id = %meeting_id, "Poll loop exited");
}
