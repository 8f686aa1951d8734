use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{HuddleError, HuddleResult};
use crate::gateway::MeetingGateway;
use crate::models::{Agent, Connectivity, Meeting};
use crate::poller::MessagePoller;
use crate::store::SessionStore;

/// Shared handle over the gateway, the store and the poller.
///
/// Selecting a meeting is the one place where all three move together: the
/// store switches the active meeting and drops the old messages, the poller
/// is re-targeted, and the new meeting's messages are loaded right away.
#[derive(Clone)]
pub struct MeetingSession {
    gateway: Arc<dyn MeetingGateway>,
    store: Arc<SessionStore>,
    poller: Arc<MessagePoller>,
}

impl MeetingSession {
    pub fn new(gateway: Arc<dyn MeetingGateway>, poll_interval: Duration) -> Self {
        let store = Arc::new(SessionStore::new());
        let poller = Arc::new(MessagePoller::new(
            gateway.clone(),
            store.clone(),
            poll_interval,
        ));
        Self {
            gateway,
            store,
            poller,
        }
    }

    pub fn gateway(&self) -> &Arc<dyn MeetingGateway> {
        &self.gateway
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn poller(&self) -> &MessagePoller {
        &self.poller
    }

    /// Makes `meeting` active, starts polling it and loads its messages.
    ///
    /// The initial load failing is not an error; the poller retries on its
    /// next tick.
    pub async fn select_meeting(&self, meeting: Meeting) {
        let meeting_id = meeting.id.clone();

        if self.store.select_meeting(meeting) {
            info!(meeting_id = %meeting_id, "Meeting selected");
        }
        self.poller.watch(&meeting_id);

        if let Err(e) = self.reload_messages(&meeting_id).await {
            warn!(
                meeting_id = %meeting_id,
                error_code = e.error_code(),
                "Initial message load failed: {}",
                e
            );
        }
    }

    /// Selects a meeting from the local list, falling back to the remote.
    pub async fn select_meeting_by_id(&self, meeting_id: &str) -> HuddleResult<Meeting> {
        let meeting = match self.store.snapshot().find_meeting(meeting_id).cloned() {
            Some(meeting) => meeting,
            None => {
                let meeting = self.gateway.get_meeting(meeting_id).await?;
                self.store.upsert_meeting(&meeting);
                meeting
            }
        };

        self.select_meeting(meeting.clone()).await;
        Ok(meeting)
    }

    pub fn clear_active(&self) {
        self.poller.stop();
        self.store.clear_active();
    }

    /// Fetches the messages of `meeting_id` and writes them if it is still
    /// active and nothing newer has landed meanwhile. Returns whether the
    /// result was applied.
    pub async fn reload_messages(&self, meeting_id: &str) -> HuddleResult<bool> {
        let ticket = self.store.begin_fetch(meeting_id);
        let messages = self.gateway.get_messages(meeting_id).await?;
        let count = messages.len();
        let applied = self.store.replace_messages(&ticket, messages);
        debug!(meeting_id = %meeting_id, count, applied, "Messages reloaded");
        Ok(applied)
    }

    pub async fn refresh_meetings(&self) -> HuddleResult<Vec<Meeting>> {
        let meetings = self.gateway.list_meetings().await?;
        self.store.set_meetings(meetings.clone());
        Ok(meetings)
    }

    pub async fn refresh_agents(&self, show_hidden: bool) -> HuddleResult<Vec<Agent>> {
        let agents = self.gateway.list_agents(show_hidden).await?;
        self.store.set_agents(agents.clone());
        Ok(agents)
    }

    /// Records the gateway's reachability. Never fails; an unreachable
    /// gateway is reported as offline.
    pub async fn check_status(&self) -> Connectivity {
        let connectivity = match self.gateway.status().await {
            Ok(status) => Connectivity::from(&status),
            Err(e) => {
                debug!(error_code = e.error_code(), "Status check failed: {}", e);
                Connectivity::offline(e.to_string())
            }
        };
        self.store.set_connectivity(connectivity.clone());
        connectivity
    }

    /// The active meeting, checked against the id an operation targets.
    pub fn require_active(&self, meeting_id: &str) -> HuddleResult<Meeting> {
        match self.store.active_meeting() {
            None => Err(HuddleError::NoActiveMeeting),
            Some(active) if active.id != meeting_id => Err(HuddleError::MeetingNotActive {
                requested: meeting_id.to_string(),
                active: active.id,
            }),
            Some(active) => Ok(active),
        }
    }
}
