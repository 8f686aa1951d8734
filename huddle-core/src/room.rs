use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::config::HuddleConfig;
use crate::dispatcher::MessageDispatcher;
use crate::error::HuddleResult;
use crate::gateway::{HttpGateway, MeetingGateway};
use crate::lifecycle::MeetingLifecycle;
use crate::models::{Agent, CamelImport, Connectivity, DiscussionOutcome, Meeting, NewMeeting};
use crate::session::MeetingSession;
use crate::store::SessionSnapshot;

/// Result of the initial concurrent load.
#[derive(Debug)]
pub struct Bootstrap {
    pub connectivity: Connectivity,
    pub meetings: HuddleResult<Vec<Meeting>>,
    pub agents: HuddleResult<Vec<Agent>>,
}

/// Entry point for a presentation layer: exposes the observable snapshot and
/// accepts user intents.
///
/// Dropping the room cancels message polling.
pub struct MeetingRoom {
    session: MeetingSession,
    lifecycle: MeetingLifecycle,
    dispatcher: MessageDispatcher,
    show_hidden_agents: bool,
}

impl MeetingRoom {
    pub fn new(gateway: Arc<dyn MeetingGateway>, config: &HuddleConfig) -> Self {
        let session = MeetingSession::new(gateway, config.poll_interval());
        Self {
            lifecycle: MeetingLifecycle::new(session.clone()),
            dispatcher: MessageDispatcher::new(session.clone()),
            session,
            show_hidden_agents: config.gateway.show_hidden_agents,
        }
    }

    /// Room talking HTTP to the configured gateway.
    pub fn from_config(config: &HuddleConfig) -> HuddleResult<Self> {
        let gateway = HttpGateway::new(&config.gateway)?;
        info!(
            base_url = %gateway.base_url(),
            routes = %gateway.routes(),
            "Meeting gateway configured"
        );
        Ok(Self::new(Arc::new(gateway), config))
    }

    pub fn session(&self) -> &MeetingSession {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.store().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.session.store().subscribe()
    }

    /// Checks status and loads meetings and agents concurrently.
    pub async fn bootstrap(&self) -> Bootstrap {
        let (connectivity, meetings, agents) = tokio::join!(
            self.session.check_status(),
            self.session.refresh_meetings(),
            self.session.refresh_agents(self.show_hidden_agents),
        );
        Bootstrap {
            connectivity,
            meetings,
            agents,
        }
    }

    pub async fn check_status(&self) -> Connectivity {
        self.session.check_status().await
    }

    pub async fn refresh_meetings(&self) -> HuddleResult<Vec<Meeting>> {
        self.session.refresh_meetings().await
    }

    pub async fn refresh_agents(&self, show_hidden: bool) -> HuddleResult<Vec<Agent>> {
        self.session.refresh_agents(show_hidden).await
    }

    pub async fn select_meeting(&self, meeting: Meeting) {
        self.session.select_meeting(meeting).await
    }

    pub async fn select_meeting_by_id(&self, meeting_id: &str) -> HuddleResult<Meeting> {
        self.session.select_meeting_by_id(meeting_id).await
    }

    pub fn clear_active(&self) {
        self.session.clear_active()
    }

    pub async fn reload_messages(&self, meeting_id: &str) -> HuddleResult<bool> {
        self.session.reload_messages(meeting_id).await
    }

    pub async fn create_meeting(&self, request: NewMeeting) -> HuddleResult<Meeting> {
        self.lifecycle.create(request).await
    }

    pub async fn import_camel(&self, request: CamelImport) -> HuddleResult<Meeting> {
        self.lifecycle.import_camel(request).await
    }

    pub async fn start_meeting(&self, meeting_id: &str) -> HuddleResult<Meeting> {
        self.lifecycle.start(meeting_id).await
    }

    pub async fn end_meeting(&self, meeting_id: &str) -> HuddleResult<Option<Meeting>> {
        self.lifecycle.end(meeting_id).await
    }

    pub async fn send_message(
        &self,
        meeting_id: &str,
        sender_id: &str,
        content: &str,
    ) -> HuddleResult<()> {
        self.dispatcher
            .send_message(meeting_id, sender_id, content)
            .await
    }

    pub async fn trigger_discussion(
        &self,
        meeting_id: &str,
        topic: Option<&str>,
        agents: Option<Vec<String>>,
    ) -> HuddleResult<DiscussionOutcome> {
        self.dispatcher
            .trigger_discussion(meeting_id, topic, agents)
            .await
    }

    pub fn is_discussing(&self) -> bool {
        self.dispatcher.is_discussing()
    }

    /// Stops polling. The snapshot stays readable.
    pub fn shutdown(&self) {
        self.session.poller().stop();
    }
}

impl Drop for MeetingRoom {
    fn drop(&mut self) {
        self.session.poller().stop();
    }
}
