use tracing::{info, warn};

use crate::error::{HuddleError, HuddleResult};
use crate::models::{CamelImport, Meeting, MeetingStatus, NewMeeting};
use crate::session::MeetingSession;

/// Create, start and end meetings. Every transition is decided remotely and
/// only applied locally after the remote accepts it.
#[derive(Clone)]
pub struct MeetingLifecycle {
    session: MeetingSession,
}

impl MeetingLifecycle {
    pub fn new(session: MeetingSession) -> Self {
        Self { session }
    }

    /// Creates a meeting, adds it to the list and selects it.
    pub async fn create(&self, request: NewMeeting) -> HuddleResult<Meeting> {
        if request.title.trim().is_empty() {
            return Err(HuddleError::EmptyTitle);
        }

        let meeting = self.session.gateway().create_meeting(&request).await?;
        info!(meeting_id = %meeting.id, title = %meeting.title, "Meeting created");

        self.adopt(meeting).await
    }

    /// Turns a two-role CAMEL session into a meeting and selects it.
    pub async fn import_camel(&self, request: CamelImport) -> HuddleResult<Meeting> {
        let meeting = self
            .session
            .gateway()
            .import_camel_session(&request)
            .await?;
        info!(
            meeting_id = %meeting.id,
            session_id = ?request.session_id,
            "Meeting imported from CAMEL session"
        );

        self.adopt(meeting).await
    }

    async fn adopt(&self, meeting: Meeting) -> HuddleResult<Meeting> {
        self.session.store().upsert_meeting(&meeting);
        self.session.select_meeting(meeting.clone()).await;
        Ok(meeting)
    }

    /// Starts the active meeting.
    ///
    /// Starting a meeting that is already in progress asks the remote again
    /// and re-applies its answer. An ended meeting cannot be started.
    pub async fn start(&self, meeting_id: &str) -> HuddleResult<Meeting> {
        let active = self.session.require_active(meeting_id)?;
        if active.status != MeetingStatus::InProgress
            && !active.status.can_transition_to(MeetingStatus::InProgress)
        {
            return Err(HuddleError::InvalidTransition {
                meeting_id: meeting_id.to_string(),
                from: active.status,
                to: MeetingStatus::InProgress,
            });
        }

        let returned = self.session.gateway().start_meeting(meeting_id).await?;
        let mut updated = returned.unwrap_or(active);
        updated.status = updated.status.max(MeetingStatus::InProgress);

        self.session.store().apply_meeting_update(&updated);
        info!(meeting_id = %meeting_id, status = %updated.status, "Meeting started");

        if let Err(e) = self.session.refresh_meetings().await {
            warn!(meeting_id = %meeting_id, "Meeting list refresh failed: {}", e);
        }
        if let Err(e) = self.session.reload_messages(meeting_id).await {
            warn!(meeting_id = %meeting_id, "Message reload after start failed: {}", e);
        }

        // The user may have switched meetings while the call was in flight.
        let snapshot = self.session.store().snapshot();
        let current = snapshot
            .active_meeting
            .as_ref()
            .filter(|m| m.id == meeting_id)
            .or_else(|| snapshot.find_meeting(meeting_id))
            .cloned()
            .unwrap_or(updated);
        Ok(current)
    }

    /// Ends a meeting. If it is the active one, polling stops and the meeting
    /// is deselected.
    pub async fn end(&self, meeting_id: &str) -> HuddleResult<Option<Meeting>> {
        let returned = self.session.gateway().end_meeting(meeting_id).await?;

        if self.session.store().active_meeting_id().as_deref() == Some(meeting_id) {
            self.session.poller().stop();
            self.session.store().clear_active_if(meeting_id);
        }

        match returned.as_ref() {
            Some(meeting) => self.session.store().upsert_meeting(meeting),
            None => self.session.store().mark_ended(meeting_id),
        }
        info!(meeting_id = %meeting_id, "Meeting ended");

        if let Err(e) = self.session.refresh_meetings().await {
            warn!(meeting_id = %meeting_id, "Meeting list refresh failed: {}", e);
        }

        Ok(returned)
    }
}
