use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{HuddleError, HuddleResult};
use crate::models::{DiscussionOutcome, DiscussionRequest, OutgoingMessage};
use crate::session::MeetingSession;
use crate::store::SessionStore;

/// Submits user messages and agent discussion rounds, then reconciles the
/// message list with one reload.
#[derive(Clone)]
pub struct MessageDispatcher {
    session: MeetingSession,
    pending: Arc<AtomicBool>,
}

/// Holds the discussion flag for the lifetime of one round.
struct PendingGuard<'a> {
    flag: &'a AtomicBool,
    store: &'a SessionStore,
}

impl<'a> PendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool, store: &'a SessionStore) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        store.set_discussion_pending(true);
        debug!("Discussion pending");
        Some(Self { flag, store })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.store.set_discussion_pending(false);
        debug!("Discussion settled");
    }
}

impl MessageDispatcher {
    pub fn new(session: MeetingSession) -> Self {
        Self {
            session,
            pending: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_discussing(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Posts a chat message as `sender_id` and reloads the message list.
    ///
    /// Once the post succeeds the message exists remotely, so a failed reload
    /// is logged and left to the poller.
    pub async fn send_message(
        &self,
        meeting_id: &str,
        sender_id: &str,
        content: &str,
    ) -> HuddleResult<()> {
        if content.trim().is_empty() {
            return Err(HuddleError::EmptyContent);
        }
        self.session.require_active(meeting_id)?;

        let message = OutgoingMessage::chat(sender_id, content);
        self.session
            .gateway()
            .post_message(meeting_id, &message)
            .await?;
        info!(meeting_id = %meeting_id, sender = %sender_id, "Message sent");

        if let Err(e) = self.session.reload_messages(meeting_id).await {
            warn!(
                meeting_id = %meeting_id,
                error_code = e.error_code(),
                "Reload after send failed: {}",
                e
            );
        }
        Ok(())
    }

    /// Asks the remote to run an agent discussion round.
    ///
    /// A blank `topic` falls back to the meeting's agenda, then its title.
    /// The message list is reloaded whether or not the round succeeded, since
    /// agents may have spoken before a failure.
    pub async fn trigger_discussion(
        &self,
        meeting_id: &str,
        topic: Option<&str>,
        agents: Option<Vec<String>>,
    ) -> HuddleResult<DiscussionOutcome> {
        let active = self.session.require_active(meeting_id)?;

        let topic = match topic.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => active.default_topic().to_string(),
        };

        let _guard = PendingGuard::acquire(&self.pending, self.session.store())
            .ok_or(HuddleError::DiscussionInProgress)?;

        info!(meeting_id = %meeting_id, topic = %topic, "Agent discussion requested");
        let request = DiscussionRequest { topic, agents };
        let result = self
            .session
            .gateway()
            .agent_discuss(meeting_id, &request)
            .await;

        if let Err(e) = self.session.reload_messages(meeting_id).await {
            warn!(
                meeting_id = %meeting_id,
                error_code = e.error_code(),
                "Reload after discussion failed: {}",
                e
            );
        }

        match &result {
            Ok(outcome) => {
                info!(meeting_id = %meeting_id, responses = outcome.count, "Agent discussion finished")
            }
            Err(e) => e.log(),
        }
        result
    }
}
