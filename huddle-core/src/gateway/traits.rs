use async_trait::async_trait;

use crate::error::HuddleResult;
use crate::models::{
    Agent, CamelImport, DiscussionOutcome, DiscussionRequest, GatewayStatus, Meeting, Message,
    NewMeeting, OutgoingMessage,
};

/// Request/response access to the remote meeting authority.
///
/// Implementations report every non-success answer as a transport-class
/// [`HuddleError`](crate::error::HuddleError); callers never distinguish an
/// HTTP failure from a business rejection.
#[async_trait]
pub trait MeetingGateway: Send + Sync {
    async fn status(&self) -> HuddleResult<GatewayStatus>;

    async fn list_meetings(&self) -> HuddleResult<Vec<Meeting>>;

    async fn list_agents(&self, show_hidden: bool) -> HuddleResult<Vec<Agent>>;

    async fn get_meeting(&self, meeting_id: &str) -> HuddleResult<Meeting>;

    async fn create_meeting(&self, request: &NewMeeting) -> HuddleResult<Meeting>;

    async fn import_camel_session(&self, request: &CamelImport) -> HuddleResult<Meeting>;

    async fn get_messages(&self, meeting_id: &str) -> HuddleResult<Vec<Message>>;

    /// Returns the updated meeting when the remote includes it.
    async fn start_meeting(&self, meeting_id: &str) -> HuddleResult<Option<Meeting>>;

    /// Returns the updated meeting when the remote includes it.
    async fn end_meeting(&self, meeting_id: &str) -> HuddleResult<Option<Meeting>>;

    /// Acknowledgement only; the message is read back through `get_messages`.
    async fn post_message(&self, meeting_id: &str, message: &OutgoingMessage) -> HuddleResult<()>;

    /// May run far longer than other calls while agents produce their turns.
    async fn agent_discuss(
        &self,
        meeting_id: &str,
        request: &DiscussionRequest,
    ) -> HuddleResult<DiscussionOutcome>;
}
