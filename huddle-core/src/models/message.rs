use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Chat,
    System,
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageType::Chat => write!(f, "chat"),
            MessageType::System => write!(f, "system"),
        }
    }
}

/// One append-only utterance. Order is whatever the remote returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    /// The remote usually omits this; the store stamps it on accepted messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,
    pub agent_id: String,
    #[serde(default)]
    pub agent_name: String,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    pub fn is_system(&self) -> bool {
        self.message_type == MessageType::System
    }

    pub fn sender_label(&self) -> &str {
        if self.agent_name.is_empty() {
            "System"
        } else {
            &self.agent_name
        }
    }

    pub fn belongs_to(&self, meeting_id: &str) -> bool {
        self.meeting_id.as_deref().map_or(true, |id| id == meeting_id)
    }
}

/// Body of a post-message request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub agent_id: String,
    pub content: String,
    pub message_type: MessageType,
}

impl OutgoingMessage {
    pub fn chat(agent_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            content: content.into(),
            message_type: MessageType::Chat,
        }
    }
}

/// Body of an agent-discuss request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscussionRequest {
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<String>>,
}

/// What the remote reported about a discussion round. A bare acknowledgement
/// decodes to zero responses.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DiscussionOutcome {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub responses: Vec<Message>,
}
