use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle position of a meeting. The derived ordering follows the lifecycle,
/// so a status never compares lower than one it has already passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Draft,
    InProgress,
    Ended,
}

impl MeetingStatus {
    /// Whether `next` is reachable from `self` in one defined transition.
    pub fn can_transition_to(self, next: MeetingStatus) -> bool {
        matches!(
            (self, next),
            (MeetingStatus::Draft, MeetingStatus::InProgress)
                | (MeetingStatus::InProgress, MeetingStatus::Ended)
        )
    }
}

impl std::fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeetingStatus::Draft => write!(f, "draft"),
            MeetingStatus::InProgress => write!(f, "in_progress"),
            MeetingStatus::Ended => write!(f, "ended"),
        }
    }
}

/// Display classification only; carries no behaviour in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeetingType {
    #[default]
    Standup,
    Architecture,
    SprintPlanning,
    Retrospective,
    Emergency,
}

impl MeetingType {
    pub const ALL: [MeetingType; 5] = [
        MeetingType::Standup,
        MeetingType::Architecture,
        MeetingType::SprintPlanning,
        MeetingType::Retrospective,
        MeetingType::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingType::Standup => "standup",
            MeetingType::Architecture => "architecture",
            MeetingType::SprintPlanning => "sprint-planning",
            MeetingType::Retrospective => "retrospective",
            MeetingType::Emergency => "emergency",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MeetingType::Standup => "Standup",
            MeetingType::Architecture => "Architecture",
            MeetingType::SprintPlanning => "Sprint Planning",
            MeetingType::Retrospective => "Retrospective",
            MeetingType::Emergency => "Emergency",
        }
    }
}

impl std::fmt::Display for MeetingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        MeetingType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Unknown meeting type '{}'. Valid types: {}",
                    s,
                    MeetingType::ALL
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub agenda: String,
    #[serde(default)]
    pub meeting_type: MeetingType,
    pub status: MeetingStatus,
    #[serde(default, rename = "attendees", alias = "invited_agents")]
    pub invited_agents: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub action_items: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camel_session_id: Option<serde_json::Value>,
}

impl Meeting {
    pub fn is_active(&self) -> bool {
        self.status == MeetingStatus::InProgress
    }

    /// Topic used for an agent discussion round when the caller gives none:
    /// the agenda, else the title.
    pub fn default_topic(&self) -> &str {
        if self.agenda.trim().is_empty() {
            &self.title
        } else {
            &self.agenda
        }
    }

    /// Folds a fresher copy of the same meeting into this one without ever
    /// moving the status backwards.
    pub fn merge_from(&mut self, newer: &Meeting) {
        let status = self.status.max(newer.status);
        *self = newer.clone();
        self.status = status;
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some((end - start).num_seconds()),
            _ => None,
        }
    }
}

/// Body of a create-meeting request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMeeting {
    pub title: String,
    pub agenda: String,
    pub meeting_type: MeetingType,
    pub invite_agents: Vec<String>,
}

impl NewMeeting {
    pub fn new(title: impl Into<String>, agenda: impl Into<String>, meeting_type: MeetingType) -> Self {
        Self {
            title: title.into(),
            agenda: agenda.into(),
            meeting_type,
            invite_agents: Vec::new(),
        }
    }

    pub fn with_agents(mut self, agents: Vec<String>) -> Self {
        self.invite_agents = agents;
        self
    }
}

/// Body of a request turning a two-role CAMEL session into a meeting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CamelImport {
    #[serde(rename = "sessId")]
    pub session_id: Option<i64>,
    pub role1: String,
    pub role2: String,
    pub task: String,
}
