use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Online,
    Hidden,
    Standby,
    Offline,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Online => write!(f, "online"),
            AgentStatus::Hidden => write!(f, "hidden"),
            AgentStatus::Standby => write!(f, "standby"),
            AgentStatus::Offline => write!(f, "offline"),
        }
    }
}

/// A named automated participant. Only `status` changes between roster loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub codename: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub avatar_letter: String,
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl Agent {
    pub fn is_available(&self) -> bool {
        matches!(self.status, AgentStatus::Online | AgentStatus::Standby)
    }

    /// Letter shown in the avatar bubble, falling back to the first letter of the name.
    pub fn display_letter(&self) -> String {
        if !self.avatar_letter.is_empty() {
            return self.avatar_letter.clone();
        }
        self.name
            .chars()
            .next()
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_else(|| "?".to_string())
    }
}
