use serde::{Deserialize, Serialize};

/// Raw status-check payload. The direct server reports `status`; the bridge
/// reports `bridge` and nests the upstream answer under `devika_status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub bridge: Option<String>,
    #[serde(default)]
    pub devika_status: Option<serde_json::Value>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub agents_count: Option<u64>,
    #[serde(default)]
    pub meetings_count: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Unknown,
    Online,
    Offline,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Unknown => write!(f, "unknown"),
            ConnectionState::Online => write!(f, "online"),
            ConnectionState::Offline => write!(f, "offline"),
        }
    }
}

/// Display-only connectivity indicator. Never gates any operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connectivity {
    pub state: ConnectionState,
    pub detail: Option<String>,
}

impl Connectivity {
    pub fn offline(detail: impl Into<String>) -> Self {
        Self {
            state: ConnectionState::Offline,
            detail: Some(detail.into()),
        }
    }

    pub fn is_online(&self) -> bool {
        self.state == ConnectionState::Online
    }
}

impl From<&GatewayStatus> for Connectivity {
    fn from(status: &GatewayStatus) -> Self {
        let upstream = status.devika_status.as_ref();
        let upstream_error = upstream
            .and_then(|v| v.get("error"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let upstream_status = upstream
            .and_then(|v| v.get("status"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        if let Some(err) = upstream_error {
            return Connectivity::offline(err);
        }

        let reported = status.status.as_deref().or(status.bridge.as_deref());
        let state = match reported {
            Some(s) if s.eq_ignore_ascii_case("online") => ConnectionState::Online,
            Some(_) => ConnectionState::Offline,
            None => ConnectionState::Unknown,
        };

        Connectivity {
            state,
            detail: upstream_status.or_else(|| status.service.clone()),
        }
    }
}
