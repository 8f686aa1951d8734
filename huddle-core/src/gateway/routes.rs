use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which URL layout the remote speaks: the meeting server itself, or the
/// bridge that proxies it under `/meeting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteStyle {
    #[default]
    Direct,
    Bridge,
}

impl std::fmt::Display for RouteStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteStyle::Direct => write!(f, "direct"),
            RouteStyle::Bridge => write!(f, "bridge"),
        }
    }
}

impl FromStr for RouteStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" | "api" => Ok(RouteStyle::Direct),
            "bridge" | "meeting" => Ok(RouteStyle::Bridge),
            other => Err(format!(
                "Unknown route style '{}'. Valid styles: direct, bridge",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Status,
    Agents,
    ListMeetings,
    CreateMeeting,
    FromCamel,
    Meeting(&'a str),
    Start(&'a str),
    End(&'a str),
    Messages(&'a str),
    Discuss(&'a str),
}

impl RouteStyle {
    /// Path segments for `route`, to be appended to the gateway base URL.
    pub fn segments<'a>(&self, route: Route<'a>) -> Vec<&'a str> {
        match self {
            RouteStyle::Direct => match route {
                Route::Status => vec!["api", "status"],
                Route::Agents => vec!["api", "agents"],
                Route::ListMeetings | Route::CreateMeeting => vec!["api", "meetings"],
                Route::FromCamel => vec!["api", "meetings", "from-camel"],
                Route::Meeting(id) => vec!["api", "meetings", id],
                Route::Start(id) => vec!["api", "meetings", id, "start"],
                Route::End(id) => vec!["api", "meetings", id, "end"],
                Route::Messages(id) => vec!["api", "meetings", id, "messages"],
                Route::Discuss(id) => vec!["api", "meetings", id, "agent-discuss"],
            },
            RouteStyle::Bridge => match route {
                Route::Status => vec!["meeting", "status"],
                Route::Agents => vec!["meeting", "agents"],
                Route::ListMeetings => vec!["meeting", "list"],
                Route::CreateMeeting => vec!["meeting", "create"],
                Route::FromCamel => vec!["meeting", "from-camel"],
                Route::Meeting(id) => vec!["meeting", id],
                Route::Start(id) => vec!["meeting", id, "start"],
                Route::End(id) => vec!["meeting", id, "end"],
                Route::Messages(id) => vec!["meeting", id, "messages"],
                Route::Discuss(id) => vec!["meeting", id, "agent-discuss"],
            },
        }
    }
}
