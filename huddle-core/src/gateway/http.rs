use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::{HuddleError, HuddleResult};
use crate::models::{
    Agent, CamelImport, DiscussionOutcome, DiscussionRequest, GatewayStatus, Meeting, Message,
    NewMeeting, OutgoingMessage,
};

use super::routes::{Route, RouteStyle};
use super::traits::MeetingGateway;

/// [`MeetingGateway`] over HTTP/JSON.
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    routes: RouteStyle,
    discuss_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct MeetingsResponse {
    #[serde(default)]
    meetings: Vec<Meeting>,
}

#[derive(Debug, Deserialize)]
struct AgentsResponse {
    #[serde(default)]
    agents: Vec<Agent>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct MeetingResponse {
    #[serde(default)]
    meeting: Option<Meeting>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> HuddleResult<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("huddle/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HuddleError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            routes: config.routes,
            discuss_timeout: config.discuss_timeout(),
        })
    }

    /// Gateway with default timeouts against `base_url`.
    pub fn with_base_url(base_url: &str, routes: RouteStyle) -> HuddleResult<Self> {
        Self::new(&GatewayConfig {
            base_url: base_url.to_string(),
            routes,
            ..GatewayConfig::default()
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn routes(&self) -> RouteStyle {
        self.routes
    }

    fn url(&self, route: Route<'_>) -> HuddleResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                HuddleError::InvalidConfigValue {
                    key: "gateway.base_url".to_string(),
                    message: format!("'{}' cannot carry a path", self.base_url),
                }
            })?
            .pop_if_empty()
            .extend(self.routes.segments(route));
        Ok(url)
    }

    /// Sends the request and returns the body of a 2xx response.
    async fn send(&self, request: RequestBuilder, route: Route<'_>) -> HuddleResult<String> {
        debug!(route = ?route, style = %self.routes, "Gateway request");

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                } else {
                    trimmed.chars().take(200).collect()
                }
            });

        debug!(route = ?route, status = status.as_u16(), %message, "Gateway rejected request");

        Err(HuddleError::GatewayRejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, route: Route<'_>) -> HuddleResult<T> {
        let request = self.client.get(self.url(route)?);
        let body = self.send(request, route).await?;
        decode(&body)
    }
}

fn parse_base_url(raw: &str) -> HuddleResult<Url> {
    Url::parse(raw.trim()).map_err(|e| HuddleError::InvalidConfigValue {
        key: "gateway.base_url".to_string(),
        message: format!("'{}' is not a valid URL: {}", raw, e),
    })
}

fn decode<T: DeserializeOwned>(body: &str) -> HuddleResult<T> {
    serde_json::from_str(body).map_err(|e| HuddleError::GatewayParseError(e.to_string()))
}

/// Acknowledgement bodies may be empty or carry extra fields; only a
/// well-formed `meeting` is taken from them.
fn decode_optional_meeting(body: &str) -> Option<Meeting> {
    serde_json::from_str::<MeetingResponse>(body)
        .ok()
        .and_then(|r| r.meeting)
}

fn require_meeting(body: &str) -> HuddleResult<Meeting> {
    decode::<MeetingResponse>(body)?
        .meeting
        .ok_or_else(|| HuddleError::GatewayParseError("response has no meeting".to_string()))
}

#[async_trait]
impl MeetingGateway for HttpGateway {
    async fn status(&self) -> HuddleResult<GatewayStatus> {
        self.get(Route::Status).await
    }

    async fn list_meetings(&self) -> HuddleResult<Vec<Meeting>> {
        let response: MeetingsResponse = self.get(Route::ListMeetings).await?;
        Ok(response.meetings)
    }

    async fn list_agents(&self, show_hidden: bool) -> HuddleResult<Vec<Agent>> {
        let mut url = self.url(Route::Agents)?;
        if show_hidden {
            url.query_pairs_mut().append_pair("show_hidden", "true");
        }

        let body = self.send(self.client.get(url), Route::Agents).await?;
        let response: AgentsResponse = decode(&body)?;
        Ok(response.agents)
    }

    async fn get_meeting(&self, meeting_id: &str) -> HuddleResult<Meeting> {
        let route = Route::Meeting(meeting_id);
        let body = self.send(self.client.get(self.url(route)?), route).await?;
        require_meeting(&body)
    }

    async fn create_meeting(&self, request: &NewMeeting) -> HuddleResult<Meeting> {
        let route = Route::CreateMeeting;
        let body = self
            .send(self.client.post(self.url(route)?).json(request), route)
            .await?;
        require_meeting(&body)
    }

    async fn import_camel_session(&self, request: &CamelImport) -> HuddleResult<Meeting> {
        let route = Route::FromCamel;
        let body = self
            .send(self.client.post(self.url(route)?).json(request), route)
            .await?;
        require_meeting(&body)
    }

    async fn get_messages(&self, meeting_id: &str) -> HuddleResult<Vec<Message>> {
        let response: MessagesResponse = self.get(Route::Messages(meeting_id)).await?;
        Ok(response.messages)
    }

    async fn start_meeting(&self, meeting_id: &str) -> HuddleResult<Option<Meeting>> {
        let route = Route::Start(meeting_id);
        let body = self.send(self.client.post(self.url(route)?), route).await?;
        Ok(decode_optional_meeting(&body))
    }

    async fn end_meeting(&self, meeting_id: &str) -> HuddleResult<Option<Meeting>> {
        let route = Route::End(meeting_id);
        let body = self.send(self.client.post(self.url(route)?), route).await?;
        Ok(decode_optional_meeting(&body))
    }

    async fn post_message(&self, meeting_id: &str, message: &OutgoingMessage) -> HuddleResult<()> {
        let route = Route::Messages(meeting_id);
        self.send(self.client.post(self.url(route)?).json(message), route)
            .await?;
        Ok(())
    }

    async fn agent_discuss(
        &self,
        meeting_id: &str,
        request: &DiscussionRequest,
    ) -> HuddleResult<DiscussionOutcome> {
        let route = Route::Discuss(meeting_id);
        let builder = self
            .client
            .post(self.url(route)?)
            .timeout(self.discuss_timeout)
            .json(request);
        let body = self.send(builder, route).await?;

        if body.trim().is_empty() {
            return Ok(DiscussionOutcome::default());
        }
        decode(&body)
    }
}
