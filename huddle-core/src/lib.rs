pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod poller;
pub mod room;
pub mod session;
pub mod store;

pub use config::{
    get_config_dir, ChatConfig, ConfigLoadError, GatewayConfig, HuddleConfig, LoggingConfig,
    PollingConfig,
};
pub use dispatcher::MessageDispatcher;
pub use error::{CliErrorDisplay, HuddleError, HuddleResult};
pub use gateway::{HttpGateway, MeetingGateway, Route, RouteStyle};
pub use lifecycle::MeetingLifecycle;
pub use models::{
    Agent, AgentStatus, CamelImport, ConnectionState, Connectivity, DiscussionOutcome,
    DiscussionRequest, GatewayStatus, Meeting, MeetingStatus, MeetingType, Message, MessageType,
    NewMeeting, OutgoingMessage,
};
pub use poller::MessagePoller;
pub use room::{Bootstrap, MeetingRoom};
pub use session::MeetingSession;
pub use store::{FetchTicket, SessionSnapshot, SessionStore};
