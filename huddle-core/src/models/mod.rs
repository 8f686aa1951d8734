mod agent;
mod meeting;
mod message;
mod status;

pub use agent::{Agent, AgentStatus};
pub use meeting::{CamelImport, Meeting, MeetingStatus, MeetingType, NewMeeting};
pub use message::{DiscussionOutcome, DiscussionRequest, Message, MessageType, OutgoingMessage};
pub use status::{ConnectionState, Connectivity, GatewayStatus};
