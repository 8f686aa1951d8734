pub mod agents;
pub mod chat;
pub mod meetings;

pub use agents::handle_agents_command;
pub use chat::{handle_discuss_command, handle_send_command, handle_watch_command};
pub use meetings::{handle_meetings_command, MeetingsCommand};
