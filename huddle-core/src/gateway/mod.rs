mod http;
mod routes;
mod traits;

pub use http::HttpGateway;
pub use routes::{Route, RouteStyle};
pub use traits::MeetingGateway;
