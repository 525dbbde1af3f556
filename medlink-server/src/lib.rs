mod config;
mod http;
mod room;
mod signaling;

pub use config::*;
pub use http::*;
pub use room::*;
pub use signaling::*;
