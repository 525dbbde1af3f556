mod peer_connection;
mod rtc_connection;
mod signaling_channel;
mod ws_channel;

pub use peer_connection::*;
pub use rtc_connection::*;
pub use signaling_channel::*;
pub use ws_channel::*;
