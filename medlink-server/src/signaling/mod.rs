mod connection_state;
mod relay_connection;
mod signaling_relay;
mod ws_handler;

pub use connection_state::*;
pub use relay_connection::*;
pub use signaling_relay::*;
pub use ws_handler::*;
