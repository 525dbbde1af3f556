pub use medlink_core::model::{ConnectionId, RoomId, SignalMessage};

pub mod model {
    pub use medlink_core::model::*;
}

pub mod error {
    pub use medlink_core::error::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use medlink_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use medlink_client::*;
}
