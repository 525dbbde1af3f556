pub mod error;
pub mod model;

pub use error::{CaptureError, ChannelError, NegotiationError, RoomStateError, SessionError};
pub use model::*;
