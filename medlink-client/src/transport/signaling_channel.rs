use async_trait::async_trait;
use medlink_core::{ChannelError, SignalMessage};

/// Outbound half of a signaling connection. Inbound frames arrive on the
/// receiver handed out alongside the channel.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    async fn send(&self, msg: SignalMessage) -> Result<(), ChannelError>;

    /// Closes the connection. Closing twice is a no-op.
    async fn close(&self) -> Result<(), ChannelError>;
}
