use crate::transport::SignalingChannel;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use medlink_core::{ChannelError, SignalMessage};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Signaling channel over a WebSocket connection to the relay.
///
/// A writer task owns the sink and a reader task decodes text frames into
/// the inbound receiver. The receiver ends when the relay closes the socket.
pub struct WsChannel {
    outbound: mpsc::UnboundedSender<Message>,
    closed: AtomicBool,
}

impl WsChannel {
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SignalMessage>), ChannelError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        info!(%url, "Connected to signaling relay");

        let (mut sink, mut stream) = ws.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if let Err(e) = sink.send(msg).await {
                    warn!("Signaling send failed: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
            debug!("Signaling writer finished");
        });

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<SignalMessage>(text.as_str()) {
                            Ok(msg) => {
                                if in_tx.send(msg).is_err() {
                                    debug!("Inbound receiver gone, stopping reader");
                                    break;
                                }
                            }
                            Err(e) => warn!("Dropping undecodable signaling frame: {}", e),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Signaling receive failed: {}", e);
                        break;
                    }
                }
            }
            debug!("Signaling reader finished");
        });

        Ok((
            Self {
                outbound: out_tx,
                closed: AtomicBool::new(false),
            },
            in_rx,
        ))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.outbound.is_closed()
    }
}

#[async_trait]
impl SignalingChannel for WsChannel {
    async fn send(&self, msg: SignalMessage) -> Result<(), ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        let text = serde_json::to_string(&msg).map_err(|e| ChannelError::Encode(e.to_string()))?;
        self.outbound
            .send(Message::Text(text.into()))
            .map_err(|_| ChannelError::Closed)
    }

    async fn close(&self) -> Result<(), ChannelError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        // the writer may already be gone if the relay hung up first
        let _ = self.outbound.send(Message::Close(None));
        Ok(())
    }
}
