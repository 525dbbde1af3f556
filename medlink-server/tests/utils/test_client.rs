use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use medlink_core::{RoomId, SignalMessage};

use super::signal_helpers::SIGNAL_TIMEOUT_MS;

/// A bare signaling client speaking the relay's JSON frames over a real socket.
pub struct TestClient {
    pub name: &'static str,
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn connect(name: &'static str, addr: SocketAddr) -> Result<Self> {
        let (ws, _) = connect_async(format!("ws://{addr}/ws"))
            .await
            .with_context(|| format!("{name}: failed to connect"))?;
        Ok(Self { name, ws })
    }

    pub async fn send(&mut self, msg: &SignalMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        self.send_raw(&json).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.ws
            .send(Message::Text(text.to_owned().into()))
            .await
            .with_context(|| format!("{}: send failed", self.name))
    }

    pub async fn join(&mut self, room: &str) -> Result<()> {
        self.send(&SignalMessage::Join {
            room_id: RoomId::from(room),
        })
        .await
    }

    /// Next text frame from the relay, as raw JSON.
    pub async fn recv_raw(&mut self) -> Result<String> {
        let timeout = Duration::from_millis(SIGNAL_TIMEOUT_MS);
        loop {
            let frame = tokio::time::timeout(timeout, self.ws.next())
                .await
                .with_context(|| format!("{}: timed out waiting for a frame", self.name))?;
            match frame {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
                Some(Ok(Message::Close(_))) | None => bail!("{}: connection closed", self.name),
                Some(Ok(_)) => continue,
                Some(Err(e)) => bail!("{}: socket error: {e}", self.name),
            }
        }
    }

    pub async fn recv(&mut self) -> Result<SignalMessage> {
        let text = self.recv_raw().await?;
        serde_json::from_str(&text).with_context(|| format!("{}: bad frame {text}", self.name))
    }

    pub async fn expect_initiate(&mut self) -> Result<bool> {
        match self.recv().await? {
            SignalMessage::Initiate(flag) => Ok(flag),
            other => bail!("{}: expected initiate, got {:?}", self.name, other),
        }
    }

    /// Asserts nothing arrives within `ms`.
    pub async fn expect_silence(&mut self, ms: u64) -> Result<()> {
        match tokio::time::timeout(Duration::from_millis(ms), self.ws.next()).await {
            Err(_) => Ok(()),
            Ok(Some(Ok(Message::Text(text)))) => {
                bail!("{}: expected silence, got {}", self.name, text.as_str())
            }
            Ok(_) => Ok(()),
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}
