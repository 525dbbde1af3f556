use crate::signaling::{Flow, SignalingRelay};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(relay): State<SignalingRelay>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

async fn handle_socket(socket: WebSocket, relay: SignalingRelay) {
    let mut conn = relay.connect();
    let conn_id = conn.id();
    info!(conn = %conn_id, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            frame = conn.next_outbound() => {
                let Some(text) = frame else { break };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if conn.handle_text(text.as_str()) == Flow::Close {
                            let _ = sender.send(Message::Close(None)).await;
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(conn = %conn_id, "WebSocket receive error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    conn.release();
    info!(conn = %conn_id, "WebSocket disconnected");
}
