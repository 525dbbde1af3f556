mod test_list_reports;

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub const TEST_TOKEN: &str = "session-token";

/// Serves `app` on an ephemeral port for the rest of the test.
pub async fn spawn_service(app: Router) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(addr)
}
