use crate::integration::init_tracing;
use crate::utils::TestRelay;
use medlink_server::HEALTH_MESSAGE;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::test]
async fn test_health_check_returns_static_body() -> anyhow::Result<()> {
    init_tracing();
    let relay = TestRelay::start().await?;

    let mut stream = TcpStream::connect(relay.addr).await?;
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await?;
    let mut response = String::new();
    stream.read_to_string(&mut response).await?;

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with(HEALTH_MESSAGE), "{response}");

    Ok(())
}
