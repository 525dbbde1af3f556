use crate::integration::init_tracing;
use crate::utils::{MockConnector, mock_channel};
use medlink_client::{ClientConfig, PeerSession, SampleCapture, SessionParts, TrackKind};
use medlink_core::{CaptureError, RoomId, SessionError};

#[tokio::test]
async fn test_capture_failure_aborts_before_join() -> anyhow::Result<()> {
    init_tracing();
    let cases = [
        (SampleCapture::denied(), CaptureError::PermissionDenied),
        (
            SampleCapture::with_devices([TrackKind::Audio]),
            CaptureError::NoDevice("video"),
        ),
    ];

    for (capture, expected) in cases {
        let connector = MockConnector::new();
        let (channel, inbound, mut probe) = mock_channel();
        let parts = SessionParts {
            capture: &capture,
            connector: &connector,
            channel,
            inbound,
        };

        let err = PeerSession::start(&ClientConfig::default(), RoomId::from("apt-1"), parts)
            .await
            .err()
            .unwrap();

        assert_eq!(err, SessionError::Capture(expected));
        probe.expect_nothing_sent(50).await?;
        assert_eq!(probe.close_count(), 1);
    }
    Ok(())
}

#[tokio::test]
async fn test_peer_connection_failure_aborts_before_join() -> anyhow::Result<()> {
    init_tracing();
    let capture = SampleCapture::new();
    let connector = MockConnector::failing();
    let (channel, inbound, mut probe) = mock_channel();
    let parts = SessionParts {
        capture: &capture,
        connector: &connector,
        channel,
        inbound,
    };

    let result = PeerSession::start(&ClientConfig::default(), RoomId::from("apt-2"), parts).await;

    assert!(matches!(result, Err(SessionError::Negotiation(_))));
    probe.expect_nothing_sent(50).await?;
    assert_eq!(probe.close_count(), 1);
    Ok(())
}
