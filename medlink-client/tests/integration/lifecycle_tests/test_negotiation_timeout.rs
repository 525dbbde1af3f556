use crate::integration::init_tracing;
use crate::utils::SessionHarness;
use medlink_client::{ClientConfig, SampleCapture, SessionEvent};
use medlink_core::{NegotiationError, SessionError, SignalMessage};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_stalled_negotiation_times_out() -> anyhow::Result<()> {
    init_tracing();
    let config = ClientConfig {
        negotiation_timeout_secs: 2,
        ..ClientConfig::default()
    };
    let mut h = SessionHarness::start_with("apt-42", &config, &SampleCapture::new()).await?;

    // role arrives but the other party never answers
    h.probe.push(SignalMessage::Initiate(true));
    let seen = h.drain().await;

    assert!(seen.iter().any(|e| matches!(
        e,
        SessionEvent::Error(SessionError::Negotiation(NegotiationError::Timeout(d)))
            if *d == Duration::from_secs(2)
    )));
    assert!(matches!(seen.last(), Some(SessionEvent::Ended)));
    assert!(h.handle.is_ended());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_established_call_outlives_deadline() -> anyhow::Result<()> {
    init_tracing();
    let config = ClientConfig {
        negotiation_timeout_secs: 2,
        ..ClientConfig::default()
    };
    let mut h = SessionHarness::start_with("apt-43", &config, &SampleCapture::new()).await?;

    h.probe.push(h.offer("o1"));
    h.probe.next_sent().await?;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(!h.handle.is_ended());
    h.handle.end_call().await;
    Ok(())
}
