use crate::integration::init_tracing;
use crate::utils::{MOCK_OFFER, PeerCall, QUIET_MS, SessionHarness};
use medlink_client::{NegotiationState, Role, SessionEvent};
use medlink_core::{SessionDescription, SignalMessage};

#[tokio::test]
async fn test_initiator_offers_then_applies_answer() -> anyhow::Result<()> {
    init_tracing();
    let mut h = SessionHarness::start("apt-42").await?;

    assert!(h.probe.push(SignalMessage::Initiate(true)));
    let event = h.next_event().await?;
    assert!(matches!(event, SessionEvent::RoleAssigned(Role::Initiator)));

    let offer = h.probe.next_sent().await?;
    assert_eq!(offer, h.offer(MOCK_OFFER));
    assert_eq!(
        h.connector.pc.calls().await,
        vec![
            PeerCall::CreateOffer,
            PeerCall::SetLocal(SessionDescription::offer(MOCK_OFFER)),
        ]
    );

    h.probe.push(h.answer("a1"));
    h.wait_for(|e| matches!(e, SessionEvent::StateChanged(NegotiationState::Stable)))
        .await?;
    assert_eq!(
        h.connector.pc.calls().await.last(),
        Some(&PeerCall::SetRemote(SessionDescription::answer("a1")))
    );
    assert_eq!(h.handle.status().role, Role::Initiator);

    Ok(())
}

#[tokio::test]
async fn test_repeated_initiate_sends_one_offer() -> anyhow::Result<()> {
    init_tracing();
    let mut h = SessionHarness::start("apt-43").await?;

    h.probe.push(SignalMessage::Initiate(true));
    h.probe.next_sent().await?;
    h.probe.push(SignalMessage::Initiate(true));
    h.probe.expect_nothing_sent(QUIET_MS).await?;

    assert_eq!(
        h.connector.pc.count(|c| *c == PeerCall::CreateOffer).await,
        1
    );
    assert_eq!(h.handle.status().state, NegotiationState::HaveLocalOffer);

    Ok(())
}
