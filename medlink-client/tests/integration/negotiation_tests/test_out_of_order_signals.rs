use crate::integration::init_tracing;
use crate::utils::{PeerCall, QUIET_MS, SessionHarness};
use medlink_client::{NegotiationState, SessionEvent};
use medlink_core::{
    ChannelError, NegotiationError, RoomId, SessionDescription, SessionError, SignalMessage,
};
use serde_json::json;

#[tokio::test]
async fn test_answer_during_setup_aborts_call() -> anyhow::Result<()> {
    init_tracing();
    let mut h = SessionHarness::start("apt-42").await?;

    h.probe.push(h.answer("a1"));
    let seen = h.drain().await;

    assert!(matches!(
        seen.first(),
        Some(SessionEvent::Error(SessionError::Negotiation(NegotiationError::NoOutstandingOffer)))
    ));
    assert!(matches!(seen.last(), Some(SessionEvent::Ended)));
    assert!(h.handle.is_ended());
    assert_eq!(h.connector.pc.calls().await, vec![PeerCall::Close]);
    assert_eq!(h.probe.close_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_second_offer_is_reported() -> anyhow::Result<()> {
    init_tracing();
    let mut h = SessionHarness::start("apt-46").await?;

    h.probe.push(h.offer("o1"));
    h.probe.next_sent().await?;
    h.probe.push(h.offer("o2"));
    let event = h
        .wait_for(|e| matches!(e, SessionEvent::Error(_)))
        .await?;

    assert!(matches!(
        event,
        SessionEvent::Error(SessionError::Negotiation(NegotiationError::UnexpectedOffer("stable")))
    ));
    h.probe.expect_nothing_sent(QUIET_MS).await?;

    Ok(())
}

#[tokio::test]
async fn test_malformed_offer_during_setup_aborts_call() -> anyhow::Result<()> {
    init_tracing();
    let mut h = SessionHarness::start("apt-47").await?;

    let garbled = SignalMessage::Offer {
        room_id: h.room.clone(),
        sdp: json!({"bogus": 1}),
    };
    h.probe.push(garbled);
    let seen = h.drain().await;

    assert!(matches!(
        seen.first(),
        Some(SessionEvent::Error(SessionError::Negotiation(NegotiationError::MalformedDescription(_))))
    ));
    assert!(matches!(seen.last(), Some(SessionEvent::Ended)));
    assert!(h.handle.is_ended());
    h.probe.expect_nothing_sent(QUIET_MS).await?;

    Ok(())
}

#[tokio::test]
async fn test_mislabeled_description_during_setup_aborts_call() -> anyhow::Result<()> {
    init_tracing();
    let mut h = SessionHarness::start("apt-50").await?;

    // an answer payload inside an offer frame
    let mislabeled = SignalMessage::Offer {
        room_id: h.room.clone(),
        sdp: serde_json::to_value(SessionDescription::answer("a1"))?,
    };
    h.probe.push(mislabeled);
    let seen = h.drain().await;

    assert!(seen.iter().any(|e| matches!(e, SessionEvent::Error(_))));
    assert!(matches!(seen.last(), Some(SessionEvent::Ended)));
    assert!(!h.connector.pc.calls().await.contains(&PeerCall::CreateAnswer));

    Ok(())
}

#[tokio::test]
async fn test_malformed_offer_after_call_is_dropped() -> anyhow::Result<()> {
    init_tracing();
    let mut h = SessionHarness::start("apt-51").await?;
    h.probe.push(h.offer("o1"));
    h.wait_for(|e| matches!(e, SessionEvent::StateChanged(NegotiationState::Stable)))
        .await?;
    h.probe.next_sent().await?;

    h.probe.push(SignalMessage::Offer {
        room_id: h.room.clone(),
        sdp: json!({"bogus": 1}),
    });
    let event = h.wait_for(|e| matches!(e, SessionEvent::Error(_))).await?;
    assert!(matches!(
        event,
        SessionEvent::Error(SessionError::Negotiation(NegotiationError::MalformedDescription(_)))
    ));
    assert!(!h.handle.is_ended());
    assert_eq!(h.handle.status().state, NegotiationState::Stable);

    Ok(())
}

#[tokio::test]
async fn test_foreign_room_frames_are_ignored() -> anyhow::Result<()> {
    init_tracing();
    let mut h = SessionHarness::start("apt-52").await?;

    let foreign = SignalMessage::offer(RoomId::from("apt-other"), &SessionDescription::offer("o9"))?;
    h.probe.push(foreign);
    h.probe.expect_nothing_sent(QUIET_MS).await?;

    assert!(h.connector.pc.calls().await.is_empty());
    assert!(!h.handle.is_ended());
    assert_eq!(h.handle.status().state, NegotiationState::AwaitingRole);

    Ok(())
}

#[tokio::test]
async fn test_room_full_rejection_ends_session() -> anyhow::Result<()> {
    init_tracing();
    let mut h = SessionHarness::start("apt-48").await?;

    h.probe.push(SignalMessage::Rejected {
        room_id: h.room.clone(),
        reason: "room is full".to_owned(),
    });
    let seen = h.drain().await;

    assert!(seen.iter().any(|e| matches!(
        e,
        SessionEvent::Error(SessionError::Channel(ChannelError::Rejected(reason))) if reason == "room is full"
    )));
    assert!(matches!(seen.last(), Some(SessionEvent::Ended)));

    Ok(())
}
