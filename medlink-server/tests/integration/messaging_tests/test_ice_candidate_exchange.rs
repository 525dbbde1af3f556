use crate::integration::init_tracing;
use crate::utils::{SILENCE_MS, TestClient, TestRelay};
use medlink_core::{IceCandidate, RoomId, SessionDescription, SignalMessage};

#[tokio::test]
async fn test_candidates_flow_both_ways() -> anyhow::Result<()> {
    init_tracing();
    let relay = TestRelay::start().await?;
    let room = RoomId::from("apt-42");

    let mut c1 = TestClient::connect("c1", relay.addr).await?;
    let mut c2 = TestClient::connect("c2", relay.addr).await?;
    c1.join("apt-42").await?;
    c1.expect_initiate().await?;
    c2.join("apt-42").await?;
    c2.expect_initiate().await?;

    let from_c1 = SignalMessage::candidate(room.clone(), &IceCandidate::new("candidate:c1"))?;
    c1.send(&from_c1).await?;
    assert_eq!(c2.recv().await?, from_c1);

    let from_c2 = SignalMessage::candidate(room.clone(), &IceCandidate::new("candidate:c2"))?;
    c2.send(&from_c2).await?;
    assert_eq!(c1.recv().await?, from_c2);

    c1.expect_silence(SILENCE_MS).await?;
    c2.expect_silence(SILENCE_MS).await?;

    Ok(())
}

#[tokio::test]
async fn test_candidate_before_answer_is_still_relayed() -> anyhow::Result<()> {
    init_tracing();
    let relay = TestRelay::start().await?;
    let room = RoomId::from("apt-43");

    let mut c1 = TestClient::connect("c1", relay.addr).await?;
    let mut c2 = TestClient::connect("c2", relay.addr).await?;
    c1.join("apt-43").await?;
    c1.expect_initiate().await?;
    c2.join("apt-43").await?;
    c2.expect_initiate().await?;

    let offer = SignalMessage::offer(room.clone(), &SessionDescription::offer("o1"))?;
    c1.send(&offer).await?;
    assert_eq!(c2.recv().await?, offer);

    // responder trickles a candidate before its answer
    let candidate = SignalMessage::candidate(room.clone(), &IceCandidate::new("candidate:early"))?;
    let answer = SignalMessage::answer(room.clone(), &SessionDescription::answer("a1"))?;
    c2.send(&candidate).await?;
    c2.send(&answer).await?;

    assert_eq!(c1.recv().await?, candidate);
    assert_eq!(c1.recv().await?, answer);

    Ok(())
}
