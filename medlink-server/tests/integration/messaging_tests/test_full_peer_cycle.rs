use crate::integration::init_tracing;
use crate::utils::{SILENCE_MS, TestClient, TestRelay};
use medlink_core::{RoomId, SessionDescription, SignalMessage};

#[tokio::test]
async fn test_offer_answer_reach_only_the_other_party() -> anyhow::Result<()> {
    init_tracing();
    let relay = TestRelay::start().await?;
    let room = RoomId::from("apt-42");

    let mut c1 = TestClient::connect("c1", relay.addr).await?;
    let mut c2 = TestClient::connect("c2", relay.addr).await?;

    c1.join("apt-42").await?;
    assert!(c1.expect_initiate().await?);
    c2.join("apt-42").await?;
    assert!(!c2.expect_initiate().await?);

    let offer = SignalMessage::offer(room.clone(), &SessionDescription::offer("o1"))?;
    c1.send(&offer).await?;
    assert_eq!(c2.recv().await?, offer);
    c1.expect_silence(SILENCE_MS).await?;

    let answer = SignalMessage::answer(room.clone(), &SessionDescription::answer("a1"))?;
    c2.send(&answer).await?;
    assert_eq!(c1.recv().await?, answer);
    c2.expect_silence(SILENCE_MS).await?;

    Ok(())
}

#[tokio::test]
async fn test_relay_forwards_frame_verbatim() -> anyhow::Result<()> {
    init_tracing();
    let relay = TestRelay::start().await?;

    let mut c1 = TestClient::connect("c1", relay.addr).await?;
    let mut c2 = TestClient::connect("c2", relay.addr).await?;
    c1.join("apt-9").await?;
    c1.expect_initiate().await?;
    c2.join("apt-9").await?;
    c2.expect_initiate().await?;

    // payloads the relay does not understand still pass through untouched
    let raw = r#"{"event":"offer","data":{"roomId":"apt-9","sdp":{"x-vendor":[1,2,{"deep":null}]}}}"#;
    c1.send_raw(raw).await?;
    assert_eq!(c2.recv_raw().await?, raw);

    Ok(())
}
