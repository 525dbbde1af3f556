use crate::media::{LocalMedia, MediaTrack, RtcRemoteTrack};
use crate::transport::{PeerConnection, PeerConnectionState, PeerConnector, PeerEvent};
use async_trait::async_trait;
use medlink_core::{IceCandidate, IceServerConfig, NegotiationError, SdpType, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

fn rtc_err(e: webrtc::Error) -> NegotiationError {
    NegotiationError::PeerConnection(e.to_string())
}

/// Builds webrtc-rs peer connections against a fixed ICE server list.
#[derive(Debug, Clone)]
pub struct RtcConnector {
    ice_servers: Vec<IceServerConfig>,
}

impl RtcConnector {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }

    fn rtc_config(&self) -> RTCConfiguration {
        RTCConfiguration {
            ice_servers: self
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl PeerConnector for RtcConnector {
    async fn connect(
        &self,
        media: &LocalMedia,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Arc<dyn PeerConnection>, NegotiationError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs().map_err(rtc_err)?;
        let registry = register_default_interceptors(Registry::new(), &mut m).map_err(rtc_err)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let pc = Arc::new(
            api.new_peer_connection(self.rtc_config())
                .await
                .map_err(rtc_err)?,
        );

        for track in media.tracks() {
            let local: Arc<dyn TrackLocal + Send + Sync> = track.rtc_track();
            let sender = pc.add_track(local).await.map_err(rtc_err)?;
            // interceptors only run while someone reads RTCP
            tokio::spawn(async move {
                let mut rtcp_buf = vec![0u8; 1500];
                while sender.read(&mut rtcp_buf).await.is_ok() {}
            });
        }

        let state_tx = events.clone();
        pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            Box::pin(async move {
                info!("Peer connection state changed: {}", s);
                if let Some(state) = map_state(s) {
                    let _ = tx.send(PeerEvent::StateChanged(state));
                }
            })
        }));

        let ice_tx = events.clone();
        pc.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                match candidate.to_json() {
                    Ok(init) => {
                        let _ = tx.send(PeerEvent::LocalCandidate(from_rtc_candidate(init)));
                    }
                    Err(e) => warn!("Dropping unserializable local candidate: {}", e),
                }
            })
        }));

        let track_tx = events;
        pc.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                Box::pin(async move {
                    let track: Arc<dyn MediaTrack> = Arc::new(RtcRemoteTrack::new(track));
                    debug!(kind = %track.kind(), id = %track.id(), "Remote track arrived");
                    let _ = tx.send(PeerEvent::Track(track));
                })
            },
        ));

        Ok(Arc::new(RtcPeerConnection { pc }))
    }
}

fn map_state(s: RTCPeerConnectionState) -> Option<PeerConnectionState> {
    let state = match s {
        RTCPeerConnectionState::New => PeerConnectionState::New,
        RTCPeerConnectionState::Connecting => PeerConnectionState::Connecting,
        RTCPeerConnectionState::Connected => PeerConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => PeerConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => PeerConnectionState::Failed,
        RTCPeerConnectionState::Closed => PeerConnectionState::Closed,
        _ => return None,
    };
    Some(state)
}

fn from_rtc_candidate(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

fn to_rtc_candidate(candidate: IceCandidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate,
        sdp_mid: candidate.sdp_mid,
        sdp_mline_index: candidate.sdp_m_line_index,
        username_fragment: candidate.username_fragment,
    }
}

fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription, NegotiationError> {
    let parsed = match desc.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(desc.sdp),
        SdpType::Answer => RTCSessionDescription::answer(desc.sdp),
        SdpType::Pranswer => RTCSessionDescription::pranswer(desc.sdp),
        SdpType::Rollback => {
            return Err(NegotiationError::MalformedDescription(
                "rollback is not supported".to_owned(),
            ));
        }
    };
    parsed.map_err(|e| NegotiationError::MalformedDescription(e.to_string()))
}

fn from_rtc_description(desc: RTCSessionDescription) -> Result<SessionDescription, NegotiationError> {
    let sdp_type = match desc.sdp_type {
        RTCSdpType::Offer => SdpType::Offer,
        RTCSdpType::Answer => SdpType::Answer,
        RTCSdpType::Pranswer => SdpType::Pranswer,
        other => {
            return Err(NegotiationError::PeerConnection(format!(
                "unexpected local description type {}",
                other
            )));
        }
    };
    Ok(SessionDescription {
        sdp_type,
        sdp: desc.sdp,
    })
}

pub struct RtcPeerConnection {
    pc: Arc<RTCPeerConnection>,
}

#[async_trait]
impl PeerConnection for RtcPeerConnection {
    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError> {
        let offer = self.pc.create_offer(None).await.map_err(rtc_err)?;
        from_rtc_description(offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription, NegotiationError> {
        let answer = self.pc.create_answer(None).await.map_err(rtc_err)?;
        from_rtc_description(answer)
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), NegotiationError> {
        let desc = to_rtc_description(desc)?;
        self.pc.set_local_description(desc).await.map_err(rtc_err)
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), NegotiationError> {
        let desc = to_rtc_description(desc)?;
        self.pc.set_remote_description(desc).await.map_err(rtc_err)
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        self.pc
            .add_ice_candidate(to_rtc_candidate(candidate))
            .await
            .map_err(|e| NegotiationError::MalformedCandidate(e.to_string()))
    }

    async fn close(&self) -> Result<(), NegotiationError> {
        self.pc.close().await.map_err(rtc_err)
    }
}
