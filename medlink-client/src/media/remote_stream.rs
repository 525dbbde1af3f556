use crate::media::TrackKind;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_remote::TrackRemote;

/// A track received from the remote peer.
pub trait MediaTrack: Send + Sync + fmt::Debug {
    fn id(&self) -> String;
    fn kind(&self) -> TrackKind;
    fn stream_id(&self) -> String;
}

pub struct RtcRemoteTrack {
    track: Arc<TrackRemote>,
}

impl RtcRemoteTrack {
    pub fn new(track: Arc<TrackRemote>) -> Self {
        Self { track }
    }

    /// The underlying track, for reading RTP.
    pub fn rtc_track(&self) -> Arc<TrackRemote> {
        Arc::clone(&self.track)
    }
}

impl MediaTrack for RtcRemoteTrack {
    fn id(&self) -> String {
        self.track.id()
    }

    fn kind(&self) -> TrackKind {
        match self.track.kind() {
            RTPCodecType::Audio => TrackKind::Audio,
            _ => TrackKind::Video,
        }
    }

    fn stream_id(&self) -> String {
        self.track.stream_id()
    }
}

impl fmt::Debug for RtcRemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtcRemoteTrack")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .finish()
    }
}

/// Remote tracks collected for the rendering surface.
///
/// Subscribers are woken every time a track is added.
pub struct RemoteStream {
    tracks: watch::Sender<Vec<Arc<dyn MediaTrack>>>,
}

impl Default for RemoteStream {
    fn default() -> Self {
        let (tracks, _) = watch::channel(Vec::new());
        Self { tracks }
    }
}

impl RemoteStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `track` unless a track with the same id is already present.
    pub fn add_track(&self, track: Arc<dyn MediaTrack>) -> bool {
        self.tracks.send_if_modified(|tracks| {
            if tracks.iter().any(|t| t.id() == track.id()) {
                return false;
            }
            tracks.push(track);
            true
        })
    }

    pub fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.tracks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Arc<dyn MediaTrack>>> {
        self.tracks.subscribe()
    }
}

impl fmt::Debug for RemoteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStream")
            .field("tracks", &*self.tracks.borrow())
            .finish()
    }
}
