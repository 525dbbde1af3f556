use medlink_core::CaptureError;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use webrtc::media::Sample;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl TrackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One captured track. Samples written after [`stop`](Self::stop) are refused.
pub struct LocalTrack {
    kind: TrackKind,
    track: Arc<TrackLocalStaticSample>,
    stopped: AtomicBool,
}

impl LocalTrack {
    pub fn new(kind: TrackKind, track: Arc<TrackLocalStaticSample>) -> Self {
        Self {
            kind,
            track,
            stopped: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        self.track.id()
    }

    pub fn rtc_track(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.track)
    }

    pub async fn write_sample(&self, sample: &Sample) -> Result<(), CaptureError> {
        if self.is_stopped() {
            return Err(CaptureError::Backend(format!("{} track stopped", self.kind)));
        }
        self.track
            .write_sample(sample)
            .await
            .map_err(|e| CaptureError::Backend(e.to_string()))
    }

    /// Returns `true` only for the call that actually stopped the track.
    pub fn stop(&self) -> bool {
        !self.stopped.swap(true, Ordering::AcqRel)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("kind", &self.kind)
            .field("id", &self.id())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// The local stream attached to the peer connection.
#[derive(Debug)]
pub struct LocalMedia {
    stream_id: String,
    tracks: Vec<Arc<LocalTrack>>,
}

impl LocalMedia {
    pub fn new(stream_id: impl Into<String>, tracks: Vec<Arc<LocalTrack>>) -> Self {
        Self {
            stream_id: stream_id.into(),
            tracks,
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn tracks(&self) -> &[Arc<LocalTrack>] {
        &self.tracks
    }

    pub fn track(&self, kind: TrackKind) -> Option<&Arc<LocalTrack>> {
        self.tracks.iter().find(|t| t.kind() == kind)
    }

    /// Stops every track, returning how many were still live.
    pub fn stop_all(&self) -> usize {
        self.tracks.iter().filter(|t| t.stop()).count()
    }

    pub fn is_stopped(&self) -> bool {
        self.tracks.iter().all(|t| t.is_stopped())
    }
}
