use crate::config::MediaConstraints;
use crate::media::{LocalMedia, LocalTrack, TrackKind};
use async_trait::async_trait;
use medlink_core::CaptureError;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// A source of local audio/video.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<LocalMedia, CaptureError>;
}

/// Capture backed by sample tracks the application feeds with encoded
/// frames through [`LocalTrack::write_sample`].
#[derive(Debug, Clone)]
pub struct SampleCapture {
    devices: HashSet<TrackKind>,
    permitted: bool,
}

impl Default for SampleCapture {
    fn default() -> Self {
        Self::with_devices([TrackKind::Audio, TrackKind::Video])
    }
}

impl SampleCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(devices: impl IntoIterator<Item = TrackKind>) -> Self {
        Self {
            devices: devices.into_iter().collect(),
            permitted: true,
        }
    }

    /// A capture whose user refused access.
    pub fn denied() -> Self {
        Self {
            permitted: false,
            ..Self::default()
        }
    }

    fn codec(kind: TrackKind) -> RTCRtpCodecCapability {
        match kind {
            TrackKind::Audio => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            TrackKind::Video => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl MediaCapture for SampleCapture {
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<LocalMedia, CaptureError> {
        if !self.permitted {
            return Err(CaptureError::PermissionDenied);
        }

        let mut wanted = Vec::new();
        if constraints.audio {
            wanted.push(TrackKind::Audio);
        }
        if constraints.video {
            wanted.push(TrackKind::Video);
        }
        if wanted.is_empty() {
            return Err(CaptureError::NothingRequested);
        }

        let stream_id = Uuid::new_v4().to_string();
        let mut tracks = Vec::with_capacity(wanted.len());
        for kind in wanted {
            if !self.devices.contains(&kind) {
                return Err(CaptureError::NoDevice(kind.as_str()));
            }
            let track = TrackLocalStaticSample::new(
                Self::codec(kind),
                format!("{}-{}", kind, Uuid::new_v4()),
                stream_id.clone(),
            );
            tracks.push(Arc::new(LocalTrack::new(kind, Arc::new(track))));
        }

        debug!(stream = %stream_id, tracks = tracks.len(), "Acquired local media");
        Ok(LocalMedia::new(stream_id, tracks))
    }
}
