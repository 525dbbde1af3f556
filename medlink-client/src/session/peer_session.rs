use crate::config::ClientConfig;
use crate::media::{LocalMedia, MediaCapture, RemoteStream};
use crate::session::negotiation::{self, Effect, Inbound};
use crate::session::{NegotiationState, Role, SessionEvent};
use crate::transport::{PeerConnection, PeerConnector, PeerEvent, SignalingChannel};
use medlink_core::{
    ChannelError, IceCandidate, NegotiationError, RoomId, SdpType, SessionError, SignalMessage,
};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Role and negotiation state as last observed by the session task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub role: Role,
    pub state: NegotiationState,
}

/// Everything a session needs besides its room.
pub struct SessionParts<'a> {
    pub capture: &'a dyn MediaCapture,
    pub connector: &'a dyn PeerConnector,
    pub channel: Arc<dyn SignalingChannel>,
    pub inbound: mpsc::UnboundedReceiver<SignalMessage>,
}

/// The client side of one call.
///
/// One task owns the session. It reads inbound signals and peer connection
/// callbacks in arrival order, so no two handlers ever interleave, and it
/// runs teardown exactly once after its loop exits.
pub struct PeerSession {
    room_id: RoomId,
    role: Role,
    state: NegotiationState,
    pending: Vec<IceCandidate>,
    timeout: Duration,
    media: Arc<LocalMedia>,
    pc: Arc<dyn PeerConnection>,
    channel: Arc<dyn SignalingChannel>,
    remote: Arc<RemoteStream>,
    status: watch::Sender<SessionStatus>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl PeerSession {
    /// Acquires media, builds the peer connection, joins `room_id` and starts
    /// the session task.
    ///
    /// A failure before the join is sent releases whatever was already set up
    /// and closes the channel.
    pub async fn start(
        config: &ClientConfig,
        room_id: RoomId,
        parts: SessionParts<'_>,
    ) -> Result<(SessionHandle, mpsc::UnboundedReceiver<SessionEvent>), SessionError> {
        let SessionParts {
            capture,
            connector,
            channel,
            inbound,
        } = parts;

        let media = match capture.acquire(&config.constraints).await {
            Ok(media) => Arc::new(media),
            Err(e) => {
                warn!(room = %room_id, "Media capture failed: {}", e);
                close_quietly(channel.as_ref()).await;
                return Err(e.into());
            }
        };

        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        let pc = match connector.connect(&media, peer_tx).await {
            Ok(pc) => pc,
            Err(e) => {
                error!(room = %room_id, "Peer connection setup failed: {}", e);
                media.stop_all();
                close_quietly(channel.as_ref()).await;
                return Err(e.into());
            }
        };

        let join = SignalMessage::Join {
            room_id: room_id.clone(),
        };
        if let Err(e) = channel.send(join).await {
            error!(room = %room_id, "Failed to send join: {}", e);
            media.stop_all();
            if let Err(e) = pc.close().await {
                warn!("Peer connection close failed: {}", e);
            }
            close_quietly(channel.as_ref()).await;
            return Err(e.into());
        }
        info!(room = %room_id, "Joined room, awaiting role");

        let initial = SessionStatus {
            role: Role::Unknown,
            state: NegotiationState::AwaitingRole,
        };
        let (status, status_rx) = watch::channel(initial);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let remote = Arc::new(RemoteStream::new());
        let cancel = CancellationToken::new();

        let session = PeerSession {
            room_id: room_id.clone(),
            role: initial.role,
            state: initial.state,
            pending: Vec::new(),
            timeout: config.negotiation_timeout(),
            media: Arc::clone(&media),
            pc,
            channel,
            remote: Arc::clone(&remote),
            status,
            events: events_tx,
        };
        let task = tokio::spawn(session.run(inbound, peer_rx, cancel.clone()));

        let handle = SessionHandle {
            room_id,
            cancel,
            task: Mutex::new(Some(task)),
            media,
            remote,
            status: status_rx,
        };
        Ok((handle, events_rx))
    }

    async fn run(
        mut self,
        mut inbound: mpsc::UnboundedReceiver<SignalMessage>,
        mut peer_events: mpsc::UnboundedReceiver<PeerEvent>,
        cancel: CancellationToken,
    ) {
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);
        let mut inbound_open = true;
        let mut peer_open = true;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(room = %self.room_id, "Call ended locally");
                    break;
                }
                _ = &mut deadline, if self.state != NegotiationState::Stable => {
                    warn!(room = %self.room_id, state = %self.state, "Negotiation timed out");
                    self.emit(SessionEvent::Error(
                        NegotiationError::Timeout(self.timeout).into(),
                    ));
                    break;
                }
                msg = inbound.recv(), if inbound_open => {
                    let Some(msg) = msg else {
                        inbound_open = false;
                        if self.state == NegotiationState::Stable {
                            info!(room = %self.room_id, "Signaling closed, call continues");
                            self.emit(SessionEvent::ChannelClosed);
                            continue;
                        }
                        warn!(room = %self.room_id, "Signaling closed before the call was established");
                        self.emit(SessionEvent::Error(ChannelError::Closed.into()));
                        break;
                    };
                    let flow = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        flow = self.handle_signal(msg) => flow,
                    };
                    if flow.is_break() {
                        break;
                    }
                }
                event = peer_events.recv(), if peer_open => {
                    let Some(event) = event else {
                        peer_open = false;
                        continue;
                    };
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = self.handle_peer_event(event) => {}
                    }
                }
            }
        }

        // dropping the receivers here means nothing more reaches this session
        drop(inbound);
        drop(peer_events);
        self.teardown().await;
    }

    async fn handle_signal(&mut self, msg: SignalMessage) -> ControlFlow<()> {
        let event = match self.decode(msg) {
            Ok(Some(event)) => event,
            Ok(None) => return ControlFlow::Continue(()),
            Err(SessionError::Channel(e @ ChannelError::Rejected(_))) => {
                error!(room = %self.room_id, "Relay refused the join: {}", e);
                self.emit(SessionEvent::Error(e.into()));
                return ControlFlow::Break(());
            }
            Err(e) => return self.reject_signal(e),
        };

        let step = match negotiation::transition(self.state, self.role, event) {
            Ok(step) => step,
            Err(e) => return self.reject_signal(e.into()),
        };

        // state only advances once its effects have gone through
        for effect in step.effects {
            if let Err(e) = self.apply(effect).await {
                error!(room = %self.room_id, "Negotiation aborted: {}", e);
                self.emit(SessionEvent::Error(e));
                return ControlFlow::Break(());
            }
        }
        self.commit(step.state, step.role);
        ControlFlow::Continue(())
    }

    /// Reports a signal that could not be decoded or applied. Until the call
    /// reaches `Stable` this aborts setup; afterwards the signal is dropped.
    fn reject_signal(&self, e: SessionError) -> ControlFlow<()> {
        self.emit(SessionEvent::Error(e.clone()));
        if self.state == NegotiationState::Stable {
            warn!(room = %self.room_id, state = %self.state, "Dropping signal: {}", e);
            return ControlFlow::Continue(());
        }
        error!(room = %self.room_id, state = %self.state, "Call setup aborted: {}", e);
        ControlFlow::Break(())
    }

    /// `Ok(None)` for frames this session has no business with.
    fn decode(&self, msg: SignalMessage) -> Result<Option<Inbound>, SessionError> {
        if let Some(room) = msg.room_id() {
            if room != &self.room_id {
                debug!(room = %room, "Ignoring signal for another room");
                return Ok(None);
            }
        }

        let event = match &msg {
            SignalMessage::Initiate(flag) => Inbound::Initiate(*flag),
            SignalMessage::Offer { .. } | SignalMessage::Answer { .. } => {
                let desc = match msg.description() {
                    Some(Ok(desc)) => desc,
                    Some(Err(e)) => {
                        return Err(NegotiationError::MalformedDescription(e.to_string()).into());
                    }
                    None => return Ok(None),
                };
                match (&msg, desc.sdp_type) {
                    (SignalMessage::Offer { .. }, SdpType::Offer) => Inbound::Offer(desc),
                    (SignalMessage::Answer { .. }, SdpType::Answer) => Inbound::Answer(desc),
                    (_, sdp_type) => {
                        return Err(NegotiationError::MalformedDescription(format!(
                            "{} frame carries a {:?} description",
                            msg.kind(),
                            sdp_type
                        ))
                        .into());
                    }
                }
            }
            SignalMessage::IceCandidate { .. } => {
                let candidate = match msg.ice_candidate() {
                    Some(Ok(candidate)) => candidate,
                    Some(Err(e)) => {
                        return Err(NegotiationError::MalformedCandidate(e.to_string()).into());
                    }
                    None => return Ok(None),
                };
                Inbound::Candidate(candidate)
            }
            SignalMessage::Rejected { reason, .. } => {
                return Err(ChannelError::Rejected(reason.clone()).into());
            }
            SignalMessage::Join { .. } | SignalMessage::Disconnect { .. } => {
                debug!(kind = %msg.kind(), "Ignoring relay-bound signal");
                return Ok(None);
            }
        };
        Ok(Some(event))
    }

    fn commit(&mut self, state: NegotiationState, role: Role) {
        if role != self.role {
            self.role = role;
            info!(room = %self.room_id, ?role, "Role assigned");
            self.emit(SessionEvent::RoleAssigned(role));
        }
        if state != self.state {
            debug!(room = %self.room_id, from = %self.state, to = %state, "Negotiation state changed");
            self.state = state;
            self.emit(SessionEvent::StateChanged(state));
        }
        self.status.send_replace(SessionStatus {
            role: self.role,
            state: self.state,
        });
    }

    async fn apply(&mut self, effect: Effect) -> Result<(), SessionError> {
        match effect {
            Effect::PublishOffer => {
                let offer = self.pc.create_offer().await?;
                self.pc.set_local_description(offer.clone()).await?;
                self.publish(SignalMessage::offer(self.room_id.clone(), &offer))
                    .await?;
                info!(room = %self.room_id, "Offer sent");
            }
            Effect::AcceptOffer(offer) => {
                self.pc.set_remote_description(offer).await?;
                let answer = self.pc.create_answer().await?;
                self.pc.set_local_description(answer.clone()).await?;
                self.publish(SignalMessage::answer(self.room_id.clone(), &answer))
                    .await?;
                info!(room = %self.room_id, "Answer sent");
            }
            Effect::AcceptAnswer(answer) => {
                self.pc.set_remote_description(answer).await?;
                info!(room = %self.room_id, "Answer applied");
            }
            Effect::ApplyCandidate(candidate) => self.add_candidate(candidate).await,
            Effect::QueueCandidate(candidate) => {
                debug!(room = %self.room_id, queued = self.pending.len() + 1, "Queueing early candidate");
                self.pending.push(candidate);
            }
            Effect::FlushCandidates => {
                for candidate in std::mem::take(&mut self.pending) {
                    self.add_candidate(candidate).await;
                }
            }
        }
        Ok(())
    }

    /// A rejected candidate is reported but does not end the call.
    async fn add_candidate(&self, candidate: IceCandidate) {
        if let Err(e) = self.pc.add_ice_candidate(candidate).await {
            warn!(room = %self.room_id, "Remote candidate rejected: {}", e);
            self.emit(SessionEvent::Error(e.into()));
        }
    }

    async fn publish(
        &self,
        msg: serde_json::Result<SignalMessage>,
    ) -> Result<(), SessionError> {
        let msg = msg.map_err(|e| ChannelError::Encode(e.to_string()))?;
        self.channel.send(msg).await?;
        Ok(())
    }

    async fn handle_peer_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::LocalCandidate(candidate) => {
                let msg = SignalMessage::candidate(self.room_id.clone(), &candidate);
                if let Err(e) = self.publish(msg).await {
                    warn!(room = %self.room_id, "Could not send local candidate: {}", e);
                }
            }
            PeerEvent::Track(track) => {
                if self.remote.add_track(Arc::clone(&track)) {
                    info!(room = %self.room_id, kind = %track.kind(), "Remote track attached");
                    self.emit(SessionEvent::RemoteTrack(track));
                }
            }
            PeerEvent::StateChanged(state) => {
                self.emit(SessionEvent::ConnectionState(state));
            }
        }
    }

    async fn teardown(&mut self) {
        let stopped = self.media.stop_all();
        if let Err(e) = self.pc.close().await {
            warn!(room = %self.room_id, "Peer connection close failed: {}", e);
        }
        close_quietly(self.channel.as_ref()).await;

        self.commit(NegotiationState::Closed, self.role);
        info!(room = %self.room_id, stopped, "Call torn down");
        self.emit(SessionEvent::Ended);
    }

    fn emit(&self, event: SessionEvent) {
        // the owner may have stopped listening
        let _ = self.events.send(event);
    }
}

async fn close_quietly(channel: &dyn SignalingChannel) {
    if let Err(e) = channel.close().await {
        debug!("Signaling close failed: {}", e);
    }
}

/// Owner's handle on a running session. Dropping it ends the call.
pub struct SessionHandle {
    room_id: RoomId,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    media: Arc<LocalMedia>,
    remote: Arc<RemoteStream>,
    status: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// Waits for the next role or state change.
    pub async fn changed(&mut self) -> Option<SessionStatus> {
        self.status.changed().await.ok()?;
        Some(*self.status.borrow_and_update())
    }

    pub fn local_media(&self) -> &Arc<LocalMedia> {
        &self.media
    }

    pub fn remote_stream(&self) -> &Arc<RemoteStream> {
        &self.remote
    }

    pub fn is_ended(&self) -> bool {
        self.status().state == NegotiationState::Closed
    }

    /// Ends the call and waits for teardown. Safe to call any number of times.
    pub async fn end_call(&self) {
        self.cancel.cancel();
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(room = %self.room_id, "Session task failed: {}", e);
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
