use medlink_core::{IceCandidate, NegotiationError, SessionDescription};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Unknown,
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    /// Joined, waiting for the relay to assign a role or for an offer.
    AwaitingRole,
    HaveLocalOffer,
    /// Both descriptions applied.
    Stable,
    Closed,
}

impl NegotiationState {
    pub fn name(self) -> &'static str {
        match self {
            NegotiationState::AwaitingRole => "awaiting-role",
            NegotiationState::HaveLocalOffer => "have-local-offer",
            NegotiationState::Stable => "stable",
            NegotiationState::Closed => "closed",
        }
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded signal relevant to negotiation.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Initiate(bool),
    Offer(SessionDescription),
    Answer(SessionDescription),
    Candidate(IceCandidate),
}

/// Work the session performs against its peer connection and channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Create an offer, apply it locally, send it.
    PublishOffer,
    /// Apply the remote offer, then create, apply and send an answer.
    AcceptOffer(SessionDescription),
    AcceptAnswer(SessionDescription),
    ApplyCandidate(IceCandidate),
    QueueCandidate(IceCandidate),
    /// Apply every queued candidate in arrival order.
    FlushCandidates,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: NegotiationState,
    pub role: Role,
    pub effects: Vec<Effect>,
}

impl Step {
    fn stay(state: NegotiationState, role: Role) -> Self {
        Self {
            state,
            role,
            effects: Vec::new(),
        }
    }
}

/// The negotiation table. Errors leave state and role untouched.
pub fn transition(
    state: NegotiationState,
    role: Role,
    event: Inbound,
) -> Result<Step, NegotiationError> {
    use NegotiationState::*;

    let step = match (state, event) {
        (Closed, _) => Step::stay(Closed, role),

        (AwaitingRole, Inbound::Initiate(true)) => Step {
            state: HaveLocalOffer,
            role: Role::Initiator,
            effects: vec![Effect::PublishOffer],
        },
        (AwaitingRole, Inbound::Initiate(false)) => Step::stay(AwaitingRole, Role::Responder),
        // at most one offer per session; late or repeated roles are ignored
        (HaveLocalOffer | Stable, Inbound::Initiate(_)) => Step::stay(state, role),

        (AwaitingRole, Inbound::Offer(desc)) => Step {
            state: Stable,
            role: Role::Responder,
            effects: vec![Effect::AcceptOffer(desc), Effect::FlushCandidates],
        },
        (HaveLocalOffer | Stable, Inbound::Offer(_)) => {
            return Err(NegotiationError::UnexpectedOffer(state.name()));
        }

        (HaveLocalOffer, Inbound::Answer(desc)) => Step {
            state: Stable,
            role,
            effects: vec![Effect::AcceptAnswer(desc), Effect::FlushCandidates],
        },
        (AwaitingRole | Stable, Inbound::Answer(_)) => {
            return Err(NegotiationError::NoOutstandingOffer);
        }

        (Stable, Inbound::Candidate(c)) => Step {
            state,
            role,
            effects: vec![Effect::ApplyCandidate(c)],
        },
        (AwaitingRole | HaveLocalOffer, Inbound::Candidate(c)) => Step {
            state,
            role,
            effects: vec![Effect::QueueCandidate(c)],
        },
    };
    Ok(step)
}
