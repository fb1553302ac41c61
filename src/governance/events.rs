use std::fmt;

use serde::{Deserialize, Serialize};

use crate::governance::workflow::Phase;
use crate::identity::Identity;

/// Observable outcome of a successful call, published once per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VotingEvent {
    ParticipantRegistered { identity: Identity },
    PhaseChanged { previous: Phase, next: Phase },
    ProposalRegistered { index: usize },
    VoteCast { identity: Identity, proposal_index: usize },
    VotesTallied { winning_proposal_index: usize },
}

impl fmt::Display for VotingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VotingEvent::ParticipantRegistered { identity } => {
                write!(f, "ParticipantRegistered({})", identity)
            }
            VotingEvent::PhaseChanged { previous, next } => {
                write!(f, "PhaseChanged({} -> {})", previous, next)
            }
            VotingEvent::ProposalRegistered { index } => write!(f, "ProposalRegistered({})", index),
            VotingEvent::VoteCast { identity, proposal_index } => {
                write!(f, "VoteCast({}, {})", identity, proposal_index)
            }
            VotingEvent::VotesTallied { winning_proposal_index } => {
                write!(f, "VotesTallied({})", winning_proposal_index)
            }
        }
    }
}
