use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::governance::workflow::Phase;
use crate::identity::Identity;

/// Role an operation demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Administrator,
    Participant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Administrator => f.write_str("administrator"),
            Role::Participant => f.write_str("registered participant"),
        }
    }
}

/// Rejections raised by the voting process. None of them is transient, and
/// a rejected call never leaves partial state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VotingError {
    #[error("Unauthorized: {caller} is not the {required}")]
    Unauthorized { caller: Identity, required: Role },
    #[error("Phase violation: expected {expected}, current phase is {actual}")]
    PhaseViolation { expected: Phase, actual: Phase },
    #[error("Participant {0} is already registered")]
    AlreadyRegistered(Identity),
    #[error("Participant {0} has already voted")]
    AlreadyVoted(Identity),
    #[error("Proposal {0:?} already exists")]
    DuplicateProposal(String),
    #[error("Invalid proposal index {index}: {len} proposal(s) registered")]
    InvalidProposalIndex { index: usize, len: usize },
    #[error("Vote count of proposal {0} cannot grow any further")]
    VoteCountOverflow(usize),
    #[error("No phase follows {0}")]
    NoNextPhase(Phase),
    #[error("Voting state is unavailable after a panic in another caller")]
    StatePoisoned,
}

pub type VotingResult<T> = Result<T, VotingError>;
