use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::governance::error::{VotingError, VotingResult};

/// Stage of the voting process. Exactly one is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    RegisteringParticipants,
    ProposalsOpen,
    ProposalsClosed,
    VotingOpen,
    VotingClosed,
    Tallied,
}

impl Phase {
    /// All phases in their natural order.
    pub const ALL: [Phase; 6] = [
        Phase::RegisteringParticipants,
        Phase::ProposalsOpen,
        Phase::ProposalsClosed,
        Phase::VotingOpen,
        Phase::VotingClosed,
        Phase::Tallied,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::RegisteringParticipants => "RegisteringParticipants",
            Phase::ProposalsOpen => "ProposalsOpen",
            Phase::ProposalsClosed => "ProposalsClosed",
            Phase::VotingOpen => "VotingOpen",
            Phase::VotingClosed => "VotingClosed",
            Phase::Tallied => "Tallied",
        }
    }

    /// Following phase in the natural order, `None` after `Tallied`.
    pub fn next(&self) -> Option<Phase> {
        let position = Phase::ALL.iter().position(|p| p == self)?;
        Phase::ALL.get(position + 1).copied()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown phase {0:?}")]
pub struct ParsePhaseError(String);

impl FromStr for Phase {
    type Err = ParsePhaseError;

    /// Accepts `VotingOpen`, `votingopen` and `voting-open` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        Phase::ALL
            .iter()
            .find(|p| p.name().to_lowercase() == wanted)
            .copied()
            .ok_or_else(|| ParsePhaseError(s.to_string()))
    }
}

/// Owns the current phase. Any phase may follow any other; ordering is the
/// administrator's business, not the state machine's.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workflow {
    phase: Phase,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_phase(&self) -> Phase {
        self.phase
    }

    /// Replaces the current phase and returns `(previous, next)`.
    /// The caller has already been checked to be the administrator.
    pub fn set_phase(&mut self, next: Phase) -> (Phase, Phase) {
        let previous = std::mem::replace(&mut self.phase, next);
        (previous, next)
    }

    /// Gate used by every phase-restricted operation.
    pub fn require(&self, expected: Phase) -> VotingResult<()> {
        if self.phase != expected {
            return Err(VotingError::PhaseViolation {
                expected,
                actual: self.phase,
            });
        }
        debug!("Phase gate passed: {}", expected);
        Ok(())
    }
}
