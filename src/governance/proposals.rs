use serde::{Deserialize, Serialize};

use crate::governance::error::{VotingError, VotingResult};

/// A textual option. Its index is its position in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub description: String,
    pub vote_count: u64,
}

/// Ordered proposals. Indices are dense and never change once assigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalRegistry {
    proposals: Vec<Proposal>,
}

impl ProposalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a proposal and returns its index.
    ///
    /// Descriptions must be unique byte for byte; a linear scan is plenty for
    /// the handful of proposals a ballot carries.
    pub fn register(&mut self, description: String) -> VotingResult<usize> {
        if self.proposals.iter().any(|p| p.description == description) {
            return Err(VotingError::DuplicateProposal(description));
        }
        self.proposals.push(Proposal {
            description,
            vote_count: 0,
        });
        Ok(self.len() - 1)
    }

    /// Fails without side effects when the index is out of range or the
    /// counter is saturated.
    pub fn ensure_votable(&self, index: usize) -> VotingResult<()> {
        let proposal = self.get(index)?;
        if proposal.vote_count == u64::MAX {
            return Err(VotingError::VoteCountOverflow(index));
        }
        Ok(())
    }

    pub fn increment_vote(&mut self, index: usize) -> VotingResult<()> {
        let len = self.len();
        let proposal = self
            .proposals
            .get_mut(index)
            .ok_or(VotingError::InvalidProposalIndex { index, len })?;
        proposal.vote_count = proposal
            .vote_count
            .checked_add(1)
            .ok_or(VotingError::VoteCountOverflow(index))?;
        Ok(())
    }

    pub fn get(&self, index: usize) -> VotingResult<&Proposal> {
        self.proposals.get(index).ok_or(VotingError::InvalidProposalIndex {
            index,
            len: self.len(),
        })
    }

    pub fn list(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn total_votes(&self) -> u64 {
        self.proposals.iter().map(|p| p.vote_count).sum()
    }
}
