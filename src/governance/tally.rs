use serde::{Deserialize, Serialize};

use crate::governance::participants::ParticipantRegistry;
use crate::governance::proposals::Proposal;

/// Index of the proposal with the most votes.
///
/// Single pass with a strict `>`: a later proposal that only ties the leader
/// never displaces it, so ties go to the lowest index. An empty slice yields
/// `0`, which then does not refer to any proposal.
pub fn tally(proposals: &[Proposal]) -> usize {
    let mut winning_index = 0;
    let mut winning_count = 0;
    for (index, proposal) in proposals.iter().enumerate() {
        if proposal.vote_count > winning_count {
            winning_count = proposal.vote_count;
            winning_index = index;
        }
    }
    winning_index
}

/// Final results as shown to participants once the ballot is tallied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyReport {
    pub winning_proposal_index: usize,
    /// `None` when no proposal was ever registered.
    pub winning_description: Option<String>,
    pub vote_counts: Vec<u64>,
    pub total_votes: u64,
    /// Registered participants at the time of reading.
    pub participants: usize,
    /// Participants that cast their vote.
    pub voters: usize,
}

impl TallyReport {
    pub fn new(
        proposals: &[Proposal],
        winning_proposal_index: usize,
        participants: &ParticipantRegistry,
    ) -> Self {
        Self {
            winning_proposal_index,
            winning_description: proposals
                .get(winning_proposal_index)
                .map(|p| p.description.clone()),
            vote_counts: proposals.iter().map(|p| p.vote_count).collect(),
            total_votes: proposals.iter().map(|p| p.vote_count).sum(),
            participants: participants.len(),
            voters: participants.voted_count(),
        }
    }
}
