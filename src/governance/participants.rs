use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::governance::error::{Role, VotingError, VotingResult};
use crate::identity::Identity;

/// Voting state of one identity. Unknown identities read as the default
/// (unregistered, not voted) record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub is_registered: bool,
    pub has_voted: bool,
    pub voted_proposal_index: Option<usize>,
}

/// Identities allowed to propose and vote. Records are never removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipantRegistry {
    participants: BTreeMap<Identity, Participant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `identity` as registered. Gating (administrator, phase) is done
    /// by the service before this is reached.
    pub fn register(&mut self, identity: Identity) -> VotingResult<()> {
        if self.is_registered(&identity) {
            return Err(VotingError::AlreadyRegistered(identity));
        }
        self.participants.insert(
            identity,
            Participant {
                is_registered: true,
                ..Participant::default()
            },
        );
        Ok(())
    }

    pub fn is_registered(&self, identity: &Identity) -> bool {
        self.participants
            .get(identity)
            .map(|p| p.is_registered)
            .unwrap_or(false)
    }

    pub fn get(&self, identity: &Identity) -> Participant {
        self.participants.get(identity).cloned().unwrap_or_default()
    }

    /// Fails unless `identity` is registered and has not voted yet.
    pub fn ensure_can_vote(&self, identity: &Identity) -> VotingResult<()> {
        match self.participants.get(identity) {
            Some(p) if p.is_registered && !p.has_voted => Ok(()),
            Some(p) if p.is_registered => Err(VotingError::AlreadyVoted(identity.clone())),
            _ => Err(VotingError::Unauthorized {
                caller: identity.clone(),
                required: Role::Participant,
            }),
        }
    }

    /// Records the single vote of `identity`. No phase check here.
    pub fn record_vote(&mut self, identity: &Identity, proposal_index: usize) -> VotingResult<()> {
        self.ensure_can_vote(identity)?;
        if let Some(participant) = self.participants.get_mut(identity) {
            participant.has_voted = true;
            participant.voted_proposal_index = Some(proposal_index);
        }
        Ok(())
    }

    /// Registered identities in sorted order.
    pub fn registered(&self) -> Vec<Identity> {
        self.participants
            .iter()
            .filter(|(_, p)| p.is_registered)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.participants.values().filter(|p| p.is_registered).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn voted_count(&self) -> usize {
        self.participants.values().filter(|p| p.has_voted).count()
    }
}
