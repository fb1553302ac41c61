pub mod audit;
pub mod error;
pub mod events;
pub mod participants;
pub mod proposals;
pub mod shared;
pub mod tally;
pub mod voting;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use audit::{AuditError, AuditLog, AuditRecord};
pub use error::{Role, VotingError, VotingResult};
pub use events::VotingEvent;
pub use participants::{Participant, ParticipantRegistry};
pub use proposals::{Proposal, ProposalRegistry};
pub use shared::SharedVotingService;
pub use tally::{tally, TallyReport};
pub use voting::VotingService;
pub use workflow::{ParsePhaseError, Phase, Workflow};
