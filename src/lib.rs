/*!
Julius Vote - A Governed Voting Process

A single administrator registers the eligible participants, participants
submit proposals and cast one vote each during clearly delimited phases, and
the process ends with a deterministic tally in which ties go to the earliest
proposal.

# Main Components

- `identity`: caller identities, supplied already authenticated by the embedding application
- `governance`: the phase state machine, participant and proposal registries,
  tally and the `VotingService` composition root
- `config`: process settings loaded from JSON
- `cli`: line-oriented command interface used by the `juliusvote` binary

# Example Usage

```rust
use juliusvote::{Identity, Phase, VotingService};

let admin = Identity::new("admin");
let alice = Identity::new("alice");

let mut ballot = VotingService::new(admin.clone());
ballot.register_participant(&admin, alice.clone()).unwrap();
ballot.set_phase(&admin, Phase::ProposalsOpen).unwrap();
let index = ballot.register_proposal(&alice, "Plant more trees").unwrap();
ballot.set_phase(&admin, Phase::VotingOpen).unwrap();
ballot.cast_vote(&alice, index).unwrap();
ballot.set_phase(&admin, Phase::VotingClosed).unwrap();
assert_eq!(ballot.run_tally(&admin).unwrap(), index);
```
*/

/// Caller identities and the context trait every operation takes.
pub mod identity;

/// Voting workflow, registries, tally and the service that gates them.
pub mod governance;

/// Process configuration.
pub mod config;

/// Command-line interface for driving a voting session.
pub mod cli;

// Re-export commonly used types
pub use cli::CliHandler;
pub use config::{BallotConfig, ConfigError};
pub use governance::{
    AuditLog, Participant, Phase, Proposal, Role, SharedVotingService, TallyReport, VotingError,
    VotingEvent, VotingService,
};
pub use identity::{Identity, IdentityContext};
