mod shared_test;

use crate::governance::participants::Participant;
use crate::governance::proposals::Proposal;
use crate::governance::voting::VotingService;
use crate::governance::workflow::Phase;
use crate::identity::Identity;

pub(super) fn admin() -> Identity {
    Identity::new("admin")
}

pub(super) fn id(label: &str) -> Identity {
    Identity::new(label)
}

/// Service with `names` registered, still in the registration phase.
pub(super) fn service_with(names: &[&str]) -> VotingService {
    let mut service = VotingService::new(admin());
    for name in names {
        service.register_participant(&admin(), id(name)).unwrap();
    }
    service
}

/// Service with `names` registered and `descriptions` proposed by the first
/// participant, left in `ProposalsOpen`.
pub(super) fn service_with_proposals(names: &[&str], descriptions: &[&str]) -> VotingService {
    let mut service = service_with(names);
    service.set_phase(&admin(), Phase::ProposalsOpen).unwrap();
    for description in descriptions {
        service.register_proposal(&id(names[0]), *description).unwrap();
    }
    service
}

/// Everything observable about a service, read as `observer`.
#[derive(Debug, PartialEq)]
pub(super) struct Snapshot {
    phase: Phase,
    events: usize,
    proposals: Vec<Proposal>,
    records: Vec<Participant>,
}

pub(super) fn snapshot(service: &VotingService, observer: &str, participants: &[&str]) -> Snapshot {
    // participant_status only reads the caller's own record
    let records = participants
        .iter()
        .map(|name| service.participant_status(&id(name)).unwrap())
        .collect();
    Snapshot {
        phase: service.current_phase(),
        events: service.events().len(),
        proposals: service.list_proposals(&id(observer)).unwrap(),
        records,
    }
}
