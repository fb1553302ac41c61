use std::thread;

use super::{admin, id, service_with_proposals};
use crate::governance::error::VotingError;
use crate::governance::shared::SharedVotingService;
use crate::governance::workflow::Phase;

#[test]
fn test_concurrent_voters_keep_counts_consistent() {
    let names: Vec<String> = (0..32).map(|i| format!("voter{}", i)).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut service = service_with_proposals(&name_refs, &["A", "B"]);
    service.set_phase(&admin(), Phase::VotingOpen).unwrap();
    let shared = SharedVotingService::new(service);

    let handles: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let shared = shared.clone();
            let voter = id(name);
            thread::spawn(move || {
                // every voter tries twice; only the first attempt may count
                let first = shared.execute(|svc| svc.cast_vote(&voter, i % 2));
                let second = shared.execute(|svc| svc.cast_vote(&voter, (i + 1) % 2));
                (first, second)
            })
        })
        .collect();

    for (handle, name) in handles.into_iter().zip(&names) {
        let (first, second) = handle.join().unwrap();
        assert_eq!(first, Ok(()));
        assert_eq!(second, Err(VotingError::AlreadyVoted(id(name))));
    }

    let proposals = shared
        .execute(|svc| svc.list_proposals(&id("voter0")))
        .unwrap();
    assert_eq!(proposals[0].vote_count, 16);
    assert_eq!(proposals[1].vote_count, 16);

    let voted = shared
        .execute(|svc| {
            names
                .iter()
                .map(|name| svc.participant_status(&id(name)))
                .collect::<Result<Vec<_>, _>>()
        })
        .unwrap()
        .iter()
        .filter(|p| p.has_voted)
        .count();
    assert_eq!(voted, names.len());
}

#[test]
fn test_poisoned_lock_is_reported() {
    let shared = SharedVotingService::new(service_with_proposals(&["alice"], &["A"]));
    let clone = shared.clone();
    let result = thread::spawn(move || {
        let _ = clone.execute::<(), _>(|_| panic!("boom"));
    })
    .join();
    assert!(result.is_err());

    assert_eq!(
        shared.execute(|svc| svc.list_proposals(&id("alice"))),
        Err(VotingError::StatePoisoned)
    );
}
