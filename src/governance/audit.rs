//! Tamper-evident record of published events.
//!
//! Records are linked the same way blocks are: each one carries the hash of
//! its predecessor, and its own hash covers the sequence number, that link
//! and the bincode encoding of the event.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::governance::events::VotingEvent;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("Audit chain broken at record {0}")]
    ChainBroken(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub sequence: u64,
    pub prev_hash: Vec<u8>,
    pub event: VotingEvent,
    pub hash: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events<'a, I>(events: I) -> Result<Self, AuditError>
    where
        I: IntoIterator<Item = &'a VotingEvent>,
    {
        let mut log = AuditLog::new();
        for event in events {
            log.append(event.clone())?;
        }
        Ok(log)
    }

    pub fn append(&mut self, event: VotingEvent) -> Result<&AuditRecord, AuditError> {
        let sequence = self.records.len() as u64;
        let prev_hash = self.records.last().map(|r| r.hash.clone()).unwrap_or_default();
        let hash = hash_record(sequence, &prev_hash, &event)?;
        self.records.push(AuditRecord {
            sequence,
            prev_hash,
            event,
            hash,
        });
        let index = self.records.len() - 1;
        Ok(&self.records[index])
    }

    /// Recomputes every link and hash.
    pub fn verify(&self) -> Result<(), AuditError> {
        let mut expected_prev: Vec<u8> = Vec::new();
        for (position, record) in self.records.iter().enumerate() {
            let sequence = position as u64;
            if record.sequence != sequence || record.prev_hash != expected_prev {
                return Err(AuditError::ChainBroken(sequence));
            }
            if hash_record(sequence, &record.prev_hash, &record.event)? != record.hash {
                return Err(AuditError::ChainBroken(sequence));
            }
            expected_prev = record.hash.clone();
        }
        Ok(())
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Hex digest of the newest record.
    pub fn head_hex(&self) -> Option<String> {
        self.records.last().map(|r| hex::encode(&r.hash))
    }
}

fn hash_record(
    sequence: u64,
    prev_hash: &[u8],
    event: &VotingEvent,
) -> Result<Vec<u8>, AuditError> {
    let encoded = bincode::serialize(&(sequence, prev_hash, event))?;
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    Ok(hasher.finalize().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::workflow::Phase;
    use crate::identity::Identity;

    fn sample_events() -> Vec<VotingEvent> {
        vec![
            VotingEvent::ParticipantRegistered { identity: Identity::new("alice") },
            VotingEvent::PhaseChanged {
                previous: Phase::RegisteringParticipants,
                next: Phase::ProposalsOpen,
            },
            VotingEvent::ProposalRegistered { index: 0 },
        ]
    }

    #[test]
    fn test_chain_links_records() {
        let log = AuditLog::from_events(&sample_events()).unwrap();
        assert_eq!(log.len(), 3);
        assert!(log.records()[0].prev_hash.is_empty());
        assert_eq!(log.records()[1].prev_hash, log.records()[0].hash);
        assert_eq!(log.records()[2].prev_hash, log.records()[1].hash);
        assert_eq!(log.head_hex().unwrap().len(), 64);
        assert!(log.verify().is_ok());
    }

    #[test]
    fn test_same_events_same_head() {
        let a = AuditLog::from_events(&sample_events()).unwrap();
        let b = AuditLog::from_events(&sample_events()).unwrap();
        assert_eq!(a.head_hex(), b.head_hex());
    }

    #[test]
    fn test_tampering_is_detected() {
        let mut log = AuditLog::from_events(&sample_events()).unwrap();
        log.records[1].event = VotingEvent::PhaseChanged {
            previous: Phase::RegisteringParticipants,
            next: Phase::Tallied,
        };
        assert!(matches!(log.verify(), Err(AuditError::ChainBroken(1))));
    }

    #[test]
    fn test_empty_log() {
        let log = AuditLog::new();
        assert!(log.is_empty());
        assert!(log.verify().is_ok());
        assert_eq!(log.head_hex(), None);
    }
}
