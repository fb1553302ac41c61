use std::sync::{Arc, Mutex};

use log::error;

use crate::governance::error::{VotingError, VotingResult};
use crate::governance::voting::VotingService;

/// Thread-safe handle to one voting process.
///
/// A single mutex guards all state, so each operation runs to completion
/// before the next one is observed.
#[derive(Clone)]
pub struct SharedVotingService {
    inner: Arc<Mutex<VotingService>>,
}

impl SharedVotingService {
    pub fn new(service: VotingService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    /// Runs `operation` with exclusive access to the service.
    pub fn execute<T, F>(&self, operation: F) -> VotingResult<T>
    where
        F: FnOnce(&mut VotingService) -> VotingResult<T>,
    {
        let mut service = self.inner.lock().map_err(|_| {
            error!("Voting state lock poisoned");
            VotingError::StatePoisoned
        })?;
        operation(&mut service)
    }
}

impl From<VotingService> for SharedVotingService {
    fn from(service: VotingService) -> Self {
        Self::new(service)
    }
}
