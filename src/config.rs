use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::governance::voting::{VotingService, DEFAULT_EVENT_CAPACITY, MAX_EVENT_CAPACITY};
use crate::identity::{Identity, IdentityError};

const DEFAULT_ADMINISTRATOR: &str = "admin";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid administrator: {0}")]
    Administrator(#[from] IdentityError),
    #[error("Event capacity must be at least 1")]
    ZeroEventCapacity,
    #[error("Event capacity {0} exceeds the maximum of {max}", max = MAX_EVENT_CAPACITY)]
    EventCapacityTooLarge(usize),
}

/// Settings of one voting process, read from a JSON file.
/// Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallotConfig {
    /// Fixed for the lifetime of the process.
    pub administrator: String,
    pub event_capacity: usize,
    /// Default `env_logger` filter; `RUST_LOG` still wins.
    pub log_level: String,
    /// Stop a command session at the first rejected command.
    pub strict: bool,
}

impl Default for BallotConfig {
    fn default() -> Self {
        Self {
            administrator: DEFAULT_ADMINISTRATOR.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            strict: false,
        }
    }
}

impl BallotConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let config: BallotConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Identity::parse(&self.administrator)?;
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        if self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(ConfigError::EventCapacityTooLarge(self.event_capacity));
        }
        Ok(())
    }

    /// Replaces the administrator, keeping the old one if `admin` is not a
    /// valid identity.
    pub fn override_administrator(&mut self, admin: &str) -> Result<(), ConfigError> {
        let identity = Identity::parse(admin)?;
        self.administrator = identity.as_str().to_string();
        Ok(())
    }

    pub fn administrator_identity(&self) -> Result<Identity, ConfigError> {
        Ok(Identity::parse(&self.administrator)?)
    }

    pub fn build_service(&self) -> Result<VotingService, ConfigError> {
        self.validate()?;
        Ok(VotingService::with_event_capacity(
            self.administrator_identity()?,
            self.event_capacity,
        ))
    }
}
