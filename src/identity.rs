//! Caller identities.
//!
//! Authentication happens outside this crate. By the time an operation is
//! invoked the caller is already known, and is handed in as anything that
//! implements [`IdentityContext`].

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Invalid identity {0:?}: expected 1-64 of [A-Za-z0-9_.@-], not starting with a symbol")]
    Invalid(String),
}

// 外部入力のラベル検証用
lazy_static::lazy_static! {
    static ref IDENTITY_PATTERN: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.@-]{0,63}$")
        .expect("identity pattern is a valid regex");
}

/// An already-authenticated identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    /// Wraps a label without validation. Embedding code that already trusts
    /// its identity source uses this directly.
    pub fn new(label: impl Into<String>) -> Self {
        Identity(label.into())
    }

    /// Validates a user-supplied label.
    pub fn parse(label: &str) -> Result<Self, IdentityError> {
        if IDENTITY_PATTERN.is_match(label) {
            Ok(Identity(label.to_string()))
        } else {
            Err(IdentityError::Invalid(label.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identity::parse(s)
    }
}

/// Supplies the identity behind the current call.
pub trait IdentityContext {
    fn caller(&self) -> &Identity;

    fn is_administrator(&self, admin: &Identity) -> bool {
        self.caller() == admin
    }
}

impl IdentityContext for Identity {
    fn caller(&self) -> &Identity {
        self
    }
}

impl<T: IdentityContext + ?Sized> IdentityContext for &T {
    fn caller(&self) -> &Identity {
        (**self).caller()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_plain_labels() {
        assert_eq!(Identity::parse("alice").unwrap().as_str(), "alice");
        assert!(Identity::parse("bob.smith@example-org").is_ok());
        assert!(Identity::parse("0xdeadbeef").is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_labels() {
        assert!(Identity::parse("").is_err());
        assert!(Identity::parse("-leading-dash").is_err());
        assert!(Identity::parse("has space").is_err());
        assert!(Identity::parse(&"a".repeat(65)).is_err());
        assert!(Identity::parse(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_administrator_check() {
        let admin = Identity::new("admin");
        let alice = Identity::new("alice");
        assert!(admin.is_administrator(&admin));
        assert!(!alice.is_administrator(&admin));
        assert!((&alice).caller() == &alice);
    }
}
