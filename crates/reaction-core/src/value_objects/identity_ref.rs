//! Identity reference - the opaque service identifier carried on the wire

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a remote identity (account id, service id, ...)
///
/// Only its textual form is meaningful to this crate. Empty references are
/// rejected at construction so that an `IdentityRef` always names someone.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityRef(String);

impl IdentityRef {
    /// Parse an identity reference, trimming surrounding whitespace
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, IdentityRefError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdentityRefError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the textual form
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Error when parsing an identity reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdentityRefError {
    #[error("identity reference is empty")]
    Empty,
}

impl fmt::Display for IdentityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for IdentityRef {
    type Error = IdentityRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<IdentityRef> for String {
    fn from(value: IdentityRef) -> Self {
        value.0
    }
}
