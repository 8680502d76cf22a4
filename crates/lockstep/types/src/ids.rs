//! Strongly-typed identifiers for lockstep entities
//!
//! All IDs wrap plain strings: configuration ids are user-assigned, entry
//! ids are assigned by the external entry subsystem, and flow run ids are
//! assigned by the flow protocol. Newtypes keep them from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, user-assigned identifier for a managed integration.
///
/// This is the key the reconciler matches specification items to persisted
/// state by. It never changes for the lifetime of a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationId(String);

impl ConfigurationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigurationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config:{}", self.0)
    }
}

/// Identifier assigned to an entry by the external entry subsystem.
///
/// Opaque and unstable: it only exists once the subsystem has created the
/// entry, and it can be invalidated out-of-band if something else deletes
/// the entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry:{}", self.0)
    }
}

/// Identifier for one in-flight run of the interactive flow protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowRunId(String);

impl FlowRunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlowRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flow:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(ConfigurationId::new("a").to_string(), "config:a");
        assert_eq!(ExternalId::new("b").to_string(), "entry:b");
        assert_eq!(FlowRunId::new("c").to_string(), "flow:c");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = ConfigurationId::new("kitchen-lights");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"kitchen-lights\"");
        let back: ConfigurationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
