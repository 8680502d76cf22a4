//! Entry lifecycle seam
//!
//! The subsystem that owns configuration entries is consumed through
//! [`EntryRegistry`]. The engine only ever looks entries up (to re-validate
//! externally assigned identity before trusting it) and removes them;
//! creation happens through the flow protocol, never directly.

use async_trait::async_trait;
use lockstep_types::ExternalId;
use thiserror::Error;

/// Condensed view of an entry as the lifecycle subsystem reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    pub external_id: ExternalId,
    pub platform: String,
    pub title: Option<String>,
}

/// Failures reported by the entry lifecycle subsystem.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown entry {0}")]
    NotFound(ExternalId),

    #[error("entry subsystem failure: {0}")]
    Subsystem(String),
}

/// The external entry lifecycle subsystem.
#[async_trait]
pub trait EntryRegistry: Send + Sync {
    /// Look an entry up by its externally assigned id. Absent entries are
    /// `None`, not an error — absence is how drift is detected.
    async fn lookup(&self, external_id: &ExternalId)
        -> Result<Option<EntrySummary>, RegistryError>;

    /// Remove an entry.
    async fn remove(&self, external_id: &ExternalId) -> Result<(), RegistryError>;
}
