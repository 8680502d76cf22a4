//! Flow driver error taxonomy

use crate::protocol::ProtocolError;
use std::collections::BTreeMap;
use thiserror::Error;

/// Failures a flow run can end with.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The protocol reported field-level errors on a step.
    #[error("{subject} reported step errors: {errors:?}")]
    StepValidation {
        subject: String,
        /// Raw error payload, keyed by field name.
        errors: BTreeMap<String, String>,
    },

    /// The protocol says an equivalent entry already exists, but it is not
    /// one we track. Surfaced distinctly: the run is already terminal, so
    /// no cleanup abort is issued, and the likely cause is external drift.
    #[error("{subject}: an equivalent entry already exists but is not tracked")]
    AlreadyConfigured { subject: String },

    /// The flow terminated itself for a reason other than "already
    /// configured".
    #[error("{subject} aborted: {reason}")]
    Aborted { subject: String, reason: String },

    /// The supplied answers cannot satisfy the flow, either because a step
    /// rejected them or because the flow still expected more steps after
    /// every answer set was used.
    #[error("{subject}: answers do not satisfy the flow: {detail}")]
    SchemaMismatch { subject: String, detail: String },

    /// No flow handler exists for the subject. Expected for the options
    /// flow of platforms without options support; callers on that path
    /// treat it as a no-op rather than a failure.
    #[error("{subject}: no flow handler registered")]
    UnknownHandler { subject: String },

    /// The protocol subsystem itself failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl FlowError {
    /// Whether the failure is a terminal abort of the run itself, meaning
    /// there is nothing left to clean up.
    pub fn is_terminal_abort(&self) -> bool {
        matches!(
            self,
            Self::AlreadyConfigured { .. } | Self::Aborted { .. }
        )
    }
}

/// Result type for flow operations.
pub type FlowResult<T> = std::result::Result<T, FlowError>;
