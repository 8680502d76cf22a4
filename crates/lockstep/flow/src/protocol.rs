//! Flow protocol seam
//!
//! The external subsystem that actually hosts interactive flows is consumed
//! through [`FlowProtocol`]. Step schemas, validation rules, and run
//! bookkeeping all live behind it; the engine only initiates runs, submits
//! answers, and aborts runs it broke.

use async_trait::async_trait;
use lockstep_types::{AnswerMap, ExternalId, FlowRunId, FlowStep};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Context passed to the protocol when a run is initiated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowContext {
    /// Origin of the run, as the protocol understands it.
    pub source: String,
    /// Ask the protocol to expose advanced fields in its step schemas.
    pub show_advanced_options: bool,
}

impl Default for FlowContext {
    fn default() -> Self {
        Self {
            source: "user".into(),
            show_advanced_options: true,
        }
    }
}

/// What a flow run acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowSubject {
    /// Create a new entry for the named platform.
    Create { platform: String },
    /// Reconfigure the options of an existing entry.
    Options { external_id: ExternalId },
}

impl FlowSubject {
    pub fn create(platform: impl Into<String>) -> Self {
        Self::Create {
            platform: platform.into(),
        }
    }

    pub fn options(external_id: ExternalId) -> Self {
        Self::Options { external_id }
    }
}

impl fmt::Display for FlowSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { platform } => write!(f, "create flow for platform {platform}"),
            Self::Options { external_id } => write!(f, "options flow for {external_id}"),
        }
    }
}

/// A freshly initiated flow run: its id plus the first step.
#[derive(Debug, Clone)]
pub struct FlowHandle {
    pub run_id: FlowRunId,
    pub step: FlowStep,
}

/// Failures reported by the flow protocol subsystem itself.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// No flow handler exists for the requested subject.
    #[error("no flow handler for this subject")]
    UnknownHandler,

    /// The referenced run does not exist (any more).
    #[error("unknown flow run {0}")]
    UnknownRun(FlowRunId),

    /// The submitted answers do not satisfy the current step's schema.
    #[error("answers rejected: {0}")]
    InvalidAnswers(String),

    /// Anything else the subsystem failed with.
    #[error("flow protocol failure: {0}")]
    Subsystem(String),
}

/// The external flow protocol subsystem.
#[async_trait]
pub trait FlowProtocol: Send + Sync {
    /// Initiate a run for the given subject, obtaining the first step.
    async fn init(
        &self,
        subject: &FlowSubject,
        context: &FlowContext,
    ) -> Result<FlowHandle, ProtocolError>;

    /// Submit answers for the current step, obtaining the next step.
    async fn configure(
        &self,
        run_id: &FlowRunId,
        answers: AnswerMap,
    ) -> Result<FlowStep, ProtocolError>;

    /// Abort an in-progress run. Must tolerate unknown run ids by
    /// returning [`ProtocolError::UnknownRun`].
    async fn abort(&self, run_id: &FlowRunId) -> Result<(), ProtocolError>;
}
