//! # Lockstep Types
//!
//! Shared data model for the lockstep reconciliation engine:
//!
//! - Strongly-typed identifiers for configurations, entries, and flow runs
//! - Answer maps supplied to interactive configuration flows
//! - Flow step variants and step schemas
//! - Declarative specification items
//! - The persisted record format for applied state

pub mod answers;
pub mod ids;
pub mod record;
pub mod spec;
pub mod step;

pub use answers::AnswerMap;
pub use ids::{ConfigurationId, ExternalId, FlowRunId};
pub use record::EntryRecord;
pub use spec::IntegrationSpec;
pub use step::{FieldSpec, FlowReceipt, FlowStep, FormStep, StepSchema};
