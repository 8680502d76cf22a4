//! Engine error types

use crate::registry::RegistryError;
use lockstep_flow::FlowError;
use thiserror::Error;

/// A single entry's reconciliation failure.
///
/// The reconciler catches these per entry, records them with the entry's
/// platform and configuration id, and moves on to the next entry.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}
