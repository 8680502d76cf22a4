//! # Lockstep Engine
//!
//! Converges a declaratively specified set of managed integrations to their
//! desired state against an external configuration-entry subsystem. The
//! engine:
//!
//! 1. Loads previously applied state from a [`StateBackend`]
//! 2. Merges the latest specification into it, keyed by configuration id
//! 3. Reconciles every managed entry in order — creating, recreating,
//!    reconfiguring, or deleting entries by driving interactive flows
//! 4. Persists applied state once, at the end of the pass
//!
//! Per-entry failures are collected, not fatal: one broken integration must
//! never block convergence of the others.
//!
//! The subsystems the engine acts on are consumed through traits:
//! [`EntryRegistry`] for the entry lifecycle, `FlowProtocol` (from
//! `lockstep-flow`) for the interactive protocol, and [`StateBackend`] for
//! the persisted state medium.

pub mod entry;
pub mod error;
pub mod reconciler;
pub mod registry;
pub mod store;

pub use entry::{EntryOutcome, ManagedEntry};
pub use error::ReconcileError;
pub use reconciler::{EntryFailure, PassSummary, Reconciler};
pub use registry::{EntryRegistry, EntrySummary, RegistryError};
pub use store::{JsonFileBackend, MemoryBackend, StateBackend, StateStore, StoreError};
