//! Reconciliation pass orchestration
//!
//! One pass: load applied state, merge the latest specification into it,
//! reconcile every managed entry in order, save once. Entries are driven
//! strictly sequentially; a failing entry is recorded and skipped, never
//! fatal to the pass.

use crate::entry::{EntryOutcome, ManagedEntry};
use crate::registry::EntryRegistry;
use crate::store::{StateBackend, StateStore, StoreError};
use lockstep_flow::{FlowContext, FlowDriver, FlowProtocol};
use lockstep_types::{ConfigurationId, IntegrationSpec};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// One entry's recorded failure from a pass.
#[derive(Debug, Clone)]
pub struct EntryFailure {
    pub configuration_id: ConfigurationId,
    pub platform: String,
    pub error: String,
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default)]
pub struct PassSummary {
    pub created: usize,
    pub recreated: usize,
    pub options_updated: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub failures: Vec<EntryFailure>,
}

impl PassSummary {
    fn record(&mut self, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Created => self.created += 1,
            EntryOutcome::Recreated => self.recreated += 1,
            EntryOutcome::OptionsUpdated => self.options_updated += 1,
            EntryOutcome::Removed => self.removed += 1,
            EntryOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Number of entries the pass actually touched.
    pub fn total_changes(&self) -> usize {
        self.created + self.recreated + self.options_updated + self.removed
    }

    /// Whether every entry converged.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives reconciliation passes against the external subsystems.
pub struct Reconciler {
    registry: Arc<dyn EntryRegistry>,
    protocol: Arc<dyn FlowProtocol>,
    backend: Arc<dyn StateBackend>,
    driver: FlowDriver,
}

impl Reconciler {
    pub fn new(
        registry: Arc<dyn EntryRegistry>,
        protocol: Arc<dyn FlowProtocol>,
        backend: Arc<dyn StateBackend>,
    ) -> Self {
        Self {
            registry,
            protocol,
            backend,
            driver: FlowDriver::new(FlowContext::default()),
        }
    }

    /// Use a custom flow context for every run this reconciler initiates.
    pub fn with_context(mut self, context: FlowContext) -> Self {
        self.driver = FlowDriver::new(context);
        self
    }

    /// Run one reconciliation pass for `spec`.
    ///
    /// Entries known from a previous pass but missing from `spec` keep an
    /// absent desired config and are deleted. The store is saved exactly
    /// once, after every entry was given its chance to converge.
    pub async fn run(&self, spec: &[IntegrationSpec]) -> Result<PassSummary, StoreError> {
        let mut store = StateStore::load(self.backend.clone()).await?;

        for item in spec {
            if !store.contains(&item.configuration_id) {
                debug!(
                    configuration_id = %item.configuration_id,
                    platform = %item.platform,
                    "allocating new managed entry"
                );
                store.push(ManagedEntry::new(
                    item.platform.clone(),
                    item.configuration_id.clone(),
                ));
            }
            store.get_mut(&item.configuration_id)?.apply_spec(item);
        }

        info!(entries = store.len(), "reconciling managed entries");
        let mut summary = PassSummary::default();
        for entry in store.entries_mut() {
            let platform = entry.platform.clone();
            let configuration_id = entry.configuration_id.clone();
            match entry
                .reconcile(self.registry.as_ref(), self.protocol.as_ref(), &self.driver)
                .await
            {
                Ok(outcome) => summary.record(outcome),
                Err(err) => {
                    error!(
                        platform = %platform,
                        configuration_id = %configuration_id,
                        error = %err,
                        "entry failed to reconcile"
                    );
                    summary.failures.push(EntryFailure {
                        configuration_id,
                        platform,
                        error: err.to_string(),
                    });
                }
            }
        }

        store.save().await?;

        info!(
            created = summary.created,
            recreated = summary.recreated,
            options_updated = summary.options_updated,
            removed = summary.removed,
            unchanged = summary.unchanged,
            failed = summary.failures.len(),
            "reconciliation pass complete"
        );
        Ok(summary)
    }

    /// Run one pass as soon as the host is ready.
    ///
    /// Runs immediately if the readiness signal is already true, otherwise
    /// waits for it to become true first.
    pub async fn run_when_ready(
        &self,
        mut readiness: watch::Receiver<bool>,
        spec: &[IntegrationSpec],
    ) -> Result<PassSummary, StoreError> {
        while !*readiness.borrow_and_update() {
            if readiness.changed().await.is_err() {
                // Signal source is gone; a readiness transition can no
                // longer arrive, so proceed rather than hang forever.
                debug!("readiness source dropped, proceeding with the pass");
                break;
            }
        }
        self.run(spec).await
    }
}
