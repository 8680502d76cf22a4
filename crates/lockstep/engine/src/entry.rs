//! Per-entry state machine
//!
//! A [`ManagedEntry`] tracks one managed integration across two identities:
//! the stable, user-assigned configuration id and the unstable, externally
//! assigned entry id. Each reconciliation pass it compares desired state
//! (refreshed from the specification) against last-applied state (loaded
//! from the persisted store) and decides whether to create, recreate,
//! reconfigure options, delete, or leave the entry alone.

use crate::error::ReconcileError;
use crate::registry::{EntryRegistry, RegistryError};
use lockstep_flow::{FlowDriver, FlowError, FlowProtocol, FlowSubject};
use lockstep_types::{
    AnswerMap, ConfigurationId, EntryRecord, ExternalId, FlowReceipt, IntegrationSpec,
};
use tracing::{debug, info, warn};

/// What a reconciliation step did to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// A new external entry was created.
    Created,
    /// The external entry was deleted and created again.
    Recreated,
    /// Only the options flow ran.
    OptionsUpdated,
    /// The external entry was deleted and nothing replaced it.
    Removed,
    /// Nothing needed doing.
    Unchanged,
}

/// One managed integration: desired vs. last-applied state plus the
/// external identity, if any.
#[derive(Debug, Clone)]
pub struct ManagedEntry {
    /// Which integration/driver this entry instantiates.
    pub platform: String,
    /// Stable user-assigned identity; the store's key.
    pub configuration_id: ConfigurationId,
    /// Identity assigned by the entry subsystem, once created.
    pub external_id: Option<ExternalId>,
    /// Answer sets last successfully applied through the creation flow.
    pub last_config: Option<Vec<AnswerMap>>,
    /// Answer sets last successfully applied through the options flow.
    pub last_options: Option<Vec<AnswerMap>>,
    /// What the specification currently wants applied. `None` means the
    /// entry should not exist.
    pub desired_config: Option<Vec<AnswerMap>>,
    /// Desired options. `None` means "do not touch options"; an empty
    /// sequence is an explicit configuration.
    pub desired_options: Option<Vec<AnswerMap>>,
    /// Whether an options change alone forces delete + recreate.
    pub options_needs_recreate: bool,
    /// Set when the specification renamed this entry's platform; forces a
    /// recreate on the next reconcile. Never persisted.
    pub(crate) platform_changed: bool,
}

impl ManagedEntry {
    /// A fresh entry that has never been applied.
    pub fn new(platform: impl Into<String>, configuration_id: ConfigurationId) -> Self {
        Self {
            platform: platform.into(),
            configuration_id,
            external_id: None,
            last_config: None,
            last_options: None,
            desired_config: None,
            desired_options: None,
            options_needs_recreate: false,
            platform_changed: false,
        }
    }

    /// Rebuild an entry from its persisted record. Desired state starts
    /// absent and is merged in from the specification afterwards.
    pub fn from_record(record: EntryRecord) -> Self {
        Self {
            platform: record.platform,
            configuration_id: record.configuration_id,
            external_id: Some(record.external_id),
            last_config: record.last_config,
            last_options: record.last_options,
            desired_config: None,
            desired_options: None,
            options_needs_recreate: false,
            platform_changed: false,
        }
    }

    /// The persisted form of this entry. Only meaningful when
    /// [`Self::is_persistable`] holds.
    pub fn record(&self) -> Option<EntryRecord> {
        let external_id = self.external_id.clone()?;
        Some(EntryRecord {
            platform: self.platform.clone(),
            external_id,
            configuration_id: self.configuration_id.clone(),
            last_config: self.last_config.clone(),
            last_options: self.last_options.clone(),
        })
    }

    /// Whether this entry belongs in the persisted store: it must both be
    /// desired and have materialized externally. Everything else is either
    /// pending deletion or retried from scratch next pass.
    pub fn is_persistable(&self) -> bool {
        self.desired_config.is_some() && self.external_id.is_some()
    }

    /// Overwrite desired state from a specification item. Desired fields
    /// are always replaced wholesale, never merged field by field.
    pub fn apply_spec(&mut self, item: &IntegrationSpec) {
        if self.platform != item.platform {
            info!(
                configuration_id = %self.configuration_id,
                from = %self.platform,
                to = %item.platform,
                "platform renamed, entry will be recreated"
            );
            self.platform = item.platform.clone();
            self.platform_changed = true;
        }
        self.desired_config = Some(item.answers.clone());
        self.desired_options = item.options.clone();
        self.options_needs_recreate = item.options_needs_recreate;
    }

    /// Converge this entry to its desired state.
    pub async fn reconcile(
        &mut self,
        registry: &dyn EntryRegistry,
        protocol: &dyn FlowProtocol,
        driver: &FlowDriver,
    ) -> Result<EntryOutcome, ReconcileError> {
        if self.desired_config.is_none() {
            let removed = self.remove_external(registry).await?;
            self.last_config = None;
            self.last_options = None;
            return Ok(if removed {
                EntryOutcome::Removed
            } else {
                EntryOutcome::Unchanged
            });
        }

        // Re-validate the externally assigned identity before trusting it.
        // An entry deleted behind our back is a fresh-create case.
        if let Some(external_id) = &self.external_id {
            if registry.lookup(external_id).await?.is_none() {
                info!(
                    platform = %self.platform,
                    configuration_id = %self.configuration_id,
                    external_id = %external_id,
                    "tracked entry no longer exists, creating from scratch"
                );
                self.external_id = None;
            }
        }

        let mut outcome = EntryOutcome::Unchanged;
        if self.external_id.is_none() {
            info!(
                platform = %self.platform,
                configuration_id = %self.configuration_id,
                "creating entry"
            );
            let receipt = self.run_create(protocol, driver).await?;
            self.external_id = Some(receipt.external_id);
            self.last_options = None;
            self.platform_changed = false;
            outcome = EntryOutcome::Created;
        } else if self.needs_recreate() {
            info!(
                platform = %self.platform,
                configuration_id = %self.configuration_id,
                "recreating entry"
            );
            self.remove_external(registry).await?;
            let receipt = self.run_create(protocol, driver).await?;
            self.external_id = Some(receipt.external_id);
            self.last_options = None;
            self.platform_changed = false;
            outcome = EntryOutcome::Recreated;
        } else {
            debug!(
                platform = %self.platform,
                configuration_id = %self.configuration_id,
                "entry configuration unchanged"
            );
        }
        self.last_config = self.desired_config.clone();

        if let Some(desired) = self.desired_options.clone() {
            if self.last_options.as_ref() != Some(&desired) {
                if let Some(external_id) = self.external_id.clone() {
                    let result = self
                        .run_options(protocol, driver, external_id, &desired)
                        .await;
                    match result {
                        Ok(_) => {
                            self.last_options = Some(desired);
                            if outcome == EntryOutcome::Unchanged {
                                outcome = EntryOutcome::OptionsUpdated;
                            }
                        }
                        Err(FlowError::UnknownHandler { .. }) => {
                            warn!(
                                platform = %self.platform,
                                configuration_id = %self.configuration_id,
                                "platform has no options flow, leaving options untouched"
                            );
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Whether the live entry has to be torn down and built again.
    fn needs_recreate(&self) -> bool {
        self.config_changed()
            || self.platform_changed
            || (self.options_needs_recreate && self.options_changed())
    }

    fn config_changed(&self) -> bool {
        self.desired_config != self.last_config
    }

    fn options_changed(&self) -> bool {
        match &self.desired_options {
            Some(desired) => self.last_options.as_ref() != Some(desired),
            None => false,
        }
    }

    async fn run_create(
        &self,
        protocol: &dyn FlowProtocol,
        driver: &FlowDriver,
    ) -> Result<FlowReceipt, FlowError> {
        let answers = self.desired_config.as_deref().unwrap_or(&[]);
        driver
            .run(protocol, &FlowSubject::create(self.platform.clone()), answers)
            .await
    }

    async fn run_options(
        &self,
        protocol: &dyn FlowProtocol,
        driver: &FlowDriver,
        external_id: ExternalId,
        answers: &[AnswerMap],
    ) -> Result<FlowReceipt, FlowError> {
        info!(
            platform = %self.platform,
            configuration_id = %self.configuration_id,
            external_id = %external_id,
            "configuring entry options"
        );
        driver
            .run(protocol, &FlowSubject::options(external_id), answers)
            .await
    }

    /// Remove the external entry, if any. Returns whether an entry was
    /// actually removed. An already-gone entry is not a failure; on any
    /// other failure the identity is kept so the next pass retries.
    async fn remove_external(
        &mut self,
        registry: &dyn EntryRegistry,
    ) -> Result<bool, RegistryError> {
        let Some(external_id) = self.external_id.take() else {
            return Ok(false);
        };
        info!(
            platform = %self.platform,
            configuration_id = %self.configuration_id,
            external_id = %external_id,
            "removing entry"
        );
        let result = registry.remove(&external_id).await;
        match result {
            Ok(()) => Ok(true),
            Err(RegistryError::NotFound(_)) => Ok(false),
            Err(err) => {
                self.external_id = Some(external_id);
                Err(err)
            }
        }
    }
}
