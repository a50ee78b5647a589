//! Top-level identity operations.
//!
//! [`IdentityManager`] owns the backend chosen at startup, the original-value
//! store and the history log. Every entry point that changes an identifier
//! records the pre-change value as the original (once per kind) before
//! anything is written, then hands the write to the [`MutationEngine`].

use log::{debug, info};
use netid_core::{
    generate, hex_to_duid, normalize, randomize, Duid, DuidVariant, GenerateOptions, MacAddress,
};
use serde::Serialize;

use crate::backend::{select_backend, Backend, BackendError};
use crate::config::Config;
use crate::engine::{MutationEngine, MutationOutcome, RetryPolicy};
use crate::error::IdentityError;
use crate::history::{History, HistoryAction, HistoryEntry};
use crate::store::OriginalStore;
use crate::target::{Identifier, IdentifierKind, MutationTarget};

/// Result of a restore request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RestoreOutcome {
    Restored(MutationOutcome),
    /// The current value already equals the recorded original; nothing was
    /// written.
    AlreadyOriginal { value: String },
}

pub struct IdentityManager {
    backend: Box<dyn Backend>,
    store: OriginalStore,
    policy: RetryPolicy,
    options: GenerateOptions,
    history: History,
}

impl IdentityManager {
    pub fn new(
        backend: Box<dyn Backend>,
        store: OriginalStore,
        policy: RetryPolicy,
        options: GenerateOptions,
        history: History,
    ) -> Self {
        Self {
            backend,
            store,
            policy,
            options,
            history,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let platform = config.platform();
        let state_dir = config.state_dir(platform);
        let backend = select_backend(config, platform);
        debug!(
            "platform {platform}, backend {}, state dir {}",
            backend.name(),
            state_dir.display()
        );
        Self::new(
            backend,
            OriginalStore::new(state_dir.clone()),
            config.retry_policy(),
            config.generate_options(platform),
            History::new(state_dir.join("history.json"), &config.history),
        )
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn store(&self) -> &OriginalStore {
        &self.store
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn generate_options(&self) -> &GenerateOptions {
        &self.options
    }

    fn engine(&self) -> MutationEngine<'_> {
        MutationEngine::new(self.backend.as_ref(), self.policy)
    }

    /// Current value of the `I` identifier on `interface`.
    pub fn current<I: Identifier>(&self, interface: &str) -> Result<I, IdentityError> {
        let target = MutationTarget::new(interface, I::KIND)?;
        self.engine().read(&target)
    }

    pub fn set_mac(
        &self,
        interface: &str,
        input: &str,
        verify: bool,
    ) -> Result<MutationOutcome, IdentityError> {
        let mac = normalize(input)?.ensure_assignable()?;
        self.mutate(interface, &mac, HistoryAction::Set, verify)
    }

    pub fn randomize_mac(
        &self,
        interface: &str,
        local_admin: bool,
        verify: bool,
    ) -> Result<MutationOutcome, IdentityError> {
        let mac = randomize(local_admin, self.options.oui_policy);
        self.mutate(interface, &mac, HistoryAction::Randomize, verify)
    }

    pub fn set_duid(
        &self,
        interface: &str,
        hex: &str,
        verify: bool,
    ) -> Result<MutationOutcome, IdentityError> {
        let duid = hex_to_duid(hex)?;
        self.mutate(interface, &duid, HistoryAction::Set, verify)
    }

    pub fn randomize_duid(
        &self,
        interface: &str,
        variant: DuidVariant,
        verify: bool,
    ) -> Result<MutationOutcome, IdentityError> {
        let duid = self.generate_duid(variant, None)?;
        self.mutate(interface, &duid, HistoryAction::Randomize, verify)
    }

    pub fn generate_duid(
        &self,
        variant: DuidVariant,
        mac: Option<MacAddress>,
    ) -> Result<Duid, IdentityError> {
        Ok(generate(variant, mac, &self.options)?)
    }

    /// Capture the original if needed, apply `desired`, and log the change.
    pub(crate) fn mutate<I: Identifier>(
        &self,
        interface: &str,
        desired: &I,
        action: HistoryAction,
        verify: bool,
    ) -> Result<MutationOutcome, IdentityError> {
        let target = MutationTarget::new(interface, I::KIND)?;
        let engine = self.engine();

        let previous = match engine.read_raw(&target) {
            Ok(bytes) => Some(bytes),
            // A host may not have generated a DUID yet; there is nothing to keep.
            Err(BackendError::NotFound(reason)) if I::KIND == IdentifierKind::Duid => {
                debug!("{target}: no current value ({reason})");
                None
            }
            Err(err) => return Err(IdentityError::from_backend("read", &target.to_string(), &err)),
        };
        if let Some(bytes) = &previous {
            if !self.store.has_original(I::KIND) {
                self.store.capture(I::KIND, bytes)?;
            }
        }

        let outcome = engine.apply(&target, desired, verify)?;
        info!("{target}: {action} -> {}", outcome.value);
        self.history.record(HistoryEntry::now(
            I::KIND,
            &target.interface,
            action,
            previous.map(|bytes| I::render(&bytes)),
            Some(outcome.value.clone()),
        ));
        Ok(outcome)
    }

    /// Write the recorded original back, unless it is already in place.
    pub fn restore<I: Identifier>(
        &self,
        interface: &str,
        verify: bool,
    ) -> Result<RestoreOutcome, IdentityError> {
        let target = MutationTarget::new(interface, I::KIND)?;
        let Some(bytes) = self.store.get_original(I::KIND)? else {
            return Err(IdentityError::validation(format!(
                "no original {} has been recorded",
                I::KIND
            ))
            .with_suggestion(format!(
                "An original is recorded the first time `netid {} set` or `random` changes it",
                I::KIND
            )));
        };
        let original = I::from_bytes(&bytes)?;
        let engine = self.engine();

        let current = match engine.read_raw(&target) {
            Ok(current) => Some(current),
            Err(BackendError::NotFound(_)) if I::KIND == IdentifierKind::Duid => None,
            Err(err) => return Err(IdentityError::from_backend("read", &target.to_string(), &err)),
        };
        if current.as_deref().is_some_and(|current| original.matches(current)) {
            info!("{target}: already at original {original}");
            return Ok(RestoreOutcome::AlreadyOriginal {
                value: original.to_string(),
            });
        }

        let outcome = engine.apply(&target, &original, verify)?;
        self.history.record(HistoryEntry::now(
            I::KIND,
            &target.interface,
            HistoryAction::Restore,
            current.map(|bytes| I::render(&bytes)),
            Some(outcome.value.clone()),
        ));
        Ok(RestoreOutcome::Restored(outcome))
    }

    /// Delete the current value so its owner regenerates one. The recorded
    /// original is left alone.
    pub fn reset(&self, kind: IdentifierKind, interface: &str) -> Result<(), IdentityError> {
        let target = MutationTarget::new(interface, kind)?;
        let engine = self.engine();
        let previous = engine
            .read_raw(&target)
            .ok()
            .map(|bytes| kind.render_hex(&bytes));
        engine.delete(&target)?;
        info!("{target}: reset");
        self.history.record(HistoryEntry::now(
            kind,
            &target.interface,
            HistoryAction::Reset,
            previous,
            None,
        ));
        Ok(())
    }

    /// Recorded original for `kind` as canonical hex.
    pub fn original(&self, kind: IdentifierKind) -> Result<Option<String>, IdentityError> {
        Ok(self
            .store
            .get_original(kind)?
            .map(|bytes| kind.render_hex(&bytes)))
    }

    pub fn clear_original(&self, kind: IdentifierKind) -> Result<bool, IdentityError> {
        Ok(self.store.clear_original(kind)?)
    }
}
