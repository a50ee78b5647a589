//! Keep the DUID's embedded link-layer address in step with the MAC.

use netid_core::{DuidVariant, MacAddress};
use serde::Serialize;

use crate::engine::MutationOutcome;
use crate::error::IdentityError;
use crate::history::HistoryAction;
use crate::identity::IdentityManager;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    /// MAC address the new DUID was built from.
    pub mac: String,
    pub duid: String,
    #[serde(flatten)]
    pub outcome: MutationOutcome,
}

/// Regenerate the DUID from `interface`'s current MAC and apply it.
///
/// Only LLT and LL carry a link-layer address; other variants are refused
/// before anything is read or written.
pub fn sync_duid(
    manager: &IdentityManager,
    interface: &str,
    variant: DuidVariant,
    verify: bool,
) -> Result<SyncOutcome, IdentityError> {
    if !variant.embeds_link_layer() {
        return Err(IdentityError::validation(format!(
            "{} does not embed a link-layer address, so there is nothing to sync",
            variant.name()
        ))
        .with_suggestion("Use `--type llt` or `--type ll`")
        .with_suggestion(format!(
            "To replace a {} use `netid duid random {interface} --type {}`",
            variant.name(),
            variant.name().trim_start_matches("DUID-").to_ascii_lowercase()
        )));
    }

    let mac: MacAddress = manager.current(interface)?;
    let duid = manager.generate_duid(variant, Some(mac))?;
    let outcome = manager.mutate(interface, &duid, HistoryAction::Sync, verify)?;
    Ok(SyncOutcome {
        mac: mac.to_string(),
        duid: duid.to_string(),
        outcome,
    })
}
