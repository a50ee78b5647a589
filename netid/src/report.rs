use colored::Colorize;
use netid_core::{DuidInfo, MacValidation};

use crate::engine::MutationOutcome;
use crate::error::IdentityError;
use crate::history::HistoryEntry;
use crate::identity::RestoreOutcome;
use crate::sync::SyncOutcome;
use crate::target::IdentifierKind;

/// Render a completed mutation.
pub fn render_outcome(action: &str, outcome: &MutationOutcome) -> String {
    let mut out = Vec::new();
    let status = if outcome.verified {
        format!("verified after {} check(s)", outcome.checks)
            .green()
            .to_string()
    } else {
        "not verified".yellow().to_string()
    };
    out.push(format!(
        "{} {}: {} ({status})",
        action,
        outcome.target,
        outcome.value.bold()
    ));
    if let Some(err) = &outcome.spurious_write_error {
        out.push(format!("  {} backend reported: {err}", "note:".yellow()));
    }
    if let Some(warning) = &outcome.follow_up_warning {
        out.push(format!("  {} {warning}", "warning:".yellow()));
    }
    out.join("\n")
}

pub fn render_restore(outcome: &RestoreOutcome) -> String {
    match outcome {
        RestoreOutcome::Restored(outcome) => render_outcome("restored", outcome),
        RestoreOutcome::AlreadyOriginal { value } => {
            format!("already at original value {}", value.bold())
        }
    }
}

pub fn render_sync(synced: &SyncOutcome) -> String {
    let mut out = vec![format!("mac: {}", synced.mac)];
    out.push(render_outcome("synced", &synced.outcome));
    out.join("\n")
}

/// Render an error with its suggestions, one per line.
pub fn render_error(err: &IdentityError) -> String {
    let mut out = vec![format!(
        "{} [{}] {}",
        "error:".red().bold(),
        err.kind,
        err.message
    )];
    if let (Some(expected), Some(actual)) = (&err.expected, &err.actual) {
        out.push(format!("  expected: {expected}"));
        out.push(format!("  actual:   {actual}"));
    }
    for suggestion in &err.suggestions {
        out.push(format!("  {} {suggestion}", "hint:".cyan()));
    }
    out.join("\n")
}

pub fn render_duid_info(info: &DuidInfo) -> String {
    let mut out = vec![
        format!("{} (type {})", info.type_name.bold(), info.variant.code()),
        format!("- raw: {}", info.raw),
    ];
    if let Some(hw) = info.hardware_type {
        let label = if hw == 1 { " (Ethernet)" } else { "" };
        out.push(format!("- hardware_type: {hw}{label}"));
    }
    if let Some(addr) = &info.link_layer_address {
        out.push(format!("- link_layer_address: {addr}"));
    }
    if let Some(ts) = info.timestamp {
        let time = info.time.as_deref().unwrap_or("out of range");
        out.push(format!("- timestamp: {ts} ({time})"));
    }
    if let Some(en) = info.enterprise_number {
        out.push(format!("- enterprise_number: {en}"));
    }
    if let Some(id) = &info.identifier {
        out.push(format!("- identifier: {id}"));
    }
    if let Some(uuid) = &info.uuid {
        out.push(format!("- uuid: {uuid}"));
    }
    out.join("\n")
}

pub fn render_validation(input: &str, result: &MacValidation) -> String {
    if result.valid {
        let normalized = result.normalized.as_deref().unwrap_or(input);
        return format!("{} {input} -> {normalized}", "valid".green());
    }
    format!(
        "{} {input}: {}",
        "invalid".red(),
        result.error.as_deref().unwrap_or("unknown error")
    )
}

pub fn render_original(kind: IdentifierKind, value: Option<&str>, path: &str) -> String {
    match value {
        Some(value) => format!("original {kind}: {}\n- stored at {path}", value.bold()),
        None => format!("no original {kind} recorded ({path})"),
    }
}

pub fn render_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "no changes recorded".to_string();
    }
    entries
        .iter()
        .map(|entry| {
            format!(
                "{} {} {} {}: {} -> {}",
                entry.timestamp.dimmed(),
                entry.action.to_string().cyan(),
                entry.interface,
                entry.kind,
                entry.previous.as_deref().unwrap_or("-"),
                entry.current.as_deref().unwrap_or("-")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
