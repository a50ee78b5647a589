use anyhow::Result;
use netid::identity::IdentityManager;
use netid::report::render_original;
use netid::target::IdentifierKind;
use serde_json::json;

use crate::cli::{OriginalCommand, OutputFormat};
use crate::emit;

pub fn run_original(
    command: OriginalCommand,
    manager: &IdentityManager,
    format: OutputFormat,
) -> Result<()> {
    match command {
        OriginalCommand::Show(args) => {
            let kind = IdentifierKind::from(args.kind);
            let value = manager.original(kind)?;
            let path = manager.store().get_original_path(kind).display().to_string();
            emit(
                format,
                &json!({ "kind": kind, "value": value, "path": path }),
                || render_original(kind, value.as_deref(), &path),
            )
        }
        OriginalCommand::Clear(args) => {
            let kind = IdentifierKind::from(args.kind);
            let cleared = manager.clear_original(kind)?;
            emit(format, &json!({ "kind": kind, "cleared": cleared }), || {
                if cleared {
                    format!("cleared original {kind}")
                } else {
                    format!("no original {kind} recorded")
                }
            })
        }
    }
}
