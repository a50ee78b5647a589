use anyhow::Result;
use netid::error::IdentityError;
use netid::identity::IdentityManager;
use netid::report::{render_duid_info, render_outcome, render_restore, render_sync};
use netid::sync::sync_duid;
use netid::target::IdentifierKind;
use netid_core::{hex_to_duid, normalize, Duid};

use crate::cli::{DuidCommand, OutputFormat};
use crate::emit;

pub fn run_duid(command: DuidCommand, manager: &IdentityManager, format: OutputFormat) -> Result<()> {
    match command {
        DuidCommand::Show(args) => {
            let duid: Duid = manager.current(&args.interface)?;
            let info = duid.info();
            emit(format, &info, || render_duid_info(&info))
        }
        DuidCommand::Set(args) => {
            let outcome = manager.set_duid(&args.interface, &args.duid, !args.no_verify)?;
            emit(format, &outcome, || render_outcome("set", &outcome))
        }
        DuidCommand::Random(args) => {
            let outcome =
                manager.randomize_duid(&args.interface, args.duid_type.into(), !args.no_verify)?;
            emit(format, &outcome, || render_outcome("randomized", &outcome))
        }
        DuidCommand::Sync(args) => {
            let synced = sync_duid(
                manager,
                &args.interface,
                args.duid_type.into(),
                !args.no_verify,
            )?;
            emit(format, &synced, || render_sync(&synced))
        }
        DuidCommand::Restore(args) => {
            let outcome = manager.restore::<Duid>(&args.interface, !args.no_verify)?;
            emit(format, &outcome, || render_restore(&outcome))
        }
        DuidCommand::Reset(args) => {
            manager.reset(IdentifierKind::Duid, &args.interface)?;
            emit(
                format,
                &serde_json::json!({ "interface": args.interface, "reset": true }),
                || format!("{} duid reset; the DHCPv6 client will generate a new one", args.interface),
            )
        }
        DuidCommand::Parse(args) => {
            let duid = hex_to_duid(&args.duid).map_err(IdentityError::from)?;
            let info = duid.info();
            emit(format, &info, || render_duid_info(&info))
        }
        DuidCommand::Generate(args) => {
            let mac = args
                .mac
                .as_deref()
                .map(|raw| normalize(raw).and_then(|mac| mac.ensure_assignable()))
                .transpose()
                .map_err(IdentityError::from)?;
            let duid = manager.generate_duid(args.duid_type.into(), mac)?;
            let info = duid.info();
            emit(format, &info, || render_duid_info(&info))
        }
    }
}
