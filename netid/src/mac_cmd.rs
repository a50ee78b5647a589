use anyhow::{bail, Result};
use netid::identity::IdentityManager;
use netid::report::{render_outcome, render_restore, render_validation};
use netid_core::{randomize, validate, MacAddress};
use serde::Serialize;

use crate::cli::{MacCommand, OutputFormat};
use crate::emit;

#[derive(Serialize)]
struct MacView<'a> {
    interface: &'a str,
    mac: MacAddress,
    locally_administered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    vendor: Option<&'static str>,
}

pub fn run_mac(command: MacCommand, manager: &IdentityManager, format: OutputFormat) -> Result<()> {
    match command {
        MacCommand::Show(args) => {
            let mac: MacAddress = manager.current(&args.interface)?;
            let view = MacView {
                interface: &args.interface,
                mac,
                locally_administered: mac.is_locally_administered(),
                vendor: mac.pool_vendor(),
            };
            emit(format, &view, || {
                let mut line = format!("{} {}", view.interface, view.mac);
                if let Some(vendor) = view.vendor {
                    line.push_str(&format!(" ({vendor} prefix)"));
                }
                if view.locally_administered {
                    line.push_str(" [locally administered]");
                }
                line
            })
        }
        MacCommand::Set(args) => {
            let outcome = manager.set_mac(&args.interface, &args.mac, !args.no_verify)?;
            emit(format, &outcome, || render_outcome("set", &outcome))
        }
        MacCommand::Random(args) => {
            let outcome = manager.randomize_mac(&args.interface, args.local, !args.no_verify)?;
            emit(format, &outcome, || render_outcome("randomized", &outcome))
        }
        MacCommand::Restore(args) => {
            let outcome = manager.restore::<MacAddress>(&args.interface, !args.no_verify)?;
            emit(format, &outcome, || render_restore(&outcome))
        }
        MacCommand::Validate(args) => {
            let result = validate(&args.mac);
            emit(format, &result, || render_validation(&args.mac, &result))?;
            if !result.valid {
                bail!("{:?} is not a usable MAC address", args.mac);
            }
            Ok(())
        }
        MacCommand::Generate(args) => {
            let policy = manager.generate_options().oui_policy;
            let macs: Vec<MacAddress> = (0..args.count)
                .map(|_| randomize(args.local, policy))
                .collect();
            emit(format, &macs, || {
                macs.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}
