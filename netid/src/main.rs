use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use netid::config::load_config;
use netid::error::IdentityError;
use netid::identity::IdentityManager;
use netid::report::{render_error, render_history};
use serde::Serialize;

mod cli;
mod duid_cmd;
mod mac_cmd;
mod original_cmd;

use cli::{Cli, Command, HistoryArgs, OutputFormat};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let format = cli.format;

    if let Err(err) = run(cli) {
        process::exit(report_failure(&err, format));
    }
}

fn run(cli: Cli) -> Result<()> {
    let (config, source) =
        load_config(cli.config.as_deref()).context("failed to load configuration")?;
    info!("configuration: {source}");
    let manager = IdentityManager::from_config(&config);
    info!("backend: {}", manager.backend_name());

    match cli.command {
        Command::Mac(command) => mac_cmd::run_mac(command, &manager, cli.format),
        Command::Duid(command) => duid_cmd::run_duid(command, &manager, cli.format),
        Command::Original(command) => original_cmd::run_original(command, &manager, cli.format),
        Command::History(args) => run_history(args, &manager, cli.format),
    }
}

fn run_history(args: HistoryArgs, manager: &IdentityManager, format: OutputFormat) -> Result<()> {
    let entries = manager
        .history()
        .recent(args.limit)
        .with_context(|| format!("failed to read {}", manager.history().path().display()))?;
    emit(format, &entries, || render_history(&entries))
}

/// Print `value` as pretty JSON, or the text rendering.
pub(crate) fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce() -> String,
) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Print the failure and return the process exit status.
fn report_failure(err: &anyhow::Error, format: OutputFormat) -> i32 {
    let Some(identity) = err.downcast_ref::<IdentityError>() else {
        eprintln!("error: {err:#}");
        return 1;
    };
    match format {
        OutputFormat::Text => eprintln!("{}", render_error(identity)),
        OutputFormat::Json => {
            match serde_json::to_string_pretty(&serde_json::json!({ "error": identity })) {
                Ok(body) => println!("{body}"),
                Err(_) => eprintln!("{}", render_error(identity)),
            }
        }
    }
    identity.kind.exit_code()
}
