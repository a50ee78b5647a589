use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use netid::target::IdentifierKind;
use netid_core::DuidVariant;

#[derive(Parser, Debug)]
#[command(name = "netid")]
#[command(about = "Inspect, spoof and restore MAC addresses and DHCPv6 DUIDs")]
pub struct Cli {
    /// Configuration file (defaults to the built-in configuration).
    #[arg(long, global = true, env = "NETID_CONFIG")]
    pub config: Option<PathBuf>,
    /// More logging; repeat for debug output.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Hardware (MAC) address operations.
    #[command(subcommand)]
    Mac(MacCommand),
    /// DHCPv6 Unique Identifier operations.
    #[command(subcommand)]
    Duid(DuidCommand),
    /// Show or clear the recorded pre-change values.
    #[command(subcommand)]
    Original(OriginalCommand),
    /// Show recently applied changes.
    History(HistoryArgs),
}

#[derive(clap::Subcommand, Debug)]
pub enum MacCommand {
    /// Print the interface's current MAC address.
    Show(InterfaceArgs),
    /// Set a specific MAC address.
    Set(MacSetArgs),
    /// Set a random MAC address with a virtualization-vendor prefix.
    Random(MacRandomArgs),
    /// Put the recorded original MAC address back.
    Restore(RestoreArgs),
    /// Check and normalize a MAC address without applying it.
    Validate(MacValidateArgs),
    /// Print random MAC addresses without applying them.
    Generate(MacGenerateArgs),
}

#[derive(clap::Subcommand, Debug)]
pub enum DuidCommand {
    /// Print and decode the current DUID.
    Show(InterfaceArgs),
    /// Set a DUID from colon-hex.
    Set(DuidSetArgs),
    /// Set a freshly generated DUID.
    Random(DuidRandomArgs),
    /// Rebuild the DUID from the interface's current MAC address.
    Sync(DuidSyncArgs),
    /// Put the recorded original DUID back.
    Restore(RestoreArgs),
    /// Delete the DUID so the DHCPv6 client generates a new one.
    Reset(InterfaceArgs),
    /// Decode a colon-hex DUID.
    Parse(DuidParseArgs),
    /// Print a generated DUID without applying it.
    Generate(DuidGenerateArgs),
}

#[derive(clap::Subcommand, Debug)]
pub enum OriginalCommand {
    /// Print the recorded original value.
    Show(KindArgs),
    /// Forget the recorded original value.
    Clear(KindArgs),
}

#[derive(Parser, Debug)]
pub struct InterfaceArgs {
    pub interface: String,
}

#[derive(Parser, Debug)]
pub struct MacSetArgs {
    pub interface: String,
    pub mac: String,
    /// Do not read the address back after writing it.
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Parser, Debug)]
pub struct MacRandomArgs {
    pub interface: String,
    /// Set the locally-administered bit.
    #[arg(long)]
    pub local: bool,
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Parser, Debug)]
pub struct RestoreArgs {
    pub interface: String,
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Parser, Debug)]
pub struct MacValidateArgs {
    pub mac: String,
}

#[derive(Parser, Debug)]
pub struct MacGenerateArgs {
    #[arg(long)]
    pub local: bool,
    #[arg(long, default_value_t = 1)]
    pub count: usize,
}

#[derive(Parser, Debug)]
pub struct DuidSetArgs {
    pub interface: String,
    /// Colon-separated hex, e.g. 00:03:00:01:aa:bb:cc:dd:ee:ff.
    pub duid: String,
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Parser, Debug)]
pub struct DuidRandomArgs {
    pub interface: String,
    #[arg(long = "type", value_enum, default_value_t = DuidType::Llt)]
    pub duid_type: DuidType,
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Parser, Debug)]
pub struct DuidSyncArgs {
    pub interface: String,
    #[arg(long = "type", value_enum, default_value_t = DuidType::Llt)]
    pub duid_type: DuidType,
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Parser, Debug)]
pub struct DuidParseArgs {
    pub duid: String,
}

#[derive(Parser, Debug)]
pub struct DuidGenerateArgs {
    #[arg(long = "type", value_enum, default_value_t = DuidType::Llt)]
    pub duid_type: DuidType,
    /// Link-layer address to embed (LLT and LL only).
    #[arg(long)]
    pub mac: Option<String>,
}

#[derive(Parser, Debug)]
pub struct KindArgs {
    #[arg(value_enum)]
    pub kind: KindArg,
}

#[derive(Parser, Debug)]
pub struct HistoryArgs {
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum DuidType {
    Llt,
    En,
    Ll,
    Uuid,
}

impl From<DuidType> for DuidVariant {
    fn from(value: DuidType) -> Self {
        match value {
            DuidType::Llt => DuidVariant::Llt,
            DuidType::En => DuidVariant::En,
            DuidType::Ll => DuidVariant::Ll,
            DuidType::Uuid => DuidVariant::Uuid,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum KindArg {
    Mac,
    Duid,
}

impl From<KindArg> for IdentifierKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Mac => IdentifierKind::Mac,
            KindArg::Duid => IdentifierKind::Duid,
        }
    }
}
