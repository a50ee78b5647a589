//! Platform backends that actually read and write identifiers.
//!
//! The rest of the crate sees only the [`Backend`] trait. One implementation
//! is chosen at startup by [`select_backend`] and passed down; nothing below
//! that point branches on the operating system.
//!
//! - [`FileBackend`]: JSON state file, for dry runs, labs and tests.
//! - [`LinuxBackend`]: sysfs + `ip link` for MAC addresses, a hex text file
//!   for the DHCPv6 client's DUID.
//! - [`UnsupportedBackend`]: every call fails with [`BackendError::Unsupported`].

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config::{BackendChoice, Config, Platform};
use crate::target::MutationTarget;

mod command;
mod file;
mod linux;

pub use file::FileBackend;
pub use linux::LinuxBackend;

/// Closed set of backend failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Interface or stored value does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Required tool or service is missing on this host.
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// The operation is not implemented for this platform or kind.
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("{0}")]
    Failed(String),
    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

/// Read/write capabilities over one platform's identifier storage.
///
/// Every call must complete or fail within `timeout`.
pub trait Backend {
    fn name(&self) -> &'static str;

    fn read_identifier(
        &self,
        target: &MutationTarget,
        timeout: Duration,
    ) -> Result<Vec<u8>, BackendError>;

    fn write_identifier(
        &self,
        target: &MutationTarget,
        value: &[u8],
        timeout: Duration,
    ) -> Result<(), BackendError>;

    /// Remove the current value so its owner regenerates one.
    fn delete_identifier(
        &self,
        target: &MutationTarget,
        _timeout: Duration,
    ) -> Result<(), BackendError> {
        Err(BackendError::Unsupported(format!(
            "the {} backend cannot delete {}",
            self.name(),
            target
        )))
    }

    /// Follow-up work once a write has been verified (e.g. reconnecting).
    fn after_verified(
        &self,
        _target: &MutationTarget,
        _timeout: Duration,
    ) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Backend for platforms without an implementation.
#[derive(Debug, Clone, Copy)]
pub struct UnsupportedBackend {
    pub platform: Platform,
}

impl Backend for UnsupportedBackend {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn read_identifier(
        &self,
        target: &MutationTarget,
        _timeout: Duration,
    ) -> Result<Vec<u8>, BackendError> {
        Err(self.unsupported(target))
    }

    fn write_identifier(
        &self,
        target: &MutationTarget,
        _value: &[u8],
        _timeout: Duration,
    ) -> Result<(), BackendError> {
        Err(self.unsupported(target))
    }
}

impl UnsupportedBackend {
    fn unsupported(&self, target: &MutationTarget) -> BackendError {
        BackendError::Unsupported(format!(
            "no system backend for {} on {}",
            target.kind, self.platform
        ))
    }
}

/// Pick the backend described by `config` for `platform`.
pub fn select_backend(config: &Config, platform: Platform) -> Box<dyn Backend> {
    match (config.backend, platform) {
        (BackendChoice::File, _) => Box::new(FileBackend::new(backend_file_path(config, platform))),
        (BackendChoice::Auto | BackendChoice::System, Platform::Linux) => Box::new(
            LinuxBackend::new(PathBuf::from("/sys/class/net"), config.duid_file.clone()),
        ),
        (BackendChoice::Auto | BackendChoice::System, other) => {
            Box::new(UnsupportedBackend { platform: other })
        }
    }
}

fn backend_file_path(config: &Config, platform: Platform) -> PathBuf {
    config
        .backend_file
        .clone()
        .unwrap_or_else(|| config.state_dir(platform).join("interfaces.json"))
}
