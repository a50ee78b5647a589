//! Error taxonomy shared by every mutation entry point.
//!
//! Whatever goes wrong, callers receive one [`IdentityError`]: a category
//! ([`ErrorKind`]), a short message, and ordered suggestions the user can act
//! on. Backend failures arrive as a closed [`BackendError`] enum and are
//! classified by `match`, so no decision here depends on message text.

use std::fmt;
use std::io;

use netid_core::{DuidError, MacError};
use serde::Serialize;
use thiserror::Error;

use crate::backend::BackendError;
use crate::target::IdentifierKind;

/// Failure category, which decides retry behaviour and guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or forbidden identifier value. Never retried.
    Validation,
    /// Insufficient privilege. Never retried.
    Permission,
    /// Transient backend failure, timeout, or verification mismatch.
    Network,
    /// Missing or unsupported backend tooling. Never retried.
    Platform,
    /// Malformed DUID bytes or hex.
    Parse,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Permission => "permission",
            ErrorKind::Network => "network",
            ErrorKind::Platform => "platform",
            ErrorKind::Parse => "parse",
        }
    }

    /// Process exit status used by the CLI.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Validation | ErrorKind::Parse => 2,
            ErrorKind::Permission => 3,
            ErrorKind::Network => 4,
            ErrorKind::Platform => 5,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single error type surfaced by the identity operations.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct IdentityError {
    pub kind: ErrorKind,
    pub message: String,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl IdentityError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            suggestions: Vec::new(),
            expected: None,
            actual: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_values(mut self, expected: String, actual: String) -> Self {
        self.expected = Some(expected);
        self.actual = Some(actual);
        self
    }

    /// Read-back never matched the requested value.
    pub fn mismatch(kind: IdentifierKind, expected: String, actual: String, checks: u32) -> Self {
        Self::new(
            ErrorKind::Network,
            format!(
                "{kind} verification failed after {checks} checks: expected {expected}, found {actual}"
            ),
        )
        .with_values(expected, actual)
        .with_suggestion("The driver may ignore address changes; try again with the interface down")
        .with_suggestion("Check that no network manager is rewriting the value after the change")
        .with_suggestion("Raise retry.max_attempts or retry.base_delay_ms for slow adapters")
    }

    /// Classify a backend failure for `operation` on `what`.
    pub fn from_backend(operation: &str, what: &str, err: &BackendError) -> Self {
        let message = format!("failed to {operation} {what}: {err}");
        match err {
            BackendError::NotFound(_) => Self::validation(message)
                .with_suggestion("Check the interface name; `ip link` or `ifconfig -a` lists them"),
            BackendError::PermissionDenied(_) => Self::new(ErrorKind::Permission, message)
                .with_suggestion("Re-run with root privileges (sudo) or as Administrator")
                .with_suggestion("On Linux, CAP_NET_ADMIN is required to change link addresses"),
            BackendError::Unavailable(_) | BackendError::Unsupported(_) => {
                Self::new(ErrorKind::Platform, message)
                    .with_suggestion("Install the platform tooling (iproute2 on Linux)")
                    .with_suggestion("Or set `backend = \"file\"` in the configuration for a dry run")
            }
            BackendError::Failed(_) => Self::new(ErrorKind::Network, message)
                .with_suggestion("Check that the interface exists and the driver supports the change")
                .with_suggestion("Run with -vv to see each backend step"),
            BackendError::Timeout { .. } => Self::new(ErrorKind::Network, message)
                .with_suggestion("The backend did not answer in time; raise retry.timeout_ms")
                .with_suggestion("Check for a hung network service holding the interface"),
        }
    }

    /// Errors touching the local state directory.
    pub fn from_io(context: String, err: &io::Error) -> Self {
        let message = format!("{context}: {err}");
        if err.kind() == io::ErrorKind::PermissionDenied {
            Self::new(ErrorKind::Permission, message)
                .with_suggestion("Re-run with root privileges or point state_dir at a writable path")
        } else {
            Self::new(ErrorKind::Platform, message)
                .with_suggestion("Check that state_dir exists and is writable")
        }
    }
}

impl From<MacError> for IdentityError {
    fn from(err: MacError) -> Self {
        Self::validation(err.to_string()).with_suggestion(
            "Use a form like AA:BB:CC:DD:EE:FF, AA-BB-CC-DD-EE-FF, AABBCCDDEEFF or AABB.CCDD.EEFF",
        )
    }
}

impl From<DuidError> for IdentityError {
    fn from(err: DuidError) -> Self {
        Self::parse(err.to_string())
            .with_suggestion("Use colon-separated hex pairs, e.g. 00:03:00:01:aa:bb:cc:dd:ee:ff")
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use netid_core::{hex_to_duid, normalize};

    use super::{ErrorKind, IdentityError};
    use crate::backend::BackendError;
    use crate::target::IdentifierKind;

    #[test]
    fn classifies_every_backend_error() {
        let cases = [
            (BackendError::NotFound("eth9".into()), ErrorKind::Validation),
            (BackendError::PermissionDenied("no".into()), ErrorKind::Permission),
            (BackendError::Unavailable("ip".into()), ErrorKind::Platform),
            (BackendError::Unsupported("windows".into()), ErrorKind::Platform),
            (BackendError::Failed("busy".into()), ErrorKind::Network),
            (
                BackendError::Timeout {
                    operation: "write",
                    after: Duration::from_secs(1),
                },
                ErrorKind::Network,
            ),
        ];
        for (err, kind) in cases {
            let classified = IdentityError::from_backend("write", "eth0 mac", &err);
            assert_eq!(classified.kind, kind, "{err}");
            assert!(!classified.suggestions.is_empty());
        }
    }

    #[test]
    fn codec_errors_map_to_validation_and_parse() {
        let mac = IdentityError::from(normalize("zz").expect_err("bad mac"));
        assert_eq!(mac.kind, ErrorKind::Validation);
        let duid = IdentityError::from(hex_to_duid("00:09:00").expect_err("bad duid"));
        assert_eq!(duid.kind, ErrorKind::Parse);
    }

    #[test]
    fn mismatch_carries_expected_and_actual() {
        let err = IdentityError::mismatch(
            IdentifierKind::Mac,
            "AA:BB:CC:DD:EE:FF".into(),
            "00:11:22:33:44:55".into(),
            4,
        );
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.expected.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
        assert_eq!(err.actual.as_deref(), Some("00:11:22:33:44:55"));
        assert!(err.message.contains("after 4 checks"));
    }

    #[test]
    fn io_permission_is_permission_kind() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            IdentityError::from_io("write".into(), &err).kind,
            ErrorKind::Permission
        );
        let err = io::Error::new(io::ErrorKind::Other, "disk");
        assert_eq!(
            IdentityError::from_io("write".into(), &err).kind,
            ErrorKind::Platform
        );
    }
}
