//! Apply-verify-retry protocol shared by MAC and DUID writes.
//!
//! A mutation moves through `Writing -> Verifying -> {Success, Retrying,
//! Failed}`:
//!
//! 1. **Writing**: the backend write is attempted. An error is remembered
//!   but does not end the call: some platforms report failure after the
//!   change has taken effect.
//! 2. **Verifying**: the value is read back. A match is a success even if the
//!   write complained.
//! 3. A mismatch after a write error fails with that error's category.
//! 4. A mismatch after a clean write enters **Retrying**: re-read (never
//!   re-write) after `base_delay * 2^attempt`, up to `max_attempts` times,
//!   then fail with the expected and observed values.
//!
//! Each backend call is bounded by [`RetryPolicy::timeout`]. A timeout ends the
//! call immediately as a network-category failure; it is never treated as a
//! mismatch.
//!
//! The engine holds no mutable state. Callers serialize mutations per target.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Serialize;

use crate::backend::{Backend, BackendError};
use crate::error::IdentityError;
use crate::target::{Identifier, MutationTarget};

/// Verification retry and timeout settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Re-reads after the first failed verification.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound for each backend call.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before re-read number `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationState {
    Writing,
    Verifying,
    Retrying,
    Success,
    Failed,
}

/// Result of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationOutcome {
    pub target: MutationTarget,
    pub value: String,
    pub verified: bool,
    /// Read-backs performed, including the first.
    pub checks: u32,
    /// Write error that verification proved harmless.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spurious_write_error: Option<String>,
    /// Failure of the post-verification step, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_warning: Option<String>,
}

pub struct MutationEngine<'a> {
    backend: &'a dyn Backend,
    policy: RetryPolicy,
}

enum Observation {
    Matched,
    Mismatched(String),
}

impl<'a> MutationEngine<'a> {
    pub fn new(backend: &'a dyn Backend, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    /// Timed raw read.
    pub fn read_raw(&self, target: &MutationTarget) -> Result<Vec<u8>, BackendError> {
        self.timed("read", || {
            self.backend.read_identifier(target, self.policy.timeout)
        })
    }

    /// Read and decode the current value of `target`.
    pub fn read<I: Identifier>(&self, target: &MutationTarget) -> Result<I, IdentityError> {
        let bytes = self
            .read_raw(target)
            .map_err(|err| IdentityError::from_backend("read", &target.to_string(), &err))?;
        I::from_bytes(&bytes)
    }

    /// Timed delete.
    pub fn delete(&self, target: &MutationTarget) -> Result<(), IdentityError> {
        self.timed("delete", || {
            self.backend.delete_identifier(target, self.policy.timeout)
        })
        .map_err(|err| IdentityError::from_backend("reset", &target.to_string(), &err))
    }

    /// Write `desired` to `target` and, when `verify` is set, confirm it took.
    pub fn apply<I: Identifier>(
        &self,
        target: &MutationTarget,
        desired: &I,
        verify: bool,
    ) -> Result<MutationOutcome, IdentityError> {
        let expected = desired.to_string();
        let what = target.to_string();

        debug!("{target}: {:?} {expected}", MutationState::Writing);
        let write_error = match self.timed("write", || {
            self.backend
                .write_identifier(target, &desired.to_bytes(), self.policy.timeout)
        }) {
            Ok(()) => None,
            Err(err @ BackendError::Timeout { .. }) => {
                debug!("{target}: {:?} ({err})", MutationState::Failed);
                return Err(IdentityError::from_backend("write", &what, &err));
            }
            Err(err) => {
                debug!("{target}: write reported {err}; verifying anyway");
                Some(err)
            }
        };

        if !verify {
            if let Some(err) = write_error {
                return Err(IdentityError::from_backend("write", &what, &err));
            }
            info!("{target}: wrote {expected} (not verified)");
            return Ok(MutationOutcome {
                target: target.clone(),
                value: expected,
                verified: false,
                checks: 0,
                spurious_write_error: None,
                follow_up_warning: None,
            });
        }

        debug!("{target}: {:?}", MutationState::Verifying);
        let mut checks = 1;
        let mut observation = self.observe(target, desired)?;

        if let Observation::Mismatched(actual) = &observation {
            if let Some(err) = &write_error {
                debug!("{target}: {:?} ({err})", MutationState::Failed);
                return Err(IdentityError::from_backend("write", &what, err)
                    .with_values(expected, actual.clone()));
            }
        }

        let mut attempt = 0;
        while let Observation::Mismatched(actual) = &observation {
            if attempt >= self.policy.max_attempts {
                debug!("{target}: {:?} after {checks} checks", MutationState::Failed);
                return Err(IdentityError::mismatch(
                    target.kind,
                    expected,
                    actual.clone(),
                    checks,
                ));
            }
            let delay = self.policy.delay(attempt);
            debug!(
                "{target}: {:?} in {}ms, observed {actual}",
                MutationState::Retrying,
                delay.as_millis()
            );
            thread::sleep(delay);
            attempt += 1;
            checks += 1;
            observation = self.observe(target, desired)?;
        }

        if let Some(err) = &write_error {
            warn!("{target}: write reported \"{err}\" but the new value is in place");
        }
        debug!("{target}: {:?} after {checks} checks", MutationState::Success);

        let follow_up_warning = self
            .timed("follow-up", || {
                self.backend.after_verified(target, self.policy.timeout)
            })
            .err()
            .map(|err| {
                warn!("{target}: follow-up step failed: {err}");
                err.to_string()
            });

        Ok(MutationOutcome {
            target: target.clone(),
            value: expected,
            verified: true,
            checks,
            spurious_write_error: write_error.map(|err| err.to_string()),
            follow_up_warning,
        })
    }

    /// One verification read. Unreadable values count as a mismatch unless
    /// the failure can never clear up by waiting.
    fn observe<I: Identifier>(
        &self,
        target: &MutationTarget,
        desired: &I,
    ) -> Result<Observation, IdentityError> {
        match self.read_raw(target) {
            Ok(bytes) if desired.matches(&bytes) => Ok(Observation::Matched),
            Ok(bytes) => Ok(Observation::Mismatched(I::render(&bytes))),
            Err(err @ BackendError::NotFound(_)) | Err(err @ BackendError::Failed(_)) => {
                Ok(Observation::Mismatched(format!("<unreadable: {err}>")))
            }
            Err(err) => Err(IdentityError::from_backend("verify", &target.to_string(), &err)),
        }
    }

    /// Run a backend call, converting an overrun of the timeout into
    /// [`BackendError::Timeout`] even when the call itself returned.
    fn timed<T>(
        &self,
        operation: &'static str,
        call: impl FnOnce() -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let started = Instant::now();
        let result = call();
        let elapsed = started.elapsed();
        if elapsed > self.policy.timeout {
            return Err(BackendError::Timeout {
                operation,
                after: elapsed,
            });
        }
        result
    }
}
