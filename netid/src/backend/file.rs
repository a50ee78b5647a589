use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use netid_core::hex::parse_colon_hex;
use netid_core::normalize;
use serde::{Deserialize, Serialize};

use super::{Backend, BackendError};
use crate::target::{IdentifierKind, MutationTarget};

/// Identifiers kept in a JSON document instead of on real hardware.
///
/// ```json
/// { "interfaces": { "eth0": { "mac": "00:11:22:33:44:55", "duid": "00:03:..." } } }
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileState {
    #[serde(default)]
    interfaces: BTreeMap<String, InterfaceRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct InterfaceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duid: Option<String>,
}

impl InterfaceRecord {
    fn slot(&mut self, kind: IdentifierKind) -> &mut Option<String> {
        match kind {
            IdentifierKind::Mac => &mut self.mac,
            IdentifierKind::Duid => &mut self.duid,
        }
    }
}

impl FileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<FileState, BackendError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(FileState::default()),
            Err(err) => return Err(io_error(&self.path, &err)),
        };
        serde_json::from_str(&raw).map_err(|err| {
            BackendError::Failed(format!("corrupt state file {}: {err}", self.path.display()))
        })
    }

    fn save(&self, state: &FileState) -> Result<(), BackendError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|err| io_error(dir, &err))?;

        let body = serde_json::to_string_pretty(state)
            .map_err(|err| BackendError::Failed(format!("encode state: {err}")))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|err| io_error(dir, &err))?;
        tmp.write_all(body.as_bytes())
            .and_then(|_| tmp.write_all(b"\n"))
            .map_err(|err| io_error(tmp.path(), &err))?;
        tmp.persist(&self.path)
            .map_err(|err| io_error(&self.path, &err.error))?;
        Ok(())
    }
}

impl Backend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn read_identifier(
        &self,
        target: &MutationTarget,
        _timeout: Duration,
    ) -> Result<Vec<u8>, BackendError> {
        let mut state = self.load()?;
        let text = state
            .interfaces
            .get_mut(&target.interface)
            .and_then(|record| record.slot(target.kind).clone())
            .ok_or_else(|| BackendError::NotFound(format!("no {target} in {}", self.path.display())))?;

        let bytes = match target.kind {
            IdentifierKind::Mac => normalize(&text).map(|mac| mac.octets().to_vec()).ok(),
            IdentifierKind::Duid => parse_colon_hex(&text).ok(),
        };
        bytes.ok_or_else(|| BackendError::Failed(format!("stored {target} {text:?} is not valid hex")))
    }

    fn write_identifier(
        &self,
        target: &MutationTarget,
        value: &[u8],
        _timeout: Duration,
    ) -> Result<(), BackendError> {
        let mut state = self.load()?;
        let record = state
            .interfaces
            .entry(target.interface.clone())
            .or_default();
        *record.slot(target.kind) = Some(target.kind.render_hex(value));
        self.save(&state)
    }

    fn delete_identifier(
        &self,
        target: &MutationTarget,
        _timeout: Duration,
    ) -> Result<(), BackendError> {
        let mut state = self.load()?;
        if let Some(record) = state.interfaces.get_mut(&target.interface) {
            *record.slot(target.kind) = None;
        }
        self.save(&state)
    }
}

fn io_error(path: &Path, err: &io::Error) -> BackendError {
    if err.kind() == io::ErrorKind::PermissionDenied {
        BackendError::PermissionDenied(path.display().to_string())
    } else {
        BackendError::Failed(format!("{}: {err}", path.display()))
    }
}
