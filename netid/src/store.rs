//! Durable record of the identifier values seen before the first change.
//!
//! One file per identifier kind, `<dir>/<kind>.original`, holding canonical
//! colon-hex text and a trailing newline. A file is written at most once and
//! only removed by [`OriginalStore::clear_original`].

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use netid_core::hex::parse_colon_hex;
use thiserror::Error;

use crate::error::IdentityError;
use crate::target::IdentifierKind;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        source: io::Error,
    },
    #[error("original value file {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::Io { source, .. } => IdentityError::from_io(err.to_string(), source),
            StoreError::Corrupt { .. } => IdentityError::parse(err.to_string())
                .with_suggestion("Inspect or remove it with `netid original clear <kind>`"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OriginalStore {
    dir: PathBuf,
}

impl OriginalStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn get_original_path(&self, kind: IdentifierKind) -> PathBuf {
        self.dir.join(format!("{}.original", kind.as_str()))
    }

    pub fn has_original(&self, kind: IdentifierKind) -> bool {
        self.get_original_path(kind).is_file()
    }

    pub fn get_original(&self, kind: IdentifierKind) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.get_original_path(kind);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(io_err(&path, source)),
        };
        parse_colon_hex(&raw)
            .map(Some)
            .map_err(|err| StoreError::Corrupt {
                path: path.display().to_string(),
                reason: err.to_string(),
            })
    }

    /// Persist `value` as the original unless one is already recorded.
    ///
    /// Returns `true` when this call created the record. The file appears
    /// atomically, so a concurrent capture can never replace an existing one.
    pub fn capture(&self, kind: IdentifierKind, value: &[u8]) -> Result<bool, StoreError> {
        let path = self.get_original_path(kind);
        if path.exists() {
            debug!("original {kind} already recorded at {}", path.display());
            return Ok(false);
        }
        fs::create_dir_all(&self.dir).map_err(|source| io_err(&self.dir, source))?;

        let mut tmp =
            tempfile::NamedTempFile::new_in(&self.dir).map_err(|source| io_err(&self.dir, source))?;
        writeln!(tmp, "{}", kind.render_hex(value)).map_err(|source| io_err(tmp.path(), source))?;
        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                info!("recorded original {kind} {}", kind.render_hex(value));
                Ok(true)
            }
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(err) => Err(io_err(&path, err.error)),
        }
    }

    /// Remove the recorded original. Returns whether one existed.
    pub fn clear_original(&self, kind: IdentifierKind) -> Result<bool, StoreError> {
        let path = self.get_original_path(kind);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("cleared original {kind}");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(io_err(&path, source)),
        }
    }
}

fn io_err(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::{OriginalStore, StoreError};
    use crate::target::IdentifierKind;

    #[test]
    fn capture_is_at_most_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = OriginalStore::new(dir.path().join("state"));
        let first = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];

        assert!(!store.has_original(IdentifierKind::Mac));
        assert_eq!(store.get_original(IdentifierKind::Mac).expect("get"), None);

        assert!(store.capture(IdentifierKind::Mac, &first).expect("capture"));
        assert!(!store
            .capture(IdentifierKind::Mac, &[0xaa; 6])
            .expect("second capture"));
        assert_eq!(
            store.get_original(IdentifierKind::Mac).expect("get"),
            Some(first.to_vec())
        );
        assert_eq!(
            fs::read_to_string(store.get_original_path(IdentifierKind::Mac)).expect("read"),
            "00:11:22:33:44:55\n"
        );
        assert!(!store.has_original(IdentifierKind::Duid));
    }

    #[test]
    fn clear_removes_only_that_kind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = OriginalStore::new(dir.path().to_path_buf());
        store
            .capture(IdentifierKind::Mac, &[0x02, 0, 0, 0, 0, 1])
            .expect("mac");
        store
            .capture(IdentifierKind::Duid, &[0x00, 0x03, 0x00, 0x01, 1, 2, 3, 4, 5, 6])
            .expect("duid");

        assert!(store.clear_original(IdentifierKind::Duid).expect("clear"));
        assert!(!store.clear_original(IdentifierKind::Duid).expect("clear again"));
        assert!(store.has_original(IdentifierKind::Mac));
        assert_eq!(
            store.get_original_path(IdentifierKind::Duid),
            dir.path().join("duid.original")
        );
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = OriginalStore::new(dir.path().to_path_buf());
        fs::write(store.get_original_path(IdentifierKind::Duid), "not hex\n").expect("seed");
        assert!(matches!(
            store.get_original(IdentifierKind::Duid),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
