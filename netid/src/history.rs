use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::HistoryConfig;
use crate::target::IdentifierKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Set,
    Randomize,
    Sync,
    Restore,
    Reset,
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HistoryAction::Set => "set",
            HistoryAction::Randomize => "randomize",
            HistoryAction::Sync => "sync",
            HistoryAction::Restore => "restore",
            HistoryAction::Reset => "reset",
        })
    }
}

/// One recorded change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub kind: IdentifierKind,
    pub interface: String,
    pub action: HistoryAction,
    pub previous: Option<String>,
    pub current: Option<String>,
}

impl HistoryEntry {
    pub fn now(
        kind: IdentifierKind,
        interface: &str,
        action: HistoryAction,
        previous: Option<String>,
        current: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            kind,
            interface: interface.to_string(),
            action,
            previous,
            current,
        }
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to access history file {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("history file {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Capped JSON log of applied changes.
#[derive(Debug, Clone)]
pub struct History {
    path: PathBuf,
    max_entries: usize,
    enabled: bool,
}

impl History {
    pub fn new(path: PathBuf, config: &HistoryConfig) -> Self {
        Self {
            path,
            max_entries: config.max_entries,
            enabled: config.enabled,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `entry`, dropping the oldest entries past the cap. Failures are
    /// logged and otherwise ignored.
    pub fn record(&self, entry: HistoryEntry) {
        if !self.enabled {
            return;
        }
        if let Err(err) = self.append(entry) {
            warn!("history not updated: {err}");
        }
    }

    fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let mut entries = self.load()?;
        entries.push(entry);
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(..excess);
        }
        self.save(&entries)
    }

    /// The newest `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut entries = self.load()?;
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.split_off(skip))
    }

    fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(self.io_err(source)),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|source| HistoryError::Parse {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn save(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|source| self.io_err(source))?;
        let body = serde_json::to_string_pretty(entries).map_err(|source| HistoryError::Parse {
            path: self.path.display().to_string(),
            source,
        })?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|source| self.io_err(source))?;
        writeln!(tmp, "{body}").map_err(|source| self.io_err(source))?;
        tmp.persist(&self.path)
            .map_err(|err| self.io_err(err.error))?;
        Ok(())
    }

    fn io_err(&self, source: io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::{History, HistoryAction, HistoryEntry};
    use crate::config::HistoryConfig;
    use crate::target::IdentifierKind;

    fn entry(n: u8) -> HistoryEntry {
        HistoryEntry::now(
            IdentifierKind::Mac,
            "eth0",
            HistoryAction::Set,
            Some(format!("00:00:00:00:00:{n:02X}")),
            Some(format!("02:00:00:00:00:{n:02X}")),
        )
    }

    #[test]
    fn keeps_newest_entries_up_to_cap() {
        let dir = tempfile::tempdir().expect("tempdir");
        let history = History::new(
            dir.path().join("history.json"),
            &HistoryConfig {
                enabled: true,
                max_entries: 3,
            },
        );
        for n in 1..=5 {
            history.record(entry(n));
        }

        let all = history.recent(10).expect("recent");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].current.as_deref(), Some("02:00:00:00:00:03"));
        assert_eq!(all[2].current.as_deref(), Some("02:00:00:00:00:05"));

        let last = history.recent(1).expect("recent");
        assert_eq!(last, vec![all[2].clone()]);
    }

    #[test]
    fn disabled_history_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");
        let history = History::new(
            path.clone(),
            &HistoryConfig {
                enabled: false,
                max_entries: 10,
            },
        );
        history.record(entry(1));
        assert!(!path.exists());
        assert!(history.recent(5).expect("empty").is_empty());
    }

    #[test]
    fn corrupt_history_does_not_panic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");
        fs::write(&path, "[{").expect("seed");
        let history = History::new(path.clone(), &HistoryConfig::default());
        history.record(entry(1));
        assert!(history.recent(5).is_err());
        assert_eq!(fs::read_to_string(&path).expect("unchanged"), "[{");
    }

    #[test]
    fn serializes_lowercase_action_and_kind() {
        let json = serde_json::to_string(&entry(7)).expect("json");
        assert!(json.contains("\"action\":\"set\""));
        assert!(json.contains("\"kind\":\"mac\""));
    }
}
