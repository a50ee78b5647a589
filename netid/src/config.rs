use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use netid_core::{GenerateOptions, OuiPolicy};
use serde::Deserialize;
use thiserror::Error;

use crate::engine::RetryPolicy;

/// Operating system family the tool is acting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Other
        }
    }

    pub fn default_state_dir(self) -> PathBuf {
        match self {
            Platform::MacOs => PathBuf::from("/Library/Application Support/netid"),
            Platform::Windows => PathBuf::from(r"C:\ProgramData\netid"),
            Platform::Linux | Platform::Other => PathBuf::from("/var/lib/netid"),
        }
    }

    /// Windows adapters only accept overrides with specific first bytes.
    pub fn oui_policy(self) -> OuiPolicy {
        match self {
            Platform::Windows => OuiPolicy::WindowsCompatible,
            _ => OuiPolicy::VendorPool,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
            Platform::Other => "other",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformChoice {
    #[default]
    Auto,
    Linux,
    Macos,
    Windows,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    #[default]
    Auto,
    System,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 200,
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DuidConfig {
    pub enterprise_number: u32,
    pub en_identifier_len: usize,
    pub uuid_strict: bool,
}

impl Default for DuidConfig {
    fn default() -> Self {
        let defaults = GenerateOptions::default();
        Self {
            enterprise_number: defaults.enterprise_number,
            en_identifier_len: defaults.en_identifier_len,
            uuid_strict: defaults.strict_uuid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 500,
        }
    }
}

/// Tool configuration. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub platform: PlatformChoice,
    pub backend: BackendChoice,
    pub state_dir: Option<PathBuf>,
    pub backend_file: Option<PathBuf>,
    pub duid_file: PathBuf,
    pub retry: RetryConfig,
    pub duid: DuidConfig,
    pub history: HistoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform: PlatformChoice::Auto,
            backend: BackendChoice::Auto,
            state_dir: None,
            backend_file: None,
            duid_file: PathBuf::from("/var/lib/dhcpcd/duid"),
            retry: RetryConfig::default(),
            duid: DuidConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl Config {
    pub fn platform(&self) -> Platform {
        match self.platform {
            PlatformChoice::Auto => Platform::current(),
            PlatformChoice::Linux => Platform::Linux,
            PlatformChoice::Macos => Platform::MacOs,
            PlatformChoice::Windows => Platform::Windows,
        }
    }

    pub fn state_dir(&self, platform: Platform) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| platform.default_state_dir())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            timeout: Duration::from_millis(self.retry.timeout_ms),
        }
    }

    pub fn generate_options(&self, platform: Platform) -> GenerateOptions {
        GenerateOptions {
            enterprise_number: self.duid.enterprise_number,
            en_identifier_len: self.duid.en_identifier_len,
            strict_uuid: self.duid.uuid_strict,
            oui_policy: platform.oui_policy(),
        }
    }
}

/// Errors returned when loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Load configuration from `path`, or the embedded default when `None`.
///
/// Returns the configuration and a description of where it came from
/// (`embedded` or `file:<path>`).
pub fn load_config(path: Option<&Path>) -> Result<(Config, String), ConfigError> {
    let Some(path) = path else {
        return Ok((default_config(), "embedded".to_string()));
    };

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config = parse_config(&raw, path.display().to_string())?;
    Ok((config, format!("file:{}", path.display())))
}

/// Built-in configuration.
pub fn default_config() -> Config {
    let embedded = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml"));
    parse_config(embedded, "embedded config".to_string()).unwrap_or_default()
}

fn parse_config(raw: &str, path: String) -> Result<Config, ConfigError> {
    toml::from_str(raw).map_err(|source| ConfigError::Parse { path, source })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;

    use netid_core::OuiPolicy;
    use pretty_assertions::assert_eq;

    use super::{
        default_config, load_config, parse_config, BackendChoice, Config, ConfigError, Platform,
    };

    #[test]
    fn embedded_config_parses_and_matches_defaults() {
        let embedded = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml"));
        let parsed = parse_config(embedded, "embedded".to_string()).expect("embedded parses");
        assert_eq!(parsed, Config::default());
        assert_eq!(default_config(), Config::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("netid.toml");
        fs::write(
            &path,
            r#"
backend = "file"
state_dir = "/tmp/netid-state"

[retry]
max_attempts = 2
"#,
        )
        .expect("write config");

        let (config, source) = load_config(Some(&path)).expect("load");
        assert!(source.starts_with("file:"));
        assert_eq!(config.backend, BackendChoice::File);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.base_delay_ms, 200);
        assert_eq!(
            config.state_dir(Platform::Linux),
            PathBuf::from("/tmp/netid-state")
        );
        let policy = config.retry_policy();
        assert_eq!(policy.timeout, Duration::from_secs(10));
    }

    #[test]
    fn reports_parse_and_io_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        fs::write(&path, "backend = [oops").expect("write");
        match load_config(Some(&path)) {
            Err(ConfigError::Parse { .. }) => {}
            other => panic!("unexpected result: {other:?}"),
        }

        match load_config(Some(&dir.path().join("missing.toml"))) {
            Err(ConfigError::Io { .. }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn windows_uses_compatible_oui_policy() {
        let config = Config::default();
        assert_eq!(
            config.generate_options(Platform::Windows).oui_policy,
            OuiPolicy::WindowsCompatible
        );
        assert_eq!(
            config.generate_options(Platform::Linux).oui_policy,
            OuiPolicy::VendorPool
        );
        assert_eq!(
            Config::default().state_dir(Platform::Linux),
            PathBuf::from("/var/lib/netid")
        );
    }
}
