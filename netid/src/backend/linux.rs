use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, warn};
use netid_core::hex::parse_colon_hex;
use netid_core::{normalize, MacAddress};

use super::command::run_with_timeout;
use super::{Backend, BackendError};
use crate::target::{IdentifierKind, MutationTarget};

/// Linux MAC and DUID storage.
///
/// MAC addresses are read from sysfs and changed with `ip link`, taking the
/// link down around the change. The DUID lives in a colon-hex text file read
/// by the DHCPv6 client (dhcpcd-style); it is host-wide, so the interface name
/// is ignored for DUID targets.
#[derive(Debug, Clone)]
pub struct LinuxBackend {
    sysfs_root: PathBuf,
    duid_file: PathBuf,
    ip_program: String,
}

impl LinuxBackend {
    pub fn new(sysfs_root: PathBuf, duid_file: PathBuf) -> Self {
        Self {
            sysfs_root,
            duid_file,
            ip_program: "ip".to_string(),
        }
    }

    fn read_mac(&self, interface: &str) -> Result<Vec<u8>, BackendError> {
        let path = self.sysfs_root.join(interface).join("address");
        let raw = fs::read_to_string(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => {
                BackendError::NotFound(format!("interface {interface} does not exist"))
            }
            _ => io_error(&path, &err),
        })?;
        normalize(&raw)
            .map(|mac| mac.octets().to_vec())
            .map_err(|err| BackendError::Failed(format!("{}: {err}", path.display())))
    }

    fn write_mac(
        &self,
        interface: &str,
        value: &[u8],
        timeout: Duration,
    ) -> Result<(), BackendError> {
        let mac = MacAddress::from_slice(value)
            .map_err(|err| BackendError::Failed(format!("refusing to write {interface}: {err}")))?;
        let mac_text = mac.to_string();
        let deadline = Instant::now() + timeout;

        self.ip(&["link", "set", "dev", interface, "down"], deadline)?;
        let changed = self.ip(
            &["link", "set", "dev", interface, "address", &mac_text],
            deadline,
        );
        // The link must come back up even when the change was refused.
        let raised = self.ip(&["link", "set", "dev", interface, "up"], deadline);
        if let Err(err) = &raised {
            warn!("failed to bring {interface} back up: {err}");
        }
        changed.and(raised)
    }

    fn ip(&self, args: &[&str], deadline: Instant) -> Result<(), BackendError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(BackendError::Timeout {
                operation: "ip link",
                after: Duration::ZERO,
            });
        }
        run_with_timeout(&self.ip_program, args, remaining).map(|_| ())
    }

    fn read_duid(&self) -> Result<Vec<u8>, BackendError> {
        let raw = fs::read_to_string(&self.duid_file).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => BackendError::NotFound(format!(
                "no DUID stored at {}",
                self.duid_file.display()
            )),
            _ => io_error(&self.duid_file, &err),
        })?;
        parse_colon_hex(&raw).map_err(|err| {
            BackendError::Failed(format!("{}: {err}", self.duid_file.display()))
        })
    }

    fn write_duid(&self, value: &[u8]) -> Result<(), BackendError> {
        if let Some(dir) = self.duid_file.parent() {
            fs::create_dir_all(dir).map_err(|err| io_error(dir, &err))?;
        }
        let text = format!("{}\n", IdentifierKind::Duid.render_hex(value));
        fs::write(&self.duid_file, text).map_err(|err| io_error(&self.duid_file, &err))
    }

    fn delete_duid(&self) -> Result<(), BackendError> {
        match fs::remove_file(&self.duid_file) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("{} already absent", self.duid_file.display());
                Ok(())
            }
            Err(err) => Err(io_error(&self.duid_file, &err)),
        }
    }
}

impl Backend for LinuxBackend {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn read_identifier(
        &self,
        target: &MutationTarget,
        _timeout: Duration,
    ) -> Result<Vec<u8>, BackendError> {
        match target.kind {
            IdentifierKind::Mac => self.read_mac(&target.interface),
            IdentifierKind::Duid => self.read_duid(),
        }
    }

    fn write_identifier(
        &self,
        target: &MutationTarget,
        value: &[u8],
        timeout: Duration,
    ) -> Result<(), BackendError> {
        match target.kind {
            IdentifierKind::Mac => self.write_mac(&target.interface, value, timeout),
            IdentifierKind::Duid => self.write_duid(value),
        }
    }

    fn delete_identifier(
        &self,
        target: &MutationTarget,
        _timeout: Duration,
    ) -> Result<(), BackendError> {
        match target.kind {
            IdentifierKind::Mac => Err(BackendError::Unsupported(
                "a hardware address cannot be deleted; use `mac restore`".to_string(),
            )),
            IdentifierKind::Duid => self.delete_duid(),
        }
    }

    /// Confirm the link came back up after a MAC change.
    fn after_verified(
        &self,
        target: &MutationTarget,
        _timeout: Duration,
    ) -> Result<(), BackendError> {
        if target.kind != IdentifierKind::Mac {
            return Ok(());
        }
        let path = self.sysfs_root.join(&target.interface).join("operstate");
        let state = fs::read_to_string(&path).map_err(|err| io_error(&path, &err))?;
        match state.trim() {
            "down" => Err(BackendError::Failed(format!(
                "{} is still down after the address change",
                target.interface
            ))),
            other => {
                debug!("{} operstate {other}", target.interface);
                Ok(())
            }
        }
    }
}

fn io_error(path: &Path, err: &io::Error) -> BackendError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => {
            BackendError::PermissionDenied(path.display().to_string())
        }
        _ => BackendError::Failed(format!("{}: {err}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use super::LinuxBackend;
    use crate::backend::{Backend, BackendError};
    use crate::target::{IdentifierKind, MutationTarget};

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn fake_sysfs(dir: &std::path::Path, interface: &str, address: &str) {
        let iface = dir.join(interface);
        fs::create_dir_all(&iface).expect("mkdir");
        fs::write(iface.join("address"), format!("{address}\n")).expect("write address");
    }

    #[test]
    fn reads_mac_from_sysfs() {
        let dir = tempfile::tempdir().expect("tempdir");
        fake_sysfs(dir.path(), "eth0", "52:54:00:12:34:56");
        let backend = LinuxBackend::new(dir.path().to_path_buf(), dir.path().join("duid"));

        let target = MutationTarget::new("eth0", IdentifierKind::Mac).expect("target");
        assert_eq!(
            backend.read_identifier(&target, TIMEOUT),
            Ok(vec![0x52, 0x54, 0x00, 0x12, 0x34, 0x56])
        );

        let missing = MutationTarget::new("eth7", IdentifierKind::Mac).expect("target");
        assert!(matches!(
            backend.read_identifier(&missing, TIMEOUT),
            Err(BackendError::NotFound(_))
        ));
    }

    #[test]
    fn duid_file_round_trip_and_reset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let duid_file = dir.path().join("dhcpcd").join("duid");
        let backend = LinuxBackend::new(dir.path().to_path_buf(), duid_file.clone());
        let target = MutationTarget::new("eth0", IdentifierKind::Duid).expect("target");

        assert!(matches!(
            backend.read_identifier(&target, TIMEOUT),
            Err(BackendError::NotFound(_))
        ));

        let value = [0x00, 0x03, 0x00, 0x01, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];
        backend
            .write_identifier(&target, &value, TIMEOUT)
            .expect("write");
        assert_eq!(
            fs::read_to_string(&duid_file).expect("read"),
            "00:03:00:01:aa:bb:cc:dd:ee:ff\n"
        );
        assert_eq!(backend.read_identifier(&target, TIMEOUT), Ok(value.to_vec()));

        backend.delete_identifier(&target, TIMEOUT).expect("delete");
        assert!(!duid_file.exists());
        backend
            .delete_identifier(&target, TIMEOUT)
            .expect("second delete is a no-op");
    }

    #[test]
    fn link_down_after_change_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        fake_sysfs(dir.path(), "eth0", "52:54:00:12:34:56");
        let backend = LinuxBackend::new(dir.path().to_path_buf(), dir.path().join("duid"));
        let target = MutationTarget::new("eth0", IdentifierKind::Mac).expect("target");

        fs::write(dir.path().join("eth0").join("operstate"), "down\n").expect("operstate");
        assert!(matches!(
            backend.after_verified(&target, TIMEOUT),
            Err(BackendError::Failed(_))
        ));

        fs::write(dir.path().join("eth0").join("operstate"), "up\n").expect("operstate");
        assert_eq!(backend.after_verified(&target, TIMEOUT), Ok(()));
    }

    #[test]
    fn mac_cannot_be_deleted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = LinuxBackend::new(dir.path().to_path_buf(), dir.path().join("duid"));
        let target = MutationTarget::new("eth0", IdentifierKind::Mac).expect("target");
        assert!(matches!(
            backend.delete_identifier(&target, TIMEOUT),
            Err(BackendError::Unsupported(_))
        ));
    }
}
