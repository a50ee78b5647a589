use std::fmt;
use std::str::FromStr;

use netid_core::hex::{to_colon_hex, HexCase};
use netid_core::{Duid, MacAddress};
use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Which identifier a mutation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Mac,
    Duid,
}

impl IdentifierKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IdentifierKind::Mac => "mac",
            IdentifierKind::Duid => "duid",
        }
    }

    /// Canonical hex text for raw bytes of this kind: uppercase for MAC
    /// addresses, lowercase for DUIDs.
    pub fn render_hex(self, bytes: &[u8]) -> String {
        match self {
            IdentifierKind::Mac => to_colon_hex(bytes, HexCase::Upper),
            IdentifierKind::Duid => to_colon_hex(bytes, HexCase::Lower),
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mac" => Ok(IdentifierKind::Mac),
            "duid" => Ok(IdentifierKind::Duid),
            other => Err(format!("unknown identifier kind {other:?}")),
        }
    }
}

/// Where an identifier is applied: an interface plus the identifier kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MutationTarget {
    pub interface: String,
    pub kind: IdentifierKind,
}

impl MutationTarget {
    /// Build a target after checking the interface name is usable as a
    /// path component and command argument.
    pub fn new(interface: &str, kind: IdentifierKind) -> Result<Self, IdentityError> {
        let name = interface.trim();
        if name.is_empty()
            || name.len() > 64
            || name.starts_with('-')
            || name
                .chars()
                .any(|c| c == '/' || c == '\\' || c.is_control())
            || name == "."
            || name == ".."
        {
            return Err(IdentityError::validation(format!(
                "invalid interface name {interface:?}"
            ))
            .with_suggestion("Pass the interface name as the OS lists it, e.g. eth0 or en0"));
        }
        Ok(Self {
            interface: name.to_string(),
            kind,
        })
    }
}

impl fmt::Display for MutationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.interface, self.kind)
    }
}

/// An identifier value the mutation engine can write and verify.
pub trait Identifier: Sized + Clone + fmt::Display {
    const KIND: IdentifierKind;

    fn to_bytes(&self) -> Vec<u8>;

    fn from_bytes(bytes: &[u8]) -> Result<Self, IdentityError>;

    /// Whether bytes read back from a backend represent this value.
    fn matches(&self, observed: &[u8]) -> bool;

    /// Display form for raw bytes, falling back to hex when they do not
    /// decode.
    fn render(bytes: &[u8]) -> String {
        match Self::from_bytes(bytes) {
            Ok(value) => value.to_string(),
            Err(_) => Self::KIND.render_hex(bytes),
        }
    }
}

impl Identifier for MacAddress {
    const KIND: IdentifierKind = IdentifierKind::Mac;

    fn to_bytes(&self) -> Vec<u8> {
        self.octets().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, IdentityError> {
        MacAddress::from_slice(bytes).map_err(IdentityError::from)
    }

    fn matches(&self, observed: &[u8]) -> bool {
        MacAddress::from_slice(observed).is_ok_and(|mac| mac == *self)
    }
}

impl Identifier for Duid {
    const KIND: IdentifierKind = IdentifierKind::Duid;

    fn to_bytes(&self) -> Vec<u8> {
        Duid::to_bytes(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, IdentityError> {
        Duid::from_bytes(bytes).map_err(IdentityError::from)
    }

    fn matches(&self, observed: &[u8]) -> bool {
        Duid::to_bytes(self) == observed
    }
}

#[cfg(test)]
mod tests {
    use netid_core::{hex_to_duid, normalize, Duid, MacAddress};

    use super::{Identifier, IdentifierKind, MutationTarget};
    use crate::error::ErrorKind;

    #[test]
    fn rejects_unsafe_interface_names() {
        for name in ["", "  ", "../eth0", "eth0/address", "-x", "..", "a\nb"] {
            let err = MutationTarget::new(name, IdentifierKind::Mac).expect_err(name);
            assert_eq!(err.kind, ErrorKind::Validation);
        }
        let target = MutationTarget::new(" eth0 ", IdentifierKind::Duid).expect("valid");
        assert_eq!(target.interface, "eth0");
        assert_eq!(target.to_string(), "eth0 duid");
    }

    #[test]
    fn mac_matches_on_canonical_value() {
        let mac = normalize("aa-bb-cc-dd-ee-ff").expect("mac");
        assert!(mac.matches(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]));
        assert!(!mac.matches(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee]));
        assert_eq!(
            <MacAddress as Identifier>::render(&[1, 2, 3]),
            "01:02:03".to_string()
        );
    }

    #[test]
    fn duid_matches_byte_exact() {
        let duid = hex_to_duid("00:03:00:01:aa:bb:cc:dd:ee:ff").expect("duid");
        assert!(duid.matches(&Identifier::to_bytes(&duid)));
        assert!(!duid.matches(&[0x00, 0x03, 0x00, 0x01]));
        assert_eq!(
            <Duid as Identifier>::render(&[0x00, 0x09]),
            "00:09".to_string()
        );
    }

    #[test]
    fn kind_parses_and_renders() {
        assert_eq!("MAC".parse::<IdentifierKind>(), Ok(IdentifierKind::Mac));
        assert!("ipv6".parse::<IdentifierKind>().is_err());
        assert_eq!(IdentifierKind::Mac.render_hex(&[0xab, 0x01]), "AB:01");
        assert_eq!(IdentifierKind::Duid.render_hex(&[0xab, 0x01]), "ab:01");
    }
}
