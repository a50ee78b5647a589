//! 48-bit hardware address handling.
//!
//! Addresses arrive in whatever shape a user or an operating system tool
//! prints them: `00:11:22:33:44:55`, `00-11-22-33-44-55`, bare
//! `001122334455`, or the Cisco dotted form `0011.2233.4455`. [`normalize`]
//! folds all of them into [`MacAddress`], whose canonical text is uppercase
//! colon-hex.
//!
//! [`randomize`] produces plausible addresses by borrowing a prefix from a
//! small pool of virtualization vendors, so a spoofed NIC looks like an
//! ordinary virtual adapter rather than random noise.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::hex::{to_colon_hex, HexCase};

/// Number of bytes in a MAC address.
pub const MAC_LEN: usize = 6;

/// Locally-administered flag in the first byte (IEEE 802 U/L bit).
pub const LOCAL_ADMIN_BIT: u8 = 0x02;

const MULTICAST_BIT: u8 = 0x01;

/// Virtualization-vendor OUIs used as randomization prefixes.
pub const VENDOR_PREFIXES: [(&str, [u8; 3]); 8] = [
    ("VMware", [0x00, 0x05, 0x69]),
    ("VMware", [0x00, 0x0C, 0x29]),
    ("VMware", [0x00, 0x50, 0x56]),
    ("Xen", [0x00, 0x16, 0x3E]),
    ("Hyper-V", [0x00, 0x15, 0x5D]),
    ("Parallels", [0x00, 0x1C, 0x42]),
    ("Virtual Iron", [0x00, 0x0F, 0x4B]),
    ("VirtualBox", [0x08, 0x00, 0x27]),
];

/// First bytes accepted by Windows adapters when the address is overridden.
pub const WINDOWS_FIRST_BYTES: [u8; 4] = [0xD2, 0xD6, 0xDA, 0xDE];

/// Errors produced by MAC parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacError {
    /// Input did not match any accepted textual form.
    #[error("invalid MAC address format: {0}")]
    InvalidFormat(String),
    /// Structurally valid but not usable as an interface address.
    #[error("MAC address {mac} is not allowed: {reason}")]
    Reserved { mac: MacAddress, reason: &'static str },
    /// Raw byte input had the wrong length.
    #[error("expected 6 bytes for a MAC address, got {0}")]
    Length(usize),
}

/// A 48-bit hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress([u8; MAC_LEN]);

impl MacAddress {
    pub const BROADCAST: MacAddress = MacAddress([0xFF; MAC_LEN]);
    pub const ZERO: MacAddress = MacAddress([0x00; MAC_LEN]);

    /// Build from a byte slice that must be exactly six bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MacError> {
        let array: [u8; MAC_LEN] = bytes
            .try_into()
            .map_err(|_| MacError::Length(bytes.len()))?;
        Ok(Self(array))
    }

    pub fn octets(&self) -> [u8; MAC_LEN] {
        self.0
    }

    pub fn oui(&self) -> [u8; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    pub fn is_locally_administered(&self) -> bool {
        self.0[0] & LOCAL_ADMIN_BIT != 0
    }

    pub fn is_multicast(&self) -> bool {
        self.0[0] & MULTICAST_BIT != 0
    }

    /// Reject addresses that can never be assigned to an interface.
    pub fn ensure_assignable(self) -> Result<Self, MacError> {
        if self.is_zero() {
            return Err(MacError::Reserved {
                mac: self,
                reason: "the all-zero address is reserved",
            });
        }
        if self.is_broadcast() {
            return Err(MacError::Reserved {
                mac: self,
                reason: "the broadcast address cannot be assigned",
            });
        }
        Ok(self)
    }

    /// Name of the pool vendor whose prefix this address carries, if any.
    pub fn pool_vendor(&self) -> Option<&'static str> {
        let oui = self.oui();
        VENDOR_PREFIXES
            .iter()
            .find(|(_, prefix)| *prefix == oui)
            .map(|(name, _)| *name)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_colon_hex(&self.0, HexCase::Upper))
    }
}

impl FromStr for MacAddress {
    type Err = MacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        normalize(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse any accepted textual form into a [`MacAddress`].
///
/// Whitespace anywhere in the input is ignored. Accepted forms:
///
/// - six `:`- or `-`-separated groups of one or two hex digits
/// - twelve bare hex digits
/// - three `.`-separated groups of up to four hex digits (Cisco)
///
/// This is a structural check only; see [`validate`] for the all-zero and
/// broadcast rejections.
pub fn normalize(input: &str) -> Result<MacAddress, MacError> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(MacError::InvalidFormat("empty input".to_string()));
    }

    let digits = if compact.contains('.') {
        cisco_digits(&compact)?
    } else if compact.contains(':') || compact.contains('-') {
        separated_digits(&compact)?
    } else {
        compact
    };

    if digits.len() != MAC_LEN * 2 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(MacError::InvalidFormat(format!(
            "{input:?} does not contain exactly 12 hex digits"
        )));
    }

    let mut bytes = [0u8; MAC_LEN];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
            .map_err(|_| MacError::InvalidFormat(format!("{input:?} contains invalid hex")))?;
    }
    Ok(MacAddress(bytes))
}

fn cisco_digits(compact: &str) -> Result<String, MacError> {
    let groups: Vec<&str> = compact.split('.').collect();
    if groups.len() != 3 {
        return Err(MacError::InvalidFormat(format!(
            "dotted form needs 3 groups, found {}",
            groups.len()
        )));
    }

    let mut out = String::with_capacity(12);
    for group in groups {
        if group.is_empty() || group.len() > 4 {
            return Err(MacError::InvalidFormat(format!(
                "dotted group {group:?} must be 1-4 hex digits"
            )));
        }
        out.push_str(&format!("{group:0>4}"));
    }
    Ok(out)
}

fn separated_digits(compact: &str) -> Result<String, MacError> {
    let Some(separator) = compact.chars().find(|c| matches!(c, ':' | '-')) else {
        return Err(MacError::InvalidFormat("missing byte separator".to_string()));
    };
    let other = if separator == ':' { '-' } else { ':' };
    if compact.contains(other) {
        return Err(MacError::InvalidFormat(format!(
            "mixed separators {separator:?} and {other:?}"
        )));
    }
    let groups: Vec<&str> = compact.split(separator).collect();
    if groups.len() != MAC_LEN {
        return Err(MacError::InvalidFormat(format!(
            "expected 6 byte groups, found {}",
            groups.len()
        )));
    }

    let mut out = String::with_capacity(12);
    for group in groups {
        if group.is_empty() || group.len() > 2 {
            return Err(MacError::InvalidFormat(format!(
                "byte group {group:?} must be 1-2 hex digits"
            )));
        }
        out.push_str(&format!("{group:0>2}"));
    }
    Ok(out)
}

/// Outcome of [`validate`], shaped for direct JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacValidation {
    pub valid: bool,
    pub normalized: Option<String>,
    pub error: Option<String>,
}

/// Normalize and additionally reject the all-zero and broadcast addresses.
pub fn validate(input: &str) -> MacValidation {
    match normalize(input).and_then(MacAddress::ensure_assignable) {
        Ok(mac) => MacValidation {
            valid: true,
            normalized: Some(mac.to_string()),
            error: None,
        },
        Err(err) => MacValidation {
            valid: false,
            normalized: match &err {
                MacError::Reserved { mac, .. } => Some(mac.to_string()),
                _ => None,
            },
            error: Some(err.to_string()),
        },
    }
}

/// Where the first byte of a randomized address comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OuiPolicy {
    /// Use the vendor prefix unchanged.
    #[default]
    VendorPool,
    /// Replace the first byte with one of [`WINDOWS_FIRST_BYTES`].
    WindowsCompatible,
}

/// Generate a random unicast address with a virtualization-vendor prefix.
pub fn randomize(local_admin: bool, policy: OuiPolicy) -> MacAddress {
    randomize_with(&mut rand::thread_rng(), local_admin, policy)
}

/// [`randomize`] with a caller-supplied RNG.
pub fn randomize_with<R: Rng + ?Sized>(
    rng: &mut R,
    local_admin: bool,
    policy: OuiPolicy,
) -> MacAddress {
    let (_, prefix) = VENDOR_PREFIXES[rng.gen_range(0..VENDOR_PREFIXES.len())];
    let mut bytes = [
        prefix[0],
        prefix[1],
        prefix[2],
        rng.gen_range(0x00..=0x7F),
        rng.gen(),
        rng.gen(),
    ];

    if policy == OuiPolicy::WindowsCompatible {
        bytes[0] = WINDOWS_FIRST_BYTES[rng.gen_range(0..WINDOWS_FIRST_BYTES.len())];
    }
    if local_admin {
        bytes[0] |= LOCAL_ADMIN_BIT;
    }
    MacAddress(bytes)
}
