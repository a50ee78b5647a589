//! DHCPv6 Unique Identifier encoding (RFC 8415 §11, RFC 6355).
//!
//! Every DUID starts with a 2-byte big-endian type code followed by a
//! variant-specific body:
//!
//! | Variant | Code | Body                                                    |
//! |---------|------|---------------------------------------------------------|
//! | LLT     | 1    | hw type (2), seconds since 2000-01-01 (4), link address |
//! | EN      | 2    | enterprise number (4), opaque identifier                |
//! | LL      | 3    | hw type (2), link address                               |
//! | UUID    | 4    | 16-byte UUID                                            |
//!
//! Decoding is strict: the total length must match the variant's layout
//! exactly. A buffer that is too short or too long for its declared type is
//! rejected rather than truncated or reinterpreted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hex::{parse_colon_hex, to_colon_hex, HexCase, HexError};
use crate::mac::{randomize_with, MacAddress, OuiPolicy, MAC_LEN};

pub const DUID_TYPE_LLT: u16 = 1;
pub const DUID_TYPE_EN: u16 = 2;
pub const DUID_TYPE_LL: u16 = 3;
pub const DUID_TYPE_UUID: u16 = 4;

/// IANA hardware type for Ethernet.
pub const HW_TYPE_ETHERNET: u16 = 1;

/// Type code plus the 128-byte body limit from RFC 8415.
pub const MAX_DUID_LEN: usize = 2 + 128;

/// Enterprise number used for generated DUID-EN values unless configured.
pub const DEFAULT_ENTERPRISE_NUMBER: u32 = 43793;

pub const DEFAULT_EN_IDENTIFIER_LEN: usize = 8;

/// 2000-01-01T00:00:00Z as a Unix timestamp.
const DUID_EPOCH_UNIX: i64 = 946_684_800;

/// Errors produced while decoding or generating a DUID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DuidError {
    /// Fewer than two bytes: no type code.
    #[error("DUID is too short ({0} bytes); at least a 2-byte type code is required")]
    TooShort(usize),
    #[error("DUID is too long ({0} bytes); the maximum is 130")]
    TooLong(usize),
    #[error("unknown DUID type code {0}")]
    UnknownType(u16),
    /// Body length does not match the declared variant.
    #[error("{variant} has invalid length {actual} bytes; expected {expected}")]
    Length {
        variant: &'static str,
        actual: usize,
        expected: String,
    },
    #[error("invalid DUID hex: {0}")]
    Hex(#[from] HexError),
    #[error("time {0} cannot be encoded as a DUID-LLT timestamp")]
    Timestamp(String),
    #[error("DUID-EN identifier length must be between 1 and 124 bytes, got {0}")]
    IdentifierLength(usize),
}

/// The four DUID layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuidVariant {
    Llt,
    En,
    Ll,
    Uuid,
}

impl DuidVariant {
    pub const ALL: [DuidVariant; 4] = [
        DuidVariant::Llt,
        DuidVariant::En,
        DuidVariant::Ll,
        DuidVariant::Uuid,
    ];

    pub fn code(self) -> u16 {
        match self {
            DuidVariant::Llt => DUID_TYPE_LLT,
            DuidVariant::En => DUID_TYPE_EN,
            DuidVariant::Ll => DUID_TYPE_LL,
            DuidVariant::Uuid => DUID_TYPE_UUID,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            DUID_TYPE_LLT => Some(DuidVariant::Llt),
            DUID_TYPE_EN => Some(DuidVariant::En),
            DUID_TYPE_LL => Some(DuidVariant::Ll),
            DUID_TYPE_UUID => Some(DuidVariant::Uuid),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DuidVariant::Llt => "DUID-LLT",
            DuidVariant::En => "DUID-EN",
            DuidVariant::Ll => "DUID-LL",
            DuidVariant::Uuid => "DUID-UUID",
        }
    }

    /// Whether the layout carries a link-layer address.
    pub fn embeds_link_layer(self) -> bool {
        matches!(self, DuidVariant::Llt | DuidVariant::Ll)
    }
}

impl fmt::Display for DuidVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DuidVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let key = lowered.strip_prefix("duid-").unwrap_or(&lowered);
        match key {
            "llt" | "1" => Ok(DuidVariant::Llt),
            "en" | "2" => Ok(DuidVariant::En),
            "ll" | "3" => Ok(DuidVariant::Ll),
            "uuid" | "4" => Ok(DuidVariant::Uuid),
            _ => Err(format!("unknown DUID type {s:?}; expected llt, en, ll or uuid")),
        }
    }
}

/// A decoded DUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Duid {
    Llt {
        hardware_type: u16,
        time: u32,
        link_layer_address: Vec<u8>,
    },
    En {
        enterprise_number: u32,
        identifier: Vec<u8>,
    },
    Ll {
        hardware_type: u16,
        link_layer_address: Vec<u8>,
    },
    Uuid([u8; 16]),
}

impl Duid {
    pub fn variant(&self) -> DuidVariant {
        match self {
            Duid::Llt { .. } => DuidVariant::Llt,
            Duid::En { .. } => DuidVariant::En,
            Duid::Ll { .. } => DuidVariant::Ll,
            Duid::Uuid(_) => DuidVariant::Uuid,
        }
    }

    /// Canonical wire encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(18);
        bytes.extend_from_slice(&self.variant().code().to_be_bytes());
        match self {
            Duid::Llt {
                hardware_type,
                time,
                link_layer_address,
            } => {
                bytes.extend_from_slice(&hardware_type.to_be_bytes());
                bytes.extend_from_slice(&time.to_be_bytes());
                bytes.extend_from_slice(link_layer_address);
            }
            Duid::En {
                enterprise_number,
                identifier,
            } => {
                bytes.extend_from_slice(&enterprise_number.to_be_bytes());
                bytes.extend_from_slice(identifier);
            }
            Duid::Ll {
                hardware_type,
                link_layer_address,
            } => {
                bytes.extend_from_slice(&hardware_type.to_be_bytes());
                bytes.extend_from_slice(link_layer_address);
            }
            Duid::Uuid(uuid) => bytes.extend_from_slice(uuid),
        }
        bytes
    }

    /// Decode wire bytes, enforcing the exact layout of the declared variant.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DuidError> {
        if bytes.len() < 2 {
            return Err(DuidError::TooShort(bytes.len()));
        }
        if bytes.len() > MAX_DUID_LEN {
            return Err(DuidError::TooLong(bytes.len()));
        }

        let code = u16::from_be_bytes([bytes[0], bytes[1]]);
        let variant = DuidVariant::from_code(code).ok_or(DuidError::UnknownType(code))?;
        let body = &bytes[2..];

        match variant {
            DuidVariant::Llt => {
                if body.len() < 6 {
                    return Err(length_error(variant, bytes.len(), "at least 9".to_string()));
                }
                let hardware_type = u16::from_be_bytes([body[0], body[1]]);
                let time = u32::from_be_bytes([body[2], body[3], body[4], body[5]]);
                let link_layer_address = &body[6..];
                check_link_layer(variant, hardware_type, link_layer_address, 8, bytes.len())?;
                Ok(Duid::Llt {
                    hardware_type,
                    time,
                    link_layer_address: link_layer_address.to_vec(),
                })
            }
            DuidVariant::En => {
                if body.len() < 5 {
                    return Err(length_error(variant, bytes.len(), "at least 7".to_string()));
                }
                Ok(Duid::En {
                    enterprise_number: u32::from_be_bytes([body[0], body[1], body[2], body[3]]),
                    identifier: body[4..].to_vec(),
                })
            }
            DuidVariant::Ll => {
                if body.len() < 2 {
                    return Err(length_error(variant, bytes.len(), "at least 5".to_string()));
                }
                let hardware_type = u16::from_be_bytes([body[0], body[1]]);
                let link_layer_address = &body[2..];
                check_link_layer(variant, hardware_type, link_layer_address, 4, bytes.len())?;
                Ok(Duid::Ll {
                    hardware_type,
                    link_layer_address: link_layer_address.to_vec(),
                })
            }
            DuidVariant::Uuid => {
                let uuid: [u8; 16] = body
                    .try_into()
                    .map_err(|_| length_error(variant, bytes.len(), "exactly 18".to_string()))?;
                Ok(Duid::Uuid(uuid))
            }
        }
    }

    /// Embedded MAC address for Ethernet LLT/LL values.
    pub fn mac_address(&self) -> Option<MacAddress> {
        match self {
            Duid::Llt {
                hardware_type: HW_TYPE_ETHERNET,
                link_layer_address,
                ..
            }
            | Duid::Ll {
                hardware_type: HW_TYPE_ETHERNET,
                link_layer_address,
            } => MacAddress::from_slice(link_layer_address).ok(),
            _ => None,
        }
    }

    /// Field-level description of this value.
    pub fn info(&self) -> DuidInfo {
        let mut info = DuidInfo {
            raw: format(self, HexCase::Lower),
            variant: self.variant(),
            type_name: self.variant().name(),
            hardware_type: None,
            link_layer_address: None,
            timestamp: None,
            time: None,
            enterprise_number: None,
            identifier: None,
            uuid: None,
        };

        match self {
            Duid::Llt {
                hardware_type,
                time,
                link_layer_address,
            } => {
                info.hardware_type = Some(*hardware_type);
                info.link_layer_address = Some(to_colon_hex(link_layer_address, HexCase::Upper));
                info.timestamp = Some(*time);
                info.time = duid_time(*time).map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));
            }
            Duid::En {
                enterprise_number,
                identifier,
            } => {
                info.enterprise_number = Some(*enterprise_number);
                info.identifier = Some(to_colon_hex(identifier, HexCase::Lower));
            }
            Duid::Ll {
                hardware_type,
                link_layer_address,
            } => {
                info.hardware_type = Some(*hardware_type);
                info.link_layer_address = Some(to_colon_hex(link_layer_address, HexCase::Upper));
            }
            Duid::Uuid(uuid) => {
                info.uuid = Some(uuid::Uuid::from_bytes(*uuid).hyphenated().to_string());
            }
        }
        info
    }
}

fn check_link_layer(
    variant: DuidVariant,
    hardware_type: u16,
    address: &[u8],
    fixed: usize,
    actual: usize,
) -> Result<(), DuidError> {
    if hardware_type == HW_TYPE_ETHERNET && address.len() != MAC_LEN {
        return Err(length_error(
            variant,
            actual,
            format!("exactly {} for an Ethernet address", fixed + MAC_LEN),
        ));
    }
    if address.is_empty() {
        return Err(length_error(
            variant,
            actual,
            format!("at least {} with a link-layer address", fixed + 1),
        ));
    }
    Ok(())
}

fn length_error(variant: DuidVariant, actual: usize, expected: String) -> DuidError {
    DuidError::Length {
        variant: variant.name(),
        actual,
        expected,
    }
}

impl fmt::Display for Duid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(self, HexCase::Lower))
    }
}

impl FromStr for Duid {
    type Err = DuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex_to_duid(s)
    }
}

/// Human- and JSON-friendly breakdown of a DUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuidInfo {
    /// Lowercase colon-hex of the full value.
    pub raw: String,
    pub variant: DuidVariant,
    pub type_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_type: Option<u16>,
    /// Uppercase colon-hex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_layer_address: Option<String>,
    /// Seconds since 2000-01-01T00:00:00Z.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u32>,
    /// RFC 3339 rendering of `timestamp`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enterprise_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

/// Decode raw bytes and describe them.
pub fn parse(bytes: &[u8]) -> Result<DuidInfo, DuidError> {
    Duid::from_bytes(bytes).map(|duid| duid.info())
}

/// Render as colon-hex; the output is accepted by [`hex_to_duid`].
pub fn format(duid: &Duid, case: HexCase) -> String {
    to_colon_hex(&duid.to_bytes(), case)
}

/// Parse colon-separated hex pairs into a [`Duid`].
pub fn hex_to_duid(input: &str) -> Result<Duid, DuidError> {
    let bytes = parse_colon_hex(input)?;
    Duid::from_bytes(&bytes)
}

/// Seconds since the DUID epoch, clamped at zero for earlier instants.
pub fn duid_timestamp(at: DateTime<Utc>) -> Result<u32, DuidError> {
    let seconds = (at.timestamp() - DUID_EPOCH_UNIX).max(0);
    u32::try_from(seconds).map_err(|_| DuidError::Timestamp(at.to_rfc3339()))
}

/// Calendar time for a DUID-LLT timestamp.
pub fn duid_time(seconds: u32) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(DUID_EPOCH_UNIX + i64::from(seconds), 0)
}

/// Knobs for [`generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    pub enterprise_number: u32,
    pub en_identifier_len: usize,
    /// Set RFC 4122 version-4 bits on generated UUIDs.
    pub strict_uuid: bool,
    /// Prefix policy for link-layer addresses generated on the caller's behalf.
    pub oui_policy: OuiPolicy,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            enterprise_number: DEFAULT_ENTERPRISE_NUMBER,
            en_identifier_len: DEFAULT_EN_IDENTIFIER_LEN,
            strict_uuid: true,
            oui_policy: OuiPolicy::VendorPool,
        }
    }
}

/// Generate a fresh DUID of `variant`.
///
/// LLT and LL embed `mac`, or a freshly randomized address when none is
/// given. `mac` is ignored by EN and UUID.
pub fn generate(
    variant: DuidVariant,
    mac: Option<MacAddress>,
    options: &GenerateOptions,
) -> Result<Duid, DuidError> {
    generate_at(variant, mac, options, Utc::now(), &mut rand::thread_rng())
}

/// [`generate`] at a fixed instant with a caller-supplied RNG.
pub fn generate_at<R: Rng + ?Sized>(
    variant: DuidVariant,
    mac: Option<MacAddress>,
    options: &GenerateOptions,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Duid, DuidError> {
    match variant {
        DuidVariant::Llt => Ok(Duid::Llt {
            hardware_type: HW_TYPE_ETHERNET,
            time: duid_timestamp(now)?,
            link_layer_address: link_layer_bytes(mac, options.oui_policy, rng),
        }),
        DuidVariant::Ll => Ok(Duid::Ll {
            hardware_type: HW_TYPE_ETHERNET,
            link_layer_address: link_layer_bytes(mac, options.oui_policy, rng),
        }),
        DuidVariant::En => {
            let len = options.en_identifier_len;
            if len == 0 || len > MAX_DUID_LEN - 6 {
                return Err(DuidError::IdentifierLength(len));
            }
            let mut identifier = vec![0u8; len];
            rng.fill(identifier.as_mut_slice());
            Ok(Duid::En {
                enterprise_number: options.enterprise_number,
                identifier,
            })
        }
        DuidVariant::Uuid => {
            let random: [u8; 16] = rng.gen();
            if options.strict_uuid {
                Ok(Duid::Uuid(
                    *uuid::Builder::from_random_bytes(random).into_uuid().as_bytes(),
                ))
            } else {
                Ok(Duid::Uuid(random))
            }
        }
    }
}

fn link_layer_bytes<R: Rng + ?Sized>(
    mac: Option<MacAddress>,
    policy: OuiPolicy,
    rng: &mut R,
) -> Vec<u8> {
    mac.unwrap_or_else(|| randomize_with(rng, false, policy))
        .octets()
        .to_vec()
}
