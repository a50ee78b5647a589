//! Byte-level codecs for a host's advertised network identities.
//!
//! Two identifier families are covered:
//!
//! - [`mac`]: 48-bit hardware addresses: normalization of the common textual
//!   forms, validation, and randomized generation from a pool of
//!   virtualization-vendor prefixes.
//! - [`duid`]: DHCPv6 Unique Identifiers: strict encode/decode of the LLT, EN,
//!   LL and UUID variants, colon-hex interchange, and generation.
//!
//! Nothing in this crate performs I/O. Applying an identifier to a live
//! interface is the job of the `netid` crate.

pub mod duid;
pub mod hex;
pub mod mac;

pub use duid::{
    format, generate, generate_at, hex_to_duid, parse, Duid, DuidError, DuidInfo, DuidVariant,
    GenerateOptions,
};
pub use hex::{HexCase, HexError};
pub use mac::{normalize, randomize, validate, MacAddress, MacError, MacValidation, OuiPolicy};
