use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Letter case used when rendering hex digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HexCase {
    #[default]
    Lower,
    Upper,
}

/// Errors raised while reading colon-separated hex.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("hex string is empty")]
    Empty,
    /// A group was not exactly two hex digits.
    #[error("invalid hex byte {group:?} at position {index}")]
    InvalidByte { index: usize, group: String },
}

/// Render bytes as colon-separated hex pairs, e.g. `00:03:aa`.
pub fn to_colon_hex(bytes: &[u8], case: HexCase) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(':');
        }
        match case {
            HexCase::Lower => out.push_str(&format!("{b:02x}")),
            HexCase::Upper => out.push_str(&format!("{b:02X}")),
        }
    }
    out
}

/// Parse colon-separated hex pairs. Surrounding whitespace is ignored; every
/// group must be exactly two hex digits.
pub fn parse_colon_hex(input: &str) -> Result<Vec<u8>, HexError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(HexError::Empty);
    }

    trimmed
        .split(':')
        .enumerate()
        .map(|(index, group)| {
            parse_byte(group).ok_or_else(|| HexError::InvalidByte {
                index,
                group: group.to_string(),
            })
        })
        .collect()
}

/// Decode one two-digit hex group.
pub(crate) fn parse_byte(group: &str) -> Option<u8> {
    if group.len() != 2 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(group, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::{parse_colon_hex, to_colon_hex, HexCase, HexError};

    #[test]
    fn renders_both_cases() {
        let bytes = [0x00, 0x0a, 0xff];
        assert_eq!(to_colon_hex(&bytes, HexCase::Lower), "00:0a:ff");
        assert_eq!(to_colon_hex(&bytes, HexCase::Upper), "00:0A:FF");
        assert_eq!(to_colon_hex(&[], HexCase::Lower), "");
    }

    #[test]
    fn parses_mixed_case_pairs() {
        let bytes = parse_colon_hex(" 00:0A:ff \n").expect("parse");
        assert_eq!(bytes, vec![0x00, 0x0a, 0xff]);
    }

    #[test]
    fn rejects_single_digit_and_sign_groups() {
        let err = parse_colon_hex("00:a:ff").expect_err("single digit");
        assert_eq!(
            err,
            HexError::InvalidByte {
                index: 1,
                group: "a".to_string()
            }
        );
        assert!(parse_colon_hex("+1:00").is_err());
        assert!(parse_colon_hex("00-11").is_err());
        assert!(parse_colon_hex("00::11").is_err());
        assert_eq!(parse_colon_hex("   "), Err(HexError::Empty));
    }
}
