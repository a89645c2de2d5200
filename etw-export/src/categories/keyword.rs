//! Keyword bits and parsing

use crate::types::{ExportError, Keyword, Result};

/// Bit selecting every category without a dedicated bit
pub const OTHER_EVENTS_KEYWORD_BIT: Keyword = 1 << 61;

/// Bit selecting every disabled-by-default category without a dedicated bit
pub const DISABLED_OTHER_EVENTS_KEYWORD_BIT: Keyword = 1 << 62;

/// Always set by the controller; not interpreted here
pub const RESERVED_KEYWORD_BIT: Keyword = 1 << 63;

/// Outcome of applying a keyword to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordChange {
    /// Same keyword as last applied, nothing was touched
    Unchanged,
    /// Category states were recomputed from the new keyword
    Changed,
}

impl KeywordChange {
    pub fn is_changed(self) -> bool {
        self == KeywordChange::Changed
    }
}

/// Parse a keyword as given to a trace controller
///
/// Accepts hex with a `0x` prefix (`0x8000000000000009`) or plain decimal.
/// Underscores are ignored.
pub fn parse_keyword(text: &str) -> Result<Keyword> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();

    let parsed = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => cleaned.parse::<u64>(),
    };

    parsed.map_err(|e| ExportError::InvalidKeyword(format!("{:?}: {}", text, e)))
}

/// Format a keyword the way trace controllers print it
pub fn format_keyword(keyword: Keyword) -> String {
    format!("0x{:016X}", keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_and_decimal() {
        assert_eq!(parse_keyword("0x8000000000000009").unwrap(), 0x8000_0000_0000_0009);
        assert_eq!(parse_keyword("0XA0000000000000A0").unwrap(), 0xA000_0000_0000_00A0);
        assert_eq!(parse_keyword(" 0x8000_0000_0000_0001 ").unwrap(), 0x8000_0000_0000_0001);
        assert_eq!(parse_keyword("9").unwrap(), 9);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_keyword("0xZZ"), Err(ExportError::InvalidKeyword(_))));
        assert!(parse_keyword("").is_err());
        assert!(parse_keyword("0x1_0000_0000_0000_0000").is_err()); // 65 bits
    }

    #[test]
    fn test_format_keyword() {
        assert_eq!(format_keyword(0x8000_0000_0000_0009), "0x8000000000000009");
        assert_eq!(format_keyword(OTHER_EVENTS_KEYWORD_BIT), "0x2000000000000000");
    }

    #[test]
    fn test_catch_all_bits_do_not_overlap() {
        assert_eq!(OTHER_EVENTS_KEYWORD_BIT & DISABLED_OTHER_EVENTS_KEYWORD_BIT, 0);
        assert_eq!(DISABLED_OTHER_EVENTS_KEYWORD_BIT & RESERVED_KEYWORD_BIT, 0);
    }
}
