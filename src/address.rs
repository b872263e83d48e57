// src/address.rs
//! Address classification and canonicalization. Every address
//! comparison in the crate routes through [`equals`]; raw string
//! equality on addresses is a bug.

use crate::types::Chain;

/// Classify an address by its prefix: `0x` means Ethereum, every other
/// non-empty string is treated as Bitcoin. Callers are responsible for
/// rejecting empty input before it gets here.
pub fn classify(raw: &str) -> Chain {
    if raw.trim_start().starts_with("0x") {
        Chain::Ethereum
    } else {
        Chain::Bitcoin
    }
}

/// Produce the canonical comparison key for an address. Ethereum
/// addresses are case-insensitive hex, so they are lower-cased;
/// Bitcoin addresses are base58 and case-sensitive, so they pass
/// through unchanged. Surrounding whitespace is always stripped.
/// Idempotent: canonicalizing twice yields the same string.
pub fn canonicalize(raw: &str) -> String {
    let trimmed = raw.trim();
    match classify(trimmed) {
        Chain::Ethereum => trimmed.to_lowercase(),
        Chain::Bitcoin => trimmed.to_string(),
    }
}

/// Case/format-insensitive address equality.
pub fn equals(a: &str, b: &str) -> bool {
    canonicalize(a) == canonicalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_prefix() {
        assert_eq!(classify("0xAbC123"), Chain::Ethereum);
        assert_eq!(classify("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2"), Chain::Bitcoin);
        assert_eq!(classify("bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh"), Chain::Bitcoin);
    }

    #[test]
    fn canonicalize_is_idempotent() {
        for raw in ["0xAbC123", "  0xDEF456 ", "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", " 3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy"] {
            let once = canonicalize(raw);
            assert_eq!(canonicalize(&once), once);
        }
    }

    #[test]
    fn ethereum_lowercased_bitcoin_untouched() {
        assert_eq!(canonicalize("0xABCdef"), "0xabcdef");
        assert_eq!(
            canonicalize("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2"),
            "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2"
        );
    }

    #[test]
    fn equality_ignores_case_and_whitespace_for_ethereum() {
        assert!(equals("0xAAA", "0xaaa"));
        assert!(equals(" 0xAAA ", "0xaaa"));
        assert!(!equals("0xAAA", "0xAAB"));
        // Bitcoin stays case-sensitive.
        assert!(!equals("1BvBMSEYstW", "1bvbmseystw"));
    }
}
