//! Mail address normalization.
//!
//! Domains are case-insensitive and are lower-cased; local parts are kept
//! exactly as written.

use crate::{Error, Result};

/// Canonical form of an address as stored and compared.
///
/// Trims surrounding whitespace, strips one pair of enclosing angle
/// brackets and lower-cases everything after the last `@`.
#[must_use]
pub fn normalize_address(raw: &str) -> String {
    let trimmed = raw.trim();
    let bare = trimmed
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .map_or(trimmed, str::trim);

    match bare.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => bare.to_string(),
    }
}

/// Check that `address` looks like `local@domain`.
///
/// # Errors
///
/// Returns [`Error::Validation`] unless there is exactly one `@` with text
/// on both sides and no whitespace.
pub fn validate_address(address: &str) -> Result<()> {
    let invalid = || Error::validation(format!("invalid email address: {address:?}"));

    if address.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = address.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_domain_only() {
        assert_eq!(normalize_address("Alice@Example.COM"), "Alice@example.com");
    }

    #[test]
    fn test_normalize_strips_brackets_and_whitespace() {
        assert_eq!(normalize_address("  <bob@X.com> "), "bob@x.com");
        assert_eq!(normalize_address("< bob@x.com >"), "bob@x.com");
    }

    #[test]
    fn test_normalize_without_at() {
        assert_eq!(normalize_address(" postmaster "), "postmaster");
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("a@x.com").is_ok());
        assert!(validate_address("a@localhost").is_ok());
        assert!(validate_address("ax.com").is_err());
        assert!(validate_address("@x.com").is_err());
        assert!(validate_address("a@").is_err());
        assert!(validate_address("a@b@x.com").is_err());
        assert!(validate_address("a b@x.com").is_err());
    }
}
