use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Address required")]
    Missing,
    #[error("Invalid address format")]
    Invalid,
}

/// A 20-byte account identifier in canonical `0x` + 40 hex digit form.
///
/// Hex case is kept as supplied so responses echo the caller's checksum
/// casing; equality is case-insensitive.
#[derive(Debug, Clone, Eq)]
pub struct Address(String);

impl Address {
    /// Normalize and validate a raw query value.
    ///
    /// Surrounding whitespace is trimmed and a missing `0x` prefix is added
    /// before the result is checked against `^0x[0-9a-fA-F]{40}$`.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        if raw.is_empty() {
            return Err(AddressError::Missing);
        }

        let trimmed = raw.trim();
        let candidate = if trimmed.starts_with("0x") {
            trimmed.to_string()
        } else {
            format!("0x{}", trimmed)
        };

        let digits = &candidate[2..];
        if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::Invalid);
        }

        Ok(Address(candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 40 hex digits without the `0x` prefix.
    pub fn hex_digits(&self) -> &str {
        &self.0[2..]
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
