//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Authenticated user identifier supplied by the account layer.
///
/// The inner String is private to ensure all construction goes through
/// the defined constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a `UserId`, rejecting blank identifiers.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyUserId`] for empty or whitespace input.
    pub fn parse(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyUserId);
        }
        Ok(Self(id))
    }

    /// Get the user ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// On-chain wallet address.
///
/// Always stored lowercase so that lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and normalize a `0x`-prefixed 40 hex character address.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidAddress`] if the input is malformed.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let invalid = || ValidationError::InvalidAddress {
            input: input.to_string(),
        };

        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(invalid)?;
        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display, e.g. `0x1234...abcd`.
    #[must_use]
    pub fn short(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Transaction hash, the natural key of a trade.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(String);

impl TxHash {
    /// Create a new `TxHash`, normalized to lowercase.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into().trim().to_ascii_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TxHash {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_normalized_to_lowercase() {
        let a = Address::parse("0xABCDEF0123456789abcdef0123456789ABCDEF01").unwrap();
        let b = Address::parse("  0xabcdef0123456789abcdef0123456789abcdef01 ").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn address_rejects_bad_input() {
        for input in [
            "",
            "abcdef0123456789abcdef0123456789abcdef01",
            "0xabc",
            "0xzzcdef0123456789abcdef0123456789abcdef01",
            "0xabcdef0123456789abcdef0123456789abcdef0123",
        ] {
            assert!(
                matches!(
                    Address::parse(input),
                    Err(ValidationError::InvalidAddress { .. })
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn address_short_form() {
        let a = Address::parse("0x1234567890abcdef1234567890abcdef12345678").unwrap();
        assert_eq!(a.short(), "0x1234...5678");
    }

    #[test]
    fn address_deserializes_through_validation() {
        let ok: Address =
            serde_json::from_str("\"0x1234567890ABCDEF1234567890abcdef12345678\"").unwrap();
        assert_eq!(ok.as_str(), "0x1234567890abcdef1234567890abcdef12345678");
        assert!(serde_json::from_str::<Address>("\"nope\"").is_err());
    }

    #[test]
    fn user_id_rejects_blank() {
        assert_eq!(UserId::parse("  "), Err(ValidationError::EmptyUserId));
        assert_eq!(UserId::parse("u1").unwrap().as_str(), "u1");
    }

    #[test]
    fn tx_hash_is_case_insensitive() {
        assert_eq!(TxHash::new("0xABC"), TxHash::new("0xabc"));
    }
}
