//! Ledger addresses.

use crate::errors::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of bytes in an address.
pub const ADDRESS_BYTES: usize = 20;

/// Length of the textual form: `0x` followed by 40 hex digits.
pub const ADDRESS_LEN: usize = 2 + ADDRESS_BYTES * 2;

/// A 20-byte ledger address, displayed as `0x`-prefixed lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_BYTES]);

impl Address {
    /// Creates an address from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    /// Creates an address from the leading bytes of a digest.
    #[must_use]
    pub fn from_digest(digest: &[u8]) -> Self {
        let mut bytes = [0u8; ADDRESS_BYTES];
        let take = digest.len().min(ADDRESS_BYTES);
        bytes[..take].copy_from_slice(&digest[..take]);
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }

    /// Returns true if `text` is a well-formed address.
    #[must_use]
    pub fn is_valid(text: &str) -> bool {
        text.parse::<Self>().is_ok()
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| LedgerError::InvalidAddress(format!("{s}: missing 0x prefix")))?;

        if s.len() != ADDRESS_LEN {
            return Err(LedgerError::InvalidAddress(format!(
                "{s}: expected {ADDRESS_LEN} characters, got {}",
                s.len()
            )));
        }

        let mut bytes = [0u8; ADDRESS_BYTES];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| LedgerError::InvalidAddress(format!("{s}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "0x5b1869d9a4c187f2eaa108f3062412ecf0526b24";

    #[test]
    fn test_parse_and_display() {
        let address: Address = SAMPLE.parse().unwrap();
        assert_eq!(address.to_string(), SAMPLE);
        assert_eq!(address.to_string().len(), ADDRESS_LEN);
    }

    #[test]
    fn test_uppercase_hex_is_normalized() {
        let address: Address = "0x5B1869D9A4C187F2EAA108F3062412ECF0526B24".parse().unwrap();
        assert_eq!(address.to_string(), SAMPLE);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(!Address::is_valid("5b1869d9a4c187f2eaa108f3062412ecf0526b24"));
        assert!(!Address::is_valid("0x5b18"));
        assert!(!Address::is_valid("0xzz1869d9a4c187f2eaa108f3062412ecf0526b24"));
        assert!(!Address::is_valid(""));
    }

    #[test]
    fn test_from_digest_truncates() {
        let digest = [0xabu8; 32];
        let address = Address::from_digest(&digest);
        assert_eq!(address.as_bytes(), &[0xab; ADDRESS_BYTES]);
    }

    #[test]
    fn test_serde_as_string() {
        let address: Address = SAMPLE.parse().unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{SAMPLE}\""));
        assert!(serde_json::from_str::<Address>("\"0x12\"").is_err());
    }
}
