//! Core type definitions for the lending pool ledger

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::LedgerError;

/// Asset amount in base units (wei for the native asset, 1e-6 for a 6-decimal stable)
pub type Amount = u128;

/// Unix timestamp in seconds
pub type Timestamp = u64;

/// Participant identity (20 bytes, `0x`-prefixed hex on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId([u8; 20]);

impl AccountId {
    pub const LEN: usize = 20;

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse from hex, with or without the `0x` prefix
    pub fn parse(input: &str) -> Result<Self, LedgerError> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != Self::LEN * 2 {
            return Err(LedgerError::InvalidAccount {
                input: input.to_string(),
                reason: format!("expected {} hex digits, got {}", Self::LEN * 2, digits.len()),
            });
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes).map_err(|e| LedgerError::InvalidAccount {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self(bytes))
    }

    /// Deterministic identity for fixtures, big-endian in the trailing 8 bytes
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for AccountId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.to_string()
    }
}

/// Serde adapter writing amounts as decimal strings, so u128 values survive JSON consumers
/// that parse numbers as doubles.
pub mod amount_string {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use super::Amount;

    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim().parse::<Amount>().map_err(D::Error::custom)
    }
}

/// Constants
pub mod constants {
    /// Basis-point denominator (100% = 10_000)
    pub const BPS_DENOMINATOR: u128 = 10_000;

    /// Percentage denominator used by the collateral ratios (150 = 150%)
    pub const PERCENT_DENOMINATOR: u128 = 100;

    /// 365 days
    pub const SECONDS_PER_YEAR: u128 = 31_536_000;

    /// Native asset decimals (wei)
    pub const DEFAULT_NATIVE_DECIMALS: u8 = 18;

    /// Stable asset decimals (USDT-style)
    pub const DEFAULT_STABLE_DECIMALS: u8 = 6;

    /// Oracle answer decimals (Chainlink-style feed)
    pub const DEFAULT_PRICE_DECIMALS: u8 = 8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_parse_and_display() {
        let id = AccountId::parse("0x00000000000000000000000000000000000000ff").unwrap();
        assert_eq!(id.as_bytes()[19], 0xff);
        assert_eq!(id.to_string(), "0x00000000000000000000000000000000000000ff");

        let unprefixed = AccountId::parse("00000000000000000000000000000000000000FF").unwrap();
        assert_eq!(unprefixed, id);
        assert_eq!(AccountId::from_low_u64(255), id);
    }

    #[test]
    fn test_account_id_rejects_bad_input() {
        let err = AccountId::parse("0x1234").unwrap_err();
        assert_eq!(err.error_code(), "invalid_account");

        let err = AccountId::parse("0xzz000000000000000000000000000000000000ff").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAccount { .. }));
    }

    #[test]
    fn test_account_id_serializes_as_hex_string() {
        let id = AccountId::from_low_u64(1);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0x0000000000000000000000000000000000000001\"");

        let parsed: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
        assert!(serde_json::from_str::<AccountId>("\"0x01\"").is_err());
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapped {
        #[serde(with = "amount_string")]
        value: Amount,
    }

    #[test]
    fn test_amount_string_roundtrip_beyond_u64() {
        let wrapped = Wrapped {
            value: 10_000_000_000_000_000_000_000,
        };
        let json = serde_json::to_string(&wrapped).unwrap();
        assert_eq!(json, r#"{"value":"10000000000000000000000"}"#);
        assert_eq!(serde_json::from_str::<Wrapped>(&json).unwrap(), wrapped);
        assert!(serde_json::from_str::<Wrapped>(r#"{"value":"-1"}"#).is_err());
    }
}
