//! Core ledger types: addresses, account records, amounts, capabilities.
//!
//! Balances are `u128` base units of the claim token, so a token divided
//! into 10^18 units still leaves room for 3.4e20 whole tokens. Rates are
//! `u64` fixed-point values scaled by [`SCALE`](crate::constants::SCALE).
//! Timestamps are Unix seconds.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::ADDRESS_LEN;
use crate::error::AddressError;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Opaque 20-byte account identifier, rendered as `0x`-prefixed hex.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    /// Parse a hex address with or without the `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let arr: [u8; ADDRESS_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidLength(bytes.len()))?;
        Ok(Self(arr))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Per-account ledger record.
///
/// `principal` excludes interest accrued since `last_synced_at`. The
/// user-facing balance is computed from all three fields by the ledger.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct AccountState {
    /// Materialized balance in claim-token units.
    pub principal: u128,
    /// Per-second interest rate pinned when the account was last funded from zero.
    pub rate: u64,
    /// Timestamp of the last settlement.
    pub last_synced_at: Timestamp,
}

impl AccountState {
    /// Whether the account holds any materialized principal.
    pub fn is_funded(&self) -> bool {
        self.principal > 0
    }
}

/// Amount requested by a burn or transfer.
///
/// `All` acts on the account's full settled balance, resolved after
/// settlement. It replaces the "maximum integer" sentinel so a literal
/// `u128::MAX` is never reinterpreted.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Amount {
    Exact(u128),
    All,
}

impl Amount {
    /// Resolve against a settled balance.
    ///
    /// # Examples
    ///
    /// ```
    /// use accrual_core::types::Amount;
    /// assert_eq!(Amount::All.resolve(42), 42);
    /// assert_eq!(Amount::Exact(7).resolve(42), 7);
    /// assert_eq!(Amount::Exact(u128::MAX).resolve(42), u128::MAX);
    /// ```
    pub fn resolve(self, settled_balance: u128) -> u128 {
        match self {
            Self::Exact(v) => v,
            Self::All => settled_balance,
        }
    }
}

impl From<u128> for Amount {
    fn from(v: u128) -> Self {
        Self::Exact(v)
    }
}

impl From<u64> for Amount {
    fn from(v: u64) -> Self {
        Self::Exact(u128::from(v))
    }
}

/// A privilege checked at the top of guarded ledger operations.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
    bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// May mint and burn claim tokens (granted to the custodial pool).
    MintBurn,
    /// May lower the global rate and manage mint/burn holders.
    Admin,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MintBurn => f.write_str("mint/burn"),
            Self::Admin => f.write_str("admin"),
        }
    }
}
