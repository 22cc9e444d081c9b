//! Domain primitives: TimeMs, Address, CoinName, ObligationId.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    /// Create a TimeMs from whole seconds.
    pub fn from_secs(secs: i64) -> Self {
        TimeMs(secs.saturating_mul(1000))
    }

    /// Get the underlying milliseconds value.
    pub fn as_ms(&self) -> i64 {
        self.0
    }

    /// Whole seconds, truncated.
    pub fn as_secs(&self) -> i64 {
        self.0.div_euclid(1000)
    }

    /// Whole seconds elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn secs_since(&self, earlier: TimeMs) -> u64 {
        u64::try_from(self.as_secs() - earlier.as_secs()).unwrap_or(0)
    }
}

/// Wallet address (0x-prefixed hex string).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("address must start with 0x")]
    MissingPrefix,
    #[error("address must be 1..=64 hex characters after 0x")]
    InvalidLength,
    #[error("address contains non-hex characters")]
    InvalidHex,
}

impl Address {
    /// Create an Address from a string.
    pub fn new(addr: String) -> Self {
        Address(addr)
    }

    /// Get the address as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let hex = s
            .strip_prefix("0x")
            .ok_or(AddressParseError::MissingPrefix)?;
        if hex.is_empty() || hex.len() > 64 {
            return Err(AddressParseError::InvalidLength);
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressParseError::InvalidHex);
        }
        Ok(Address(format!("0x{}", hex.to_ascii_lowercase())))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Short coin name used as the market key (e.g. "sui", "usdc").
///
/// Always lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CoinName(String);

impl CoinName {
    /// Create a CoinName, normalizing to lowercase.
    pub fn new(name: impl AsRef<str>) -> Self {
        CoinName(name.as_ref().trim().to_ascii_lowercase())
    }

    /// Get the coin name as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the pool's claim-share ("market") coin, e.g. `ssui` for `sui`.
    pub fn market_coin(&self) -> CoinName {
        CoinName(format!("s{}", self.0))
    }
}

impl std::fmt::Display for CoinName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CoinName {
    fn from(value: &str) -> Self {
        CoinName::new(value)
    }
}

/// On-ledger object id of a borrower position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObligationId(pub String);

impl ObligationId {
    pub fn new(id: impl Into<String>) -> Self {
        ObligationId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObligationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
