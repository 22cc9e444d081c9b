//! Governance lock (veSCA) records.

use crate::domain::TimeMs;
use serde::{Deserialize, Serialize};

/// Maximum lock period: four 365-day years, in seconds.
pub const MAX_LOCK_SECS: u64 = 4 * 365 * 86_400;

/// One veSCA key: governance coins locked until `unlock_at_secs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVeScaKey {
    pub key_id: String,
    /// Locked governance coin, raw units.
    pub locked_amount: u64,
    pub unlock_at_secs: i64,
}

impl RawVeScaKey {
    pub fn unlock_at(&self) -> TimeMs {
        TimeMs::from_secs(self.unlock_at_secs)
    }
}
