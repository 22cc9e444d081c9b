//! Raw borrower position.

use crate::domain::{CoinName, ObligationId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A borrower's collateral and debt records as stored on-ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawObligation {
    pub id: ObligationId,
    /// Deposited collateral per coin, raw units.
    #[serde(default)]
    pub collaterals: BTreeMap<CoinName, u64>,
    #[serde(default)]
    pub debts: BTreeMap<CoinName, RawDebt>,
    /// Set while the position is staked into an incentive program.
    #[serde(default)]
    pub locked: bool,
}

/// Debt principal plus the pool borrow index at the last interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDebt {
    pub amount: u64,
    pub borrow_index: u64,
}

impl RawObligation {
    pub fn new(id: ObligationId) -> Self {
        Self {
            id,
            collaterals: BTreeMap::new(),
            debts: BTreeMap::new(),
            locked: false,
        }
    }

    pub fn with_collateral(mut self, coin: impl Into<CoinName>, amount: u64) -> Self {
        self.collaterals.insert(coin.into(), amount);
        self
    }

    pub fn with_debt(mut self, coin: impl Into<CoinName>, amount: u64, borrow_index: u64) -> Self {
        self.debts.insert(
            coin.into(),
            RawDebt {
                amount,
                borrow_index,
            },
        );
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// Every coin referenced by the position, collateral or debt.
    pub fn coins(&self) -> Vec<CoinName> {
        let mut coins: Vec<CoinName> = self
            .collaterals
            .keys()
            .chain(self.debts.keys())
            .cloned()
            .collect();
        coins.sort();
        coins.dedup();
        coins
    }
}
