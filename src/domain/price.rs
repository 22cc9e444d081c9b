//! Coin price table.

use crate::domain::{CoinName, Decimal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// USD prices keyed by coin name. Coins whose price could not be obtained are
/// simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinPrices(BTreeMap<CoinName, Decimal>);

impl CoinPrices {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, coin: &CoinName) -> Option<Decimal> {
        self.0.get(coin).copied()
    }

    pub fn insert(&mut self, coin: CoinName, price: Decimal) {
        self.0.insert(coin, price);
    }

    pub fn contains(&self, coin: &CoinName) -> bool {
        self.0.contains_key(coin)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CoinName, &Decimal)> {
        self.0.iter()
    }

    /// Add every price from `other` that is not already present.
    pub fn fill_missing(&mut self, other: CoinPrices) {
        for (coin, price) in other.0 {
            self.0.entry(coin).or_insert(price);
        }
    }
}

impl FromIterator<(CoinName, Decimal)> for CoinPrices {
    fn from_iter<I: IntoIterator<Item = (CoinName, Decimal)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
