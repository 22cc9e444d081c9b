//! Primary/fallback price source composition.

use super::{DataSourceError, PriceSource};
use crate::domain::{CoinName, CoinPrices};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Asks the primary source first, then the fallback for whatever the primary
/// could not price.
#[derive(Debug, Clone)]
pub struct FallbackPriceSource {
    primary: Arc<dyn PriceSource>,
    fallback: Arc<dyn PriceSource>,
}

impl FallbackPriceSource {
    pub fn new(primary: Arc<dyn PriceSource>, fallback: Arc<dyn PriceSource>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl PriceSource for FallbackPriceSource {
    async fn fetch_coin_prices(&self, coins: &[CoinName]) -> Result<CoinPrices, DataSourceError> {
        let (mut prices, primary_error) = match self.primary.fetch_coin_prices(coins).await {
            Ok(prices) => (prices, None),
            Err(e) => {
                warn!("Primary price source failed, using fallback: {}", e);
                (CoinPrices::new(), Some(e))
            }
        };

        let missing: Vec<CoinName> = coins
            .iter()
            .filter(|c| !prices.contains(c))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(prices);
        }

        match self.fallback.fetch_coin_prices(&missing).await {
            Ok(more) => {
                prices.fill_missing(more);
                Ok(prices)
            }
            Err(e) if primary_error.is_some() => Err(e),
            Err(e) => {
                warn!("Fallback price source failed for {} coins: {}", missing.len(), e);
                Ok(prices)
            }
        }
    }
}
