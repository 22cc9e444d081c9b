//! Pyth Hermes price client.

use super::{DataSourceError, PriceSource};
use crate::domain::{CoinName, CoinPrices, Decimal};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Price source reading the latest Pyth price updates from a Hermes endpoint.
#[derive(Debug, Clone)]
pub struct HermesPriceSource {
    client: Client,
    base_url: String,
    /// Coin to price feed id, lowercase hex without `0x`.
    feed_ids: BTreeMap<CoinName, String>,
}

#[derive(Debug, Deserialize)]
struct LatestUpdates {
    #[serde(default)]
    parsed: Vec<ParsedUpdate>,
}

#[derive(Debug, Deserialize)]
struct ParsedUpdate {
    id: String,
    price: PythPrice,
}

#[derive(Debug, Deserialize)]
struct PythPrice {
    price: String,
    expo: i32,
}

fn normalize_feed_id(id: &str) -> String {
    id.trim_start_matches("0x").to_ascii_lowercase()
}

impl HermesPriceSource {
    pub fn new(base_url: String, feed_ids: BTreeMap<CoinName, String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            feed_ids: feed_ids
                .into_iter()
                .map(|(coin, id)| (coin, normalize_feed_id(&id)))
                .collect(),
        }
    }

    /// Default public Hermes endpoint.
    pub fn default_url(feed_ids: BTreeMap<CoinName, String>) -> Self {
        Self::new("https://hermes.pyth.network".to_string(), feed_ids)
    }

    async fn fetch_latest(&self, ids: &[&str]) -> Result<LatestUpdates, DataSourceError> {
        let url = format!("{}/v2/updates/price/latest", self.base_url);
        let query: Vec<(&str, &str)> = ids
            .iter()
            .map(|id| ("ids[]", *id))
            .chain(std::iter::once(("parsed", "true")))
            .collect();
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(10)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .get(&url)
                .query(&query)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(DataSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<LatestUpdates>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl PriceSource for HermesPriceSource {
    async fn fetch_coin_prices(&self, coins: &[CoinName]) -> Result<CoinPrices, DataSourceError> {
        let wanted: Vec<(&CoinName, &str)> = coins
            .iter()
            .filter_map(|c| self.feed_ids.get(c).map(|id| (c, id.as_str())))
            .collect();
        if wanted.is_empty() {
            return Ok(CoinPrices::new());
        }
        let ids: Vec<&str> = wanted.iter().map(|(_, id)| *id).collect();
        debug!("Fetching Hermes prices for {} feeds", ids.len());

        let updates = self.fetch_latest(&ids).await?;
        Ok(prices_from_updates(&wanted, &updates))
    }
}

fn prices_from_updates(wanted: &[(&CoinName, &str)], updates: &LatestUpdates) -> CoinPrices {
    let by_id: BTreeMap<String, &PythPrice> = updates
        .parsed
        .iter()
        .map(|u| (normalize_feed_id(&u.id), &u.price))
        .collect();

    let mut prices = CoinPrices::new();
    for (coin, id) in wanted {
        let Some(raw) = by_id.get(*id) else {
            continue;
        };
        match Decimal::from_str_canonical(&raw.price) {
            Ok(mantissa) if !mantissa.is_negative() => {
                prices.insert((*coin).clone(), mantissa.shift(raw.expo))
            }
            _ => warn!("Dropping invalid Hermes price for {}: {}", coin, raw.price),
        }
    }
    prices
}
