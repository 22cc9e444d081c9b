//! Market indexer API client.
//!
//! The indexer mirrors on-ledger objects as JSON records shaped like the raw
//! domain types, so most responses deserialize straight into them.

use super::{DataSourceError, LedgerSource, PriceSource};
use crate::domain::{
    Address, CoinName, CoinPrices, Decimal, ObligationId, RawIncentiveAccount, RawIncentivePool,
    RawMarketCollateral, RawMarketPool, RawObligation, RawSpool, RawStakeAccount, RawVeScaKey,
};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Ledger and price data source backed by the market indexer.
#[derive(Debug, Clone)]
pub struct IndexerDataSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(deserialize_with = "u64_from_str_or_number")]
    balance: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeScaKeysResponse {
    key_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObligationIdsResponse {
    obligation_ids: Vec<ObligationId>,
}

impl IndexerDataSource {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        what: &str,
    ) -> Result<T, DataSourceError> {
        let url = format!("{}{}", self.base_url, path);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let value = retry(backoff, || async {
            let response = self.client.get(&url).send().await.map_err(|e| {
                backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
            })?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(backoff::Error::permanent(DataSourceError::NotFound(
                    what.to_string(),
                )));
            }
            if status == StatusCode::TOO_MANY_REQUESTS {
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
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await?;

        serde_json::from_value(value)
            .map_err(|e| DataSourceError::ParseError(format!("{}: {}", what, e)))
    }
}

#[async_trait]
impl LedgerSource for IndexerDataSource {
    async fn fetch_market_pool(&self, coin: &CoinName) -> Result<RawMarketPool, DataSourceError> {
        debug!("Fetching market pool coin={}", coin);
        self.get_json(&format!("/market/pools/{}", coin), &format!("market pool {}", coin))
            .await
    }

    async fn fetch_market_collateral(
        &self,
        coin: &CoinName,
    ) -> Result<RawMarketCollateral, DataSourceError> {
        debug!("Fetching market collateral coin={}", coin);
        self.get_json(
            &format!("/market/collaterals/{}", coin),
            &format!("market collateral {}", coin),
        )
        .await
    }

    async fn fetch_obligation(&self, id: &ObligationId) -> Result<RawObligation, DataSourceError> {
        debug!("Fetching obligation id={}", id);
        self.get_json(&format!("/obligations/{}", id), &format!("obligation {}", id))
            .await
    }

    async fn fetch_obligation_ids(
        &self,
        owner: &Address,
    ) -> Result<Vec<ObligationId>, DataSourceError> {
        debug!("Fetching obligation ids owner={}", owner);
        let response: ObligationIdsResponse = self
            .get_json(
                &format!("/owners/{}/obligations", owner),
                &format!("obligations of {}", owner),
            )
            .await?;
        Ok(response.obligation_ids)
    }

    async fn fetch_stake_accounts(
        &self,
        owner: &Address,
        coin: &CoinName,
    ) -> Result<Vec<RawStakeAccount>, DataSourceError> {
        debug!("Fetching stake accounts owner={}, coin={}", owner, coin);
        self.get_json(
            &format!("/owners/{}/stake-accounts/{}", owner, coin),
            &format!("stake accounts of {}", owner),
        )
        .await
    }

    async fn fetch_coin_balance(
        &self,
        owner: &Address,
        coin: &CoinName,
    ) -> Result<u64, DataSourceError> {
        debug!("Fetching coin balance owner={}, coin={}", owner, coin);
        let result: Result<BalanceResponse, _> = self
            .get_json(
                &format!("/owners/{}/balances/{}", owner, coin),
                &format!("{} balance of {}", coin, owner),
            )
            .await;
        match result {
            Ok(response) => Ok(response.balance),
            Err(e) if e.is_not_found() => Ok(0),
            Err(e) => Err(e),
        }
    }

    async fn fetch_spool(&self, coin: &CoinName) -> Result<RawSpool, DataSourceError> {
        debug!("Fetching spool coin={}", coin);
        self.get_json(&format!("/spools/{}", coin), &format!("spool {}", coin))
            .await
    }

    async fn fetch_borrow_incentive_pool(
        &self,
        coin: &CoinName,
    ) -> Result<RawIncentivePool, DataSourceError> {
        debug!("Fetching borrow incentive pool coin={}", coin);
        self.get_json(
            &format!("/borrow-incentive/pools/{}", coin),
            &format!("borrow incentive pool {}", coin),
        )
        .await
    }

    async fn fetch_incentive_accounts(
        &self,
        obligation: &ObligationId,
    ) -> Result<Vec<RawIncentiveAccount>, DataSourceError> {
        debug!("Fetching incentive accounts obligation={}", obligation);
        let result = self
            .get_json(
                &format!("/borrow-incentive/accounts/{}", obligation),
                &format!("incentive accounts of {}", obligation),
            )
            .await;
        match result {
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            other => other,
        }
    }

    async fn fetch_ve_sca_keys(&self, owner: &Address) -> Result<Vec<String>, DataSourceError> {
        debug!("Fetching veSCA keys owner={}", owner);
        let response: VeScaKeysResponse = self
            .get_json(
                &format!("/owners/{}/vesca-keys", owner),
                &format!("veSCA keys of {}", owner),
            )
            .await?;
        Ok(response.key_ids)
    }

    async fn fetch_ve_sca(&self, key_id: &str) -> Result<RawVeScaKey, DataSourceError> {
        debug!("Fetching veSCA key={}", key_id);
        self.get_json(&format!("/vesca/{}", key_id), &format!("veSCA key {}", key_id))
            .await
    }
}

#[async_trait]
impl PriceSource for IndexerDataSource {
    async fn fetch_coin_prices(&self, coins: &[CoinName]) -> Result<CoinPrices, DataSourceError> {
        if coins.is_empty() {
            return Ok(CoinPrices::new());
        }
        let list = coins
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(",");
        debug!("Fetching indexer prices coins={}", list);
        let raw: BTreeMap<String, serde_json::Value> = self
            .get_json(&format!("/prices?coins={}", list), "coin prices")
            .await?;
        Ok(parse_prices(coins, &raw))
    }
}

/// Keep the requested coins with a parseable price; anything else is dropped.
fn parse_prices(coins: &[CoinName], raw: &BTreeMap<String, serde_json::Value>) -> CoinPrices {
    let mut prices = CoinPrices::new();
    for coin in coins {
        let Some(value) = raw.get(coin.as_str()) else {
            continue;
        };
        let parsed = match value {
            serde_json::Value::String(s) => Decimal::from_str_canonical(s).ok(),
            serde_json::Value::Number(n) => Decimal::from_str_canonical(&n.to_string()).ok(),
            _ => None,
        };
        match parsed {
            Some(price) if !price.is_negative() => prices.insert(coin.clone(), price),
            _ => warn!("Dropping unparseable price for {}: {}", coin, value),
        }
    }
    prices
}

fn u64_from_str_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
