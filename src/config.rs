use crate::domain::CoinName;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub indexer_api_url: String,
    pub hermes_api_url: Option<String>,
    /// Coin to Pyth price feed id.
    pub price_feed_ids: BTreeMap<CoinName, String>,
    pub coins: MarketCoins,
    /// Zero disables the read-through cache.
    pub cache_ttl_ms: u64,
}

/// Coins the query layer fans out over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketCoins {
    pub market: Vec<CoinName>,
    pub spool: Vec<CoinName>,
    pub borrow_incentive: Vec<CoinName>,
    pub governance: CoinName,
    pub governance_decimals: u32,
}

impl Default for MarketCoins {
    fn default() -> Self {
        Self {
            market: coin_list(DEFAULT_MARKET_COINS),
            spool: coin_list(DEFAULT_SPOOL_COINS),
            borrow_incentive: coin_list(DEFAULT_BORROW_INCENTIVE_COINS),
            governance: CoinName::new(DEFAULT_GOVERNANCE_COIN),
            governance_decimals: 9,
        }
    }
}

const DEFAULT_MARKET_COINS: &str = "sui,usdc,usdt,eth,sca";
const DEFAULT_SPOOL_COINS: &str = "sui,usdc,usdt";
const DEFAULT_BORROW_INCENTIVE_COINS: &str = "sui,usdc";
const DEFAULT_GOVERNANCE_COIN: &str = "sca";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let indexer_api_url = env_map
            .get("INDEXER_API_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("INDEXER_API_URL".to_string()))?;

        let hermes_api_url = env_map
            .get("HERMES_API_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let price_feed_ids = match env_map.get("PRICE_FEED_IDS") {
            Some(raw) => parse_price_feed_ids(raw)?,
            None => BTreeMap::new(),
        };

        let coin_var = |key: &str, default: &str| -> Result<Vec<CoinName>, ConfigError> {
            let coins = coin_list(env_map.get(key).map(|s| s.as_str()).unwrap_or(default));
            if coins.is_empty() {
                return Err(ConfigError::InvalidValue(
                    key.to_string(),
                    "must list at least one coin".to_string(),
                ));
            }
            Ok(coins)
        };

        let coins = MarketCoins {
            market: coin_var("MARKET_COINS", DEFAULT_MARKET_COINS)?,
            spool: coin_var("SPOOL_COINS", DEFAULT_SPOOL_COINS)?,
            borrow_incentive: coin_var("BORROW_INCENTIVE_COINS", DEFAULT_BORROW_INCENTIVE_COINS)?,
            governance: CoinName::new(
                env_map
                    .get("GOVERNANCE_COIN")
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .unwrap_or(DEFAULT_GOVERNANCE_COIN),
            ),
            ..MarketCoins::default()
        };

        let cache_ttl_ms = env_map
            .get("CACHE_TTL_MS")
            .map(|s| s.as_str())
            .unwrap_or("0")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "CACHE_TTL_MS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        Ok(Config {
            port,
            indexer_api_url,
            hermes_api_url,
            price_feed_ids,
            coins,
            cache_ttl_ms,
        })
    }
}

fn coin_list(raw: &str) -> Vec<CoinName> {
    let mut coins: Vec<CoinName> = Vec::new();
    for coin in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let coin = CoinName::new(coin);
        if !coins.contains(&coin) {
            coins.push(coin);
        }
    }
    coins
}

/// `coin:feedId,coin:feedId`
fn parse_price_feed_ids(raw: &str) -> Result<BTreeMap<CoinName, String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.split_once(':') {
            Some((coin, id)) if !coin.trim().is_empty() && !id.trim().is_empty() => {
                Ok((CoinName::new(coin.trim()), id.trim().to_string()))
            }
            _ => Err(ConfigError::InvalidValue(
                "PRICE_FEED_IDS".to_string(),
                format!("expected coin:feedId, got {}", pair),
            )),
        })
        .collect()
}
