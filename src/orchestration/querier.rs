use super::{
    BorrowIncentiveQueries, CoreQueries, MarketSnapshot, PortfolioQueries, QueryError,
    QuerySession, SpoolQueries, VeScaQueries,
};
use crate::config::MarketCoins;
use crate::datasource::DataSourceError;
use crate::domain::{
    Address, CoinName, CoinPrices, ObligationId, RawIncentivePool, RawMarketCollateral,
    RawMarketPool, RawObligation, RawSpool, RawVeScaKey, TimeMs,
};
use crate::engine::{
    assess_collateral, build_borrowing, build_lending, build_obligation_account,
    summarize_portfolio, value_incentive_pool, value_pool, value_spool, value_ve_sca,
    IncentivePoolMetrics, Lending, LendingStake, ObligationAccount, PoolMetrics, Portfolio,
    SpoolMetrics, VeScaMetrics,
};
use async_trait::async_trait;
use futures::future::join_all;
use futures::join;
use std::collections::BTreeMap;
use tracing::{debug, warn};

type MarketRecord = (
    CoinName,
    Result<RawMarketPool, DataSourceError>,
    Result<RawMarketCollateral, DataSourceError>,
);

/// Concrete query handle over one [`QuerySession`].
#[derive(Debug, Clone)]
pub struct MarketQuerier {
    session: QuerySession,
    coins: MarketCoins,
}

impl MarketQuerier {
    pub fn new(session: QuerySession, coins: MarketCoins) -> Self {
        Self { session, coins }
    }

    pub fn session(&self) -> &QuerySession {
        &self.session
    }

    pub fn coins(&self) -> &MarketCoins {
        &self.coins
    }

    /// Best-effort price table; unpriced coins are logged and left out.
    async fn fetch_prices(&self, coins: &[CoinName]) -> CoinPrices {
        match self.session.prices().fetch_coin_prices(coins).await {
            Ok(prices) => {
                for coin in coins.iter().filter(|c| !prices.contains(c)) {
                    warn!("No price for {}, omitting it from aggregates", coin);
                }
                prices
            }
            Err(e) => {
                warn!("Price fetch failed for {} coins: {}", coins.len(), e);
                CoinPrices::new()
            }
        }
    }

    async fn fetch_market_records(&self, coins: &[CoinName]) -> Vec<MarketRecord> {
        let ledger = self.session.ledger();
        join_all(coins.iter().map(|coin| async move {
            let (pool, collateral) = join!(
                ledger.fetch_market_pool(coin),
                ledger.fetch_market_collateral(coin)
            );
            (coin.clone(), pool, collateral)
        }))
        .await
    }

    async fn load_market(&self, coins: &[CoinName], as_of: TimeMs) -> MarketSnapshot {
        let (prices, records) = join!(self.fetch_prices(coins), self.fetch_market_records(coins));
        value_market(records, &prices, as_of)
    }

    /// Spool of `coin` when it has one configured and it loads.
    async fn optional_spool(&self, coin: &CoinName) -> Option<RawSpool> {
        if !self.coins.spool.contains(coin) {
            return None;
        }
        match self.session.ledger().fetch_spool(coin).await {
            Ok(spool) => Some(spool),
            Err(e) if e.is_not_found() => {
                debug!("No spool for {}", coin);
                None
            }
            Err(e) => {
                warn!("Spool fetch failed for {}: {}", coin, e);
                None
            }
        }
    }

    async fn lending_for(
        &self,
        pool: &PoolMetrics,
        spool: Option<&RawSpool>,
        owner: &Address,
        prices: &CoinPrices,
        as_of: TimeMs,
    ) -> Result<Lending, QueryError> {
        let ledger = self.session.ledger();
        let market_coin = pool.coin.market_coin();
        let (market_balance, wallet_balance, stake_accounts) = join!(
            ledger.fetch_coin_balance(owner, &market_coin),
            ledger.fetch_coin_balance(owner, &pool.coin),
            async {
                match spool {
                    Some(_) => ledger.fetch_stake_accounts(owner, &pool.coin).await,
                    None => Ok(Vec::new()),
                }
            }
        );
        let stake_accounts = stake_accounts?;
        let stake = spool.map(|spool| LendingStake {
            spool,
            accounts: &stake_accounts,
            reward_price: prices.get(&spool.reward.coin),
        });
        Ok(build_lending(
            pool,
            market_balance?,
            wallet_balance?,
            stake,
            as_of,
        ))
    }

    async fn load_obligations(&self, owner: &Address) -> Result<Vec<RawObligation>, QueryError> {
        let ledger = self.session.ledger();
        let ids = ledger.fetch_obligation_ids(owner).await?;
        let results = join_all(ids.iter().map(|id| ledger.fetch_obligation(id))).await;
        Ok(ids
            .iter()
            .zip(results)
            .filter_map(|(id, result)| match result {
                Ok(obligation) => Some(obligation),
                Err(e) => {
                    warn!("Omitting obligation {}: {}", id, e);
                    None
                }
            })
            .collect())
    }

    async fn load_spools(&self) -> BTreeMap<CoinName, RawSpool> {
        let spools = join_all(self.coins.spool.iter().map(|c| self.optional_spool(c))).await;
        spools
            .into_iter()
            .flatten()
            .map(|s| (s.coin.clone(), s))
            .collect()
    }

    async fn load_incentive_pools(&self) -> BTreeMap<CoinName, RawIncentivePool> {
        let ledger = self.session.ledger();
        let results = join_all(
            self.coins
                .borrow_incentive
                .iter()
                .map(|c| ledger.fetch_borrow_incentive_pool(c)),
        )
        .await;
        self.coins
            .borrow_incentive
            .iter()
            .zip(results)
            .filter_map(|(coin, result)| match result {
                Ok(pool) => Some((coin.clone(), pool)),
                Err(e) => {
                    warn!("Omitting borrow incentive pool {}: {}", coin, e);
                    None
                }
            })
            .collect()
    }

    async fn load_ve_sca_keys(&self, owner: &Address) -> Vec<RawVeScaKey> {
        let ledger = self.session.ledger();
        let ids = match ledger.fetch_ve_sca_keys(owner).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("veSCA key lookup failed for {}: {}", owner, e);
                return Vec::new();
            }
        };
        let results = join_all(ids.iter().map(|id| ledger.fetch_ve_sca(id))).await;
        ids.iter()
            .zip(results)
            .filter_map(|(id, result)| match result {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!("Omitting veSCA key {}: {}", id, e);
                    None
                }
            })
            .collect()
    }
}

/// Value every record that has a price; anything else is logged and dropped.
fn value_market(records: Vec<MarketRecord>, prices: &CoinPrices, as_of: TimeMs) -> MarketSnapshot {
    let mut pools = BTreeMap::new();
    let mut collaterals = BTreeMap::new();
    for (coin, pool, collateral) in records {
        let Some(price) = prices.get(&coin) else {
            continue;
        };
        match pool
            .map_err(QueryError::from)
            .and_then(|raw| Ok(value_pool(&raw, price, as_of)?))
        {
            Ok(metrics) => {
                pools.insert(coin.clone(), metrics);
            }
            Err(e) => warn!("Omitting pool {}: {}", coin, e),
        }
        match collateral {
            Ok(raw) => match assess_collateral(&raw, price) {
                Ok(metrics) => {
                    collaterals.insert(coin.clone(), metrics);
                }
                Err(e) => warn!("Omitting collateral {}: {}", coin, e),
            },
            Err(e) if e.is_not_found() => debug!("{} is not a collateral", coin),
            Err(e) => warn!("Omitting collateral {}: {}", coin, e),
        }
    }
    MarketSnapshot {
        as_of,
        pools,
        collaterals,
    }
}

/// `base` followed by any coins of `extra` it does not already contain.
fn merge_coins(base: &[CoinName], extra: impl IntoIterator<Item = CoinName>) -> Vec<CoinName> {
    let mut coins = base.to_vec();
    for coin in extra {
        if !coins.contains(&coin) {
            coins.push(coin);
        }
    }
    coins
}

#[async_trait]
impl CoreQueries for MarketQuerier {
    async fn get_market_pools(
        &self,
        coins: Option<&[CoinName]>,
    ) -> Result<MarketSnapshot, QueryError> {
        let coins = coins.unwrap_or(self.coins.market.as_slice());
        let as_of = self.session.now();
        Ok(self.load_market(coins, as_of).await)
    }

    async fn get_obligation_account(
        &self,
        id: &ObligationId,
    ) -> Result<ObligationAccount, QueryError> {
        let obligation = self.session.ledger().fetch_obligation(id).await?;
        let as_of = self.session.now();
        let coins = merge_coins(&self.coins.market, obligation.coins());
        let market = self.load_market(&coins, as_of).await;
        Ok(build_obligation_account(
            &obligation,
            &market.pools,
            &market.collaterals,
        )?)
    }

    async fn get_lending(&self, coin: &CoinName, owner: &Address) -> Result<Lending, QueryError> {
        let as_of = self.session.now();
        let (raw_pool, spool) = join!(
            self.session.ledger().fetch_market_pool(coin),
            self.optional_spool(coin)
        );
        let raw_pool = raw_pool?;

        let reward_coin = spool.as_ref().map(|s| s.reward.coin.clone());
        let prices = self
            .fetch_prices(&merge_coins(std::slice::from_ref(coin), reward_coin))
            .await;
        let price = prices
            .get(coin)
            .ok_or_else(|| QueryError::PriceUnavailable(coin.clone()))?;

        let pool = value_pool(&raw_pool, price, as_of)?;
        self.lending_for(&pool, spool.as_ref(), owner, &prices, as_of)
            .await
    }
}

#[async_trait]
impl SpoolQueries for MarketQuerier {
    async fn get_spool(&self, coin: &CoinName) -> Result<SpoolMetrics, QueryError> {
        let ledger = self.session.ledger();
        let as_of = self.session.now();
        let (spool, raw_pool) = join!(ledger.fetch_spool(coin), ledger.fetch_market_pool(coin));
        let (spool, raw_pool) = (spool?, raw_pool?);

        let prices = self
            .fetch_prices(&merge_coins(
                std::slice::from_ref(coin),
                [spool.reward.coin.clone()],
            ))
            .await;
        let price = prices
            .get(coin)
            .ok_or_else(|| QueryError::PriceUnavailable(coin.clone()))?;
        let pool = value_pool(&raw_pool, price, as_of)?;
        Ok(value_spool(
            &spool,
            &pool,
            prices.get(&spool.reward.coin),
            as_of,
        ))
    }
}

#[async_trait]
impl BorrowIncentiveQueries for MarketQuerier {
    async fn get_borrow_incentive_pool(
        &self,
        coin: &CoinName,
    ) -> Result<IncentivePoolMetrics, QueryError> {
        let ledger = self.session.ledger();
        let as_of = self.session.now();
        let (incentive, raw_pool) = join!(
            ledger.fetch_borrow_incentive_pool(coin),
            ledger.fetch_market_pool(coin)
        );
        let (incentive, raw_pool) = (incentive?, raw_pool?);

        let reward_coins = incentive.points.iter().map(|p| p.reward.coin.clone());
        let prices = self
            .fetch_prices(&merge_coins(std::slice::from_ref(coin), reward_coins))
            .await;
        let price = prices
            .get(coin)
            .ok_or_else(|| QueryError::PriceUnavailable(coin.clone()))?;
        let pool = value_pool(&raw_pool, price, as_of)?;
        Ok(value_incentive_pool(&incentive, &pool, &prices, as_of))
    }
}

#[async_trait]
impl VeScaQueries for MarketQuerier {
    async fn get_ve_sca(&self, key_id: &str) -> Result<VeScaMetrics, QueryError> {
        let key = self.session.ledger().fetch_ve_sca(key_id).await?;
        let as_of = self.session.now();
        let governance = &self.coins.governance;
        let prices = self.fetch_prices(std::slice::from_ref(governance)).await;
        Ok(value_ve_sca(
            &key,
            self.coins.governance_decimals,
            prices.get(governance),
            as_of,
        ))
    }

    async fn get_ve_scas(&self, owner: &Address) -> Result<Vec<VeScaMetrics>, QueryError> {
        let as_of = self.session.now();
        let governance = &self.coins.governance;
        let (keys, prices) = join!(
            self.load_ve_sca_keys(owner),
            self.fetch_prices(std::slice::from_ref(governance))
        );
        let price = prices.get(governance);
        Ok(keys
            .iter()
            .map(|k| value_ve_sca(k, self.coins.governance_decimals, price, as_of))
            .collect())
    }
}

#[async_trait]
impl PortfolioQueries for MarketQuerier {
    async fn get_user_portfolio(&self, owner: &Address) -> Result<Portfolio, QueryError> {
        let as_of = self.session.now();
        let ledger = self.session.ledger();

        let (obligations, spools, incentive_pools, ve_sca_keys) = join!(
            self.load_obligations(owner),
            self.load_spools(),
            self.load_incentive_pools(),
            self.load_ve_sca_keys(owner)
        );
        let obligations = obligations?;

        let market_coins = merge_coins(
            &self.coins.market,
            obligations.iter().flat_map(|o| o.coins()),
        );
        let reward_coins = spools
            .values()
            .map(|s| s.reward.coin.clone())
            .chain(
                incentive_pools
                    .values()
                    .flat_map(|p| p.points.iter().map(|pt| pt.reward.coin.clone())),
            )
            .chain(std::iter::once(self.coins.governance.clone()));
        let price_coins = merge_coins(&market_coins, reward_coins);

        let (prices, records) = join!(
            self.fetch_prices(&price_coins),
            self.fetch_market_records(&market_coins)
        );
        let market = value_market(records, &prices, as_of);

        let (prices, spools, incentive_pools, market) = (&prices, &spools, &incentive_pools, &market);
        let lending_futures = market
            .pools
            .values()
            .filter(|pool| self.coins.market.contains(&pool.coin))
            .map(|pool| async move {
                let result = self
                    .lending_for(pool, spools.get(&pool.coin), owner, prices, as_of)
                    .await;
                (pool.coin.clone(), result)
            });
        let borrowing_futures = obligations.iter().map(|obligation| async move {
            let account =
                build_obligation_account(obligation, &market.pools, &market.collaterals)?;
            let incentive_accounts = match ledger.fetch_incentive_accounts(&obligation.id).await {
                Ok(accounts) => accounts,
                Err(e) => {
                    warn!(
                        "Incentive accounts unavailable for {}: {}",
                        obligation.id, e
                    );
                    Vec::new()
                }
            };
            Ok::<_, QueryError>(build_borrowing(
                account,
                incentive_pools,
                &incentive_accounts,
                prices,
                as_of,
            ))
        });
        let (lendings, borrowings) = join!(join_all(lending_futures), join_all(borrowing_futures));

        let lendings = lendings
            .into_iter()
            .filter_map(|(coin, result)| match result {
                Ok(lending) => Some(lending),
                Err(e) => {
                    warn!("Omitting lending {}: {}", coin, e);
                    None
                }
            })
            .collect();
        let borrowings = obligations
            .iter()
            .zip(borrowings)
            .filter_map(|(obligation, result)| match result {
                Ok(borrowing) => Some(borrowing),
                Err(e) => {
                    warn!("Omitting obligation {}: {}", obligation.id, e);
                    None
                }
            })
            .collect();

        let governance_price = prices.get(&self.coins.governance);
        let ve_scas = ve_sca_keys
            .iter()
            .map(|k| value_ve_sca(k, self.coins.governance_decimals, governance_price, as_of))
            .collect();

        Ok(summarize_portfolio(
            owner.clone(),
            as_of,
            lendings,
            borrowings,
            ve_scas,
        ))
    }
}
