use lendscope::datasource::{FallbackPriceSource, HermesPriceSource};
use lendscope::{api, config::Config, IndexerDataSource, MarketQuerier, PriceSource, QuerySession};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    let indexer = Arc::new(IndexerDataSource::new(config.indexer_api_url.clone()));
    let prices: Arc<dyn PriceSource> = match &config.hermes_api_url {
        Some(url) => {
            tracing::info!("Using Hermes prices from {} with indexer fallback", url);
            let hermes = Arc::new(HermesPriceSource::new(
                url.clone(),
                config.price_feed_ids.clone(),
            ));
            Arc::new(FallbackPriceSource::new(hermes, indexer.clone()))
        }
        None => indexer.clone(),
    };

    let session = QuerySession::new(indexer, prices)
        .with_cache(Duration::from_millis(config.cache_ttl_ms));
    let querier = MarketQuerier::new(session, config.coins.clone());

    // Create router
    let app = api::create_router(api::AppState::new(querier));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
