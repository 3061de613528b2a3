//! Sidecar query server entry point: wires the pool store, fee table, quote
//! engine caches, pricing sources, and pricing worker together, then serves
//! the HTTP API and the ingest gRPC service side by side.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, Level};

use sqs_core::config::Config;
use sqs_core::domain::SpreadFactor;
use sqs_core::events::{block_committed_channel, prices_updated_channel};
use sqs_core::fees::TakerFeeTable;
use sqs_core::http::readiness::ReadinessTracker;
use sqs_core::http::{router, AppState};
use sqs_core::ingest::proto::generated::ingest_service_server::IngestServiceServer;
use sqs_core::ingest::IngestServer;
use sqs_core::pool::store::PoolStore;
use sqs_core::pricing::{ChainPricingSource, ExternalPricingSource, PricesTable, PricingWorker, PricingWorkerConfig};
use sqs_core::router::{cache::SingleFlightCache, RouterConfig};
use sqs_core::tokens::{HttpAssetListLoader, TokenMetadataTable};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        error!(error = %e, "fatal error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(config: Config) -> Result<()> {
    // Construction follows the unidirectional dependency order: storage
    // layers first, then the engines that read them, then the worker that
    // writes back into storage.
    let store = Arc::new(PoolStore::new());
    let fees = Arc::new(TakerFeeTable::new(SpreadFactor::ZERO));
    let metadata = Arc::new(TokenMetadataTable::new());
    let prices = Arc::new(PricesTable::new());

    let asset_loader = HttpAssetListLoader::new(config.asset_list_url.clone());
    if let Err(e) = metadata.reload(&asset_loader).await {
        error!(error = %e, "initial asset list load failed, starting with an empty token metadata table");
    }

    let chain_source = Arc::new(ChainPricingSource::new(
        store.clone(),
        fees.clone(),
        metadata.clone(),
        Duration::from_secs(config.pricing_cache_expiry_seconds),
    ));
    let external_source = config.external_pricing_base_url.as_ref().map(|url| {
        Arc::new(ExternalPricingSource::new(
            url.clone(),
            Duration::from_secs(config.pricing_cache_expiry_seconds),
        ))
    });

    let (block_committed_tx, block_committed_rx) = block_committed_channel();
    let (prices_updated_tx, prices_updated_rx) = prices_updated_channel();

    let pricing_worker = PricingWorker::new(
        store.clone(),
        chain_source.clone(),
        prices.clone(),
        metadata.clone(),
        PricingWorkerConfig {
            default_quote_denom: config.pricing_default_quote_denom.clone(),
            min_pool_liquidity_cap: config.pricing_min_pool_liquidity_cap,
            fanout_concurrency: config.pricing_fanout_concurrency,
        },
        prices_updated_tx,
    );

    let router_cfg = RouterConfig {
        max_routes: config.router_max_routes,
        max_pools_per_route: config.router_max_pools_per_route,
        min_pool_liquidity_cap: config.router_min_pool_liquidity_cap,
        max_split_routes: config.router_max_split_routes,
        max_split_iterations: config.router_max_split_iterations,
        candidate_route_cache_expiry_seconds: config.candidate_route_cache_expiry_seconds,
        ranked_route_cache_expiry_seconds: config.ranked_route_cache_expiry_seconds,
    };

    let readiness = Arc::new(ReadinessTracker::new(Duration::from_secs(config.readiness_threshold_seconds)));
    let mut readiness_block_rx = block_committed_tx.subscribe();
    let readiness_for_commits = readiness.clone();
    tokio::spawn(async move {
        while readiness_block_rx.recv().await.is_ok() {
            readiness_for_commits.record_commit();
        }
    });
    let mut readiness_prices_rx = prices_updated_rx;
    let readiness_for_prices = readiness.clone();
    tokio::spawn(async move {
        while readiness_prices_rx.recv().await.is_ok() {
            readiness_for_prices.record_prices_update();
        }
    });

    let state = AppState {
        store: store.clone(),
        fees: fees.clone(),
        prices: prices.clone(),
        metadata: metadata.clone(),
        chain_source: chain_source.clone(),
        external_source,
        router_cfg,
        candidate_cache: Arc::new(SingleFlightCache::new(Duration::from_secs(
            config.candidate_route_cache_expiry_seconds,
        ))),
        ranked_cache: Arc::new(SingleFlightCache::new(Duration::from_secs(
            config.ranked_route_cache_expiry_seconds,
        ))),
        readiness: readiness.clone(),
        default_quote_denom: config.pricing_default_quote_denom.clone(),
    };

    let http_app = router(state);
    let http_listener = tokio::net::TcpListener::bind(config.http_bind_addr).await?;
    info!(addr = %config.http_bind_addr, "http api listening");
    let http_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, http_app).await {
            error!(error = %e, "http server stopped");
        }
    });

    let ingest_server = IngestServer::new(store, fees, block_committed_tx);
    let ingest_addr = config.ingest_bind_addr;
    let max_ingest_message_bytes = config.max_ingest_message_bytes;
    info!(addr = %ingest_addr, "ingest rpc listening");
    let ingest_task = tokio::spawn(async move {
        let service = IngestServiceServer::new(ingest_server)
            .max_decoding_message_size(max_ingest_message_bytes)
            .max_encoding_message_size(max_ingest_message_bytes);
        if let Err(e) = tonic::transport::Server::builder().add_service(service).serve(ingest_addr).await {
            error!(error = %e, "ingest server stopped");
        }
    });

    let worker_task = tokio::spawn(pricing_worker.run(block_committed_rx));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
        _ = http_task => {}
        _ = ingest_task => {}
        _ = worker_task => {}
    }

    Ok(())
}
