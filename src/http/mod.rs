//! The HTTP API surface (spec §6): read-only JSON endpoints over the query
//! core, served by axum.

pub mod dto;
pub mod handlers;
pub mod readiness;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tower::timeout::TimeoutLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domain::Denom;
use crate::error::QuoteError;
use crate::fees::TakerFeeTable;
use crate::pool::store::PoolStore;
use crate::pricing::{ChainPricingSource, ExternalPricingSource, PricesTable};
use crate::quote::QuoteResult;
use crate::router::cache::SingleFlightCache;
use crate::router::{CandidateRoute, RouterConfig};
use crate::tokens::TokenMetadataTable;

use readiness::ReadinessTracker;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PoolStore>,
    pub fees: Arc<TakerFeeTable>,
    pub prices: Arc<PricesTable>,
    pub metadata: Arc<TokenMetadataTable>,
    pub chain_source: Arc<ChainPricingSource>,
    pub external_source: Option<Arc<ExternalPricingSource>>,
    pub router_cfg: RouterConfig,
    pub candidate_cache: Arc<SingleFlightCache<Vec<CandidateRoute>>>,
    pub ranked_cache: Arc<SingleFlightCache<Result<QuoteResult, QuoteError>>>,
    pub readiness: Arc<ReadinessTracker>,
    pub default_quote_denom: Denom,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/router/quote", get(handlers::quote_handler))
        .route("/router/custom-direct-quote", get(handlers::custom_direct_quote_handler))
        .route("/pools", get(handlers::pools_handler))
        .route("/pools/ticks/:id", get(handlers::pool_ticks_handler))
        .route("/pools/canonical-orderbook", get(handlers::canonical_orderbook_handler))
        .route("/pools/canonical-orderbooks", get(handlers::canonical_orderbooks_handler))
        .route("/tokens/prices", get(handlers::tokens_prices_handler))
        .route("/tokens/pool-metadata", get(handlers::tokens_pool_metadata_handler))
        .route("/system/ready", get(handlers::ready_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}
