//! HTTP surface integration tests: build the axum `Router` in-process and
//! drive it with `tower::ServiceExt::oneshot`, the same way the teacher
//! favors in-process exercising over spinning up a real listener.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use sqs_core::domain::{BalancerPayload, Pool, PoolPayload, PoolType, SpreadFactor};
use sqs_core::fees::TakerFeeTable;
use sqs_core::http::readiness::ReadinessTracker;
use sqs_core::http::{router, AppState};
use sqs_core::pool::store::PoolStore;
use sqs_core::pricing::{ChainPricingSource, PricesTable};
use sqs_core::router::cache::SingleFlightCache;
use sqs_core::router::RouterConfig;
use sqs_core::tokens::TokenMetadataTable;

fn balancer_pool(id: u64, denom_a: &str, denom_b: &str, balance_a: u128, balance_b: u128) -> Pool {
    let mut balances = HashMap::new();
    balances.insert(denom_a.to_string(), balance_a);
    balances.insert(denom_b.to_string(), balance_b);
    let mut weights = HashMap::new();
    weights.insert(denom_a.to_string(), 1);
    weights.insert(denom_b.to_string(), 1);
    Pool {
        id,
        pool_type: PoolType::Balancer,
        denoms: vec![denom_a.to_string(), denom_b.to_string()],
        balances,
        spread_factor: SpreadFactor(SpreadFactor::PRECISION / 1000), // 0.1%
        liquidity_cap: balance_a + balance_b,
        taker_fee_override: None,
        payload: PoolPayload::Balancer(BalancerPayload { weights }),
    }
}

fn test_state() -> AppState {
    let store = Arc::new(PoolStore::new());
    store.store(vec![balancer_pool(1, "uosmo", "uusdc", 1_000_000_000, 2_000_000_000)]);

    let fees = Arc::new(TakerFeeTable::new(SpreadFactor::ZERO));
    let metadata = Arc::new(TokenMetadataTable::new());
    let prices = Arc::new(PricesTable::new());
    let chain_source = Arc::new(ChainPricingSource::new(
        store.clone(),
        fees.clone(),
        metadata.clone(),
        Duration::from_secs(5),
    ));

    AppState {
        store,
        fees,
        prices,
        metadata,
        chain_source,
        external_source: None,
        router_cfg: RouterConfig::default(),
        candidate_cache: Arc::new(SingleFlightCache::new(Duration::from_secs(30))),
        ranked_cache: Arc::new(SingleFlightCache::new(Duration::from_secs(5))),
        readiness: Arc::new(ReadinessTracker::new(Duration::from_secs(30))),
        default_quote_denom: "uusdc".to_string(),
    }
}

#[tokio::test]
async fn pools_endpoint_lists_stored_pools() {
    let app = router(test_state());
    let response = app
        .oneshot(Request::builder().uri("/pools").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let pools: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0]["type"], "Balancer");
}

#[tokio::test]
async fn quote_endpoint_swaps_through_the_only_pool() {
    let app = router(test_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/router/quote?tokenIn=1000000uosmo&tokenOutDenom=uusdc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let quote: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let amount_out: u128 = quote["amount_out"].as_str().unwrap().parse().unwrap();
    assert!(amount_out > 0, "expected a nonzero swap output, got {amount_out}");
}

#[tokio::test]
async fn quote_endpoint_rejects_unroutable_pair() {
    let app = router(test_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/router/quote?tokenIn=1000000uosmo&tokenOutDenom=unonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn quote_endpoint_rejects_malformed_token_in() {
    let app = router(test_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/router/quote?tokenIn=notanumber&tokenOutDenom=uusdc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn custom_direct_quote_forces_the_given_pool_sequence() {
    let app = router(test_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/router/custom-direct-quote?tokenIn=1000000uosmo&tokenOutDenom=uusdc&poolID=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn custom_direct_quote_rejects_a_sequence_missing_a_pool() {
    let app = router(test_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/router/custom-direct-quote?tokenIn=1000000uosmo&tokenOutDenom=uusdc&poolID=999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn readiness_is_false_until_both_signals_have_fired() {
    let state = test_state();
    let app = router(state.clone());
    let response = app
        .oneshot(Request::builder().uri("/system/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    state.readiness.record_commit();
    state.readiness.record_prices_update();
    let app = router(state);
    let response = app
        .oneshot(Request::builder().uri("/system/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn pool_ticks_rejects_pools_without_a_tick_model() {
    let app = router(test_state());
    let response = app
        .oneshot(Request::builder().uri("/pools/ticks/1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
