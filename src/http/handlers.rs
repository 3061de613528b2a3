//! Axum handlers for the HTTP surface (spec §6). Each handler is a thin
//! adapter: parse the query, call into the query core, shape the response.

use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::domain::{Coin, Denom, Pool, PoolId};
use crate::error::{AppError, AppResult};
use crate::pool::GetFilteredParams;
use crate::pricing::GetPriceOpts;
use crate::quote::{evaluate_route, quote};
use crate::router::cache::{candidate_route_key, ranked_route_key};
use crate::router::{find_candidate_routes, CandidateRoute, FindRoutesParams};

use super::dto::*;
use super::AppState;

/// `token_in` query values are `<amount><denom>`, e.g. `1000000uosmo` — the
/// same shape the chain itself uses for coin amounts.
fn parse_token_in(raw: &str) -> AppResult<Coin> {
    let split_at = raw
        .find(|c: char| !c.is_ascii_digit())
        .filter(|&i| i > 0)
        .ok_or_else(|| AppError::BadRequest(format!("invalid token_in {raw:?}")))?;
    let (amount_str, denom) = raw.split_at(split_at);
    let amount: u128 = amount_str
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid token_in amount {amount_str:?}")))?;
    Ok(Coin::new(denom.to_string(), amount))
}

fn route_dto_from_quote(result: &crate::quote::QuoteResult) -> Vec<RouteHopDto> {
    match &result.split {
        Some(split) => split
            .allocations
            .iter()
            .map(|a| RouteHopDto {
                pools: a.route.pools.clone(),
                in_amount: a.amount_in.to_string(),
                out_amount: a.amount_out.to_string(),
            })
            .collect(),
        None => vec![RouteHopDto {
            pools: result.hops.iter().map(|h| h.pool_id).collect(),
            in_amount: result.amount_in.to_string(),
            out_amount: result.amount_out.to_string(),
        }],
    }
}

/// Input-weighted average of `takerFee + poolSpreadFactor` across the best
/// route's hops (spec §6 `effective_fee`), only computed when the caller asks
/// for it via `appendBaseFee` — otherwise it's zero cost to the caller.
fn effective_fee(
    store: &crate::pool::store::PoolStore,
    fees: &crate::fees::TakerFeeTable,
    result: &crate::quote::QuoteResult,
) -> String {
    if result.amount_in == 0 {
        return "0".to_string();
    }
    let mut weighted = 0f64;
    for hop in &result.hops {
        let Some(pool) = store.get(hop.pool_id) else { continue };
        let fee = pool.taker_fee_override.unwrap_or_else(|| fees.get(&pool.denoms[0], &pool.denoms[1]));
        let combined = (fee.0 as u128 + pool.spread_factor.0 as u128) as f64
            / crate::domain::SpreadFactor::PRECISION as f64;
        let weight = hop.in_amount as f64 / result.amount_in as f64;
        weighted += combined * weight;
    }
    format!("{weighted:.6}")
}

pub async fn quote_handler(
    State(state): State<AppState>,
    Query(query): Query<QuoteQuery>,
) -> AppResult<Json<QuoteResponseDto>> {
    let token_in = parse_token_in(&query.token_in)?;

    let mut cfg = state.router_cfg.clone();
    if query.single_route {
        cfg.max_split_routes = 1;
    }

    let token_in_denom = token_in.denom.clone();
    let token_out_denom = query.token_out_denom.clone();

    let routes = {
        let store = state.store.clone();
        let params = FindRoutesParams {
            token_in_denom: token_in_denom.clone(),
            token_out_denom: token_out_denom.clone(),
            max_routes: cfg.max_routes,
            max_pools_per_route: cfg.max_pools_per_route,
            min_pool_liquidity_cap: cfg.min_pool_liquidity_cap,
            preferred_pool_ids: Default::default(),
            skip_pool_ids: Default::default(),
        };
        state
            .candidate_cache
            .get_or_compute(candidate_route_key(&token_in_denom, &token_out_denom), move || async move {
                find_candidate_routes(&store, &params)
            })
            .await
    };

    let ranked_key = ranked_route_key(&token_in_denom, &token_out_denom, token_in.amount);
    let result = {
        let store = state.store.clone();
        let fees = state.fees.clone();
        let routes = routes.clone();
        let token_in = token_in.clone();
        let token_out_denom = token_out_denom.clone();
        let cfg = cfg.clone();
        state
            .ranked_cache
            .get_or_compute(ranked_key, move || async move {
                quote(&store, &fees, routes, &token_in, &token_out_denom, &cfg)
            })
            .await?
    };

    Ok(Json(QuoteResponseDto {
        amount_in: result.amount_in.to_string(),
        amount_out: result.amount_out.to_string(),
        route: route_dto_from_quote(&result),
        effective_fee: if query.append_base_fee {
            effective_fee(&state.store, &state.fees, &result)
        } else {
            "0".to_string()
        },
        price_impact: result.price_impact,
    }))
}

/// Walks the caller-forced pool sequence, threading each hop's output denom
/// into the next hop — the last hop is required to land on `token_out_denom`.
fn build_custom_route(
    store: &crate::pool::store::PoolStore,
    token_in_denom: &Denom,
    token_out_denom: &Denom,
    pool_ids: &[PoolId],
) -> AppResult<CandidateRoute> {
    let mut denoms = vec![token_in_denom.clone()];
    for (i, &pool_id) in pool_ids.iter().enumerate() {
        let pool = store.get(pool_id).ok_or_else(|| AppError::NotFound(format!("pool {pool_id}")))?;
        let current = denoms.last().unwrap();
        let is_last = i == pool_ids.len() - 1;
        let next = if is_last && pool.has_denom(token_out_denom) {
            token_out_denom.clone()
        } else {
            pool.other_denoms(current)
                .next()
                .cloned()
                .ok_or_else(|| AppError::BadRequest(format!("pool {pool_id} has no hop out of {current}")))?
        };
        denoms.push(next);
    }
    if denoms.last().map(String::as_str) != Some(token_out_denom.as_str()) {
        return Err(AppError::BadRequest(format!(
            "forced pool sequence does not reach {token_out_denom}"
        )));
    }
    Ok(CandidateRoute {
        has_canonical_orderbook: pool_ids.iter().any(|id| store.is_canonical(*id)),
        pools: pool_ids.to_vec(),
        denoms,
    })
}

pub async fn custom_direct_quote_handler(
    State(state): State<AppState>,
    Query(query): Query<CustomDirectQuoteQuery>,
) -> AppResult<Json<QuoteResponseDto>> {
    let token_in = parse_token_in(&query.token_in)?;
    let pool_ids: Vec<PoolId> = query
        .pool_ids
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<PoolId>().map_err(|_| AppError::BadRequest(format!("invalid poolID {s:?}"))))
        .collect::<Result<_, _>>()?;
    if pool_ids.is_empty() {
        return Err(AppError::BadRequest("poolID must name at least one pool".to_string()));
    }

    let route = build_custom_route(&state.store, &token_in.denom, &query.token_out_denom, &pool_ids)?;
    let ranked = evaluate_route(&state.store, &state.fees, &route, token_in.amount)?;
    if ranked.amount_out == 0 {
        return Err(AppError::BadRequest("quote produced zero amount out".to_string()));
    }

    Ok(Json(QuoteResponseDto {
        amount_in: token_in.amount.to_string(),
        amount_out: ranked.amount_out.to_string(),
        route: vec![RouteHopDto {
            pools: pool_ids,
            in_amount: token_in.amount.to_string(),
            out_amount: ranked.amount_out.to_string(),
        }],
        effective_fee: "0".to_string(),
        price_impact: 0.0,
    }))
}

fn pool_to_dto(pool: &Pool) -> PoolDto {
    let balances = pool
        .balances
        .iter()
        .map(|(denom, amount)| (denom.clone(), amount.to_string()))
        .collect();
    PoolDto {
        chain_model: serde_json::to_value(&pool.payload).unwrap_or(serde_json::Value::Null),
        balances,
        pool_type: format!("{:?}", pool.pool_type),
        spread_factor: pool.spread_factor.0.to_string(),
        liquidity_cap: pool.liquidity_cap.to_string(),
        liquidity_cap_error: None,
    }
}

pub async fn pools_handler(
    State(state): State<AppState>,
    Query(query): Query<PoolsQuery>,
) -> AppResult<Json<Vec<PoolDto>>> {
    let pool_ids = query
        .ids
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<PoolId>().map_err(|_| AppError::BadRequest(format!("invalid pool id {s:?}"))))
                .collect::<Result<HashSet<_>, _>>()
        })
        .transpose()?;

    let params = GetFilteredParams {
        min_liquidity_cap: query.min_liquidity_cap,
        pool_ids,
    };
    let pools = state.store.get_filtered(&params);
    Ok(Json(pools.iter().map(pool_to_dto).collect()))
}

pub async fn pool_ticks_handler(
    State(state): State<AppState>,
    Path(pool_id): Path<PoolId>,
) -> AppResult<Json<serde_json::Value>> {
    let pool = state
        .store
        .get(pool_id)
        .ok_or_else(|| AppError::NotFound(format!("pool {pool_id}")))?;

    let ticks = match &pool.payload {
        crate::domain::PoolPayload::ConcentratedLiquidity(cl) => serde_json::to_value(&cl.ticks),
        crate::domain::PoolPayload::OrderBook(ob) => serde_json::to_value(&ob.ticks),
        _ => return Err(AppError::BadRequest(format!("pool {pool_id} has no tick model"))),
    }
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(ticks))
}

pub async fn canonical_orderbook_handler(
    State(state): State<AppState>,
    Query(query): Query<CanonicalOrderbookQuery>,
) -> AppResult<Json<CanonicalOrderbookDto>> {
    let canon = state
        .store
        .get_canonical_orderbook(&query.base, &query.quote)
        .ok_or_else(|| AppError::NotFound(format!("canonical orderbook for {}/{}", query.base, query.quote)))?;
    Ok(Json(CanonicalOrderbookDto {
        base: canon.base,
        quote: canon.quote,
        pool_id: canon.pool_id,
        contract_address: canon.contract_address,
    }))
}

pub async fn canonical_orderbooks_handler(
    State(state): State<AppState>,
) -> Json<Vec<CanonicalOrderbookDto>> {
    let all = state
        .store
        .get_all_canonical_orderbooks()
        .into_iter()
        .map(|canon| CanonicalOrderbookDto {
            base: canon.base,
            quote: canon.quote,
            pool_id: canon.pool_id,
            contract_address: canon.contract_address,
        })
        .collect();
    Json(all)
}

pub async fn tokens_prices_handler(
    State(state): State<AppState>,
    Query(query): Query<PricesQuery>,
) -> AppResult<Json<PricesResponseDto>> {
    let mut response: PricesResponseDto = Default::default();
    let opts = GetPriceOpts::default();

    for base in query.base.split(',').filter(|s| !s.is_empty()) {
        let base = base.to_string();
        let price = match state.prices.get(&base, &query.quote) {
            Some(entry) => Some(entry.price.to_string()),
            None => match state.chain_source.get_price(&base, &query.quote, &opts).await {
                Ok(p) => Some(p.to_string()),
                Err(_) => match &state.external_source {
                    Some(external) => external
                        .get_price(&base, &query.quote)
                        .await
                        .ok()
                        .map(|p| p.to_string()),
                    None => None,
                },
            },
        };
        if let Some(price) = price {
            response
                .entry(base)
                .or_default()
                .insert(query.quote.clone(), price);
        }
    }
    Ok(Json(response))
}

pub async fn tokens_pool_metadata_handler(
    State(state): State<AppState>,
) -> Json<PoolMetadataResponseDto> {
    let mut response: PoolMetadataResponseDto = Default::default();
    for pool in state.store.get_all() {
        for denom in &pool.denoms {
            let entry = response.entry(denom.clone()).or_insert_with(|| PoolMetadataEntryDto {
                total_liquidity: Default::default(),
                total_liquidity_cap: "0".to_string(),
                price: None,
            });
            let balance = pool.balances.get(denom).copied().unwrap_or(0);
            let running: u128 = entry
                .total_liquidity
                .get(denom)
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            entry.total_liquidity.insert(denom.clone(), (running + balance).to_string());
            let running_cap: u128 = entry.total_liquidity_cap.parse().unwrap_or(0);
            entry.total_liquidity_cap = (running_cap + pool.liquidity_cap).to_string();
        }
    }
    for (denom, entry) in response.iter_mut() {
        entry.price = state
            .prices
            .get(denom, &state.default_quote_denom)
            .map(|p| p.price.to_string());
    }
    Json(response)
}

pub async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    if state.readiness.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
