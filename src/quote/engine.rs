//! The quote engine (C5, spec §4.4): evaluates candidate routes against pool
//! kernels, ranks survivors, and optionally splits across several.

use crate::domain::{Coin, Pool, PoolId, PoolType};
use crate::error::{PoolMathError, QuoteError, RouterError};
use crate::fees::TakerFeeTable;
use crate::pool::store::PoolStore;
use crate::pool::{calc_spot_price, calculate_token_out_by_token_in, charge_taker_fee_exact_in};
use crate::router::{CandidateRoute, HopResult, RankedRoute, RouterConfig};

use super::split::{split_route, SplitResult};

fn get_pool_or_err(store: &PoolStore, pool_id: PoolId, denom: &str) -> Result<Pool, PoolMathError> {
    store
        .get(pool_id)
        .ok_or_else(|| PoolMathError::InsufficientLiquidity { pool_id, denom: denom.to_string() })
}

/// Evaluate one route sequentially: charge the taker fee on the running
/// input, call the hop's kernel, thread the output into the next hop.
pub fn evaluate_route(
    store: &PoolStore,
    fees: &TakerFeeTable,
    route: &CandidateRoute,
    amount_in: u128,
) -> Result<RankedRoute, PoolMathError> {
    let mut current = Coin::new(route.denoms[0].clone(), amount_in);
    let mut hops = Vec::with_capacity(route.pools.len());
    let mut cumulative_spread = 0u128;

    for (i, &pool_id) in route.pools.iter().enumerate() {
        let denom_out = &route.denoms[i + 1];
        let pool = get_pool_or_err(store, pool_id, denom_out)?;
        let fee = pool
            .taker_fee_override
            .unwrap_or_else(|| fees.get(&current.denom, denom_out));
        let taxed_in = charge_taker_fee_exact_in(&current, fee);
        let out = calculate_token_out_by_token_in(&pool, &taxed_in, denom_out)?;

        cumulative_spread += fee.0 as u128 + pool.spread_factor.0 as u128;
        hops.push(HopResult {
            pool_id,
            in_amount: current.amount,
            out_amount: out.amount,
        });
        current = out;
    }

    Ok(RankedRoute {
        route: route.clone(),
        hops,
        amount_out: current.amount,
        cumulative_spread_factor_numer: cumulative_spread,
    })
}

/// Rank by `amountOut` descending, then fewer hops, then lower cumulative
/// spread factor, then lower smallest pool id (spec §4.4 step 2).
fn rank(mut survivors: Vec<RankedRoute>) -> Vec<RankedRoute> {
    survivors.sort_by(|a, b| {
        b.amount_out
            .cmp(&a.amount_out)
            .then(a.route.hop_count().cmp(&b.route.hop_count()))
            .then(a.cumulative_spread_factor_numer.cmp(&b.cumulative_spread_factor_numer))
            .then(a.route.smallest_pool_id().cmp(&b.route.smallest_pool_id()))
    });
    survivors
}

/// Drop any lower-ranked route whose pool-id set is a subset of a
/// higher-ranked route's (spec §4.4 step 3).
fn filter_duplicates(ranked: Vec<RankedRoute>) -> Vec<RankedRoute> {
    let mut kept: Vec<RankedRoute> = Vec::with_capacity(ranked.len());
    for candidate in ranked {
        let is_dup = kept.iter().any(|higher| candidate.route.is_subset_of(&higher.route));
        if !is_dup {
            kept.push(candidate);
        }
    }
    kept
}

fn route_contains_cosmwasm(store: &PoolStore, route: &CandidateRoute) -> bool {
    route
        .pools
        .iter()
        .any(|id| store.get(*id).map_or(false, |p| p.pool_type == PoolType::GeneralizedCosmWasm))
}

#[derive(Debug, Clone)]
pub struct QuoteResult {
    pub amount_in: u128,
    pub amount_out: u128,
    pub hops: Vec<HopResult>,
    pub split: Option<SplitResult>,
    pub price_impact: f64,
}

pub fn quote(
    store: &PoolStore,
    fees: &TakerFeeTable,
    routes: Vec<CandidateRoute>,
    token_in: &Coin,
    token_out_denom: &str,
    router_cfg: &RouterConfig,
) -> Result<QuoteResult, QuoteError> {
    if routes.is_empty() {
        return Err(QuoteError::NoRoutes(RouterError::NoRoutesFound {
            token_in: token_in.denom.clone(),
            token_out: token_out_denom.to_string(),
        }));
    }

    let mut survivors = Vec::with_capacity(routes.len());
    let mut first_error: Option<PoolMathError> = None;
    for route in &routes {
        match evaluate_route(store, fees, route, token_in.amount) {
            Ok(r) => survivors.push(r),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    if survivors.is_empty() {
        return Err(QuoteError::AllRoutesFailed {
            count: routes.len(),
            first: first_error.expect("at least one route attempted"),
        });
    }

    let ranked = filter_duplicates(rank(survivors));
    let best = ranked.first().expect("non-empty after filtering");
    if best.amount_out == 0 {
        return Err(QuoteError::AmountOutZero);
    }

    let spot_price = spot_price_for_route(store, &best.route).unwrap_or(f64::NAN);
    let effective_price = token_in.amount as f64 / best.amount_out as f64;
    let price_impact = if spot_price.is_finite() && spot_price != 0.0 {
        (spot_price - effective_price) / spot_price
    } else {
        0.0
    };

    let split = if router_cfg.max_split_routes > 1
        && ranked.len() >= 2
        && !ranked
            .iter()
            .take(router_cfg.max_split_routes)
            .any(|r| route_contains_cosmwasm(store, &r.route))
    {
        let candidate_routes: Vec<CandidateRoute> = ranked.iter().map(|r| r.route.clone()).collect();
        Some(split_route(
            store,
            fees,
            &candidate_routes,
            token_in.amount,
            router_cfg.max_split_routes,
            router_cfg.max_split_iterations,
        ))
    } else {
        None
    };

    let amount_out = split.as_ref().map(|s| s.total_amount_out).unwrap_or(best.amount_out);

    Ok(QuoteResult {
        amount_in: token_in.amount,
        amount_out,
        hops: best.hops.clone(),
        split,
        price_impact,
    })
}

/// Product of per-hop spot prices at query time, used as the `priceImpact`
/// denominator baseline (spec §4.4 step 4).
fn spot_price_for_route(store: &PoolStore, route: &CandidateRoute) -> Option<f64> {
    let mut price = 1.0;
    for (i, &pool_id) in route.pools.iter().enumerate() {
        let pool = store.get(pool_id)?;
        let base = &route.denoms[i];
        let quote = &route.denoms[i + 1];
        price *= calc_spot_price(&pool, base, quote).ok()?;
    }
    Some(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BalancerPayload, PoolPayload, SpreadFactor};
    use std::collections::HashMap;

    fn balancer(id: PoolId, a: &str, b: &str) -> Pool {
        let mut balances = HashMap::new();
        balances.insert(a.to_string(), 1_000_000);
        balances.insert(b.to_string(), 1_000_000);
        let mut weights = HashMap::new();
        weights.insert(a.to_string(), 1);
        weights.insert(b.to_string(), 1);
        Pool {
            id,
            pool_type: PoolType::Balancer,
            denoms: vec![a.to_string(), b.to_string()],
            balances,
            spread_factor: SpreadFactor::ZERO,
            liquidity_cap: 100,
            taker_fee_override: None,
            payload: PoolPayload::Balancer(BalancerPayload { weights }),
        }
    }

    #[test]
    fn single_route_quote_matches_scenario_1() {
        let store = PoolStore::new();
        store.store(vec![balancer(1, "A", "B")]);
        let fees = TakerFeeTable::new(SpreadFactor::ZERO);
        let route = CandidateRoute {
            pools: vec![1],
            denoms: vec!["A".to_string(), "B".to_string()],
            has_canonical_orderbook: false,
        };
        let cfg = RouterConfig { max_split_routes: 1, ..RouterConfig::default() };
        let result = quote(&store, &fees, vec![route], &Coin::new("A", 1000), "B", &cfg).unwrap();
        assert!((result.amount_out as i64 - 999).abs() <= 1);
    }

    #[test]
    fn no_routes_is_not_found() {
        let store = PoolStore::new();
        let fees = TakerFeeTable::new(SpreadFactor::ZERO);
        let cfg = RouterConfig::default();
        let err = quote(&store, &fees, vec![], &Coin::new("A", 1000), "B", &cfg).unwrap_err();
        assert!(matches!(err, QuoteError::NoRoutes(_)));
    }
}
