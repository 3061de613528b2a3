//! The candidate-route finder (C4, spec §4.3): bounded BFS over the
//! bipartite denom/pool graph.

use std::collections::{HashSet, VecDeque};

use crate::domain::{Denom, Pool, PoolId};
use crate::pool::store::PoolStore;

use super::route::CandidateRoute;

#[derive(Debug, Clone)]
pub struct FindRoutesParams {
    pub token_in_denom: Denom,
    pub token_out_denom: Denom,
    pub max_routes: usize,
    pub max_pools_per_route: usize,
    pub min_pool_liquidity_cap: u128,
    pub preferred_pool_ids: HashSet<PoolId>,
    pub skip_pool_ids: HashSet<PoolId>,
}

struct PartialPath {
    pools: Vec<PoolId>,
    denoms: Vec<Denom>,
    visited: HashSet<PoolId>,
}

/// Pre-filter: drop low-liquidity pools, non-canonical orderbook pools, and
/// explicitly skip-listed pools (spec §4.3 step 2).
fn eligible_pools(store: &PoolStore, params: &FindRoutesParams) -> Vec<Pool> {
    store
        .get_all()
        .into_iter()
        .filter(|p| p.liquidity_cap >= params.min_pool_liquidity_cap)
        .filter(|p| !p.is_orderbook() || store.is_canonical(p.id))
        .filter(|p| !params.skip_pool_ids.contains(&p.id))
        .collect()
}

/// For each denom, the pools touching it, sorted by liquidity cap
/// descending with a small boost for preferred pool ids (spec §4.3 step 2).
fn index_by_denom(
    pools: &[Pool],
    preferred: &HashSet<PoolId>,
) -> std::collections::HashMap<Denom, Vec<PoolId>> {
    let mut index: std::collections::HashMap<Denom, Vec<(PoolId, u128)>> =
        std::collections::HashMap::new();
    for pool in pools {
        for denom in &pool.denoms {
            let boost = if preferred.contains(&pool.id) { 1 } else { 0 };
            let score = pool.liquidity_cap.saturating_add(boost);
            index.entry(denom.clone()).or_default().push((pool.id, score));
        }
    }
    index
        .into_iter()
        .map(|(denom, mut entries)| {
            entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
            (denom, entries.into_iter().map(|(id, _)| id).collect())
        })
        .collect()
}

pub fn find_candidate_routes(store: &PoolStore, params: &FindRoutesParams) -> Vec<CandidateRoute> {
    if params.token_in_denom == params.token_out_denom {
        return Vec::new();
    }

    let pools = eligible_pools(store, params);
    let by_pool_id: std::collections::HashMap<PoolId, &Pool> =
        pools.iter().map(|p| (p.id, p)).collect();
    let denom_index = index_by_denom(&pools, &params.preferred_pool_ids);

    let mut accepted: Vec<CandidateRoute> = Vec::new();
    let mut frontier: VecDeque<PartialPath> = VecDeque::new();
    frontier.push_back(PartialPath {
        pools: Vec::new(),
        denoms: vec![params.token_in_denom.clone()],
        visited: HashSet::new(),
    });

    while let Some(path) = frontier.pop_front() {
        if accepted.len() >= params.max_routes {
            break;
        }
        let current_denom = path.denoms.last().unwrap().clone();
        let Some(candidate_pool_ids) = denom_index.get(&current_denom) else {
            continue;
        };

        for &pool_id in candidate_pool_ids {
            if path.visited.contains(&pool_id) {
                continue;
            }
            let Some(pool) = by_pool_id.get(&pool_id) else {
                continue;
            };
            for other_denom in pool.other_denoms(&current_denom) {
                let mut next_pools = path.pools.clone();
                next_pools.push(pool_id);
                let mut next_denoms = path.denoms.clone();
                next_denoms.push(other_denom.clone());
                let mut next_visited = path.visited.clone();
                next_visited.insert(pool_id);

                if other_denom == &params.token_out_denom {
                    let candidate = CandidateRoute {
                        has_canonical_orderbook: next_pools
                            .iter()
                            .any(|id| by_pool_id.get(id).map_or(false, |p| p.is_orderbook())),
                        pools: next_pools,
                        denoms: next_denoms,
                    };
                    if !accepted.iter().any(|existing| candidate.is_subset_of(existing)) {
                        accepted.push(candidate);
                        if accepted.len() >= params.max_routes {
                            break;
                        }
                    }
                } else if next_pools.len() < params.max_pools_per_route {
                    frontier.push_back(PartialPath {
                        pools: next_pools,
                        denoms: next_denoms,
                        visited: next_visited,
                    });
                }
            }
            if accepted.len() >= params.max_routes {
                break;
            }
        }
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BalancerPayload, PoolPayload, PoolType, SpreadFactor};
    use std::collections::HashMap;

    fn balancer(id: PoolId, a: &str, b: &str, cap: u128) -> Pool {
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
            liquidity_cap: cap,
            taker_fee_override: None,
            payload: PoolPayload::Balancer(BalancerPayload { weights }),
        }
    }

    #[test]
    fn finds_direct_and_two_hop_routes() {
        let store = PoolStore::new();
        store.store(vec![
            balancer(1, "A", "B", 100),
            balancer(2, "B", "C", 100),
            balancer(3, "A", "C", 50),
        ]);
        let params = FindRoutesParams {
            token_in_denom: "A".to_string(),
            token_out_denom: "C".to_string(),
            max_routes: 10,
            max_pools_per_route: 3,
            min_pool_liquidity_cap: 0,
            preferred_pool_ids: HashSet::new(),
            skip_pool_ids: HashSet::new(),
        };
        let routes = find_candidate_routes(&store, &params);
        assert!(routes.iter().any(|r| r.pools == vec![3]));
        assert!(routes.iter().any(|r| r.pools == vec![1, 2]));
    }

    #[test]
    fn respects_max_pools_per_route() {
        let store = PoolStore::new();
        store.store(vec![balancer(1, "A", "B", 100), balancer(2, "B", "C", 100)]);
        let params = FindRoutesParams {
            token_in_denom: "A".to_string(),
            token_out_denom: "C".to_string(),
            max_routes: 10,
            max_pools_per_route: 1,
            min_pool_liquidity_cap: 0,
            preferred_pool_ids: HashSet::new(),
            skip_pool_ids: HashSet::new(),
        };
        let routes = find_candidate_routes(&store, &params);
        assert!(routes.is_empty());
    }

    #[test]
    fn same_denom_yields_no_routes() {
        let store = PoolStore::new();
        let params = FindRoutesParams {
            token_in_denom: "A".to_string(),
            token_out_denom: "A".to_string(),
            max_routes: 10,
            max_pools_per_route: 3,
            min_pool_liquidity_cap: 0,
            preferred_pool_ids: HashSet::new(),
            skip_pool_ids: HashSet::new(),
        };
        assert!(find_candidate_routes(&store, &params).is_empty());
    }
}
