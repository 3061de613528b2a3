//! Split routing (spec §4.4 step 5): coordinate descent over integer shares.

use crate::fees::TakerFeeTable;
use crate::pool::store::PoolStore;
use crate::router::CandidateRoute;

use super::engine::evaluate_route;

#[derive(Debug, Clone)]
pub struct SplitAllocation {
    pub route: CandidateRoute,
    pub shares: u32,
    pub amount_in: u128,
    pub amount_out: u128,
}

#[derive(Debug, Clone)]
pub struct SplitResult {
    pub allocations: Vec<SplitAllocation>,
    pub total_amount_out: u128,
}

fn amount_for_shares(shares: u32, total_shares: u32, amount_in: u128) -> u128 {
    (amount_in * shares as u128) / total_shares.max(1) as u128
}

fn evaluate_alloc(
    store: &PoolStore,
    fees: &TakerFeeTable,
    routes: &[CandidateRoute],
    shares: &[u32],
    total_shares: u32,
    amount_in: u128,
) -> (Vec<SplitAllocation>, u128) {
    let mut allocations = Vec::with_capacity(routes.len());
    let mut total = 0u128;
    for (route, &s) in routes.iter().zip(shares) {
        let amt = amount_for_shares(s, total_shares, amount_in);
        if amt == 0 {
            allocations.push(SplitAllocation {
                route: route.clone(),
                shares: s,
                amount_in: 0,
                amount_out: 0,
            });
            continue;
        }
        let amount_out = evaluate_route(store, fees, route, amt)
            .map(|r| r.amount_out)
            .unwrap_or(0);
        total += amount_out;
        allocations.push(SplitAllocation {
            route: route.clone(),
            shares: s,
            amount_in: amt,
            amount_out,
        });
    }
    (allocations, total)
}

/// Coordinate-descent over integer shares (spec §4.4 step 5): start with the
/// whole input on the best route, then repeatedly try shifting one share
/// from every donor to every acceptor, committing the strictly-best
/// improving move, until none improves.
pub fn split_route(
    store: &PoolStore,
    fees: &TakerFeeTable,
    candidates: &[CandidateRoute],
    amount_in: u128,
    max_split_routes: usize,
    max_split_iterations: u32,
) -> SplitResult {
    let routes: Vec<CandidateRoute> = candidates.iter().take(max_split_routes.max(1)).cloned().collect();

    if routes.len() < 2 || max_split_iterations == 0 {
        let (allocations, total) = evaluate_alloc(store, fees, &routes, &[1], 1, amount_in);
        return SplitResult { allocations, total_amount_out: total };
    }

    let total_shares = max_split_iterations;
    let mut shares = vec![0u32; routes.len()];
    shares[0] = total_shares;

    let (_, mut best_total) = evaluate_alloc(store, fees, &routes, &shares, total_shares, amount_in);

    for _ in 0..max_split_iterations {
        let mut best_move: Option<(usize, usize, u128)> = None;
        for donor in 0..shares.len() {
            if shares[donor] == 0 {
                continue;
            }
            for acceptor in 0..shares.len() {
                if acceptor == donor {
                    continue;
                }
                let mut trial = shares.clone();
                trial[donor] -= 1;
                trial[acceptor] += 1;
                let (_, total) = evaluate_alloc(store, fees, &routes, &trial, total_shares, amount_in);
                if total > best_total && best_move.map_or(true, |(_, _, t)| total > t) {
                    best_move = Some((donor, acceptor, total));
                }
            }
        }
        match best_move {
            Some((donor, acceptor, total)) => {
                shares[donor] -= 1;
                shares[acceptor] += 1;
                best_total = total;
            }
            None => break,
        }
    }

    let (allocations, total) = evaluate_alloc(store, fees, &routes, &shares, total_shares, amount_in);
    SplitResult { allocations, total_amount_out: total }
}
