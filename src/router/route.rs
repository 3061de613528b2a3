//! Route shapes shared by the finder (C4), quote engine (C5), and caches
//! (C6).

use std::collections::HashSet;

use crate::domain::{Denom, PoolId};

/// A path through the pool graph: `denoms.len() == pools.len() + 1`,
/// `denoms[0]` is the input denom and `denoms[i+1]` is the denom produced by
/// hop `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRoute {
    pub pools: Vec<PoolId>,
    pub denoms: Vec<Denom>,
    /// Set when the route's sole orderbook hop (if any) is the canonical
    /// orderbook for its pair — split routing only admits orderbook routes
    /// carrying this flag (spec §4.4 step 5).
    pub has_canonical_orderbook: bool,
}

impl CandidateRoute {
    pub fn hop_count(&self) -> usize {
        self.pools.len()
    }

    pub fn pool_id_set(&self) -> HashSet<PoolId> {
        self.pools.iter().copied().collect()
    }

    pub fn smallest_pool_id(&self) -> PoolId {
        self.pools.iter().copied().min().unwrap_or(PoolId::MAX)
    }

    /// `true` if this route's pool-id set is a subset of `other`'s — used by
    /// the finder's and the quote engine's duplicate filters (spec §4.3
    /// step 4, §4.4 step 3).
    pub fn is_subset_of(&self, other: &CandidateRoute) -> bool {
        let mine = self.pool_id_set();
        let theirs = other.pool_id_set();
        mine.is_subset(&theirs)
    }
}

/// One evaluated hop within a ranked route, for the HTTP response shape
/// (spec §6: `route:[{pools:[...], in_amount, out_amount}]`).
#[derive(Debug, Clone)]
pub struct HopResult {
    pub pool_id: PoolId,
    pub in_amount: u128,
    pub out_amount: u128,
}

/// A candidate route after full evaluation: per-hop results, total output,
/// and the tiebreak fields the quote engine ranks on.
#[derive(Debug, Clone)]
pub struct RankedRoute {
    pub route: CandidateRoute,
    pub hops: Vec<HopResult>,
    pub amount_out: u128,
    pub cumulative_spread_factor_numer: u128,
}

impl RankedRoute {
    pub fn amount_in(&self) -> u128 {
        self.hops.first().map(|h| h.in_amount).unwrap_or(0)
    }
}
