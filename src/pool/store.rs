//! The pool store (spec §4.2, C2): a concurrently-read, periodically
//! rewritten index of every pool plus a derived canonical-orderbook index.
//!
//! Pools live in a `DashMap` — the key space (pool ids across the whole
//! chain) is large and unbounded, matching spec §9's guidance to reach for
//! the concurrent-map primitive there. The canonical-orderbook index and its
//! companion "currently canonical" id set are small and bounded (one entry
//! per traded pair), so they use a plain `RwLock`-guarded map instead, per
//! the same design note.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use dashmap::DashMap;

use crate::domain::{pair_key, Denom, Pool, PoolId};

#[derive(Debug, Clone)]
pub struct CanonicalOrderbook {
    pub base: Denom,
    pub quote: Denom,
    pub pool_id: PoolId,
    pub contract_address: String,
    pub liquidity_cap: u128,
}

#[derive(Default)]
pub struct GetFilteredParams {
    pub min_liquidity_cap: Option<u128>,
    pub pool_ids: Option<HashSet<PoolId>>,
}

pub struct PoolStore {
    pools: DashMap<PoolId, Pool>,
    canonical: RwLock<HashMap<String, CanonicalOrderbook>>,
    canonical_pool_ids: RwLock<HashSet<PoolId>>,
}

impl PoolStore {
    pub fn new() -> Self {
        Self {
            pools: DashMap::new(),
            canonical: RwLock::new(HashMap::new()),
            canonical_pool_ids: RwLock::new(HashSet::new()),
        }
    }

    pub fn get(&self, pool_id: PoolId) -> Option<Pool> {
        self.pools.get(&pool_id).map(|r| r.value().clone())
    }

    /// A snapshot slice at call time. Concurrent `store` calls may add or
    /// overwrite entries during traversal but never remove one, so this
    /// never observes a torn pool.
    pub fn get_all(&self) -> Vec<Pool> {
        self.pools.iter().map(|r| r.value().clone()).collect()
    }

    pub fn get_filtered(&self, params: &GetFilteredParams) -> Vec<Pool> {
        self.pools
            .iter()
            .map(|r| r.value().clone())
            .filter(|p| {
                params
                    .min_liquidity_cap
                    .map_or(true, |min| p.liquidity_cap >= min)
            })
            .filter(|p| {
                params
                    .pool_ids
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&p.id))
            })
            .collect()
    }

    pub fn is_canonical(&self, pool_id: PoolId) -> bool {
        self.canonical_pool_ids.read().unwrap().contains(&pool_id)
    }

    pub fn get_canonical_orderbook(&self, base: &str, quote: &str) -> Option<CanonicalOrderbook> {
        self.canonical.read().unwrap().get(&pair_key(base, quote)).cloned()
    }

    pub fn get_all_canonical_orderbooks(&self) -> Vec<CanonicalOrderbook> {
        let mut all: Vec<_> = self.canonical.read().unwrap().values().cloned().collect();
        all.sort_by_key(|c| c.pool_id);
        all
    }

    /// The ingest commit path's only writer. Upserts every pool, then for
    /// each orderbook pool among them, replaces the canonical entry for its
    /// `(base, quote)` pair strictly-greater-than on `liquidity_cap` (spec
    /// §4.2, §8 scenario 5).
    pub fn store(&self, pools: Vec<Pool>) {
        for pool in pools {
            if let Some(ob) = pool.orderbook_payload() {
                let key = pair_key(&ob.base_denom, &ob.quote_denom);
                let candidate = CanonicalOrderbook {
                    base: ob.base_denom.clone(),
                    quote: ob.quote_denom.clone(),
                    pool_id: pool.id,
                    contract_address: ob.contract_address.clone(),
                    liquidity_cap: pool.liquidity_cap,
                };
                let mut canonical = self.canonical.write().unwrap();
                let mut canonical_ids = self.canonical_pool_ids.write().unwrap();
                match canonical.get(&key) {
                    Some(current) if candidate.liquidity_cap > current.liquidity_cap => {
                        canonical_ids.remove(&current.pool_id);
                        canonical_ids.insert(candidate.pool_id);
                        canonical.insert(key, candidate);
                    }
                    None => {
                        canonical_ids.insert(candidate.pool_id);
                        canonical.insert(key, candidate);
                    }
                    Some(_) => {}
                }
            }
            self.pools.insert(pool.id, pool);
        }
    }
}

impl Default for PoolStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderBookPayload, PoolPayload, PoolType, SpreadFactor};

    fn ob_pool(id: PoolId, base: &str, quote: &str, cap: u128) -> Pool {
        Pool {
            id,
            pool_type: PoolType::OrderBook,
            denoms: vec![base.to_string(), quote.to_string()],
            balances: Default::default(),
            spread_factor: SpreadFactor::ZERO,
            liquidity_cap: cap,
            taker_fee_override: None,
            payload: PoolPayload::OrderBook(OrderBookPayload {
                base_denom: base.to_string(),
                quote_denom: quote.to_string(),
                next_bid_tick: 0,
                next_ask_tick: 0,
                ticks: vec![],
                contract_address: format!("osmo1ob{id}"),
            }),
        }
    }

    #[test]
    fn canonical_orderbook_tracks_max_liquidity_cap() {
        let store = PoolStore::new();
        store.store(vec![ob_pool(10, "X", "Y", 50), ob_pool(11, "X", "Y", 80)]);
        let canon = store.get_canonical_orderbook("X", "Y").unwrap();
        assert_eq!(canon.pool_id, 11);
        assert!(store.is_canonical(11));
        assert!(!store.is_canonical(10));

        store.store(vec![ob_pool(10, "X", "Y", 200)]);
        let canon = store.get_canonical_orderbook("X", "Y").unwrap();
        assert_eq!(canon.pool_id, 10);
        assert!(store.is_canonical(10));
        assert!(!store.is_canonical(11));
        // id 11 remains in the store even though it's no longer canonical.
        assert!(store.get(11).is_some());
    }

    #[test]
    fn get_all_is_a_snapshot() {
        let store = PoolStore::new();
        store.store(vec![ob_pool(1, "A", "B", 10)]);
        let snapshot = store.get_all();
        assert_eq!(snapshot.len(), 1);
        store.store(vec![ob_pool(2, "A", "B", 5)]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.get_all().len(), 2);
    }
}
