//! The taker-fee table (C3, spec §3, §9): a commutative per-pair protocol
//! fee applied before a pool's own spread factor. Small, bounded key space
//! (one entry per traded pair) — per spec §9's guidance this is a plain
//! `RwLock`-guarded map, not the concurrent-map primitive used for pools.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::{pair_key, Denom, SpreadFactor};

pub struct TakerFeeTable {
    fees: RwLock<HashMap<String, SpreadFactor>>,
    default_fee: SpreadFactor,
}

impl TakerFeeTable {
    pub fn new(default_fee: SpreadFactor) -> Self {
        Self {
            fees: RwLock::new(HashMap::new()),
            default_fee,
        }
    }

    /// Taker fee is commutative: `fee(a, b) == fee(b, a)`. We canonicalize
    /// the key by sorting the pair lexically so `set`/`get` agree regardless
    /// of argument order.
    fn key(a: &str, b: &str) -> String {
        if a <= b {
            pair_key(a, b)
        } else {
            pair_key(b, a)
        }
    }

    pub fn get(&self, denom_a: &Denom, denom_b: &Denom) -> SpreadFactor {
        self.fees
            .read()
            .unwrap()
            .get(&Self::key(denom_a, denom_b))
            .copied()
            .unwrap_or(self.default_fee)
    }

    pub fn set(&self, denom_a: &Denom, denom_b: &Denom, fee: SpreadFactor) {
        self.fees
            .write()
            .unwrap()
            .insert(Self::key(denom_a, denom_b), fee);
    }

    /// Bulk-replace entries; called from the ingest commit path alongside
    /// `PoolStore::store`.
    pub fn store(&self, entries: Vec<(Denom, Denom, SpreadFactor)>) {
        let mut fees = self.fees.write().unwrap();
        for (a, b, fee) in entries {
            fees.insert(Self::key(&a, &b), fee);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commutative_lookup() {
        let table = TakerFeeTable::new(SpreadFactor::ZERO);
        table.set(&"A".to_string(), &"B".to_string(), SpreadFactor(1_000));
        assert_eq!(table.get(&"A".to_string(), &"B".to_string()), SpreadFactor(1_000));
        assert_eq!(table.get(&"B".to_string(), &"A".to_string()), SpreadFactor(1_000));
    }

    #[test]
    fn unset_pair_falls_back_to_default() {
        let table = TakerFeeTable::new(SpreadFactor(42));
        assert_eq!(table.get(&"X".to_string(), &"Y".to_string()), SpreadFactor(42));
    }
}
