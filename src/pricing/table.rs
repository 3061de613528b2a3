//! The published prices table (spec §4.7 step 3, §5): single writer (the
//! pricing worker), published via atomic pointer swap so readers never see a
//! half-updated table.
//!
//! A `RwLock<Arc<_>>` gives us that: readers clone the `Arc` under a cheap
//! read lock, the writer builds an entirely new map off to the side and
//! swaps it in with one write-lock acquisition — no reader ever observes a
//! partially-populated generation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use bigdecimal::BigDecimal;

use crate::domain::{pair_key, Denom};

#[derive(Debug, Clone)]
pub struct PriceEntry {
    pub price: BigDecimal,
    pub height: u64,
}

#[derive(Default)]
struct Snapshot {
    entries: HashMap<String, PriceEntry>,
    height: u64,
}

pub struct PricesTable {
    inner: RwLock<Arc<Snapshot>>,
}

impl PricesTable {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    fn key(base: &str, quote: &str) -> String {
        // Canonicalized order (spec §4.6 step 5) so `get` agrees regardless
        // of which side callers name "base".
        if base <= quote {
            pair_key(base, quote)
        } else {
            pair_key(quote, base)
        }
    }

    pub fn get(&self, base: &Denom, quote: &Denom) -> Option<PriceEntry> {
        self.inner.read().unwrap().entries.get(&Self::key(base, quote)).cloned()
    }

    /// Height of the last published generation — the prices table is
    /// monotone-by-swap (spec §5): successive reads may jump forward but
    /// never backward.
    pub fn height(&self) -> u64 {
        self.inner.read().unwrap().height
    }

    /// Atomically publish a full new generation. Called once per pricing
    /// worker job (spec §4.7 step 3).
    pub fn publish(&self, height: u64, entries: HashMap<String, PriceEntry>) {
        let mut guard = self.inner.write().unwrap();
        if height < guard.height {
            // A newer generation already won the race; never regress.
            return;
        }
        *guard = Arc::new(Snapshot { entries, height });
    }

    pub fn canonical_key(base: &str, quote: &str) -> String {
        Self::key(base, quote)
    }
}

impl Default for PricesTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn publish_then_read_is_order_independent() {
        let table = PricesTable::new();
        let mut entries = HashMap::new();
        entries.insert(
            PricesTable::canonical_key("OSMO", "USDC"),
            PriceEntry { price: BigDecimal::from_str("4.000000").unwrap(), height: 100 },
        );
        table.publish(100, entries);
        assert_eq!(table.get(&"OSMO".to_string(), &"USDC".to_string()).unwrap().height, 100);
        assert_eq!(table.get(&"USDC".to_string(), &"OSMO".to_string()).unwrap().height, 100);
    }

    #[test]
    fn publish_never_regresses_height() {
        let table = PricesTable::new();
        table.publish(100, HashMap::new());
        table.publish(50, HashMap::new());
        assert_eq!(table.height(), 100);
    }
}
