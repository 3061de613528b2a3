//! TTL, single-flight route caches (C6, spec §4.5).
//!
//! Entries simply expire — no LRU eviction. Writes are single-flight per
//! key: at most one concurrent computation per missing key, other callers
//! await the winner via a `tokio::sync::Notify`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, Notify};

use crate::domain::{pair_key, KEY_SEPARATOR};

enum Slot<T> {
    Pending(Arc<Notify>),
    Ready { value: T, expires_at: Instant },
}

pub struct SingleFlightCache<T: Clone + Send + Sync + 'static> {
    entries: Mutex<HashMap<String, Slot<T>>>,
    ttl: Duration,
}

impl<T: Clone + Send + Sync + 'static> SingleFlightCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn get_or_compute<F, Fut>(&self, key: String, compute: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        loop {
            let mut guard = self.entries.lock().await;
            match guard.get(&key) {
                Some(Slot::Ready { value, expires_at }) if *expires_at > Instant::now() => {
                    return value.clone();
                }
                Some(Slot::Pending(notify)) => {
                    let notify = notify.clone();
                    drop(guard);
                    notify.notified().await;
                    continue;
                }
                _ => {
                    let notify = Arc::new(Notify::new());
                    guard.insert(key.clone(), Slot::Pending(notify.clone()));
                    drop(guard);

                    let value = compute().await;

                    let mut guard = self.entries.lock().await;
                    guard.insert(
                        key.clone(),
                        Slot::Ready {
                            value: value.clone(),
                            expires_at: Instant::now() + self.ttl,
                        },
                    );
                    drop(guard);
                    notify.notify_waiters();
                    return value;
                }
            }
        }
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}

pub fn candidate_route_key(token_in: &str, token_out: &str) -> String {
    pair_key(token_in, token_out)
}

/// `orderOfMagnitude = floor(log10(amountIn))`, bucket-memoizing quotes for
/// similarly-sized inputs (spec §4.5).
pub fn order_of_magnitude(amount_in: u128) -> i32 {
    if amount_in == 0 {
        return 0;
    }
    (amount_in as f64).log10().floor() as i32
}

pub fn ranked_route_key(token_in: &str, token_out: &str, amount_in: u128) -> String {
    format!(
        "{}{}{}{}{}",
        token_in,
        KEY_SEPARATOR,
        token_out,
        KEY_SEPARATOR,
        order_of_magnitude(amount_in)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn single_flight_computes_once_per_key() {
        let cache = SingleFlightCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.get_or_compute("k".to_string(), || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    42
                }
            }),
            cache.get_or_compute("k".to_string(), || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    42
                }
            })
        );
        assert_eq!(a, 42);
        assert_eq!(b, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn magnitude_buckets() {
        assert_eq!(order_of_magnitude(1), 0);
        assert_eq!(order_of_magnitude(999), 2);
        assert_eq!(order_of_magnitude(1000), 3);
    }
}
