//! The pricing worker (C9, spec §4.7): recomputes prices and pool liquidity
//! caps on every committed block, cancelling a still-running job when a
//! newer block arrives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::domain::Denom;
use crate::events::{BlockCommitted, PricesUpdated};
use crate::pool::store::PoolStore;
use crate::pricing::chain_source::{ChainPricingSource, GetPriceOpts};
use crate::pricing::table::{PriceEntry, PricesTable};
use crate::tokens::TokenMetadataTable;

pub struct PricingWorkerConfig {
    pub default_quote_denom: Denom,
    pub min_pool_liquidity_cap: u128,
    pub fanout_concurrency: usize,
}

pub struct PricingWorker {
    store: Arc<PoolStore>,
    chain_source: Arc<ChainPricingSource>,
    prices: Arc<PricesTable>,
    metadata: Arc<TokenMetadataTable>,
    config: PricingWorkerConfig,
    prices_updated_tx: broadcast::Sender<PricesUpdated>,
    in_flight: tokio::sync::Mutex<Option<(u64, Arc<AtomicBool>, JoinHandle<()>)>>,
}

impl PricingWorker {
    pub fn new(
        store: Arc<PoolStore>,
        chain_source: Arc<ChainPricingSource>,
        prices: Arc<PricesTable>,
        metadata: Arc<TokenMetadataTable>,
        config: PricingWorkerConfig,
        prices_updated_tx: broadcast::Sender<PricesUpdated>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            chain_source,
            prices,
            metadata,
            config,
            prices_updated_tx,
            in_flight: tokio::sync::Mutex::new(None),
        })
    }

    /// Drives the worker off the ingest "block committed" broadcast until
    /// the channel closes.
    pub async fn run(self: Arc<Self>, mut block_rx: broadcast::Receiver<BlockCommitted>) {
        loop {
            match block_rx.recv().await {
                Ok(event) => self.clone().on_block_committed(event).await,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    async fn on_block_committed(self: Arc<Self>, event: BlockCommitted) {
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let height = event.height;

        let mut guard = self.in_flight.lock().await;
        if let Some((prev_height, prev_cancel, prev_handle)) = guard.take() {
            if prev_height < height {
                prev_cancel.store(true, Ordering::SeqCst);
                prev_handle.abort();
            }
        }

        let worker = self.clone();
        let flag = cancel_flag.clone();
        let handle = tokio::spawn(async move { worker.run_job(event, flag).await });
        *guard = Some((height, cancel_flag, handle));
    }

    async fn run_job(&self, event: BlockCommitted, cancelled: Arc<AtomicBool>) {
        let started = Instant::now();
        let quote_denom = self.config.default_quote_denom.clone();
        let opts = GetPriceOpts {
            recompute: true,
            min_pool_liquidity_cap: Some(self.config.min_pool_liquidity_cap),
        };

        let mut entries = HashMap::new();
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.fanout_concurrency.max(1)));
        let mut join_set = tokio::task::JoinSet::new();

        for base in event.updated_denoms.clone() {
            if cancelled.load(Ordering::SeqCst) {
                break;
            }
            let chain_source = self.chain_source.clone();
            let quote_denom = quote_denom.clone();
            let opts = opts.clone();
            let permit = semaphore.clone();
            join_set.spawn(async move {
                let _permit = permit.acquire_owned().await.ok();
                let price = chain_source.get_price(&base, &quote_denom, &opts).await;
                (base, price)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            if cancelled.load(Ordering::SeqCst) {
                break;
            }
            let Ok((base, price)) = joined else { continue };
            if let Ok(price) = price {
                let key = PricesTable::canonical_key(&base, &quote_denom);
                entries.insert(key, PriceEntry { price, height: event.height });
            }
        }

        if cancelled.load(Ordering::SeqCst) {
            return;
        }
        self.prices.publish(event.height, entries);

        for pool_id in &event.updated_pool_ids {
            if cancelled.load(Ordering::SeqCst) {
                break;
            }
            if let Some(mut pool) = self.store.get(*pool_id) {
                if let Some(cap) = self.recompute_liquidity_cap(&pool, &quote_denom).await {
                    pool.liquidity_cap = cap;
                    self.store.store(vec![pool]);
                }
            }
        }

        crate::metrics::record_pricing_job_duration(started.elapsed().as_secs_f64());
        let _ = self.prices_updated_tx.send(PricesUpdated { height: event.height });
    }

    /// `liquidityCap = sum(price(denom) * balance(denom) / sf(denom))`
    /// across the pool's denoms (spec §4.7 step 4).
    async fn recompute_liquidity_cap(&self, pool: &crate::domain::Pool, quote_denom: &Denom) -> Option<u128> {
        let mut total = 0f64;
        for denom in &pool.denoms {
            let Some(meta) = self.metadata.get(denom) else { continue };
            let balance = *pool.balances.get(denom).unwrap_or(&0) as f64;
            if balance == 0.0 {
                continue;
            }
            let opts = GetPriceOpts { recompute: false, min_pool_liquidity_cap: None };
            if let Ok(price) = self.chain_source.get_price(denom, quote_denom, &opts).await {
                let price: f64 = price.to_string().parse().unwrap_or(0.0);
                total += price * balance / meta.scaling_factor() as f64;
            }
        }
        if total.is_finite() && total >= 0.0 {
            Some(total as u128)
        } else {
            None
        }
    }
}
