//! Block-commit and price-update broadcast signals (spec §4.7, §4.8).

use tokio::sync::broadcast;

use crate::domain::{Denom, PoolId};

#[derive(Debug, Clone)]
pub struct BlockCommitted {
    pub height: u64,
    pub updated_denoms: Vec<Denom>,
    pub updated_pool_ids: Vec<PoolId>,
}

#[derive(Debug, Clone, Copy)]
pub struct PricesUpdated {
    pub height: u64,
}

/// Capacity chosen so a slow subscriber (e.g. a newly-connecting healthcheck
/// poller) can lag a few blocks without the ingest commit path blocking on
/// `send`; `broadcast::Sender::send` never blocks regardless, but a bounded
/// ring buffer keeps memory use predictable under sustained lag.
const CHANNEL_CAPACITY: usize = 16;

pub fn block_committed_channel() -> (broadcast::Sender<BlockCommitted>, broadcast::Receiver<BlockCommitted>) {
    broadcast::channel(CHANNEL_CAPACITY)
}

pub fn prices_updated_channel() -> (broadcast::Sender<PricesUpdated>, broadcast::Receiver<PricesUpdated>) {
    broadcast::channel(CHANNEL_CAPACITY)
}
