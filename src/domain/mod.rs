//! Core data model (spec §3): denoms, coins, pools, and the tagged-union
//! pool payload. Dispatch over pool type is a `match` on the `PoolType`
//! discriminant (see `pool::kernel`), not inheritance — see DESIGN.md.

mod coin;
mod pool;

pub use coin::Coin;
pub use pool::{
    AlloyedAssetConfig, AlloyedTransmuterPayload, BalancerPayload, ChangeLimiterDivision,
    ChangeRateLimiterConfig, ConcentratedLiquidityPayload, OrderBookPayload, OrderBookTick,
    Pool, PoolType, StableSwapPayload, StaticRateLimiterConfig, TickBucket, TransmuterPayload,
};

/// Opaque on-chain asset identifier. Cheap to clone; interned nowhere on
/// purpose — the pool universe is large but each `Denom` is short-lived
/// relative to a request.
pub type Denom = String;

/// Stable, chain-assigned pool identifier.
pub type PoolId = u64;

/// A pretty-printed `base⟂quote` style composite key. `⟂` is chosen because
/// it can never appear in a denom (denoms are `[a-zA-Z0-9/\-_.]+` on every
/// chain this runs against).
pub const KEY_SEPARATOR: char = '⟂';

pub fn pair_key(a: &str, b: &str) -> String {
    format!("{a}{KEY_SEPARATOR}{b}")
}
