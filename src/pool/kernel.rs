//! The uniform pool-kernel contract (spec §4.1).
//!
//! Each pool type exposes the same four operations. Kernels are pure
//! functions of the `Pool` snapshot they're handed — they never reach back
//! into the pool store, so a route evaluation never pays for (or races
//! against) a concurrent `Store` call (see DESIGN.md).
//!
//! Dispatch is a `match` on `Pool::pool_type`, not a trait object per pool —
//! the pool store holds plain `Pool` values, and `evaluate`/`spot_price`
//! below are the single entry points the quote engine calls.

use crate::domain::{Coin, Pool, PoolPayload, PoolType, SpreadFactor};
use crate::error::PoolMathError;

mod alloyed;
mod balancer;
mod cosmwasm;
mod orderbook;
mod stableswap;
mod transmuter;
mod tick_math;

/// `CalculateTokenOutByTokenIn`: swap `token_in` for `token_out_denom`,
/// applying the pool's own spread factor (taker fee is the caller's
/// responsibility — see `charge_taker_fee_exact_in` below and
/// `quote::engine`).
pub fn calculate_token_out_by_token_in(
    pool: &Pool,
    token_in: &Coin,
    token_out_denom: &str,
) -> Result<Coin, PoolMathError> {
    match (&pool.payload, pool.pool_type) {
        (PoolPayload::Balancer(p), PoolType::Balancer) => {
            balancer::swap_exact_in(pool, p, token_in, token_out_denom)
        }
        (PoolPayload::StableSwap(p), PoolType::StableSwap) => {
            stableswap::swap_exact_in(pool, p, token_in, token_out_denom)
        }
        (PoolPayload::ConcentratedLiquidity(p), PoolType::ConcentratedLiquidity) => {
            tick_math::swap_exact_in(pool, p, token_in, token_out_denom)
        }
        (PoolPayload::Transmuter(p), PoolType::Transmuter) => {
            transmuter::swap_exact_in(pool, p, token_in, token_out_denom)
        }
        (PoolPayload::AlloyedTransmuter(p), PoolType::AlloyedTransmuter) => {
            alloyed::swap_exact_in(pool, p, token_in, token_out_denom)
        }
        (PoolPayload::OrderBook(p), PoolType::OrderBook) => {
            orderbook::swap_exact_in(pool, p, token_in, token_out_denom)
        }
        (PoolPayload::GeneralizedCosmWasm { contract_address }, PoolType::GeneralizedCosmWasm) => {
            cosmwasm::swap_exact_in(pool, contract_address, token_in, token_out_denom)
        }
        _ => Err(PoolMathError::PoolTypeMismatch {
            pool_id: pool.id,
            expected: "payload matching pool_type",
            got: "mismatched payload/pool_type pair",
        }),
    }
}

/// `CalcSpotPrice`: price of `quote` in terms of `base` at the pool's
/// current state, ignoring fees.
pub fn calc_spot_price(pool: &Pool, base: &str, quote: &str) -> Result<f64, PoolMathError> {
    match &pool.payload {
        PoolPayload::Balancer(p) => balancer::spot_price(pool, p, base, quote),
        PoolPayload::StableSwap(p) => stableswap::spot_price(pool, p, base, quote),
        PoolPayload::ConcentratedLiquidity(p) => tick_math::spot_price(pool, p, base, quote),
        PoolPayload::Transmuter(p) => transmuter::spot_price(pool, p, base, quote),
        PoolPayload::AlloyedTransmuter(p) => alloyed::spot_price(pool, p, base, quote),
        PoolPayload::OrderBook(p) => orderbook::spot_price(pool, p, base, quote),
        PoolPayload::GeneralizedCosmWasm { contract_address } => {
            cosmwasm::spot_price(pool, contract_address, base, quote)
        }
    }
}

/// `ChargeTakerFeeExactIn`: deduct the protocol taker fee (spec §3, C3) from
/// an exact-in amount. This is the same arithmetic for every pool type — the
/// taker fee is a property of the `(denomIn, denomOut)` pair, not of the
/// pool — so it lives here rather than duplicated per kernel.
pub fn charge_taker_fee_exact_in(token_in: &Coin, taker_fee: SpreadFactor) -> Coin {
    Coin::new(token_in.denom.clone(), taker_fee.deduct_from(token_in.amount))
}
