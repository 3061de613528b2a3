//! ConcentratedLiquidity: Uniswap-v3-style sqrtPrice tick walking over a
//! sparse array of liquidity buckets (spec §3, §4.1).
//!
//! `base_denom` plays the role of Uniswap's token0, `quote_denom` token1.
//! Swapping base in walks buckets towards lower ticks (price falling);
//! swapping quote in walks towards higher ticks (price rising) — the
//! direction convention resolved in spec §9 Open Questions.

use crate::domain::{Coin, ConcentratedLiquidityPayload, Pool, TickBucket};
use crate::error::PoolMathError;

fn tick_to_sqrt_price(tick: i64) -> f64 {
    1.0001f64.powf(tick as f64 / 2.0)
}

enum Direction {
    BaseIn,
    QuoteIn,
}

fn direction(
    pool: &Pool,
    payload: &ConcentratedLiquidityPayload,
    token_in: &Coin,
    token_out_denom: &str,
) -> Result<Direction, PoolMathError> {
    if token_in.denom == payload.base_denom && token_out_denom == payload.quote_denom {
        Ok(Direction::BaseIn)
    } else if token_in.denom == payload.quote_denom && token_out_denom == payload.base_denom {
        Ok(Direction::QuoteIn)
    } else {
        Err(PoolMathError::PoolTypeMismatch {
            pool_id: pool.id,
            expected: "base_denom/quote_denom pair",
            got: "unrelated denom pair",
        })
    }
}

pub fn swap_exact_in(
    pool: &Pool,
    payload: &ConcentratedLiquidityPayload,
    token_in: &Coin,
    token_out_denom: &str,
) -> Result<Coin, PoolMathError> {
    if payload.has_no_liquidity || payload.ticks.is_empty() {
        return Err(PoolMathError::NoTickModel { pool_id: pool.id });
    }
    let current_tick = payload
        .current_tick()
        .ok_or(PoolMathError::CurrentTickOutOfRange { pool_id: pool.id })?;
    if !payload.invariant_holds(current_tick) {
        let bucket = &payload.ticks[payload.current_tick_index];
        return Err(PoolMathError::CurrentTickNotWithinBucket {
            pool_id: pool.id,
            current_tick,
            lower: bucket.lower_tick,
            upper: bucket.upper_tick,
        });
    }
    if payload.current_sqrt_price <= 0.0 {
        return Err(PoolMathError::ZeroCurrentSqrtPrice { pool_id: pool.id });
    }

    let dir = direction(pool, payload, token_in, token_out_denom)?;
    let amount_in_after_spread = pool.spread_factor.deduct_from(token_in.amount);

    let mut bucket_idx = payload.current_tick_index as i64;
    let mut sqrt_price = payload.current_sqrt_price;
    let mut remaining_in = amount_in_after_spread as f64;
    let mut amount_out = 0.0f64;

    loop {
        if remaining_in <= 0.0 {
            break;
        }
        let bucket: &TickBucket = match payload.ticks.get(bucket_idx as usize) {
            Some(b) if bucket_idx >= 0 => b,
            _ => {
                return Err(PoolMathError::InsufficientLiquidity {
                    pool_id: pool.id,
                    denom: token_out_denom.to_string(),
                })
            }
        };
        let liquidity = bucket.liquidity as f64;
        if liquidity <= 0.0 {
            bucket_idx += match dir {
                Direction::BaseIn => -1,
                Direction::QuoteIn => 1,
            };
            continue;
        }

        match dir {
            Direction::BaseIn => {
                let sqrt_lower = tick_to_sqrt_price(bucket.lower_tick);
                let max_in = liquidity * (1.0 / sqrt_lower - 1.0 / sqrt_price);
                if remaining_in <= max_in {
                    let sqrt_next =
                        liquidity * sqrt_price / (liquidity + remaining_in * sqrt_price);
                    amount_out += liquidity * (sqrt_price - sqrt_next);
                    sqrt_price = sqrt_next;
                    remaining_in = 0.0;
                } else {
                    amount_out += liquidity * (sqrt_price - sqrt_lower);
                    remaining_in -= max_in;
                    sqrt_price = sqrt_lower;
                    bucket_idx -= 1;
                }
            }
            Direction::QuoteIn => {
                let sqrt_upper = tick_to_sqrt_price(bucket.upper_tick);
                let max_in = liquidity * (sqrt_upper - sqrt_price);
                if remaining_in <= max_in {
                    let sqrt_next = sqrt_price + remaining_in / liquidity;
                    amount_out += liquidity * (1.0 / sqrt_price - 1.0 / sqrt_next);
                    sqrt_price = sqrt_next;
                    remaining_in = 0.0;
                } else {
                    amount_out += liquidity * (1.0 / sqrt_price - 1.0 / sqrt_upper);
                    remaining_in -= max_in;
                    sqrt_price = sqrt_upper;
                    bucket_idx += 1;
                }
            }
        }
    }

    if !amount_out.is_finite() || amount_out <= 0.0 {
        return Err(PoolMathError::InsufficientLiquidity {
            pool_id: pool.id,
            denom: token_out_denom.to_string(),
        });
    }
    Ok(Coin::new(token_out_denom.to_string(), amount_out.floor() as u128))
}

pub fn spot_price(
    pool: &Pool,
    payload: &ConcentratedLiquidityPayload,
    base: &str,
    quote: &str,
) -> Result<f64, PoolMathError> {
    if payload.has_no_liquidity {
        return Err(PoolMathError::NoTickModel { pool_id: pool.id });
    }
    if payload.current_sqrt_price <= 0.0 {
        return Err(PoolMathError::ZeroCurrentSqrtPrice { pool_id: pool.id });
    }
    // price of token1 (quote) in token0 (base) terms is sqrtPrice^2; report
    // base-per-quote to match the (base, quote) == (effective token_in,
    // token_out) convention used throughout `calc_spot_price`.
    let price_quote_per_base = payload.current_sqrt_price * payload.current_sqrt_price;
    if base == payload.base_denom && quote == payload.quote_denom {
        Ok(1.0 / price_quote_per_base)
    } else if base == payload.quote_denom && quote == payload.base_denom {
        Ok(price_quote_per_base)
    } else {
        Err(PoolMathError::PoolTypeMismatch {
            pool_id: pool.id,
            expected: "base_denom/quote_denom pair",
            got: "unrelated denom pair",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Pool, PoolPayload, PoolType, SpreadFactor};

    fn pool() -> Pool {
        let ticks = vec![
            TickBucket { lower_tick: -200, upper_tick: -100, liquidity: 1_000_000 },
            TickBucket { lower_tick: -100, upper_tick: 100, liquidity: 5_000_000 },
            TickBucket { lower_tick: 100, upper_tick: 200, liquidity: 1_000_000 },
        ];
        Pool {
            id: 5,
            pool_type: PoolType::ConcentratedLiquidity,
            denoms: vec!["BASE".to_string(), "QUOTE".to_string()],
            balances: Default::default(),
            spread_factor: SpreadFactor::ZERO,
            liquidity_cap: 0,
            taker_fee_override: None,
            payload: PoolPayload::ConcentratedLiquidity(ConcentratedLiquidityPayload {
                ticks,
                current_tick_index: 1,
                current_sqrt_price: tick_to_sqrt_price(0),
                has_no_liquidity: false,
                base_denom: "BASE".to_string(),
                quote_denom: "QUOTE".to_string(),
            }),
        }
    }

    fn payload(p: &Pool) -> &ConcentratedLiquidityPayload {
        match &p.payload {
            PoolPayload::ConcentratedLiquidity(c) => c,
            _ => unreachable!(),
        }
    }

    #[test]
    fn small_swap_within_current_bucket() {
        let p = pool();
        let out = swap_exact_in(&p, payload(&p), &Coin::new("BASE", 1000), "QUOTE").unwrap();
        assert!(out.amount > 0 && out.amount <= 1000, "got {}", out.amount);
    }

    #[test]
    fn no_liquidity_model_errors() {
        let mut p = pool();
        if let PoolPayload::ConcentratedLiquidity(c) = &mut p.payload {
            c.has_no_liquidity = true;
        }
        let err = swap_exact_in(&p, payload(&p), &Coin::new("BASE", 10), "QUOTE").unwrap_err();
        assert!(matches!(err, PoolMathError::NoTickModel { .. }));
    }

    #[test]
    fn mismatched_denoms_error() {
        let p = pool();
        let err = swap_exact_in(&p, payload(&p), &Coin::new("OTHER", 10), "QUOTE").unwrap_err();
        assert!(matches!(err, PoolMathError::PoolTypeMismatch { .. }));
    }
}
