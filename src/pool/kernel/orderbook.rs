//! OrderBook: walks discrete ticks of resting liquidity rather than a
//! continuous curve (spec §3, §4.1).
//!
//! Direction convention (spec §4.1): filling an ASK (`tokenIn==baseDenom`,
//! `tokenOut==quoteDenom`, selling base) walks ticks in ascending `tick_id`
//! order starting at `next_ask_tick`, consuming `ask_liquidity`; filling a
//! BID (`tokenIn==quoteDenom`, `tokenOut==baseDenom`, buying base) walks
//! ticks in descending order starting at `next_bid_tick`, consuming
//! `bid_liquidity`.

use crate::domain::{Coin, OrderBookPayload, Pool};
use crate::error::PoolMathError;

enum Direction {
    /// token_in is the base denom, token_out is the quote denom: selling base.
    Ask,
    /// token_in is the quote denom, token_out is the base denom: buying base.
    Bid,
}

fn direction(
    pool: &Pool,
    payload: &OrderBookPayload,
    token_in: &Coin,
    token_out_denom: &str,
) -> Result<Direction, PoolMathError> {
    if token_in.denom == payload.base_denom && token_out_denom == payload.quote_denom {
        Ok(Direction::Ask)
    } else if token_in.denom == payload.quote_denom && token_out_denom == payload.base_denom {
        Ok(Direction::Bid)
    } else {
        Err(PoolMathError::OrderbookMismatch {
            pool_id: pool.id,
            token_in: token_in.denom.clone(),
            token_out: token_out_denom.to_string(),
        })
    }
}

/// Deterministic `tickId -> price` conversion (spec §3). Ticks are spaced
/// geometrically: 1,000,000 ticks double the price, so `tickId=0` is price 1
/// and `tickId=1_000_000` is price 2.
fn tick_id_to_price(tick_id: i64) -> f64 {
    2f64.powf(tick_id as f64 / 1_000_000.0)
}

pub fn swap_exact_in(
    pool: &Pool,
    payload: &OrderBookPayload,
    token_in: &Coin,
    token_out_denom: &str,
) -> Result<Coin, PoolMathError> {
    let dir = direction(pool, payload, token_in, token_out_denom)?;

    let mut ticks: Vec<&crate::domain::OrderBookTick> = payload.ticks.iter().collect();
    match dir {
        Direction::Ask => {
            ticks.retain(|t| t.tick_id >= payload.next_ask_tick);
            ticks.sort_by_key(|t| t.tick_id);
        }
        Direction::Bid => {
            ticks.retain(|t| t.tick_id <= payload.next_bid_tick);
            ticks.sort_by_key(|t| std::cmp::Reverse(t.tick_id));
        }
    }

    let mut remaining_in = token_in.amount;
    let mut amount_out: u128 = 0;
    let mut last_tick = match dir {
        Direction::Ask => payload.next_ask_tick,
        Direction::Bid => payload.next_bid_tick,
    };

    for tick in ticks {
        if remaining_in == 0 {
            break;
        }
        last_tick = tick.tick_id;
        let available = match dir {
            Direction::Ask => tick.ask_liquidity,
            Direction::Bid => tick.bid_liquidity,
        };
        if available == 0 {
            continue;
        }
        let price = tick_id_to_price(tick.tick_id);
        let take = remaining_in.min(available);
        let out = match dir {
            Direction::Ask => take as f64 * price,
            Direction::Bid => take as f64 / price,
        };
        amount_out = amount_out.saturating_add(out.floor() as u128);
        remaining_in -= take;
    }

    if remaining_in > 0 {
        return Err(PoolMathError::OrderbookInsufficientLiquidity {
            pool_id: pool.id,
            last_tick,
        });
    }
    if amount_out == 0 {
        return Err(PoolMathError::OrderbookInsufficientLiquidity {
            pool_id: pool.id,
            last_tick,
        });
    }

    Ok(Coin::new(token_out_denom.to_string(), amount_out))
}

pub fn spot_price(
    pool: &Pool,
    payload: &OrderBookPayload,
    base: &str,
    quote: &str,
) -> Result<f64, PoolMathError> {
    let dir = direction(pool, payload, &Coin::new(quote.to_string(), 0), base)
        .or_else(|_| direction(pool, payload, &Coin::new(base.to_string(), 0), quote))?;

    let first_tick = match dir {
        Direction::Ask => payload
            .ticks
            .iter()
            .filter(|t| t.tick_id >= payload.next_ask_tick && t.ask_liquidity > 0)
            .min_by_key(|t| t.tick_id),
        Direction::Bid => payload
            .ticks
            .iter()
            .filter(|t| t.tick_id <= payload.next_bid_tick && t.bid_liquidity > 0)
            .max_by_key(|t| t.tick_id),
    };

    match first_tick {
        Some(tick) => Ok(tick_id_to_price(tick.tick_id)),
        None => Err(PoolMathError::OrderbookInsufficientLiquidity {
            pool_id: pool.id,
            last_tick: match dir {
                Direction::Ask => payload.next_ask_tick,
                Direction::Bid => payload.next_bid_tick,
            },
        }),
    }
}
