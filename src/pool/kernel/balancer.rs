//! Balancer / StableSwap share the same weighted constant-product shape;
//! this module holds the Balancer (possibly-unequal-weight xy=k) formula.
//! StableSwap's amplified curve lives in `stableswap.rs`.

use crate::domain::{BalancerPayload, Coin, Pool};
use crate::error::PoolMathError;

fn balance_of(pool: &Pool, denom: &str) -> Result<u128, PoolMathError> {
    pool.balances
        .get(denom)
        .copied()
        .ok_or_else(|| PoolMathError::InsufficientLiquidity {
            pool_id: pool.id,
            denom: denom.to_string(),
        })
}

fn weight_of(pool: &Pool, payload: &BalancerPayload, denom: &str) -> f64 {
    payload.weights.get(denom).copied().unwrap_or(1) as f64
}

pub fn swap_exact_in(
    pool: &Pool,
    payload: &BalancerPayload,
    token_in: &Coin,
    token_out_denom: &str,
) -> Result<Coin, PoolMathError> {
    let balance_in = balance_of(pool, &token_in.denom)?;
    let balance_out = balance_of(pool, token_out_denom)?;
    let weight_in = weight_of(pool, payload, &token_in.denom);
    let weight_out = weight_of(pool, payload, token_out_denom);

    let amount_in_after_spread = pool.spread_factor.deduct_from(token_in.amount);
    if amount_in_after_spread == 0 || balance_in == 0 || balance_out == 0 {
        return Err(PoolMathError::InsufficientLiquidity {
            pool_id: pool.id,
            denom: token_out_denom.to_string(),
        });
    }

    // amountOut = balanceOut * (1 - (balanceIn / (balanceIn + amountIn))^(weightIn/weightOut))
    let ratio = balance_in as f64 / (balance_in as f64 + amount_in_after_spread as f64);
    let factor = ratio.powf(weight_in / weight_out);
    let amount_out_f = balance_out as f64 * (1.0 - factor);

    if !amount_out_f.is_finite() || amount_out_f <= 0.0 {
        return Err(PoolMathError::InsufficientLiquidity {
            pool_id: pool.id,
            denom: token_out_denom.to_string(),
        });
    }
    let amount_out = amount_out_f.floor() as u128;
    if amount_out == 0 || amount_out >= balance_out {
        return Err(PoolMathError::InsufficientLiquidity {
            pool_id: pool.id,
            denom: token_out_denom.to_string(),
        });
    }

    Ok(Coin::new(token_out_denom.to_string(), amount_out))
}

/// Marginal price: units of `base` per 1 unit of `quote`, i.e. the same
/// orientation as `effective_price = amount_in / amount_out` in the quote
/// engine (`base` plays the role of `token_in`, `quote` of `token_out`).
pub fn spot_price(
    pool: &Pool,
    payload: &BalancerPayload,
    base: &str,
    quote: &str,
) -> Result<f64, PoolMathError> {
    let balance_base = balance_of(pool, base)?;
    let balance_quote = balance_of(pool, quote)?;
    let weight_base = weight_of(pool, payload, base);
    let weight_quote = weight_of(pool, payload, quote);

    if balance_quote == 0 || weight_quote == 0.0 {
        return Err(PoolMathError::InsufficientLiquidity {
            pool_id: pool.id,
            denom: quote.to_string(),
        });
    }

    Ok((balance_base as f64 / weight_base) / (balance_quote as f64 / weight_quote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Pool, PoolPayload, PoolType, SpreadFactor};
    use std::collections::HashMap;

    fn two_asset_pool(reserve_a: u128, reserve_b: u128, spread_bps: u64) -> Pool {
        let mut balances = HashMap::new();
        balances.insert("A".to_string(), reserve_a);
        balances.insert("B".to_string(), reserve_b);
        let mut weights = HashMap::new();
        weights.insert("A".to_string(), 1);
        weights.insert("B".to_string(), 1);
        Pool {
            id: 1,
            pool_type: PoolType::Balancer,
            denoms: vec!["A".to_string(), "B".to_string()],
            balances,
            spread_factor: SpreadFactor(spread_bps * SpreadFactor::PRECISION / 10_000),
            liquidity_cap: 0,
            taker_fee_override: None,
            payload: PoolPayload::Balancer(BalancerPayload { weights }),
        }
    }

    #[test]
    fn basic_cfmm_quote_matches_scenario_1() {
        // spec §8 scenario 1: 1_000_000 / 1_000_000 reserves, spreadFactor=0,
        // tokenIn=1000A -> amountOut ~= 999
        let pool = two_asset_pool(1_000_000, 1_000_000, 0);
        let out = swap_exact_in(&pool, as_balancer(&pool), &Coin::new("A", 1000), "B").unwrap();
        assert!((out.amount as i64 - 999).abs() <= 1, "got {}", out.amount);
    }

    fn as_balancer(pool: &Pool) -> &BalancerPayload {
        match &pool.payload {
            PoolPayload::Balancer(p) => p,
            _ => unreachable!(),
        }
    }

    #[test]
    fn insufficient_liquidity_when_denom_absent() {
        let pool = two_asset_pool(100, 100, 0);
        let err = swap_exact_in(&pool, as_balancer(&pool), &Coin::new("A", 10), "C").unwrap_err();
        assert!(matches!(err, PoolMathError::InsufficientLiquidity { .. }));
    }
}
