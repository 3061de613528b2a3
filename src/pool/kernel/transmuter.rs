//! Transmuter: 1:1 swap subject to balance (spec §4.1, §8 scenario 2).

use crate::domain::{Coin, Pool, TransmuterPayload};
use crate::error::PoolMathError;

pub fn swap_exact_in(
    pool: &Pool,
    payload: &TransmuterPayload,
    token_in: &Coin,
    token_out_denom: &str,
) -> Result<Coin, PoolMathError> {
    let have = payload.reserves.get(token_out_denom).copied().unwrap_or(0);
    if token_in.amount > have {
        return Err(PoolMathError::InsufficientBalance {
            pool_id: pool.id,
            denom: token_out_denom.to_string(),
            have,
            want: token_in.amount,
        });
    }
    Ok(Coin::new(token_out_denom.to_string(), token_in.amount))
}

pub fn spot_price(
    pool: &Pool,
    payload: &TransmuterPayload,
    base: &str,
    quote: &str,
) -> Result<f64, PoolMathError> {
    if !payload.reserves.contains_key(base) || !payload.reserves.contains_key(quote) {
        return Err(PoolMathError::InsufficientLiquidity {
            pool_id: pool.id,
            denom: quote.to_string(),
        });
    }
    Ok(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Pool, PoolPayload, PoolType, SpreadFactor};
    use std::collections::HashMap;

    fn pool(a: u128, b: u128) -> Pool {
        let mut reserves = HashMap::new();
        reserves.insert("A".to_string(), a);
        reserves.insert("B".to_string(), b);
        Pool {
            id: 2,
            pool_type: PoolType::Transmuter,
            denoms: vec!["A".to_string(), "B".to_string()],
            balances: reserves.clone(),
            spread_factor: SpreadFactor::ZERO,
            liquidity_cap: 0,
            taker_fee_override: None,
            payload: PoolPayload::Transmuter(TransmuterPayload { reserves }),
        }
    }

    #[test]
    fn one_to_one_within_balance() {
        let p = pool(500, 500);
        let payload = match &p.payload {
            PoolPayload::Transmuter(t) => t,
            _ => unreachable!(),
        };
        let out = swap_exact_in(&p, payload, &Coin::new("A", 100), "B").unwrap();
        assert_eq!(out.amount, 100);
    }

    #[test]
    fn insufficient_balance_over_reserve() {
        let p = pool(500, 500);
        let payload = match &p.payload {
            PoolPayload::Transmuter(t) => t,
            _ => unreachable!(),
        };
        let err = swap_exact_in(&p, payload, &Coin::new("A", 600), "B").unwrap_err();
        assert!(matches!(err, PoolMathError::InsufficientBalance { .. }));
    }
}
