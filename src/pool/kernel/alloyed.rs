//! AlloyedTransmuter: normalization-factor swaps plus the two optional rate
//! limiters (spec §4.1, §8 scenario 3).
//!
//! The static and change limiters both need "now"; rather than thread a
//! clock through the otherwise-pure kernel contract, only this one pool type
//! reads the wall clock, and only at the single call site in `kernel.rs` —
//! every other kernel stays a pure function of its snapshot.

use crate::domain::{AlloyedAssetConfig, AlloyedTransmuterPayload, Coin, Pool};
use crate::error::PoolMathError;

fn asset_or_err<'a>(
    pool: &Pool,
    payload: &'a AlloyedTransmuterPayload,
    denom: &str,
) -> Result<&'a AlloyedAssetConfig, PoolMathError> {
    payload
        .asset(denom)
        .ok_or_else(|| PoolMathError::MissingNormalizationFactor {
            pool_id: pool.id,
            denom: denom.to_string(),
        })
}

/// Normalized weight of `denom` after hypothetically adding `extra` to its
/// reserve: `reserve(denom) * normFactor(denom) / sum(reserve(i) *
/// normFactor(i))` over every non-LP-share asset.
fn normalized_weight(
    payload: &AlloyedTransmuterPayload,
    denom: &str,
    extra: u128,
) -> f64 {
    let mut target = 0.0;
    let mut total = 0.0;
    for asset in &payload.assets {
        if asset.is_alloyed_lp_share {
            continue;
        }
        let reserve = payload.reserves.get(&asset.denom).copied().unwrap_or(0) as f64;
        let bump = if asset.denom == denom { extra as f64 } else { 0.0 };
        let normalized = (reserve + bump) * asset.normalization_factor as f64;
        total += normalized;
        if asset.denom == denom {
            target = normalized;
        }
    }
    if total <= 0.0 {
        0.0
    } else {
        target / total
    }
}

fn check_static_limiter(
    pool: &Pool,
    payload: &AlloyedTransmuterPayload,
    token_in: &Coin,
) -> Result<(), PoolMathError> {
    let asset = match payload.asset(&token_in.denom) {
        Some(a) => a,
        None => return Ok(()),
    };
    let Some(limiter) = asset.static_limiter else {
        return Ok(());
    };
    let weight = normalized_weight(payload, &token_in.denom, token_in.amount);
    if weight > limiter.upper_limit {
        return Err(PoolMathError::StaticRateLimiterExceeded {
            pool_id: pool.id,
            denom: token_in.denom.clone(),
            weight,
            limit: limiter.upper_limit,
        });
    }
    Ok(())
}

fn check_change_limiter(
    pool: &Pool,
    payload: &AlloyedTransmuterPayload,
    token_in: &Coin,
    now: i64,
) -> Result<(), PoolMathError> {
    let asset = match payload.asset(&token_in.denom) {
        Some(a) => a,
        None => return Ok(()),
    };
    let Some(limiter) = &asset.change_limiter else {
        return Ok(());
    };

    let window_start = now - limiter.window_seconds;
    let mut kept_integral = 0.0;
    let mut kept_duration = 0.0f64;
    let mut most_recently_dropped: Option<&crate::domain::ChangeLimiterDivision> = None;

    for division in &limiter.divisions {
        if division.updated_at < window_start {
            // Fully outside the window: drop, but remember the most recent
            // one for the compressed average.
            if most_recently_dropped.map_or(true, |d| division.updated_at > d.updated_at) {
                most_recently_dropped = Some(division);
            }
            continue;
        }
        kept_integral += division.integral;
        kept_duration += (division.updated_at - division.started_at).max(1) as f64;
    }

    if let Some(dropped) = most_recently_dropped {
        kept_integral += dropped.integral;
        kept_duration += (dropped.updated_at - dropped.started_at).max(1) as f64;
    }

    let moving_average = if kept_duration <= 0.0 {
        0.0
    } else {
        kept_integral / kept_duration
    };

    let weight = normalized_weight(payload, &token_in.denom, token_in.amount);
    if weight > moving_average + limiter.boundary_offset {
        return Err(PoolMathError::ChangeRateLimiterExceeded {
            pool_id: pool.id,
            denom: token_in.denom.clone(),
            weight,
            bound: moving_average + limiter.boundary_offset,
        });
    }
    Ok(())
}

pub fn swap_exact_in(
    pool: &Pool,
    payload: &AlloyedTransmuterPayload,
    token_in: &Coin,
    token_out_denom: &str,
) -> Result<Coin, PoolMathError> {
    let now = chrono::Utc::now().timestamp();
    swap_exact_in_at(pool, payload, token_in, token_out_denom, now)
}

fn swap_exact_in_at(
    pool: &Pool,
    payload: &AlloyedTransmuterPayload,
    token_in: &Coin,
    token_out_denom: &str,
    now: i64,
) -> Result<Coin, PoolMathError> {
    let asset_in = asset_or_err(pool, payload, &token_in.denom)?;
    let asset_out = asset_or_err(pool, payload, token_out_denom)?;

    if asset_in.normalization_factor == 0 {
        return Err(PoolMathError::ZeroNormalizationFactor {
            pool_id: pool.id,
            denom: token_in.denom.clone(),
        });
    }

    check_static_limiter(pool, payload, token_in)?;
    check_change_limiter(pool, payload, token_in, now)?;

    let amount_out = token_in
        .amount
        .saturating_mul(asset_out.normalization_factor)
        / asset_in.normalization_factor;

    let is_alloyed_output = token_out_denom == payload.alloyed_denom;
    if !is_alloyed_output {
        let have = payload.reserves.get(token_out_denom).copied().unwrap_or(0);
        if amount_out > have {
            return Err(PoolMathError::InsufficientBalance {
                pool_id: pool.id,
                denom: token_out_denom.to_string(),
                have,
                want: amount_out,
            });
        }
    }

    Ok(Coin::new(token_out_denom.to_string(), amount_out))
}

pub fn spot_price(
    pool: &Pool,
    payload: &AlloyedTransmuterPayload,
    base: &str,
    quote: &str,
) -> Result<f64, PoolMathError> {
    let asset_base = asset_or_err(pool, payload, base)?;
    let asset_quote = asset_or_err(pool, payload, quote)?;
    if asset_quote.normalization_factor == 0 {
        return Err(PoolMathError::ZeroNormalizationFactor {
            pool_id: pool.id,
            denom: quote.to_string(),
        });
    }
    Ok(asset_base.normalization_factor as f64 / asset_quote.normalization_factor as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PoolPayload, PoolType, SpreadFactor};
    use std::collections::HashMap;

    fn pool() -> Pool {
        let assets = vec![
            AlloyedAssetConfig {
                denom: "USDC".to_string(),
                normalization_factor: 100,
                is_alloyed_lp_share: false,
                static_limiter: None,
                change_limiter: None,
            },
            AlloyedAssetConfig {
                denom: "USDT".to_string(),
                normalization_factor: 1,
                is_alloyed_lp_share: false,
                static_limiter: None,
                change_limiter: None,
            },
            AlloyedAssetConfig {
                denom: "ALLUSD".to_string(),
                normalization_factor: 10,
                is_alloyed_lp_share: true,
                static_limiter: None,
                change_limiter: None,
            },
        ];
        let mut reserves = HashMap::new();
        reserves.insert("USDC".to_string(), 1_000_000);
        reserves.insert("USDT".to_string(), 1_000_000);
        Pool {
            id: 3,
            pool_type: PoolType::AlloyedTransmuter,
            denoms: vec!["USDC".to_string(), "USDT".to_string(), "ALLUSD".to_string()],
            balances: reserves.clone(),
            spread_factor: SpreadFactor::ZERO,
            liquidity_cap: 0,
            taker_fee_override: None,
            payload: PoolPayload::AlloyedTransmuter(AlloyedTransmuterPayload {
                alloyed_denom: "ALLUSD".to_string(),
                assets,
                reserves,
            }),
        }
    }

    fn payload(p: &Pool) -> &AlloyedTransmuterPayload {
        match &p.payload {
            PoolPayload::AlloyedTransmuter(a) => a,
            _ => unreachable!(),
        }
    }

    #[test]
    fn scenario_3_normalization() {
        let p = pool();
        let pl = payload(&p);

        let out = swap_exact_in_at(&p, pl, &Coin::new("USDC", 10), "USDT", 0).unwrap();
        assert_eq!(out.amount, 0); // 10 * 1 / 100 = 0, truncated

        let out = swap_exact_in_at(&p, pl, &Coin::new("USDC", 100), "USDT", 0).unwrap();
        assert_eq!(out.amount, 1);

        let out = swap_exact_in_at(&p, pl, &Coin::new("USDT", 1), "ALLUSD", 0).unwrap();
        assert_eq!(out.amount, 10);
    }

    #[test]
    fn static_limiter_exceeded() {
        let mut p = pool();
        if let PoolPayload::AlloyedTransmuter(pl) = &mut p.payload {
            pl.assets[0].static_limiter = Some(crate::domain::StaticRateLimiterConfig {
                upper_limit: 0.5,
            });
        }
        let pl = payload(&p);
        // Pushing a huge amount of USDC in skews its normalized weight over 0.5.
        let err = swap_exact_in_at(&p, pl, &Coin::new("USDC", 10_000_000), "USDT", 0).unwrap_err();
        assert!(matches!(err, PoolMathError::StaticRateLimiterExceeded { .. }));
    }
}
