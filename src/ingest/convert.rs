//! Wire (proto) -> domain conversion. Failures here are the "parser error on
//! a single pool" case from spec §7: the caller skips the offending record
//! and keeps going, it never aborts the whole `Push`.

use std::collections::HashMap;

use crate::domain::{Pool, PoolPayload, PoolType, SpreadFactor};
use crate::error::IngestError;

use super::proto::generated::PoolRecord;

fn parse_pool_type(raw: &str) -> Result<PoolType, IngestError> {
    match raw {
        "Balancer" => Ok(PoolType::Balancer),
        "StableSwap" => Ok(PoolType::StableSwap),
        "ConcentratedLiquidity" => Ok(PoolType::ConcentratedLiquidity),
        "Transmuter" => Ok(PoolType::Transmuter),
        "AlloyedTransmuter" => Ok(PoolType::AlloyedTransmuter),
        "OrderBook" => Ok(PoolType::OrderBook),
        "GeneralizedCosmWasm" => Ok(PoolType::GeneralizedCosmWasm),
        other => Err(IngestError::SchemaMismatch(format!("unknown pool_type {other}"))),
    }
}

pub fn pool_from_record(record: PoolRecord) -> Result<Pool, IngestError> {
    let pool_type = parse_pool_type(&record.pool_type)?;

    let mut balances = HashMap::with_capacity(record.balances.len());
    for (denom, raw) in record.balances {
        let amount: u128 = raw
            .parse()
            .map_err(|_| IngestError::ParseFailed(format!("bad balance {raw} for {denom}")))?;
        balances.insert(denom, amount);
    }

    let spread_factor = SpreadFactor(
        record
            .spread_factor
            .parse()
            .map_err(|_| IngestError::ParseFailed(format!("bad spread_factor {}", record.spread_factor)))?,
    );

    let liquidity_cap: u128 = record
        .liquidity_cap
        .parse()
        .map_err(|_| IngestError::ParseFailed(format!("bad liquidity_cap {}", record.liquidity_cap)))?;

    let taker_fee_override = record
        .taker_fee_override
        .map(|raw| raw.parse::<u64>().map(SpreadFactor))
        .transpose()
        .map_err(|_| IngestError::ParseFailed("bad taker_fee_override".to_string()))?;

    let payload: PoolPayload = serde_json::from_slice(&record.payload_json)
        .map_err(|e| IngestError::ParseFailed(format!("bad payload_json: {e}")))?;

    Ok(Pool {
        id: record.id,
        pool_type,
        denoms: record.denoms,
        balances,
        spread_factor,
        liquidity_cap,
        taker_fee_override,
        payload,
    })
}
