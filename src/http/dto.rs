//! JSON request/response shapes for the HTTP API (spec §6).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    #[serde(rename = "tokenIn")]
    pub token_in: String,
    #[serde(rename = "tokenOutDenom")]
    pub token_out_denom: String,
    #[serde(rename = "singleRoute", default)]
    pub single_route: bool,
    #[serde(rename = "appendBaseFee", default)]
    pub append_base_fee: bool,
}

#[derive(Debug, Deserialize)]
pub struct CustomDirectQuoteQuery {
    #[serde(rename = "tokenIn")]
    pub token_in: String,
    #[serde(rename = "tokenOutDenom")]
    pub token_out_denom: String,
    /// Comma-separated, ordered pool ids forcing the exact hop sequence.
    #[serde(rename = "poolID")]
    pub pool_ids: String,
}

#[derive(Debug, Serialize)]
pub struct RouteHopDto {
    pub pools: Vec<u64>,
    pub in_amount: String,
    pub out_amount: String,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponseDto {
    pub amount_in: String,
    pub amount_out: String,
    pub route: Vec<RouteHopDto>,
    pub effective_fee: String,
    pub price_impact: f64,
}

#[derive(Debug, Deserialize)]
pub struct PoolsQuery {
    #[serde(rename = "IDs")]
    pub ids: Option<String>,
    pub min_liquidity_cap: Option<u128>,
    #[serde(default)]
    pub with_market_incentives: bool,
}

#[derive(Debug, Serialize)]
pub struct PoolDto {
    pub chain_model: serde_json::Value,
    pub balances: HashMap<String, String>,
    #[serde(rename = "type")]
    pub pool_type: String,
    pub spread_factor: String,
    pub liquidity_cap: String,
    pub liquidity_cap_error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CanonicalOrderbookQuery {
    pub base: String,
    pub quote: String,
}

#[derive(Debug, Serialize)]
pub struct CanonicalOrderbookDto {
    pub base: String,
    pub quote: String,
    pub pool_id: u64,
    pub contract_address: String,
}

#[derive(Debug, Deserialize)]
pub struct PricesQuery {
    pub base: String,
    pub quote: String,
}

pub type PricesResponseDto = HashMap<String, HashMap<String, String>>;

#[derive(Debug, Serialize)]
pub struct PoolMetadataEntryDto {
    pub total_liquidity: HashMap<String, String>,
    pub total_liquidity_cap: String,
    pub price: Option<String>,
}

pub type PoolMetadataResponseDto = HashMap<String, PoolMetadataEntryDto>;
