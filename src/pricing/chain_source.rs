//! Chain pricing source (C7, spec §4.6): derives a price via a self-quote
//! through the quote engine.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;

use crate::domain::{Coin, Denom};
use crate::error::PricingError;
use crate::fees::TakerFeeTable;
use crate::pool::store::PoolStore;
use crate::quote::quote;
use crate::router::{cache::SingleFlightCache, find_candidate_routes, FindRoutesParams, RouterConfig};
use crate::tokens::TokenMetadataTable;

#[derive(Debug, Clone, Default)]
pub struct GetPriceOpts {
    /// Spec §4.7 step 2: the pricing worker bypasses the price cache to
    /// force recomputation on a new block.
    pub recompute: bool,
    pub min_pool_liquidity_cap: Option<u128>,
}

/// Outcome of a self-quote attempt, cacheable as-is so the single-flight
/// cache doesn't need to special-case errors.
#[derive(Debug, Clone)]
enum PriceComputation {
    Price(BigDecimal),
    Truncated,
    Unavailable,
}

pub struct ChainPricingSource {
    store: Arc<PoolStore>,
    fees: Arc<TakerFeeTable>,
    metadata: Arc<TokenMetadataTable>,
    router_cfg: RouterConfig,
    cache: SingleFlightCache<PriceComputation>,
}

impl ChainPricingSource {
    pub fn new(
        store: Arc<PoolStore>,
        fees: Arc<TakerFeeTable>,
        metadata: Arc<TokenMetadataTable>,
        cache_expiry: Duration,
    ) -> Self {
        Self {
            store,
            fees,
            metadata,
            router_cfg: RouterConfig::pricing_defaults(),
            cache: SingleFlightCache::new(cache_expiry),
        }
    }

    pub async fn get_price(
        &self,
        base: &Denom,
        quote_denom: &Denom,
        opts: &GetPriceOpts,
    ) -> Result<BigDecimal, PricingError> {
        let computation = if opts.recompute {
            compute_price(&self.store, &self.fees, &self.metadata, &self.router_cfg, base, quote_denom, opts)
        } else {
            let key = format!("{}{}{}", base, crate::domain::KEY_SEPARATOR, quote_denom);
            let base_owned = base.clone();
            let quote_owned = quote_denom.clone();
            let opts_owned = opts.clone();
            let store = self.store.clone();
            let fees = self.fees.clone();
            let metadata = self.metadata.clone();
            let router_cfg = self.router_cfg.clone();

            self.cache
                .get_or_compute(key, move || async move {
                    compute_price(&store, &fees, &metadata, &router_cfg, &base_owned, &quote_owned, &opts_owned)
                })
                .await
        };

        match computation {
            PriceComputation::Price(p) => Ok(p),
            PriceComputation::Truncated => Err(PricingError::PriceTruncated {
                base: base.clone(),
                quote: quote_denom.clone(),
            }),
            PriceComputation::Unavailable => Err(PricingError::NoPrice {
                base: base.clone(),
                quote: quote_denom.clone(),
            }),
        }
    }
}

/// Steps 1-4 of spec §4.6: scale one unit of quote by its token precision,
/// self-quote it for base through the router, and turn the ratio into a
/// high-precision rational.
fn compute_price(
    store: &PoolStore,
    fees: &TakerFeeTable,
    metadata: &TokenMetadataTable,
    router_cfg: &RouterConfig,
    base: &Denom,
    quote_denom: &Denom,
    opts: &GetPriceOpts,
) -> PriceComputation {
    let Some(quote_meta) = metadata.get(quote_denom) else {
        return PriceComputation::Unavailable;
    };
    let sf_quote = quote_meta.scaling_factor();

    let mut cfg = router_cfg.clone();
    if let Some(min_cap) = opts.min_pool_liquidity_cap {
        cfg.min_pool_liquidity_cap = min_cap;
    }

    let params = FindRoutesParams {
        token_in_denom: quote_denom.clone(),
        token_out_denom: base.clone(),
        max_routes: cfg.max_routes,
        max_pools_per_route: cfg.max_pools_per_route,
        min_pool_liquidity_cap: cfg.min_pool_liquidity_cap,
        preferred_pool_ids: Default::default(),
        skip_pool_ids: Default::default(),
    };
    let routes = find_candidate_routes(store, &params);
    if routes.is_empty() {
        return PriceComputation::Unavailable;
    }

    let token_in = Coin::new(quote_denom.clone(), sf_quote);
    let Ok(result) = quote(store, fees, routes, &token_in, base, &cfg) else {
        return PriceComputation::Unavailable;
    };
    if result.amount_out == 0 {
        return PriceComputation::Unavailable;
    }

    let (Ok(numer), Ok(denom)) = (
        BigDecimal::from_str(&sf_quote.to_string()),
        BigDecimal::from_str(&result.amount_out.to_string()),
    ) else {
        return PriceComputation::Unavailable;
    };
    let price = numer / denom;
    if price == BigDecimal::from(0) {
        return PriceComputation::Truncated;
    }
    PriceComputation::Price(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BalancerPayload, PoolPayload, PoolType, SpreadFactor};
    use crate::tokens::DenomMetadata;
    use std::collections::HashMap;

    fn balancer(id: crate::domain::PoolId, a: &str, b: &str, reserve_a: u128, reserve_b: u128) -> crate::domain::Pool {
        let mut balances = HashMap::new();
        balances.insert(a.to_string(), reserve_a);
        balances.insert(b.to_string(), reserve_b);
        let mut weights = HashMap::new();
        weights.insert(a.to_string(), 1);
        weights.insert(b.to_string(), 1);
        crate::domain::Pool {
            id,
            pool_type: PoolType::Balancer,
            denoms: vec![a.to_string(), b.to_string()],
            balances,
            spread_factor: SpreadFactor::ZERO,
            liquidity_cap: 100,
            taker_fee_override: None,
            payload: PoolPayload::Balancer(BalancerPayload { weights }),
        }
    }

    #[tokio::test]
    async fn self_quote_matches_scenario_6() {
        let store = Arc::new(PoolStore::new());
        // 1 USDC -> 0.25 OSMO, so 1 OSMO ~= 4 USDC.
        store.store(vec![balancer(1, "USDC", "OSMO", 4_000_000, 1_000_000)]);
        let fees = Arc::new(TakerFeeTable::new(SpreadFactor::ZERO));
        let metadata = Arc::new(TokenMetadataTable::new());
        let mut mapping = HashMap::new();
        mapping.insert(
            "USDC".to_string(),
            DenomMetadata { human_symbol: "USDC".to_string(), precision: 6, is_unlisted: false, external_oracle_id: None },
        );
        metadata.publish(mapping);

        let source = ChainPricingSource::new(store, fees, metadata, Duration::from_millis(100));
        let price = source
            .get_price(&"OSMO".to_string(), &"USDC".to_string(), &GetPriceOpts::default())
            .await
            .unwrap();
        let approx: f64 = price.to_string().parse().unwrap();
        assert!((approx - 4.0).abs() < 0.1, "got {approx}");
    }
}
