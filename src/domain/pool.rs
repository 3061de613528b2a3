use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Denom, PoolId};

/// The seven pool variants from spec §3. A pool's behavior is entirely
/// determined by this discriminant plus its payload — kernels dispatch on it
/// via `match`, there is no trait-object-per-pool-instance indirection (see
/// DESIGN.md, "dynamic dispatch over pool types").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolType {
    Balancer,
    StableSwap,
    ConcentratedLiquidity,
    Transmuter,
    AlloyedTransmuter,
    OrderBook,
    GeneralizedCosmWasm,
}

/// A fractional fixed-point value in basis-points-of-a-billionth precision,
/// matching the chain's published spread-factor/fee representation. Stored
/// as an integer numerator over `SpreadFactor::PRECISION` to avoid float
/// drift across repeated ingest cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpreadFactor(pub u64);

impl SpreadFactor {
    /// `SpreadFactor(PRECISION)` represents a 100% fee.
    pub const PRECISION: u64 = 1_000_000_000_000_000_000;

    pub const ZERO: SpreadFactor = SpreadFactor(0);

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / Self::PRECISION as f64
    }

    /// Deduct this fraction from `amount`, rounding down.
    pub fn deduct_from(&self, amount: u128) -> u128 {
        let kept = Self::PRECISION - self.0.min(Self::PRECISION);
        (amount * kept as u128) / Self::PRECISION as u128
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancerPayload {
    /// denom -> pool weight (equal weights for a plain xy=k pool).
    pub weights: HashMap<Denom, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StableSwapPayload {
    /// Amplification coefficient of the chain's StableSwap curve.
    pub amplification: u64,
    /// Per-denom scaling factor applied before the curve (accounts for
    /// denoms with different precisions participating in one stable pool).
    pub scaling_factors: HashMap<Denom, u128>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TickBucket {
    pub lower_tick: i64,
    pub upper_tick: i64,
    pub liquidity: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcentratedLiquidityPayload {
    pub ticks: Vec<TickBucket>,
    pub current_tick_index: usize,
    pub current_sqrt_price: f64,
    pub has_no_liquidity: bool,
    pub base_denom: Denom,
    pub quote_denom: Denom,
}

impl ConcentratedLiquidityPayload {
    /// Invariant from spec §3: `ticks[current_tick_index].lower_tick <=
    /// current_tick < ticks[current_tick_index].upper_tick`, unless
    /// `has_no_liquidity`.
    pub fn current_tick(&self) -> Option<i64> {
        if self.has_no_liquidity {
            return None;
        }
        // current_sqrt_price uniquely determines current_tick for the
        // purposes of the invariant check; callers that need the exact
        // integer tick derive it from sqrt_price via the CL kernel.
        self.ticks
            .get(self.current_tick_index)
            .map(|b| b.lower_tick)
    }

    pub fn invariant_holds(&self, current_tick: i64) -> bool {
        if self.has_no_liquidity {
            return true;
        }
        match self.ticks.get(self.current_tick_index) {
            Some(b) => b.lower_tick <= current_tick && current_tick < b.upper_tick,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransmuterPayload {
    pub reserves: HashMap<Denom, u128>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlloyedAssetConfig {
    pub denom: Denom,
    pub normalization_factor: u128,
    /// Explicit flag per the Open Questions resolution (spec §9): an asset
    /// is the alloyed LP-share denom iff this is true, never inferred from
    /// a substring match on the denom string.
    pub is_alloyed_lp_share: bool,
    pub static_limiter: Option<StaticRateLimiterConfig>,
    pub change_limiter: Option<ChangeRateLimiterConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StaticRateLimiterConfig {
    pub upper_limit: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRateLimiterConfig {
    pub window_seconds: i64,
    pub divisions: Vec<ChangeLimiterDivision>,
    pub boundary_offset: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChangeLimiterDivision {
    pub started_at: i64,
    pub updated_at: i64,
    pub latest_value: f64,
    pub integral: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlloyedTransmuterPayload {
    pub alloyed_denom: Denom,
    pub assets: Vec<AlloyedAssetConfig>,
    /// Reserves of the underlying (non-alloyed) assets only.
    pub reserves: HashMap<Denom, u128>,
}

impl AlloyedTransmuterPayload {
    pub fn asset(&self, denom: &str) -> Option<&AlloyedAssetConfig> {
        self.assets.iter().find(|a| a.denom == denom)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderBookTick {
    pub tick_id: i64,
    pub bid_liquidity: u128,
    pub ask_liquidity: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookPayload {
    pub base_denom: Denom,
    pub quote_denom: Denom,
    pub next_bid_tick: i64,
    pub next_ask_tick: i64,
    /// Sorted ascending by `tick_id`.
    pub ticks: Vec<OrderBookTick>,
    pub contract_address: String,
}

impl OrderBookPayload {
    pub fn tick_index(&self, tick_id: i64) -> Option<usize> {
        self.ticks.binary_search_by_key(&tick_id, |t| t.tick_id).ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PoolPayload {
    Balancer(BalancerPayload),
    StableSwap(StableSwapPayload),
    ConcentratedLiquidity(ConcentratedLiquidityPayload),
    Transmuter(TransmuterPayload),
    AlloyedTransmuter(AlloyedTransmuterPayload),
    OrderBook(OrderBookPayload),
    GeneralizedCosmWasm { contract_address: String },
}

/// A single pool, as stored in the pool store (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub pool_type: PoolType,
    pub denoms: Vec<Denom>,
    pub balances: HashMap<Denom, u128>,
    pub spread_factor: SpreadFactor,
    pub liquidity_cap: u128,
    pub taker_fee_override: Option<SpreadFactor>,
    pub payload: PoolPayload,
}

impl Pool {
    pub fn has_denom(&self, denom: &str) -> bool {
        self.denoms.iter().any(|d| d == denom)
    }

    pub fn other_denoms(&self, denom: &str) -> impl Iterator<Item = &Denom> {
        self.denoms.iter().filter(move |d| d.as_str() != denom)
    }

    /// `true` if this pool is an `OrderBook` — used by the route finder's
    /// pre-filter (spec §4.3 step 2: "drop non-canonical orderbook pools").
    pub fn is_orderbook(&self) -> bool {
        matches!(self.pool_type, PoolType::OrderBook)
    }

    pub fn orderbook_payload(&self) -> Option<&OrderBookPayload> {
        match &self.payload {
            PoolPayload::OrderBook(p) => Some(p),
            _ => None,
        }
    }
}
