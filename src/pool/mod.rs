//! Pool math kernels (C1) and the pool store (C2).

pub mod kernel;
pub mod store;

pub use kernel::{calc_spot_price, calculate_token_out_by_token_in, charge_taker_fee_exact_in};
pub use store::{CanonicalOrderbook, GetFilteredParams, PoolStore};
