//! Typed error kinds for every layer of the query core.
//!
//! Pool-math kernels and the router/quote engine return narrow, typed errors
//! (per-kind, not per-pool-type) so callers can recover precisely — the quote
//! engine discards a single bad route instead of aborting a request (see
//! `quote::engine`). `AppError` is the HTTP-facing umbrella that every other
//! error kind converts into.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use crate::domain::PoolId;

/// Errors raised by a pool-math kernel's `calculate_token_out_by_token_in`,
/// `calc_spot_price`, or `charge_taker_fee_exact_in`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PoolMathError {
    #[error("pool {pool_id}: insufficient liquidity for denom {denom}")]
    InsufficientLiquidity { pool_id: PoolId, denom: String },

    #[error("pool {pool_id}: insufficient balance of {denom} ({have} < {want})")]
    InsufficientBalance {
        pool_id: PoolId,
        denom: String,
        have: u128,
        want: u128,
    },

    #[error("pool {pool_id}: no tick model present")]
    NoTickModel { pool_id: PoolId },

    #[error("pool {pool_id}: current tick out of range")]
    CurrentTickOutOfRange { pool_id: PoolId },

    #[error("pool {pool_id}: current tick {current_tick} not within bucket [{lower}, {upper})")]
    CurrentTickNotWithinBucket {
        pool_id: PoolId,
        current_tick: i64,
        lower: i64,
        upper: i64,
    },

    #[error("pool {pool_id}: zero current sqrt price")]
    ZeroCurrentSqrtPrice { pool_id: PoolId },

    #[error("pool {pool_id}: zero normalization factor for {denom}")]
    ZeroNormalizationFactor { pool_id: PoolId, denom: String },

    #[error("pool {pool_id}: missing normalization factor for {denom}")]
    MissingNormalizationFactor { pool_id: PoolId, denom: String },

    #[error("pool {pool_id}: static rate limiter exceeded for {denom} ({weight} > {limit})")]
    StaticRateLimiterExceeded {
        pool_id: PoolId,
        denom: String,
        weight: f64,
        limit: f64,
    },

    #[error("pool {pool_id}: change rate limiter exceeded for {denom} ({weight} > {bound})")]
    ChangeRateLimiterExceeded {
        pool_id: PoolId,
        denom: String,
        weight: f64,
        bound: f64,
    },

    #[error("pool {pool_id}: orderbook insufficient liquidity past tick {last_tick}")]
    OrderbookInsufficientLiquidity { pool_id: PoolId, last_tick: i64 },

    #[error("pool {pool_id}: orderbook mismatch: ({token_in}, {token_out}) is not (base, quote) or (quote, base)")]
    OrderbookMismatch {
        pool_id: PoolId,
        token_in: String,
        token_out: String,
    },

    #[error("pool {pool_id}: orderbook invalid direction")]
    OrderbookInvalidDirection { pool_id: PoolId },

    #[error("pool {pool_id}: pool type {expected} does not support {got}")]
    PoolTypeMismatch {
        pool_id: PoolId,
        expected: &'static str,
        got: &'static str,
    },

    #[error("pool {pool_id}: requires an external contract query, none configured")]
    ExternalQueryRequired { pool_id: PoolId },
}

impl PoolMathError {
    pub fn pool_id(&self) -> PoolId {
        match self {
            PoolMathError::InsufficientLiquidity { pool_id, .. }
            | PoolMathError::InsufficientBalance { pool_id, .. }
            | PoolMathError::NoTickModel { pool_id }
            | PoolMathError::CurrentTickOutOfRange { pool_id }
            | PoolMathError::CurrentTickNotWithinBucket { pool_id, .. }
            | PoolMathError::ZeroCurrentSqrtPrice { pool_id }
            | PoolMathError::ZeroNormalizationFactor { pool_id, .. }
            | PoolMathError::MissingNormalizationFactor { pool_id, .. }
            | PoolMathError::StaticRateLimiterExceeded { pool_id, .. }
            | PoolMathError::ChangeRateLimiterExceeded { pool_id, .. }
            | PoolMathError::OrderbookInsufficientLiquidity { pool_id, .. }
            | PoolMathError::OrderbookMismatch { pool_id, .. }
            | PoolMathError::OrderbookInvalidDirection { pool_id }
            | PoolMathError::PoolTypeMismatch { pool_id, .. }
            | PoolMathError::ExternalQueryRequired { pool_id } => *pool_id,
        }
    }
}

/// Errors raised while assembling or evaluating candidate routes.
#[derive(Debug, Error, Clone)]
pub enum RouterError {
    #[error("no route found between {token_in} and {token_out}")]
    NoRoutesFound { token_in: String, token_out: String },
}

/// Errors raised by the quote engine once routes are in hand.
#[derive(Debug, Error, Clone)]
pub enum QuoteError {
    #[error(transparent)]
    NoRoutes(#[from] RouterError),

    #[error("all {count} candidate routes failed, first error: {first}")]
    AllRoutesFailed { count: usize, first: PoolMathError },

    #[error("quote produced zero amount out")]
    AmountOutZero,
}

/// Errors raised by the chain or external pricing sources.
#[derive(Debug, Error, Clone)]
pub enum PricingError {
    #[error("no price available for {base}/{quote}")]
    NoPrice { base: String, quote: String },

    #[error("price for {base}/{quote} truncated to zero")]
    PriceTruncated { base: String, quote: String },

    #[error("external price oracle unavailable: {0}")]
    ExternalUnavailable(String),
}

/// Errors raised while staging or committing an ingest transaction.
#[derive(Debug, Error, Clone)]
pub enum IngestError {
    #[error("failed to parse record: {0}")]
    ParseFailed(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
}

/// The HTTP-facing umbrella error. Every lower error kind converts into it;
/// `IntoResponse` implements the mapping table from spec §7.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    PoolMath(#[from] PoolMathError),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Router(RouterError::NoRoutesFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Quote(QuoteError::NoRoutes(RouterError::NoRoutesFound { .. })) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "message": self.to_string() }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
