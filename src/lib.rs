//! Osmosis-style sidecar query server: pool store, candidate-route finder,
//! quote engine, pricing, ingest, and the HTTP/gRPC surfaces built on top of
//! them.

pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod fees;
pub mod http;
pub mod ingest;
pub mod metrics;
pub mod pool;
pub mod pricing;
pub mod quote;
pub mod router;
pub mod tokens;
