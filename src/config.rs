//! Configuration management: environment variables (optionally backed by a
//! `.env` file and an optional TOML file), parsed with `clap`.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "sqs-core", about = "Read-optimized sidecar query server")]
pub struct Config {
    /// Optional TOML file providing defaults for any variable not already set
    /// in the environment.
    #[arg(long, env = "SQS_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    #[arg(long, env = "SQS_HTTP_BIND_ADDR", default_value = "0.0.0.0:9092")]
    pub http_bind_addr: SocketAddr,

    #[arg(long, env = "SQS_INGEST_BIND_ADDR", default_value = "0.0.0.0:9093")]
    pub ingest_bind_addr: SocketAddr,

    #[arg(long, env = "SQS_MAX_INGEST_MESSAGE_BYTES", default_value_t = 16 * 1024 * 1024)]
    pub max_ingest_message_bytes: usize,

    #[arg(long, env = "SQS_ROUTER_MAX_ROUTES", default_value_t = 10)]
    pub router_max_routes: usize,

    #[arg(long, env = "SQS_ROUTER_MAX_POOLS_PER_ROUTE", default_value_t = 4)]
    pub router_max_pools_per_route: usize,

    #[arg(long, env = "SQS_ROUTER_MIN_POOL_LIQUIDITY_CAP", default_value_t = 0)]
    pub router_min_pool_liquidity_cap: u128,

    #[arg(long, env = "SQS_ROUTER_MAX_SPLIT_ROUTES", default_value_t = 3)]
    pub router_max_split_routes: usize,

    #[arg(long, env = "SQS_ROUTER_MAX_SPLIT_ITERATIONS", default_value_t = 10)]
    pub router_max_split_iterations: u32,

    #[arg(long, env = "SQS_CANDIDATE_ROUTE_CACHE_EXPIRY_SECONDS", default_value_t = 30)]
    pub candidate_route_cache_expiry_seconds: u64,

    #[arg(long, env = "SQS_RANKED_ROUTE_CACHE_EXPIRY_SECONDS", default_value_t = 5)]
    pub ranked_route_cache_expiry_seconds: u64,

    #[arg(long, env = "SQS_PRICING_DEFAULT_QUOTE_DENOM", default_value = "usdc")]
    pub pricing_default_quote_denom: String,

    #[arg(long, env = "SQS_PRICING_MIN_POOL_LIQUIDITY_CAP", default_value_t = 0)]
    pub pricing_min_pool_liquidity_cap: u128,

    #[arg(long, env = "SQS_PRICING_FANOUT_CONCURRENCY", default_value_t = 8)]
    pub pricing_fanout_concurrency: usize,

    #[arg(long, env = "SQS_PRICING_CACHE_EXPIRY_SECONDS", default_value_t = 30)]
    pub pricing_cache_expiry_seconds: u64,

    /// Base URL of the external pricing oracle (C8). Left unset disables it.
    #[arg(long, env = "SQS_EXTERNAL_PRICING_BASE_URL")]
    pub external_pricing_base_url: Option<String>,

    #[arg(long, env = "SQS_ASSET_LIST_URL")]
    pub asset_list_url: String,

    /// Chain-block interval between asset list reloads.
    #[arg(long, env = "SQS_UPDATE_ASSETS_HEIGHT_INTERVAL", default_value_t = 200)]
    pub update_assets_height_interval: u64,

    #[arg(long, env = "SQS_READINESS_THRESHOLD_SECONDS", default_value_t = 30)]
    pub readiness_threshold_seconds: u64,
}

impl Config {
    /// Loads a `.env` file if present, applies an optional TOML file's keys
    /// as environment defaults (never overriding a variable already set),
    /// then parses the environment/CLI into `Config`.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        // A first, env-only pass just to discover `SQS_CONFIG_FILE` before
        // the real parse, since clap resolves env and CLI together.
        if let Ok(path) = std::env::var("SQS_CONFIG_FILE") {
            Self::apply_toml_defaults(&PathBuf::from(path))?;
        }

        Ok(Config::parse())
    }

    fn apply_toml_defaults(path: &PathBuf) -> Result<()> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let table: toml::Value = raw.parse().context("parsing config file as TOML")?;
        let Some(table) = table.as_table() else {
            return Ok(());
        };
        for (key, value) in table {
            let env_key = format!("SQS_{}", key.to_uppercase());
            if std::env::var(&env_key).is_err() {
                let value_str = match value {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                std::env::set_var(env_key, value_str);
            }
        }
        Ok(())
    }
}
