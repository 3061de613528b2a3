//! Token metadata (C11, spec §4.9): a reloadable denom → metadata mapping,
//! loaded from a remote asset list and refreshed periodically. The asset-list
//! fetch is an external collaborator (`AssetListLoader`); the core only
//! owns the atomic-swap publication of whatever the loader returns.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Denom;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenomMetadata {
    pub human_symbol: String,
    pub precision: u32,
    pub is_unlisted: bool,
    pub external_oracle_id: Option<String>,
}

impl DenomMetadata {
    /// `sf(denom) = 10^precision(denom)` (spec §4.6 step 1).
    pub fn scaling_factor(&self) -> u128 {
        10u128.saturating_pow(self.precision)
    }
}

#[async_trait]
pub trait AssetListLoader: Send + Sync {
    async fn load(&self) -> anyhow::Result<HashMap<Denom, DenomMetadata>>;
}

/// Fetches the asset list from a remote HTTP endpoint as a flat
/// `{denom: DenomMetadata}` JSON object.
pub struct HttpAssetListLoader {
    client: reqwest::Client,
    url: String,
}

impl HttpAssetListLoader {
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into() }
    }
}

#[async_trait]
impl AssetListLoader for HttpAssetListLoader {
    async fn load(&self) -> anyhow::Result<HashMap<Denom, DenomMetadata>> {
        let mapping = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json::<HashMap<Denom, DenomMetadata>>()
            .await?;
        Ok(mapping)
    }
}

pub struct TokenMetadataTable {
    inner: RwLock<Arc<HashMap<Denom, DenomMetadata>>>,
}

impl TokenMetadataTable {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    pub fn get(&self, denom: &str) -> Option<DenomMetadata> {
        self.inner.read().unwrap().get(denom).cloned()
    }

    pub fn snapshot(&self) -> Arc<HashMap<Denom, DenomMetadata>> {
        self.inner.read().unwrap().clone()
    }

    pub fn publish(&self, mapping: HashMap<Denom, DenomMetadata>) {
        *self.inner.write().unwrap() = Arc::new(mapping);
    }

    pub async fn reload(&self, loader: &dyn AssetListLoader) -> anyhow::Result<()> {
        let mapping = loader.load().await?;
        self.publish(mapping);
        Ok(())
    }
}

impl Default for TokenMetadataTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_factor_matches_precision() {
        let meta = DenomMetadata {
            human_symbol: "USDC".to_string(),
            precision: 6,
            is_unlisted: false,
            external_oracle_id: None,
        };
        assert_eq!(meta.scaling_factor(), 1_000_000);
    }

    #[test]
    fn publish_replaces_whole_mapping() {
        let table = TokenMetadataTable::new();
        let mut mapping = HashMap::new();
        mapping.insert(
            "USDC".to_string(),
            DenomMetadata {
                human_symbol: "USDC".to_string(),
                precision: 6,
                is_unlisted: false,
                external_oracle_id: None,
            },
        );
        table.publish(mapping);
        assert_eq!(table.get("USDC").unwrap().precision, 6);
        assert!(table.get("OSMO").is_none());
    }
}
