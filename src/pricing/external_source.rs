//! External pricing source (C8, spec §4.6): a thin HTTP adapter with its own
//! cache and TTL, used as the chain source's fallback for configured quote
//! denoms.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use bigdecimal::BigDecimal;
use serde::Deserialize;

use crate::domain::Denom;
use crate::error::PricingError;
use crate::router::cache::SingleFlightCache;

#[derive(Debug, Deserialize)]
struct OracleResponse {
    prices: HashMap<String, String>,
}

pub struct ExternalPricingSource {
    client: reqwest::Client,
    base_url: String,
    cache: SingleFlightCache<Option<BigDecimal>>,
}

impl ExternalPricingSource {
    pub fn new(base_url: impl Into<String>, cache_expiry: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            cache: SingleFlightCache::new(cache_expiry),
        }
    }

    pub async fn get_price(&self, base: &Denom, quote: &Denom) -> Result<BigDecimal, PricingError> {
        let key = format!("{}{}{}", base, crate::domain::KEY_SEPARATOR, quote);
        let base_url = self.base_url.clone();
        let client = self.client.clone();
        let base_owned = base.clone();
        let quote_owned = quote.clone();

        let result = self
            .cache
            .get_or_compute(key, move || async move {
                fetch_price(&client, &base_url, &base_owned, &quote_owned).await
            })
            .await;

        result.ok_or_else(|| PricingError::NoPrice { base: base.clone(), quote: quote.clone() })
    }
}

async fn fetch_price(
    client: &reqwest::Client,
    base_url: &str,
    base: &Denom,
    quote: &Denom,
) -> Option<BigDecimal> {
    let url = format!("{base_url}/prices?base={base}&quote={quote}");
    let response = client.get(&url).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    let body: OracleResponse = response.json().await.ok()?;
    let raw = body.prices.get(base)?;
    BigDecimal::from_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_response_parses() {
        let body = r#"{"prices":{"OSMO":"4.123456"}}"#;
        let parsed: OracleResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.prices.get("OSMO").unwrap(), "4.123456");
    }
}
