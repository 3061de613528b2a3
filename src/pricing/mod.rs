//! Pricing sources (C7, C8), the published prices table, and the pricing
//! worker (C9).

pub mod chain_source;
pub mod external_source;
pub mod table;
pub mod worker;

pub use chain_source::{ChainPricingSource, GetPriceOpts};
pub use external_source::ExternalPricingSource;
pub use table::{PriceEntry, PricesTable};
pub use worker::{PricingWorker, PricingWorkerConfig};
