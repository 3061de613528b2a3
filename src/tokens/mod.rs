//! Token metadata (C11).

pub mod metadata;

pub use metadata::{AssetListLoader, DenomMetadata, HttpAssetListLoader, TokenMetadataTable};
