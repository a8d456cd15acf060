//! Upstream ingestion: fetching both sources and deriving persisted rows.

pub mod client;
pub mod factor;
pub mod merge;
pub mod rates;

pub use client::{UpstreamClient, UpstreamSnapshot};
pub use factor::{FactorSource, FixedFactor, RandomFactor};
pub use merge::merge_country;
pub use rates::RateTable;
