pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod server;
pub mod service;
pub mod summary;

pub use error::OrbisError;
