//! Database module: models, schema and the actor owning the connection pool.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows, plus write/query inputs
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `actor.rs`: `DbActor` and its cloneable `DbActorHandle`

pub mod actor;
pub mod models;
pub mod schema;

pub use models::{CountryFilter, CountrySort, CountryUpsert, DbCountry, DbStatus};
pub use schema::SQLITE_INIT;

pub use actor::{DbActorHandle, spawn};
