pub mod router;
pub mod routes;

pub use router::{OrbisState, orbis_router};
