mod orbis;

pub use orbis::{ApiErrorBody, OrbisError, UpstreamSource};
