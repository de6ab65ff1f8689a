//! # st-infra
//!
//! Infrastructure adapters for the spot-it cycle tracker: the REST identity
//! gateway, the REST profile document store, the file-backed auth cache, and
//! in-memory fakes for tests and offline development.

pub mod auth_cache;
pub mod config;
pub mod identity;
pub mod memory;
pub mod profile_store;

pub use auth_cache::FileAuthCache;
pub use identity::{FederatedCredential, FederatedFlowPort, RestIdentityGateway};
pub use profile_store::RestProfileStore;
