//! Per-community settings: persistence and the in-memory cache in front of it.

pub mod cache;
pub mod store;

pub use cache::ConfigCache;
pub use store::{CommunityStore, JsonCommunityStore};
