//! Repository implementations

pub mod memory;

pub use memory::{InMemoryAgentStore, InMemoryCampaignStore};
