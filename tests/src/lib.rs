//! Shared helpers for the Meteora Nexus integration tests.

pub mod fixtures;
pub mod mocks;
pub mod setup;
