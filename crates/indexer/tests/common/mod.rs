//! Test infrastructure for the indexer.
//!
//! Fixtures for catalog documents and criteria, plus an in-memory
//! [`SearchRepository`](helios_indexer::SearchRepository) fake.

#![allow(dead_code)]

pub mod fixtures;
pub mod repository;

// Re-export commonly used items
pub use fixtures::*;
pub use repository::*;
