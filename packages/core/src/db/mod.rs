//! Persistence Layer
//!
//! This module handles everything that outlives a single request:
//!
//! - Storage traits for page trees and durable view state
//! - A JSON file backend with atomic writes
//! - An in-memory backend for tests and embedding
//! - Domain events broadcast after committed changes
//!
//! # Architecture
//!
//! The engine keeps the live tree of each site in memory and writes the whole
//! tree back through [`TreeStore::save_tree`] once per committed mutation.
//! Expand/collapse flags go through [`ViewStateStore`] so they survive a
//! full reload of the client.

mod error;
pub mod events;
mod json_store;
mod memory_store;
mod store;

pub use error::StoreError;
pub use events::{DomainEvent, TreeChange};
pub use json_store::JsonFileStore;
pub use memory_store::MemoryStore;
pub use store::{TreeStore, ViewStateStore};
