//! PageTree Core
//!
//! Mutation and validation engine for the hierarchical page tree of a
//! multi-site, multi-language CMS.
//!
//! # Architecture
//!
//! - **Arena tree**: Pages are addressed by stable ids with an explicit
//!   parent index; cycle checks are bounded ancestor walks
//! - **Validate, then mutate**: Every request is checked against a private
//!   copy of the tree; the live tree is swapped only after one successful
//!   persistence write
//! - **Per-site serialization**: Mutations on one site never interleave,
//!   reads always see the latest committed snapshot
//! - **Explicit sessions**: Filter and cut/copy mark live in a caller-owned
//!   [`ViewSession`](services::ViewSession)
//!
//! # Modules
//!
//! - [`models`] - Pages, translations, the tree arena and forest snapshots
//! - [`services`] - Move validation, copy, cut/paste, publishing, filtering
//! - [`db`] - Storage traits, JSON file and memory backends, domain events
//! - [`config`] - Engine configuration

pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::EngineConfig;
pub use models::*;
pub use services::*;
