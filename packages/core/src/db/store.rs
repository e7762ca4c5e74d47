//! Storage Traits - Persistence Abstraction
//!
//! The engine never touches files or databases directly. It persists page
//! trees through [`TreeStore`] and durable view state (expand/collapse flags)
//! through [`ViewStateStore`]; both are async so embedded and remote
//! backends fit behind the same interface.
//!
//! # Implementations
//!
//! - [`JsonFileStore`](super::JsonFileStore) - one JSON document per site
//! - [`MemoryStore`](super::MemoryStore) - in-process, for tests and embedding

use crate::db::StoreError;
use crate::models::{NodeId, PageTree};
use async_trait::async_trait;
use std::collections::HashSet;

/// Persistence of site page trees
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the engine shares one store
/// between all sites and sessions.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Load the tree of a site
    ///
    /// - `Ok(Some(tree))` if the site has a stored tree
    /// - `Ok(None)` if nothing was stored yet (not an error)
    /// - `Err(_)` on I/O failure or when the stored tree is corrupt
    async fn load_tree(&self, site_id: &str) -> Result<Option<PageTree>, StoreError>;

    /// Replace the stored tree of `tree.site_id` in a single write
    async fn save_tree(&self, tree: &PageTree) -> Result<(), StoreError>;
}

/// Durable per-node view state
///
/// Only expanded pages are recorded; everything else is collapsed.
#[async_trait]
pub trait ViewStateStore: Send + Sync {
    /// Ids of the pages currently flagged as expanded
    async fn expanded_nodes(&self, site_id: &str) -> Result<HashSet<NodeId>, StoreError>;

    async fn set_expanded(
        &self,
        site_id: &str,
        node_id: &str,
        expanded: bool,
    ) -> Result<(), StoreError>;

    /// Drop view state of pages that no longer exist
    async fn forget_nodes(&self, site_id: &str, node_ids: &[NodeId]) -> Result<(), StoreError>;
}
