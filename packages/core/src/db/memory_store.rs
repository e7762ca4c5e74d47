//! In-memory store for tests and embedding.
//!
//! Keeps trees and view state in process memory. Sharing one `MemoryStore`
//! (via `Arc`) between two engine instances simulates a reload: the second
//! instance sees exactly what the first one persisted.

use crate::db::{StoreError, TreeStore, ViewStateStore};
use crate::models::{NodeId, PageTree};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    trees: Mutex<HashMap<String, PageTree>>,
    expanded: Mutex<HashMap<String, HashSet<NodeId>>>,
    fail_writes: AtomicBool,
    fail_view_writes: AtomicBool,
    tree_writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with [`StoreError::WriteFailed`]
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make only view-state writes fail, leaving tree writes working
    pub fn set_fail_view_writes(&self, fail: bool) {
        self.fail_view_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `save_tree` calls so far
    pub fn tree_writes(&self) -> usize {
        self.tree_writes.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::write_failed("memory store is read-only"));
        }
        Ok(())
    }

    fn check_view_writable(&self) -> Result<(), StoreError> {
        self.check_writable()?;
        if self.fail_view_writes.load(Ordering::SeqCst) {
            return Err(StoreError::write_failed("view state is read-only"));
        }
        Ok(())
    }
}

#[async_trait]
impl TreeStore for MemoryStore {
    async fn load_tree(&self, site_id: &str) -> Result<Option<PageTree>, StoreError> {
        let trees = self.trees.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(trees.get(site_id).cloned())
    }

    async fn save_tree(&self, tree: &PageTree) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut trees = self.trees.lock().map_err(|_| StoreError::LockPoisoned)?;
        trees.insert(tree.site_id.clone(), tree.clone());
        self.tree_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ViewStateStore for MemoryStore {
    async fn expanded_nodes(&self, site_id: &str) -> Result<HashSet<NodeId>, StoreError> {
        let expanded = self.expanded.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(expanded.get(site_id).cloned().unwrap_or_default())
    }

    async fn set_expanded(
        &self,
        site_id: &str,
        node_id: &str,
        expanded: bool,
    ) -> Result<(), StoreError> {
        self.check_view_writable()?;
        let mut all = self.expanded.lock().map_err(|_| StoreError::LockPoisoned)?;
        let site = all.entry(site_id.to_string()).or_default();
        if expanded {
            site.insert(node_id.to_string());
        } else {
            site.remove(node_id);
        }
        Ok(())
    }

    async fn forget_nodes(&self, site_id: &str, node_ids: &[NodeId]) -> Result<(), StoreError> {
        self.check_view_writable()?;
        let mut all = self.expanded.lock().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(site) = all.get_mut(site_id) {
            for id in node_ids {
                site.remove(id);
            }
        }
        Ok(())
    }
}
