//! Page Tree
//!
//! `PageTree` is the canonical, site-scoped arena of pages. Pages are keyed by
//! id; hierarchy is kept twice on purpose: every page knows its `parent_id`
//! and every parent (or the tree itself, for root level) owns the ordered
//! list of child ids.
//!
//! Cycle checks are ancestor walks from the candidate target up to the root,
//! bounded by the number of pages in the tree.
//!
//! All mutating methods validate first and only then touch state, so a
//! returned error always leaves the tree unchanged.

use crate::models::page::{NodeId, PageNode, Position, SiteId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Structural errors raised by [`PageTree`] operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Page '{0}' does not exist")]
    NodeNotFound(NodeId),

    #[error("Page '{0}' already exists")]
    DuplicateId(NodeId),

    #[error("Parent page '{0}' does not exist")]
    ParentNotFound(NodeId),

    #[error("Sibling '{sibling_id}' is not a child of {parent}")]
    SiblingNotFound { parent: String, sibling_id: NodeId },

    #[error("Moving parent inside child: '{node_id}' cannot be placed under '{target_id}'")]
    WouldCycle { node_id: NodeId, target_id: NodeId },

    #[error("Corrupt tree: {0}")]
    Corrupt(String),
}

fn describe_parent(parent_id: Option<&str>) -> String {
    match parent_id {
        Some(id) => format!("page '{}'", id),
        None => "the root level".to_string(),
    }
}

/// Ordered forest of pages belonging to one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTree {
    pub site_id: SiteId,
    /// Incremented on every committed structural or publish change
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    roots: Vec<NodeId>,
    #[serde(default)]
    nodes: BTreeMap<NodeId, PageNode>,
}

impl PageTree {
    pub fn new(site_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            version: 0,
            roots: Vec::new(),
            nodes: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&PageNode> {
        self.nodes.get(id)
    }

    /// Mutable access for content changes. Hierarchy fields must not be
    /// edited through this reference.
    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut PageNode> {
        self.nodes.get_mut(id)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Ordered children of `parent_id`, or the root level for `None`
    pub fn children_of(&self, parent_id: Option<&str>) -> Option<&[NodeId]> {
        match parent_id {
            None => Some(&self.roots),
            Some(id) => self.nodes.get(id).map(|n| n.children.as_slice()),
        }
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).and_then(|n| n.parent_id.as_deref())
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: &str) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            if result.len() > self.nodes.len() {
                break;
            }
            result.push(parent.to_string());
            current = self.parent_of(parent);
        }
        result
    }

    /// True when `candidate` is `ancestor` itself or lies in its subtree
    pub fn is_same_or_descendant(&self, ancestor: &str, candidate: &str) -> bool {
        let mut current = Some(candidate);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                break;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// `id` and all its descendants in depth-first, sibling order
    pub fn subtree_ids(&self, id: &str) -> Vec<NodeId> {
        let mut result = Vec::new();
        if !self.contains(id) {
            return result;
        }
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().rev().cloned());
            }
            result.push(current);
        }
        result
    }

    /// Every page with its depth, in display order
    pub fn depth_first(&self) -> Vec<(usize, &PageNode)> {
        let mut result = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, &str)> = self.roots.iter().rev().map(|id| (0, id.as_str())).collect();
        while let Some((depth, id)) = stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children.iter().rev().map(|c| (depth + 1, c.as_str())));
                result.push((depth, node));
            }
        }
        result
    }

    /// Check that `position` resolves among the children of `parent_id`
    pub fn check_position(
        &self,
        parent_id: Option<&str>,
        position: &Position,
    ) -> Result<(), TreeError> {
        let siblings = self.sibling_list(parent_id)?;
        if let Position::Before(sibling_id) = position {
            if !siblings.contains(sibling_id) {
                return Err(TreeError::SiblingNotFound {
                    parent: describe_parent(parent_id),
                    sibling_id: sibling_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Attach a detached page under `parent_id` at `position`.
    ///
    /// Any hierarchy data carried by `node` is replaced.
    pub fn insert(
        &mut self,
        mut node: PageNode,
        parent_id: Option<&str>,
        position: &Position,
    ) -> Result<(), TreeError> {
        if self.contains(&node.id) {
            return Err(TreeError::DuplicateId(node.id));
        }
        self.check_position(parent_id, position)?;

        node.parent_id = parent_id.map(str::to_string);
        node.children.clear();
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        self.attach(&id, parent_id, position);
        Ok(())
    }

    /// Move `id` (with its whole subtree, order preserved) under `parent_id`
    pub fn relocate(
        &mut self,
        id: &str,
        parent_id: Option<&str>,
        position: &Position,
    ) -> Result<(), TreeError> {
        if !self.contains(id) {
            return Err(TreeError::NodeNotFound(id.to_string()));
        }
        if let Some(target) = parent_id {
            if !self.contains(target) {
                return Err(TreeError::ParentNotFound(target.to_string()));
            }
            if self.is_same_or_descendant(id, target) {
                return Err(TreeError::WouldCycle {
                    node_id: id.to_string(),
                    target_id: target.to_string(),
                });
            }
        }

        let current_parent = self.parent_of(id).map(str::to_string);
        if let Position::Before(sibling_id) = position {
            if sibling_id == id {
                // Placing a page before itself keeps it where it is
                if current_parent.as_deref() == parent_id {
                    return Ok(());
                }
                return Err(TreeError::SiblingNotFound {
                    parent: describe_parent(parent_id),
                    sibling_id: sibling_id.clone(),
                });
            }
        }
        self.check_position(parent_id, position)?;

        self.detach(id);
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent_id = parent_id.map(str::to_string);
            node.touch();
        }
        self.attach(id, parent_id, position);
        Ok(())
    }

    /// Remove `id` and its descendants, returning the removed pages in
    /// depth-first order
    pub fn remove_subtree(&mut self, id: &str) -> Result<Vec<PageNode>, TreeError> {
        if !self.contains(id) {
            return Err(TreeError::NodeNotFound(id.to_string()));
        }
        let ids = self.subtree_ids(id);
        self.detach(id);
        Ok(ids.iter().filter_map(|i| self.nodes.remove(i)).collect())
    }

    pub fn bump_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    /// Verify the parent/child bookkeeping of a tree loaded from storage
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(self.nodes.len());
        let mut stack: Vec<(Option<&str>, &str)> =
            self.roots.iter().map(|id| (None, id.as_str())).collect();

        while let Some((expected_parent, id)) = stack.pop() {
            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| TreeError::Corrupt(format!("dangling child reference '{}'", id)))?;
            if !seen.insert(id) {
                return Err(TreeError::Corrupt(format!(
                    "page '{}' is reachable more than once",
                    id
                )));
            }
            if node.parent_id.as_deref() != expected_parent {
                return Err(TreeError::Corrupt(format!(
                    "page '{}' records parent {:?} but is listed under {:?}",
                    id, node.parent_id, expected_parent
                )));
            }
            if node.site_id != self.site_id {
                return Err(TreeError::Corrupt(format!(
                    "page '{}' belongs to site '{}', not '{}'",
                    id, node.site_id, self.site_id
                )));
            }
            stack.extend(node.children.iter().map(|c| (Some(id), c.as_str())));
        }

        if seen.len() != self.nodes.len() {
            return Err(TreeError::Corrupt(format!(
                "{} page(s) are not reachable from the root level",
                self.nodes.len() - seen.len()
            )));
        }
        Ok(())
    }

    fn sibling_list(&self, parent_id: Option<&str>) -> Result<&Vec<NodeId>, TreeError> {
        match parent_id {
            None => Ok(&self.roots),
            Some(id) => self
                .nodes
                .get(id)
                .map(|n| &n.children)
                .ok_or_else(|| TreeError::ParentNotFound(id.to_string())),
        }
    }

    fn sibling_list_mut(&mut self, parent_id: Option<&str>) -> Option<&mut Vec<NodeId>> {
        match parent_id {
            None => Some(&mut self.roots),
            Some(id) => self.nodes.get_mut(id).map(|n| &mut n.children),
        }
    }

    /// Remove `id` from its current sibling list
    fn detach(&mut self, id: &str) {
        let parent = self.parent_of(id).map(str::to_string);
        if let Some(siblings) = self.sibling_list_mut(parent.as_deref()) {
            siblings.retain(|s| s != id);
        }
    }

    /// Add `id` to the sibling list of `parent_id`; position was checked
    fn attach(&mut self, id: &str, parent_id: Option<&str>, position: &Position) {
        if let Some(siblings) = self.sibling_list_mut(parent_id) {
            let index = match position {
                Position::Before(sibling_id) => siblings
                    .iter()
                    .position(|s| s == sibling_id)
                    .unwrap_or(siblings.len()),
                Position::Last => siblings.len(),
            };
            siblings.insert(index, id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: &str) -> PageNode {
        PageNode::new_with_id(id, "site", "default.html")
    }

    /// root level: a[b[c]], d
    fn sample_tree() -> PageTree {
        let mut tree = PageTree::new("site");
        tree.insert(page("a"), None, &Position::Last).unwrap();
        tree.insert(page("b"), Some("a"), &Position::Last).unwrap();
        tree.insert(page("c"), Some("b"), &Position::Last).unwrap();
        tree.insert(page("d"), None, &Position::Last).unwrap();
        tree
    }

    #[test]
    fn test_insert_before_sibling() {
        let mut tree = sample_tree();
        tree.insert(page("e"), None, &Position::Before("a".to_string()))
            .unwrap();

        assert_eq!(tree.roots(), ["e", "a", "d"]);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_insert_rejects_unknown_sibling() {
        let mut tree = sample_tree();
        let before = tree.clone();

        let err = tree
            .insert(page("e"), Some("a"), &Position::Before("d".to_string()))
            .unwrap_err();

        assert!(matches!(err, TreeError::SiblingNotFound { .. }));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_is_same_or_descendant() {
        let tree = sample_tree();

        assert!(tree.is_same_or_descendant("a", "a"));
        assert!(tree.is_same_or_descendant("a", "c"));
        assert!(!tree.is_same_or_descendant("c", "a"));
        assert!(!tree.is_same_or_descendant("a", "d"));
    }

    #[test]
    fn test_relocate_keeps_subtree() {
        let mut tree = sample_tree();
        tree.relocate("b", Some("d"), &Position::Last).unwrap();

        assert_eq!(tree.children_of(Some("a")).unwrap().len(), 0);
        assert_eq!(tree.children_of(Some("d")).unwrap(), ["b"]);
        assert_eq!(tree.children_of(Some("b")).unwrap(), ["c"]);
        assert_eq!(tree.ancestors("c"), vec!["b".to_string(), "d".to_string()]);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_relocate_into_descendant_is_rejected() {
        let mut tree = sample_tree();
        let before = tree.clone();

        let err = tree.relocate("a", Some("c"), &Position::Last).unwrap_err();

        assert!(matches!(err, TreeError::WouldCycle { .. }));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_relocate_before_itself_is_noop() {
        let mut tree = sample_tree();
        tree.relocate("d", None, &Position::Before("d".to_string()))
            .unwrap();
        assert_eq!(tree.roots(), ["a", "d"]);
    }

    #[test]
    fn test_relocate_within_same_parent() {
        let mut tree = sample_tree();
        tree.relocate("d", None, &Position::Before("a".to_string()))
            .unwrap();
        assert_eq!(tree.roots(), ["d", "a"]);
    }

    #[test]
    fn test_subtree_and_depth_first_order() {
        let tree = sample_tree();
        assert_eq!(tree.subtree_ids("a"), vec!["a", "b", "c"]);

        let order: Vec<(usize, &str)> = tree
            .depth_first()
            .into_iter()
            .map(|(depth, n)| (depth, n.id.as_str()))
            .collect();
        assert_eq!(order, vec![(0, "a"), (1, "b"), (2, "c"), (0, "d")]);
    }

    #[test]
    fn test_remove_subtree() {
        let mut tree = sample_tree();
        let removed = tree.remove_subtree("b").unwrap();

        let ids: Vec<&str> = removed.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(tree.len(), 2);
        assert!(tree.children_of(Some("a")).unwrap().is_empty());
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_validate_detects_broken_parent_link() {
        let mut tree = sample_tree();
        tree.get_mut("c").unwrap().parent_id = Some("a".to_string());

        assert!(matches!(tree.validate(), Err(TreeError::Corrupt(_))));
    }
}
