//! Filter & View-State Layer
//!
//! Turns the structural [`PageTree`] into the [`Forest`] a client renders:
//!
//! - **Filtering**: pages whose title contains the query (case-insensitive)
//!   are kept together with all their ancestors for path context; siblings
//!   without a matching page in their subtree are dropped.
//! - **Expand/collapse**: each page carries the durable `expanded` flag.
//!   Collapsing hides descendants from [`Forest::rendered`] only; the
//!   structure in the snapshot stays complete.

use crate::models::{Forest, LanguageStatus, NodeId, PageTree, TreeNode};
use std::collections::HashSet;

/// Pages kept by a text filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
    pub query: String,
    /// Pages whose own title matched
    pub matched: HashSet<NodeId>,
    /// Matched pages plus their ancestors
    pub visible: HashSet<NodeId>,
}

pub struct TreeFilter;

impl TreeFilter {
    /// Evaluate `query` against every page title. Blank queries yield `None`.
    pub fn apply(tree: &PageTree, query: &str) -> Option<FilterResult> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let needle = query.to_lowercase();

        let matched: HashSet<NodeId> = tree
            .depth_first()
            .into_iter()
            .filter(|(_, page)| page.title_matches(&needle))
            .map(|(_, page)| page.id.clone())
            .collect();

        let mut visible = matched.clone();
        for id in &matched {
            visible.extend(tree.ancestors(id));
        }

        tracing::debug!(
            "Filter '{}' matched {} page(s), {} visible",
            query,
            matched.len(),
            visible.len()
        );
        Some(FilterResult {
            query: query.to_string(),
            matched,
            visible,
        })
    }
}

/// Inputs for building a snapshot
pub struct ForestBuilder<'a> {
    tree: &'a PageTree,
    languages: &'a [String],
    default_language: &'a str,
    expanded: &'a HashSet<NodeId>,
    filter: Option<&'a FilterResult>,
}

impl<'a> ForestBuilder<'a> {
    pub fn new(
        tree: &'a PageTree,
        languages: &'a [String],
        default_language: &'a str,
        expanded: &'a HashSet<NodeId>,
    ) -> Self {
        Self {
            tree,
            languages,
            default_language,
            expanded,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Option<&'a FilterResult>) -> Self {
        self.filter = filter;
        self
    }

    pub fn build(&self) -> Forest {
        Forest {
            site_id: self.tree.site_id.clone(),
            version: self.tree.version,
            filter: self.filter.map(|f| f.query.clone()),
            roots: self.build_level(self.tree.roots()),
        }
    }

    fn build_level(&self, ids: &[NodeId]) -> Vec<TreeNode> {
        ids.iter()
            .filter(|id| self.filter.is_none_or(|f| f.visible.contains(*id)))
            .filter_map(|id| self.build_node(id))
            .collect()
    }

    fn build_node(&self, id: &str) -> Option<TreeNode> {
        let page = self.tree.get(id)?;
        let languages = self
            .languages
            .iter()
            .map(|language| LanguageStatus {
                language: language.clone(),
                state: page.publish_state(language),
            })
            .collect();

        Some(TreeNode {
            id: page.id.clone(),
            title: page.display_title(self.default_language).to_string(),
            template: page.template.clone(),
            languages,
            expanded: self.expanded.contains(id),
            matched: self.filter.is_some_and(|f| f.matched.contains(id)),
            children: self.build_level(&page.children),
        })
    }
}
