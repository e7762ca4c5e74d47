//! Tree Snapshots
//!
//! `Forest` is the canonical, read-only rendering of a site's page tree that
//! is handed back to clients after every read or committed mutation. It is a
//! nested structure (unlike the flat [`PageTree`](crate::models::PageTree)
//! arena) and carries view state: expand flags and, when a filter is active,
//! which pages matched.

use crate::models::page::{NodeId, PublishState, SiteId};
use serde::{Deserialize, Serialize};

/// Publish state of one configured language of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageStatus {
    pub language: String,
    pub state: PublishState,
}

/// A page inside a [`Forest`] snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: NodeId,
    pub title: String,
    pub template: String,
    pub languages: Vec<LanguageStatus>,
    pub expanded: bool,
    /// The page's own title matched the active filter (false for
    /// ancestors kept only for path context, and when no filter is active)
    pub matched: bool,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn state(&self, language: &str) -> Option<PublishState> {
        self.languages
            .iter()
            .find(|l| l.language == language)
            .map(|l| l.state)
    }
}

/// One visible row of a rendered forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedRow {
    pub id: NodeId,
    pub title: String,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
}

/// Ordered forest snapshot of one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forest {
    pub site_id: SiteId,
    /// Tree version the snapshot was taken from
    pub version: u64,
    /// Active filter query, if the view is filtered
    pub filter: Option<String>,
    pub roots: Vec<TreeNode>,
}

impl Forest {
    pub fn is_filtered(&self) -> bool {
        self.filter.is_some()
    }

    /// Find a page anywhere in the snapshot
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        let mut stack: Vec<&TreeNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter());
        }
        None
    }

    /// Number of pages in the snapshot (structural, ignores expand flags)
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&TreeNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Flattened visible rows.
    ///
    /// Children of collapsed pages are left out. A filtered forest is shown
    /// fully opened, so every kept page is rendered.
    pub fn rendered(&self) -> Vec<RenderedRow> {
        let mut rows = Vec::new();
        let mut stack: Vec<(usize, &TreeNode)> = self.roots.iter().rev().map(|n| (0, n)).collect();
        while let Some((depth, node)) = stack.pop() {
            rows.push(RenderedRow {
                id: node.id.clone(),
                title: node.title.clone(),
                depth,
                has_children: !node.children.is_empty(),
                expanded: node.expanded,
            });
            if node.expanded || self.is_filtered() {
                stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
            }
        }
        rows
    }

    /// Compact shape of the forest by title, e.g. `Homepage[Second], Top`
    pub fn outline(&self) -> String {
        fn write_level(nodes: &[TreeNode], out: &mut String) {
            for (i, node) in nodes.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&node.title);
                if !node.children.is_empty() {
                    out.push('[');
                    write_level(&node.children, out);
                    out.push(']');
                }
            }
        }

        let mut out = String::new();
        write_level(&self.roots, &mut out);
        out
    }
}
