//! Move Validator
//!
//! Decides whether a relocation may proceed before the tree is touched.
//! Rules are checked in a fixed order:
//!
//! 1. A filtered view denies every structural edit (`FilteredView`)
//! 2. The moving page must exist (`NodeNotFound`) and the target parent must
//!    still exist (`StaleTarget`)
//! 3. The target parent may not be the moving page or one of its
//!    descendants (`CyclicMove`)
//! 4. The `before` sibling must still be a child of the target (`StaleTarget`)
//!
//! Cut/paste reuses the same exclusion to compute its paste targets.

use crate::models::{NodeId, PageTree, PasteTarget, Position};
use crate::services::PageTreeError;
use serde::{Deserialize, Serialize};

/// Whether the client currently looks at the full tree or a filtered subset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Full,
    Filtered,
}

/// Relocation intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub node_id: NodeId,
    /// New parent; `None` moves the page to the root level
    pub target_parent_id: Option<NodeId>,
    /// Sibling to insert before; `None` appends as last child
    pub before_sibling_id: Option<NodeId>,
}

impl MoveRequest {
    pub fn new(
        node_id: impl Into<String>,
        target_parent_id: Option<&str>,
        before_sibling_id: Option<&str>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            target_parent_id: target_parent_id.map(str::to_string),
            before_sibling_id: before_sibling_id.map(str::to_string),
        }
    }

    pub fn position(&self) -> Position {
        Position::from_before(self.before_sibling_id.as_deref())
    }
}

/// Structural rules for relocate operations
pub struct MoveValidator;

impl MoveValidator {
    /// Validate `request` against `tree`; `Ok(())` means the tree may mutate
    pub fn validate(
        tree: &PageTree,
        request: &MoveRequest,
        view: ViewMode,
    ) -> Result<(), PageTreeError> {
        if view == ViewMode::Filtered {
            tracing::debug!("Move of '{}' denied: view is filtered", request.node_id);
            return Err(PageTreeError::filtered_view("move pages"));
        }

        if !tree.contains(&request.node_id) {
            return Err(PageTreeError::node_not_found(&request.node_id));
        }

        let target = request.target_parent_id.as_deref();
        if let Some(target_id) = target {
            if !tree.contains(target_id) {
                return Err(PageTreeError::stale_target(format!(
                    "target parent '{}' no longer exists",
                    target_id
                )));
            }
            if tree.is_same_or_descendant(&request.node_id, target_id) {
                tracing::debug!(
                    "Move of '{}' under '{}' denied: target is inside its subtree",
                    request.node_id,
                    target_id
                );
                return Err(PageTreeError::cyclic_move(&request.node_id, target_id));
            }
        }

        if let Some(before) = request.before_sibling_id.as_deref() {
            // Dropping a page right before itself is a no-op, not a stale target
            let is_self_in_place =
                before == request.node_id && tree.parent_of(&request.node_id) == target;
            if !is_self_in_place {
                tree.check_position(target, &Position::Before(before.to_string()))?;
            }
        }

        Ok(())
    }

    /// Paste targets for a cut page: the pseudo-root plus every page outside
    /// its subtree, in display order. Empty while the view is filtered.
    pub fn cut_targets(
        tree: &PageTree,
        node_id: &str,
        view: ViewMode,
    ) -> Result<Vec<PasteTarget>, PageTreeError> {
        if !tree.contains(node_id) {
            return Err(PageTreeError::node_not_found(node_id));
        }
        if view == ViewMode::Filtered {
            return Ok(Vec::new());
        }

        let mut targets = vec![PasteTarget::Root];
        targets.extend(
            tree.depth_first()
                .into_iter()
                .filter(|(_, page)| !tree.is_same_or_descendant(node_id, &page.id))
                .map(|(_, page)| PasteTarget::Node(page.id.clone())),
        );
        Ok(targets)
    }
}
