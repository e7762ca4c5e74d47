//! Copy Engine
//!
//! Deep-duplicates a subtree under a new parent. Copying is a two-phase
//! protocol: [`CopyEngine::propose_targets`] is side-effect free (a cancel
//! after it needs no compensation) and [`CopyEngine::commit`] is the only
//! call that mutates the tree.
//!
//! Target rules differ from moves: a page may be copied into itself, which
//! nests the clone under the original, because the clone is a distinct page.
//! Copying into one of its strict descendants is refused like a cyclic move.

use crate::models::{NodeId, PageNode, PageTree, PasteTarget, Position, PublishState};
use crate::services::PageTreeError;
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

/// Outcome of a committed copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyResult {
    /// Id of the clone of the copied page
    pub copy_root_id: NodeId,
    /// `(source id, copy id)` pairs in depth-first order
    pub id_map: Vec<(NodeId, NodeId)>,
}

impl CopyResult {
    pub fn page_count(&self) -> usize {
        self.id_map.len()
    }
}

pub struct CopyEngine;

impl CopyEngine {
    /// Valid paste targets for copying `node_id`: the pseudo-root, the page
    /// itself and every page that is not one of its descendants, in display
    /// order.
    pub fn propose_targets(
        tree: &PageTree,
        node_id: &str,
    ) -> Result<Vec<PasteTarget>, PageTreeError> {
        if !tree.contains(node_id) {
            return Err(PageTreeError::node_not_found(node_id));
        }

        let mut targets = vec![PasteTarget::Root];
        targets.extend(
            tree.depth_first()
                .into_iter()
                .filter(|(_, page)| !Self::is_strict_descendant(tree, node_id, &page.id))
                .map(|(_, page)| PasteTarget::Node(page.id.clone())),
        );
        Ok(targets)
    }

    /// Check that `node_id` may be copied to `target`
    pub fn validate(
        tree: &PageTree,
        node_id: &str,
        target: &PasteTarget,
    ) -> Result<(), PageTreeError> {
        if !tree.contains(node_id) {
            return Err(PageTreeError::node_not_found(node_id));
        }
        if let PasteTarget::Node(target_id) = target {
            if !tree.contains(target_id) {
                return Err(PageTreeError::stale_target(format!(
                    "copy target '{}' no longer exists",
                    target_id
                )));
            }
            if Self::is_strict_descendant(tree, node_id, target_id) {
                return Err(PageTreeError::cyclic_move(node_id, target_id.as_str()));
            }
        }
        Ok(())
    }

    /// Duplicate the subtree of `node_id` as the last child of `target`.
    ///
    /// Every copied page gets a fresh id, translations are copied verbatim and
    /// publish state resets to `Unpublished` (`Empty` stays `Empty`). Relative
    /// child order is preserved.
    ///
    /// On error the tree may hold a partial copy; callers commit against a
    /// working copy of the tree.
    pub fn commit(
        tree: &mut PageTree,
        node_id: &str,
        target: &PasteTarget,
    ) -> Result<CopyResult, PageTreeError> {
        Self::validate(tree, node_id, target)?;

        // Snapshot the source before attaching anything: copying into itself
        // must not pick up its own clone.
        let source_ids = tree.subtree_ids(node_id);
        let sources: Vec<PageNode> = source_ids
            .iter()
            .filter_map(|id| tree.get(id).cloned())
            .collect();

        let mut new_ids: HashMap<NodeId, NodeId> = HashMap::with_capacity(sources.len());
        let mut id_map = Vec::with_capacity(sources.len());
        let now = Utc::now();

        for source in sources {
            let parent = if source.id == node_id {
                target.node_id().map(str::to_string)
            } else {
                let source_parent = source.parent_id.as_deref().ok_or_else(|| {
                    PageTreeError::internal(format!("descendant '{}' has no parent", source.id))
                })?;
                Some(new_ids.get(source_parent).cloned().ok_or_else(|| {
                    PageTreeError::internal(format!(
                        "parent '{}' of '{}' was not copied first",
                        source_parent, source.id
                    ))
                })?)
            };

            let copy_id = Uuid::new_v4().to_string();
            let mut copy = source.clone();
            copy.id = copy_id.clone();
            copy.created_at = now;
            copy.modified_at = now;
            for translation in copy.translations.values_mut() {
                if translation.publish_state == PublishState::Published {
                    translation.publish_state = PublishState::Unpublished;
                }
            }

            tree.insert(copy, parent.as_deref(), &Position::Last)?;
            new_ids.insert(source.id.clone(), copy_id.clone());
            id_map.push((source.id, copy_id));
        }

        let copy_root_id = id_map
            .first()
            .map(|(_, copy)| copy.clone())
            .ok_or_else(|| PageTreeError::internal("copied subtree was empty"))?;

        tracing::debug!(
            "Copied {} page(s) from '{}' to {} as '{}'",
            id_map.len(),
            node_id,
            target,
            copy_root_id
        );
        Ok(CopyResult {
            copy_root_id,
            id_map,
        })
    }

    fn is_strict_descendant(tree: &PageTree, ancestor: &str, candidate: &str) -> bool {
        candidate != ancestor && tree.is_same_or_descendant(ancestor, candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Translation;

    fn page(id: &str, title: &str) -> PageNode {
        let mut page = PageNode::new_with_id(id, "site", "default.html");
        page.set_translation(Translation::new("en", title, title.to_lowercase()));
        page
    }

    /// Homepage[Second[Third]]
    fn sample_tree() -> PageTree {
        let mut tree = PageTree::new("site");
        tree.insert(page("homepage", "Homepage"), None, &Position::Last)
            .unwrap();
        tree.insert(page("second", "Second"), Some("homepage"), &Position::Last)
            .unwrap();
        tree.insert(page("third", "Third"), Some("second"), &Position::Last)
            .unwrap();
        tree
    }

    fn titles(tree: &PageTree, parent: Option<&str>) -> Vec<String> {
        tree.children_of(parent)
            .unwrap()
            .iter()
            .map(|id| tree.get(id).unwrap().display_title("en").to_string())
            .collect()
    }

    #[test]
    fn test_propose_targets_include_self_exclude_descendants() {
        let tree = sample_tree();
        let before = tree.clone();

        let targets = CopyEngine::propose_targets(&tree, "second").unwrap();

        assert_eq!(
            targets,
            vec![
                PasteTarget::Root,
                PasteTarget::Node("homepage".to_string()),
                PasteTarget::Node("second".to_string()),
            ]
        );
        assert_eq!(tree, before, "proposing targets must not mutate the tree");
    }

    #[test]
    fn test_copy_into_itself_nests_clone() {
        let mut tree = sample_tree();
        let result =
            CopyEngine::commit(&mut tree, "second", &PasteTarget::Node("second".to_string()))
                .unwrap();

        assert_eq!(result.page_count(), 2);
        assert_eq!(titles(&tree, Some("second")), vec!["Third", "Second"]);
        assert_eq!(
            titles(&tree, Some(result.copy_root_id.as_str())),
            vec!["Third"]
        );
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_copy_into_descendant_is_refused() {
        let mut tree = sample_tree();
        let before = tree.clone();

        let err = CopyEngine::commit(&mut tree, "homepage", &PasteTarget::Node("third".to_string()))
            .unwrap_err();

        assert!(matches!(err, PageTreeError::CyclicMove { .. }));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_copy_to_root_appends_last_with_new_ids() {
        let mut tree = sample_tree();
        let result = CopyEngine::commit(&mut tree, "homepage", &PasteTarget::Root).unwrap();

        assert_eq!(tree.roots().len(), 2);
        assert_eq!(tree.roots()[1], result.copy_root_id);
        for (source, copy) in &result.id_map {
            assert_ne!(source, copy);
            assert!(tree.contains(source), "original page must remain");
        }
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn test_copy_resets_publish_state() {
        let mut tree = sample_tree();
        tree.get_mut("second")
            .unwrap()
            .translations
            .get_mut("en")
            .unwrap()
            .publish_state = PublishState::Published;
        let mut empty_de = Translation::new("de", "", "");
        empty_de.publish_state = PublishState::Empty;
        tree.get_mut("second").unwrap().set_translation(empty_de);

        let result = CopyEngine::commit(&mut tree, "second", &PasteTarget::Root).unwrap();
        let copy = tree.get(&result.copy_root_id).unwrap();

        assert_eq!(copy.publish_state("en"), PublishState::Unpublished);
        assert_eq!(copy.publish_state("de"), PublishState::Empty);
        assert_eq!(copy.translation("en").unwrap().slug, "second");
        assert_eq!(
            tree.get("second").unwrap().publish_state("en"),
            PublishState::Published,
            "source keeps its state"
        );
    }
}
