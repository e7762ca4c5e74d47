//! Cut/Paste Coordinator State
//!
//! A session holds at most one marked page, in either cut or copy mode.
//! The mark is explicit per-session state: it is set by marking, replaced by
//! marking another page, toggled off by marking the same page again and
//! cleared after a committed paste.

use crate::models::{Forest, NodeId, PasteTarget};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkMode {
    Cut,
    Copy,
}

/// A page pending relocation or duplication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    pub node_id: NodeId,
    pub mode: MarkMode,
}

/// Mark of a session together with the paste targets a client should offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkState {
    pub mark: Option<Mark>,
    pub paste_targets: Vec<PasteTarget>,
}

impl MarkState {
    pub fn cleared() -> Self {
        Self {
            mark: None,
            paste_targets: Vec::new(),
        }
    }

    /// Paste helpers are shown
    pub fn is_active(&self) -> bool {
        self.mark.is_some()
    }

    pub fn offers(&self, target: &PasteTarget) -> bool {
        self.paste_targets.contains(target)
    }
}

/// Confirmation step of a copy-mode paste, naming source and chosen target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyConfirmation {
    pub source_id: NodeId,
    pub source_title: String,
    pub target: PasteTarget,
    /// Title of the target page; `None` for the pseudo-root
    pub target_title: Option<String>,
}

/// Result of choosing a paste target
#[derive(Debug, Clone, PartialEq)]
pub enum PasteOutcome {
    /// Cut mode: the move was committed
    Moved(Forest),
    /// Copy mode: awaiting confirmation, nothing changed yet
    ConfirmCopy(CopyConfirmation),
}

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    mark: Option<Mark>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Mark> {
        self.mark.as_ref()
    }

    /// Mark `node_id` in `mode`. Marking the marked page again in the same
    /// mode toggles the mark off; anything else replaces the mark.
    pub fn toggle(&mut self, node_id: &str, mode: MarkMode) -> Option<&Mark> {
        let same = self
            .mark
            .as_ref()
            .is_some_and(|m| m.node_id == node_id && m.mode == mode);
        self.mark = if same {
            None
        } else {
            Some(Mark {
                node_id: node_id.to_string(),
                mode,
            })
        };
        self.mark.as_ref()
    }

    pub fn clear(&mut self) {
        self.mark = None;
    }

    /// Clear the mark if it points at one of `removed`; returns whether it did
    pub fn forget_removed(&mut self, removed: &[NodeId]) -> bool {
        let hit = self
            .mark
            .as_ref()
            .is_some_and(|m| removed.iter().any(|id| id == &m.node_id));
        if hit {
            self.mark = None;
        }
        hit
    }
}
