//! Domain Events
//!
//! This module defines the events emitted by the engine after a change has
//! been committed. They are the incremental signals clients use next to the
//! full [`Forest`](crate::models::Forest) snapshot, most importantly
//! `ReloadRequired` for cases where a client cannot patch its local view.
//!
//! # Architecture
//!
//! Events are emitted using tokio's broadcast channel, allowing multiple
//! subscribers to receive notifications asynchronously.
//!
//! # Event Flow
//!
//! 1. The service validates and commits a change (tree persisted, snapshot swapped)
//! 2. A `DomainEvent` is sent on the broadcast channel
//! 3. All subscribers receive the event; lagging subscribers should reload

use crate::models::{NodeId, PasteTarget, PublishState, SiteId};
use serde::{Deserialize, Serialize};

/// What changed in a site's tree or view state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TreeChange {
    #[serde(rename_all = "camelCase")]
    NodeCreated {
        node_id: NodeId,
        parent_id: Option<NodeId>,
    },

    /// A page and its subtree were relocated
    #[serde(rename_all = "camelCase")]
    NodeMoved {
        node_id: NodeId,
        from_parent_id: Option<NodeId>,
        to_parent_id: Option<NodeId>,
        index: usize,
    },

    #[serde(rename_all = "camelCase")]
    SubtreeCopied {
        source_id: NodeId,
        copy_root_id: NodeId,
        target: PasteTarget,
        page_count: usize,
    },

    #[serde(rename_all = "camelCase")]
    NodesRemoved { node_ids: Vec<NodeId> },

    #[serde(rename_all = "camelCase")]
    PublishChanged {
        node_id: NodeId,
        language: String,
        state: PublishState,
    },

    #[serde(rename_all = "camelCase")]
    ExpandChanged { node_id: NodeId, expanded: bool },

    /// The client's view can no longer be patched incrementally
    #[serde(rename_all = "camelCase")]
    ReloadRequired { reason: String },
}

/// Event emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    pub site_id: SiteId,
    /// Tree version after the change
    pub version: u64,
    pub change: TreeChange,
    /// Client that caused the change, so it can skip its own echo
    pub source_client_id: Option<String>,
}

impl DomainEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &str {
        match self.change {
            TreeChange::NodeCreated { .. } => "node:created",
            TreeChange::NodeMoved { .. } => "node:moved",
            TreeChange::SubtreeCopied { .. } => "subtree:copied",
            TreeChange::NodesRemoved { .. } => "nodes:removed",
            TreeChange::PublishChanged { .. } => "publish:changed",
            TreeChange::ExpandChanged { .. } => "expand:changed",
            TreeChange::ReloadRequired { .. } => "reload:required",
        }
    }

    pub fn is_reload_required(&self) -> bool {
        matches!(self.change, TreeChange::ReloadRequired { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Contract test: documents the exact JSON format clients receive.
    ///
    /// `#[serde(tag = "type")]` produces an internally-tagged format where the
    /// discriminator is merged with the variant fields (flat, not nested).
    #[test]
    fn test_domain_event_serialization_contract() {
        let event = DomainEvent {
            site_id: "example.com".to_string(),
            version: 7,
            change: TreeChange::NodeMoved {
                node_id: "child-456".to_string(),
                from_parent_id: None,
                to_parent_id: Some("parent-123".to_string()),
                index: 0,
            },
            source_client_id: Some("window-1".to_string()),
        };

        let parsed: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(parsed["siteId"], "example.com");
        assert_eq!(parsed["sourceClientId"], "window-1");
        assert_eq!(parsed["change"]["type"], "nodeMoved");
        assert_eq!(parsed["change"]["nodeId"], "child-456");
        assert_eq!(parsed["change"]["toParentId"], "parent-123");
        assert!(parsed["change"]["fromParentId"].is_null());
        assert!(
            parsed["change"].get("nodeMoved").is_none(),
            "Should NOT be nested under 'nodeMoved' key"
        );
    }

    #[test]
    fn test_event_type_names() {
        let event = DomainEvent {
            site_id: "example.com".to_string(),
            version: 1,
            change: TreeChange::ReloadRequired {
                reason: "copy committed".to_string(),
            },
            source_client_id: None,
        };

        assert_eq!(event.event_type(), "reload:required");
        assert!(event.is_reload_required());

        let json = serde_json::to_string(&event).unwrap();
        let round_trip: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(round_trip, event);
    }
}
