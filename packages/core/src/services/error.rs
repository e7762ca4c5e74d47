//! Service Layer Error Types
//!
//! This module defines the error taxonomy of the tree engine. Every variant
//! is local and recoverable by resubmission; none of them leaves a partial
//! mutation behind because validation always precedes mutation.

use crate::db::StoreError;
use crate::models::{NodeId, TreeError};
use thiserror::Error;

/// Engine operation errors
#[derive(Error, Debug)]
pub enum PageTreeError {
    /// Target lies inside the moving page's own subtree
    #[error("Moving parent inside child: page '{node_id}' cannot be placed under '{target_id}'")]
    CyclicMove { node_id: NodeId, target_id: NodeId },

    /// Structural edits are disabled while a filter is active
    #[error("Cannot {operation} while the page tree is filtered")]
    FilteredView { operation: String },

    /// The referenced target changed underneath the caller
    #[error("Stale target: {context}")]
    StaleTarget { context: String },

    /// Publishing needs both a title and a slug
    #[error("Page '{node_id}' has no title or slug in '{language}' and cannot be published")]
    IncompleteContent { node_id: NodeId, language: String },

    #[error("Page not found: {id}")]
    NodeNotFound { id: NodeId },

    #[error("Site not found: {site_id}")]
    SiteNotFound { site_id: String },

    #[error("Language '{language}' is not configured for site '{site_id}'")]
    UnknownLanguage { site_id: String, language: String },

    /// Paste requested without a marked page
    #[error("No page is marked for cut or copy")]
    NoActiveMark,

    /// Invalid request that is not covered by a more specific variant
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Persistence failed; the in-memory tree was left unchanged
    #[error("Storage operation failed: {0}")]
    Storage(#[from] StoreError),

    /// Internal consistency error (indicates a bug)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PageTreeError {
    /// Create a cyclic move error
    pub fn cyclic_move(node_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self::CyclicMove {
            node_id: node_id.into(),
            target_id: target_id.into(),
        }
    }

    /// Create a filtered view error for the denied operation
    pub fn filtered_view(operation: impl Into<String>) -> Self {
        Self::FilteredView {
            operation: operation.into(),
        }
    }

    /// Create a stale target error
    pub fn stale_target(context: impl Into<String>) -> Self {
        Self::StaleTarget {
            context: context.into(),
        }
    }

    /// Create an incomplete content error
    pub fn incomplete_content(node_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self::IncompleteContent {
            node_id: node_id.into(),
            language: language.into(),
        }
    }

    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create a site not found error
    pub fn site_not_found(site_id: impl Into<String>) -> Self {
        Self::SiteNotFound {
            site_id: site_id.into(),
        }
    }

    /// Create an unknown language error
    pub fn unknown_language(site_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self::UnknownLanguage {
            site_id: site_id.into(),
            language: language.into(),
        }
    }

    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Caller should re-fetch the tree before resubmitting
    pub fn requires_refresh(&self) -> bool {
        matches!(self, Self::StaleTarget { .. } | Self::NodeNotFound { .. })
    }

    /// Denied by a business or structural rule; the user can fix the intent
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::CyclicMove { .. }
                | Self::FilteredView { .. }
                | Self::IncompleteContent { .. }
                | Self::NoActiveMark
        )
    }
}

impl From<TreeError> for PageTreeError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::NodeNotFound(id) => Self::node_not_found(id),
            TreeError::WouldCycle { node_id, target_id } => Self::cyclic_move(node_id, target_id),
            TreeError::ParentNotFound(_) | TreeError::SiblingNotFound { .. } => {
                Self::stale_target(err.to_string())
            }
            TreeError::DuplicateId(_) => Self::invalid_operation(err.to_string()),
            TreeError::Corrupt(msg) => Self::internal(msg),
        }
    }
}
