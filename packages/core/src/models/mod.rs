//! Data Models
//!
//! This module contains the core data structures used throughout the engine:
//!
//! - `PageNode` / `Translation` - A page and its per-language content
//! - `PageTree` - The site-scoped arena holding pages and their order
//! - `Forest` - Nested, read-only snapshot returned to clients
//!
//! Hierarchy is expressed with stable string ids and an explicit parent
//! index; there are no pointers between pages.

mod forest;
mod page;
mod tree;

pub use forest::{Forest, LanguageStatus, RenderedRow, TreeNode};
pub use page::{
    NodeId, PageNode, PasteTarget, Position, PublishAction, PublishState, SiteId, Translation,
};
pub use tree::{PageTree, TreeError};
