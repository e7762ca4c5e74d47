//! Engine Services
//!
//! This module contains the components operating on page trees:
//!
//! - `MoveValidator` - Structural rules for relocations and cut targets
//! - `CopyEngine` - Two-phase deep copy of subtrees
//! - `Clipboard` / `ViewSession` - Per-session mark and filter state
//! - `PublishTracker` - Per-language publish state machine
//! - `TreeFilter` / `ForestBuilder` - Filtered, expand-aware snapshots
//! - `PageTreeService` - Facade serializing mutations per site
//!
//! Components below the facade are synchronous and pure over a `PageTree`;
//! the facade adds locking, persistence and events.

pub mod clipboard;
pub mod copy_engine;
pub mod error;
pub mod move_validator;
pub mod page_tree_service;
pub mod publish;
pub mod session;
pub mod site_registry;
pub mod view;

pub use clipboard::{Clipboard, CopyConfirmation, Mark, MarkMode, MarkState, PasteOutcome};
pub use copy_engine::{CopyEngine, CopyResult};
pub use error::PageTreeError;
pub use move_validator::{MoveRequest, MoveValidator, ViewMode};
pub use page_tree_service::{CreatePageParams, PageTreeService};
pub use publish::{PublishTracker, TranslationState};
pub use session::ViewSession;
pub use site_registry::{SiteRegistry, StaticSiteRegistry};
pub use view::{FilterResult, ForestBuilder, TreeFilter};
