//! Page Data Structures
//!
//! This module defines the `PageNode` struct and its per-language
//! `Translation` entries.
//!
//! # Architecture
//!
//! - **Stable IDs**: A page keeps its id across moves; copies mint new ids
//! - **Explicit parent index**: Every page records its `parent_id` and the
//!   ordered list of its `children`, so hierarchy checks are ancestor walks
//! - **Per-language publish state**: Each translation carries its own
//!   [`PublishState`]; languages never influence each other
//!
//! # Examples
//!
//! ```rust
//! use pagetree_core::models::{PageNode, PublishState, Translation};
//!
//! let mut page = PageNode::new("example.com", "fullwidth.html");
//! page.set_translation(Translation::new("en", "Homepage", "home"));
//!
//! assert_eq!(page.publish_state("en"), PublishState::Unpublished);
//! assert_eq!(page.publish_state("de"), PublishState::Empty);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Identifier of a page. Stable across moves of the same page.
pub type NodeId = String;

/// Identifier of a site. Every site owns exactly one page tree.
pub type SiteId = String;

/// Publish state of one translation of a page
///
/// - `Empty`: no content (title or slug missing); publishing is disallowed
/// - `Unpublished`: content exists but is not live
/// - `Published`: live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PublishState {
    #[default]
    Empty,
    Unpublished,
    Published,
}

impl PublishState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishState::Empty => "empty",
            PublishState::Unpublished => "unpublished",
            PublishState::Published => "published",
        }
    }
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested publish transition for `SetPublish`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishAction {
    Publish,
    Unpublish,
}

impl PublishAction {
    /// State a successful transition ends in
    pub fn target_state(&self) -> PublishState {
        match self {
            PublishAction::Publish => PublishState::Published,
            PublishAction::Unpublish => PublishState::Unpublished,
        }
    }
}

/// Content of a page in one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub language: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub publish_state: PublishState,
}

impl Translation {
    /// Create a translation; its state is derived from the content.
    pub fn new(
        language: impl Into<String>,
        title: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        let mut translation = Self {
            language: language.into(),
            title: title.into(),
            slug: slug.into(),
            publish_state: PublishState::Empty,
        };
        if translation.has_content() {
            translation.publish_state = PublishState::Unpublished;
        }
        translation
    }

    /// Both title and slug are present (non-blank)
    pub fn has_content(&self) -> bool {
        !self.title.trim().is_empty() && !self.slug.trim().is_empty()
    }
}

/// A single page in the hierarchical tree.
///
/// # Fields
///
/// - `id`: Unique identifier (UUID v4 for pages created or copied by the engine)
/// - `site_id`: Site owning the page
/// - `parent_id`: Parent page (`None` for root-level pages)
/// - `children`: Ordered child ids; the order is the sibling display order
/// - `template`: Template identifier
/// - `translations`: Content per language code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNode {
    pub id: NodeId,
    pub site_id: SiteId,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
    pub template: String,
    #[serde(default)]
    pub translations: BTreeMap<String, Translation>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl PageNode {
    /// Create a detached page with a freshly generated id
    pub fn new(site_id: impl Into<String>, template: impl Into<String>) -> Self {
        Self::new_with_id(Uuid::new_v4().to_string(), site_id, template)
    }

    /// Create a detached page with a caller-provided id
    pub fn new_with_id(
        id: impl Into<String>,
        site_id: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            site_id: site_id.into(),
            parent_id: None,
            children: Vec::new(),
            template: template.into(),
            translations: BTreeMap::new(),
            created_at: now,
            modified_at: now,
        }
    }

    pub fn translation(&self, language: &str) -> Option<&Translation> {
        self.translations.get(language)
    }

    /// Insert or replace the translation for its language
    pub fn set_translation(&mut self, translation: Translation) {
        self.translations
            .insert(translation.language.clone(), translation);
    }

    /// Publish state for a language; `Empty` when there is no translation
    pub fn publish_state(&self, language: &str) -> PublishState {
        self.translation(language)
            .map(|t| t.publish_state)
            .unwrap_or_default()
    }

    /// Title in the preferred language, falling back to the first non-blank title
    pub fn display_title(&self, preferred_language: &str) -> &str {
        if let Some(t) = self.translation(preferred_language) {
            if !t.title.trim().is_empty() {
                return &t.title;
            }
        }
        self.translations
            .values()
            .map(|t| t.title.as_str())
            .find(|title| !title.trim().is_empty())
            .unwrap_or("")
    }

    /// Case-insensitive substring match against any translation title.
    /// `needle` must already be lowercased.
    pub fn title_matches(&self, needle: &str) -> bool {
        self.translations
            .values()
            .any(|t| t.title.to_lowercase().contains(needle))
    }

    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

/// Where a page lands among its new siblings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "sibling", rename_all = "snake_case")]
pub enum Position {
    /// Directly before the given sibling
    Before(NodeId),
    /// After all existing siblings
    Last,
}

impl Position {
    pub fn from_before(before_sibling_id: Option<&str>) -> Self {
        match before_sibling_id {
            Some(id) => Position::Before(id.to_string()),
            None => Position::Last,
        }
    }
}

/// Candidate parent offered for a pending cut or copy
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasteTarget {
    /// Top level of the site, last position
    Root,
    Node(NodeId),
}

impl PasteTarget {
    pub fn node_id(&self) -> Option<&str> {
        match self {
            PasteTarget::Root => None,
            PasteTarget::Node(id) => Some(id.as_str()),
        }
    }
}

impl From<Option<&str>> for PasteTarget {
    fn from(parent_id: Option<&str>) -> Self {
        match parent_id {
            Some(id) => PasteTarget::Node(id.to_string()),
            None => PasteTarget::Root,
        }
    }
}

impl fmt::Display for PasteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasteTarget::Root => f.write_str("root"),
            PasteTarget::Node(id) => f.write_str(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_state_follows_content() {
        assert_eq!(
            Translation::new("en", "Home", "home").publish_state,
            PublishState::Unpublished
        );
        assert_eq!(
            Translation::new("en", "Home", "").publish_state,
            PublishState::Empty
        );
        assert_eq!(
            Translation::new("en", "  ", "home").publish_state,
            PublishState::Empty
        );
    }

    #[test]
    fn test_display_title_falls_back_to_other_language() {
        let mut page = PageNode::new("site", "default.html");
        page.set_translation(Translation::new("de", "Startseite", "start"));

        assert_eq!(page.display_title("en"), "Startseite");
        assert_eq!(page.display_title("de"), "Startseite");
    }

    #[test]
    fn test_title_matches_any_language() {
        let mut page = PageNode::new("site", "default.html");
        page.set_translation(Translation::new("en", "Second", "second"));
        page.set_translation(Translation::new("fr", "Deuxième", "deuxieme"));

        assert!(page.title_matches("seco"));
        assert!(page.title_matches("deux"));
        assert!(!page.title_matches("third"));
    }

    #[test]
    fn test_paste_target_serialization() {
        let json = serde_json::to_string(&PasteTarget::Root).unwrap();
        assert_eq!(json, "\"root\"");

        let json = serde_json::to_string(&PasteTarget::Node("abc".to_string())).unwrap();
        assert_eq!(json, "{\"node\":\"abc\"}");
    }
}
