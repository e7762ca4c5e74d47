//! Publish State Tracker
//!
//! State machine per (page, language):
//!
//! ```text
//!            save title+slug            publish
//!   Empty ------------------> Unpublished ------> Published
//!     ^                            ^      <------     |
//!     |      clear title/slug      |      unpublish   |
//!     +----------------------------+------------------+
//! ```
//!
//! Languages are independent: a transition only ever touches the translation
//! it was requested for.

use crate::models::{NodeId, PageNode, PublishAction, PublishState, Translation};
use crate::services::PageTreeError;
use serde::{Deserialize, Serialize};

/// Publish state of one translation after an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationState {
    pub node_id: NodeId,
    pub language: String,
    pub state: PublishState,
}

pub struct PublishTracker;

impl PublishTracker {
    /// Apply an explicit publish or unpublish request.
    ///
    /// `Publish` requires title and slug; `Unpublish` requires content as
    /// well (an `Empty` translation has nothing to take offline). Repeating
    /// the current state is accepted as a no-op.
    pub fn apply(
        page: &mut PageNode,
        language: &str,
        action: PublishAction,
    ) -> Result<TranslationState, PageTreeError> {
        let translation = page
            .translations
            .get_mut(language)
            .filter(|t| t.has_content())
            .ok_or_else(|| PageTreeError::incomplete_content(&page.id, language))?;

        let next = action.target_state();
        if translation.publish_state != next {
            tracing::debug!(
                "Page '{}' [{}]: {} -> {}",
                page.id,
                language,
                translation.publish_state,
                next
            );
            translation.publish_state = next;
            page.touch();
        }

        Ok(TranslationState {
            node_id: page.id.clone(),
            language: language.to_string(),
            state: next,
        })
    }

    /// Store title and slug for a language, deriving the publish state.
    ///
    /// Complete content moves `Empty` to `Unpublished` and keeps any other
    /// state; incomplete content always ends in `Empty`.
    pub fn save_content(
        page: &mut PageNode,
        language: &str,
        title: &str,
        slug: &str,
    ) -> TranslationState {
        let previous = page.publish_state(language);
        let mut translation = Translation {
            language: language.to_string(),
            title: title.to_string(),
            slug: slug.to_string(),
            publish_state: previous,
        };
        translation.publish_state = match (translation.has_content(), previous) {
            (false, _) => PublishState::Empty,
            (true, PublishState::Empty) => PublishState::Unpublished,
            (true, state) => state,
        };

        let state = translation.publish_state;
        page.set_translation(translation);
        page.touch();

        TranslationState {
            node_id: page.id.clone(),
            language: language.to_string(),
            state,
        }
    }
}
