//! Site/language registry
//!
//! Enumerates the sites the engine serves and the languages relevant to
//! each of them. The first configured language of a site is its default
//! language (used for display titles).

use std::collections::HashMap;

pub trait SiteRegistry: Send + Sync {
    /// Languages of `site_id` in display order; `None` for unknown sites
    fn languages(&self, site_id: &str) -> Option<Vec<String>>;

    fn default_language(&self, site_id: &str) -> Option<String> {
        self.languages(site_id)
            .and_then(|languages| languages.into_iter().next())
    }

    fn has_language(&self, site_id: &str, language: &str) -> bool {
        self.languages(site_id)
            .is_some_and(|languages| languages.iter().any(|l| l == language))
    }
}

/// Registry with a fixed set of sites, usually built from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticSiteRegistry {
    sites: HashMap<String, Vec<String>>,
}

impl StaticSiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a site with its languages (default language first)
    pub fn with_site<I, S>(mut self, site_id: impl Into<String>, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sites.insert(
            site_id.into(),
            languages.into_iter().map(Into::into).collect(),
        );
        self
    }
}

impl SiteRegistry for StaticSiteRegistry {
    fn languages(&self, site_id: &str) -> Option<Vec<String>> {
        self.sites.get(site_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_language_is_first() {
        let registry = StaticSiteRegistry::new().with_site("example.com", ["de", "en"]);

        assert_eq!(registry.default_language("example.com").as_deref(), Some("de"));
        assert!(registry.has_language("example.com", "en"));
        assert!(!registry.has_language("example.com", "fr"));
        assert!(registry.languages("unknown.org").is_none());
    }
}
