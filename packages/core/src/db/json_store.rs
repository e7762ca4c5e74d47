//! JSON File Store
//!
//! Stores each site's page tree and view state as pretty-printed JSON
//! documents under a data directory:
//!
//! ```text
//! <data_dir>/sites/<site_id>.tree.json
//! <data_dir>/sites/<site_id>.view.json
//! ```
//!
//! Writes use the atomic write pattern (write to a temp file, then rename) so
//! a crash never leaves a half-written document behind.

use crate::db::{StoreError, TreeStore, ViewStateStore};
use crate::models::{NodeId, PageTree};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

const SITES_DIR: &str = "sites";
const TREE_SUFFIX: &str = "tree.json";
const VIEW_SUFFIX: &str = "view.json";

/// Durable view state document of one site
#[derive(Debug, Default, Serialize, Deserialize)]
struct ViewStateDocument {
    #[serde(default)]
    expanded: BTreeSet<NodeId>,
}

/// File-backed implementation of [`TreeStore`] and [`ViewStateStore`]
pub struct JsonFileStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles on view state documents
    view_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store rooted at `data_dir`. Directories are created lazily
    /// on first write.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: data_dir.into().join(SITES_DIR),
            view_lock: Mutex::new(()),
        }
    }

    fn site_file(&self, site_id: &str, suffix: &str) -> Result<PathBuf, StoreError> {
        let valid = !site_id.is_empty()
            && !site_id.starts_with('.')
            && site_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        if !valid {
            return Err(StoreError::InvalidSiteId(site_id.to_string()));
        }
        Ok(self.root.join(format!("{}.{}", site_id, suffix)))
    }

    async fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    async fn write_atomic(&self, path: &Path, contents: String) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::io(&self.root, e))?;

        let temp_file = path.with_extension("json.tmp");
        fs::write(&temp_file, contents)
            .await
            .map_err(|e| StoreError::io(&temp_file, e))?;
        fs::rename(&temp_file, path)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        Ok(())
    }

    async fn load_view(&self, site_id: &str) -> Result<ViewStateDocument, StoreError> {
        let path = self.site_file(site_id, VIEW_SUFFIX)?;
        match Self::read_optional(&path).await? {
            Some(contents) => serde_json::from_str(&contents)
                .map_err(|e| StoreError::serialization(format!("view state of '{}'", site_id), e)),
            None => Ok(ViewStateDocument::default()),
        }
    }

    async fn save_view(&self, site_id: &str, doc: &ViewStateDocument) -> Result<(), StoreError> {
        let path = self.site_file(site_id, VIEW_SUFFIX)?;
        let serialized = serde_json::to_string_pretty(doc)
            .map_err(|e| StoreError::serialization(format!("view state of '{}'", site_id), e))?;
        self.write_atomic(&path, serialized).await
    }
}

#[async_trait]
impl TreeStore for JsonFileStore {
    async fn load_tree(&self, site_id: &str) -> Result<Option<PageTree>, StoreError> {
        let path = self.site_file(site_id, TREE_SUFFIX)?;
        let Some(contents) = Self::read_optional(&path).await? else {
            return Ok(None);
        };

        let tree: PageTree = serde_json::from_str(&contents)
            .map_err(|e| StoreError::serialization(format!("tree of '{}'", site_id), e))?;
        if tree.site_id != site_id {
            return Err(StoreError::corrupt_tree(
                site_id,
                crate::models::TreeError::Corrupt(format!(
                    "document belongs to site '{}'",
                    tree.site_id
                )),
            ));
        }
        tree.validate()
            .map_err(|e| StoreError::corrupt_tree(site_id, e))?;

        tracing::debug!(
            "Loaded tree for site '{}' ({} pages, version {})",
            site_id,
            tree.len(),
            tree.version
        );
        Ok(Some(tree))
    }

    async fn save_tree(&self, tree: &PageTree) -> Result<(), StoreError> {
        let path = self.site_file(&tree.site_id, TREE_SUFFIX)?;
        let serialized = serde_json::to_string_pretty(tree)
            .map_err(|e| StoreError::serialization(format!("tree of '{}'", tree.site_id), e))?;
        self.write_atomic(&path, serialized).await
    }
}

#[async_trait]
impl ViewStateStore for JsonFileStore {
    async fn expanded_nodes(&self, site_id: &str) -> Result<HashSet<NodeId>, StoreError> {
        Ok(self.load_view(site_id).await?.expanded.into_iter().collect())
    }

    async fn set_expanded(
        &self,
        site_id: &str,
        node_id: &str,
        expanded: bool,
    ) -> Result<(), StoreError> {
        let _guard = self.view_lock.lock().await;
        let mut doc = self.load_view(site_id).await?;
        let changed = if expanded {
            doc.expanded.insert(node_id.to_string())
        } else {
            doc.expanded.remove(node_id)
        };
        if changed {
            self.save_view(site_id, &doc).await?;
        }
        Ok(())
    }

    async fn forget_nodes(&self, site_id: &str, node_ids: &[NodeId]) -> Result<(), StoreError> {
        let _guard = self.view_lock.lock().await;
        let mut doc = self.load_view(site_id).await?;
        let before = doc.expanded.len();
        for id in node_ids {
            doc.expanded.remove(id);
        }
        if doc.expanded.len() != before {
            self.save_view(site_id, &doc).await?;
        }
        Ok(())
    }
}
