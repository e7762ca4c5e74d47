//! Page Tree Service - Engine Facade
//!
//! This module exposes the operations clients call against a site's page
//! tree: reading snapshots, moving, copying, cut/paste, publishing and
//! durable expand/collapse.
//!
//! # Concurrency
//!
//! Each site owns one live [`PageTree`] behind an `Arc`. Mutations take the
//! site's write lock for the whole validate, mutate, persist and swap cycle,
//! so no two structural edits on the same site interleave. They work on a
//! private copy of the tree and only swap it in after the single persistence
//! write succeeded, so a rejected or failed request never leaves a partial
//! change behind. Reads clone the current `Arc` and never wait for a
//! mutation in progress.
//!
//! # Events
//!
//! Every committed change is broadcast as a [`DomainEvent`]. Failures caused
//! by a stale client view additionally emit `ReloadRequired`.

use crate::config::EngineConfig;
use crate::db::{DomainEvent, TreeChange, TreeStore, ViewStateStore};
use crate::models::{
    Forest, NodeId, PageNode, PageTree, PasteTarget, Position, PublishAction, PublishState,
    SiteId, Translation,
};
use crate::services::clipboard::{CopyConfirmation, Mark, MarkMode, MarkState, PasteOutcome};
use crate::services::copy_engine::{CopyEngine, CopyResult};
use crate::services::move_validator::{MoveRequest, MoveValidator, ViewMode};
use crate::services::publish::{PublishTracker, TranslationState};
use crate::services::session::ViewSession;
use crate::services::site_registry::SiteRegistry;
use crate::services::view::{ForestBuilder, TreeFilter};
use crate::services::PageTreeError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

/// Broadcast channel capacity for domain events
const DOMAIN_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Parameters for creating a page
#[derive(Debug, Clone, Default)]
pub struct CreatePageParams {
    /// Explicit id; a UUID is generated when `None`
    pub id: Option<NodeId>,
    pub parent_id: Option<NodeId>,
    pub before_sibling_id: Option<NodeId>,
    pub template: String,
    pub translations: Vec<Translation>,
}

impl CreatePageParams {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn under(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn before(mut self, sibling_id: impl Into<String>) -> Self {
        self.before_sibling_id = Some(sibling_id.into());
        self
    }

    pub fn with_translation(
        mut self,
        language: impl Into<String>,
        title: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        self.translations
            .push(Translation::new(language, title, slug));
        self
    }
}

/// Live tree of one site
struct SiteTree {
    /// Held for the whole validate/mutate/persist/swap cycle
    write_lock: Mutex<()>,
    current: RwLock<Arc<PageTree>>,
}

impl SiteTree {
    fn new(tree: PageTree) -> Self {
        Self {
            write_lock: Mutex::new(()),
            current: RwLock::new(Arc::new(tree)),
        }
    }
}

/// Engine facade over all sites
///
/// Cheap to clone; clones share the live trees, the stores and the event
/// channel.
///
/// # Examples
///
/// ```rust
/// use pagetree_core::db::MemoryStore;
/// use pagetree_core::services::{
///     CreatePageParams, MoveRequest, PageTreeService, StaticSiteRegistry, ViewSession,
/// };
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = StaticSiteRegistry::new().with_site("example.com", ["en", "de"]);
/// let service = PageTreeService::with_store(Arc::new(MemoryStore::new()), Arc::new(registry));
///
/// let home = CreatePageParams::new("default.html").with_translation("en", "Homepage", "home");
/// let home_id = service.create_page("example.com", home).await?;
/// let second = CreatePageParams::new("default.html").with_translation("en", "Second", "second");
/// service.create_page("example.com", second).await?;
///
/// let session = ViewSession::new("example.com");
/// let forest = service
///     .move_node(&session, MoveRequest::new(home_id, None, None))
///     .await?;
/// assert_eq!(forest.outline(), "Second, Homepage");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PageTreeService {
    trees: Arc<dyn TreeStore>,
    view_state: Arc<dyn ViewStateStore>,
    registry: Arc<dyn SiteRegistry>,

    /// Lazily loaded live trees by site id
    sites: Arc<RwLock<HashMap<SiteId, Arc<SiteTree>>>>,

    event_tx: broadcast::Sender<DomainEvent>,

    /// When set, emitted events carry this id as `source_client_id` so the
    /// client can skip its own echo
    client_id: Option<String>,
}

impl PageTreeService {
    pub fn new(
        trees: Arc<dyn TreeStore>,
        view_state: Arc<dyn ViewStateStore>,
        registry: Arc<dyn SiteRegistry>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(DOMAIN_EVENT_CHANNEL_CAPACITY);
        Self {
            trees,
            view_state,
            registry,
            sites: Arc::new(RwLock::new(HashMap::new())),
            event_tx,
            client_id: None,
        }
    }

    /// Use one backend for both tree storage and view state
    pub fn with_store<S>(store: Arc<S>, registry: Arc<dyn SiteRegistry>) -> Self
    where
        S: TreeStore + ViewStateStore + 'static,
    {
        Self::new(store.clone(), store, registry)
    }

    /// File-backed service for the configured sites
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_store(
            Arc::new(config.file_store()),
            Arc::new(config.site_registry()),
        )
    }

    /// Clone of this service whose events carry `client_id`
    pub fn with_client(&self, client_id: impl Into<String>) -> Self {
        let mut cloned = self.clone();
        cloned.client_id = Some(client_id.into());
        cloned
    }

    /// Subscribe to domain events of all sites
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Latest committed tree of a site
    pub async fn snapshot(&self, site_id: &str) -> Result<Arc<PageTree>, PageTreeError> {
        let site = self.site(site_id).await?;
        let tree = site.current.read().await.clone();
        Ok(tree)
    }

    /// Forest of a site, optionally restricted by a text filter
    pub async fn get_tree(
        &self,
        site_id: &str,
        filter: Option<&str>,
    ) -> Result<Forest, PageTreeError> {
        let tree = self.snapshot(site_id).await?;
        self.render(&tree, filter).await
    }

    /// Forest as seen by `session` (its site and filter)
    pub async fn session_tree(&self, session: &ViewSession) -> Result<Forest, PageTreeError> {
        self.get_tree(session.site_id(), session.filter()).await
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Create a page under `params.parent_id` (root level when `None`)
    pub async fn create_page(
        &self,
        site_id: &str,
        params: CreatePageParams,
    ) -> Result<NodeId, PageTreeError> {
        for translation in &params.translations {
            self.check_language(site_id, &translation.language)?;
        }

        let (tree, (id, parent_id)) = self
            .commit(site_id, "create page", |tree| {
                let mut page = match params.id {
                    Some(id) => PageNode::new_with_id(id, site_id, params.template),
                    None => PageNode::new(site_id, params.template),
                };
                for mut translation in params.translations {
                    translation.publish_state = match translation.publish_state {
                        _ if !translation.has_content() => PublishState::Empty,
                        PublishState::Empty => PublishState::Unpublished,
                        state => state,
                    };
                    page.set_translation(translation);
                }

                let id = page.id.clone();
                let position = Position::from_before(params.before_sibling_id.as_deref());
                tree.insert(page, params.parent_id.as_deref(), &position)?;
                Ok(((id, params.parent_id), true))
            })
            .await?;

        self.emit(
            site_id,
            tree.version,
            TreeChange::NodeCreated {
                node_id: id.clone(),
                parent_id,
            },
        );
        Ok(id)
    }

    /// Relocate a page with its subtree.
    ///
    /// Denied with `FilteredView` while `session` has a filter active.
    pub async fn move_node(
        &self,
        session: &ViewSession,
        request: MoveRequest,
    ) -> Result<Forest, PageTreeError> {
        let site_id = session.site_id();
        let view = session.view_mode();

        let (tree, moved) = self
            .commit(site_id, "move", |tree| {
                MoveValidator::validate(tree, &request, view)?;

                let target = request.target_parent_id.as_deref();
                let from_parent = tree.parent_of(&request.node_id).map(str::to_string);
                let old_index = child_index(tree, from_parent.as_deref(), &request.node_id);

                tree.relocate(&request.node_id, target, &request.position())?;

                let index = child_index(tree, target, &request.node_id).unwrap_or_default();
                let changed = from_parent.as_deref() != target || old_index != Some(index);
                Ok((changed.then_some((from_parent, index)), changed))
            })
            .await?;

        if let Some((from_parent_id, index)) = moved {
            self.emit(
                site_id,
                tree.version,
                TreeChange::NodeMoved {
                    node_id: request.node_id.clone(),
                    from_parent_id,
                    to_parent_id: request.target_parent_id.clone(),
                    index,
                },
            );
        }
        self.render(&tree, session.filter()).await
    }

    /// Remove a page and its descendants.
    ///
    /// Durable expand flags of the removed pages are dropped and the
    /// session's mark is cleared when it pointed into the removed subtree.
    /// If the flags cannot be dropped the removal still stands and is
    /// announced, but the call returns [`PageTreeError::Storage`].
    pub async fn remove_page(
        &self,
        session: &mut ViewSession,
        node_id: &str,
    ) -> Result<Forest, PageTreeError> {
        let view = session.view_mode();
        let site = self.site(session.site_id()).await?;
        let (tree, removed, forgotten) = {
            // Held until the expand flags are dropped so set_expanded cannot
            // store a flag for a removed id in between
            let _guard = site.write_lock.lock().await;
            let (tree, removed) = self
                .commit_locked(&site, session.site_id(), "remove", |tree| {
                    if view == ViewMode::Filtered {
                        return Err(PageTreeError::filtered_view("remove pages"));
                    }
                    let removed: Vec<NodeId> = tree
                        .remove_subtree(node_id)?
                        .into_iter()
                        .map(|page| page.id)
                        .collect();
                    Ok((removed, true))
                })
                .await?;

            let forgotten = self
                .view_state
                .forget_nodes(session.site_id(), &removed)
                .await;
            (tree, removed, forgotten)
        };

        if session.clipboard_mut().forget_removed(&removed) {
            tracing::debug!("Cleared mark of removed page in session");
        }

        self.emit(
            session.site_id(),
            tree.version,
            TreeChange::NodesRemoved { node_ids: removed },
        );

        // The removal is committed either way; stale expand flags are reported
        if let Err(err) = forgotten {
            tracing::warn!(
                "Removed pages on site '{}' but failed to drop their view state: {}",
                session.site_id(),
                err
            );
            return Err(err.into());
        }
        self.render(&tree, session.filter()).await
    }

    // ------------------------------------------------------------------
    // Copy
    // ------------------------------------------------------------------

    /// Valid copy targets for `node_id`. Has no side effects, so abandoning
    /// the copy afterwards needs no compensation.
    pub async fn propose_copy_targets(
        &self,
        site_id: &str,
        node_id: &str,
    ) -> Result<Vec<PasteTarget>, PageTreeError> {
        let tree = self.snapshot(site_id).await?;
        CopyEngine::propose_targets(&tree, node_id)
    }

    /// Duplicate the subtree of `node_id` as last child of `target`
    pub async fn commit_copy(
        &self,
        session: &ViewSession,
        node_id: &str,
        target: PasteTarget,
    ) -> Result<Forest, PageTreeError> {
        self.copy_subtree(session, node_id, target, false).await
    }

    /// With `marked_source`, a source missing at commit time was removed
    /// after it was marked and is reported as a stale target.
    async fn copy_subtree(
        &self,
        session: &ViewSession,
        node_id: &str,
        target: PasteTarget,
        marked_source: bool,
    ) -> Result<Forest, PageTreeError> {
        let site_id = session.site_id();
        let (tree, result): (_, CopyResult) = self
            .commit(site_id, "copy", |tree| {
                if marked_source && !tree.contains(node_id) {
                    return Err(PageTreeError::stale_target(format!(
                        "marked page '{}' no longer exists",
                        node_id
                    )));
                }
                let result = CopyEngine::commit(tree, node_id, &target)?;
                Ok((result, true))
            })
            .await?;

        self.emit(
            site_id,
            tree.version,
            TreeChange::SubtreeCopied {
                source_id: node_id.to_string(),
                copy_root_id: result.copy_root_id.clone(),
                target,
                page_count: result.page_count(),
            },
        );
        self.emit(
            site_id,
            tree.version,
            TreeChange::ReloadRequired {
                reason: format!("{} page(s) copied", result.page_count()),
            },
        );
        self.render(&tree, session.filter()).await
    }

    // ------------------------------------------------------------------
    // Cut/paste
    // ------------------------------------------------------------------

    /// Mark `node_id` for cut or copy and return the paste targets to offer.
    ///
    /// Marking the marked page again in the same mode clears the mark.
    pub async fn mark(
        &self,
        session: &mut ViewSession,
        node_id: &str,
        mode: MarkMode,
    ) -> Result<MarkState, PageTreeError> {
        let tree = self.snapshot(session.site_id()).await?;
        if !tree.contains(node_id) {
            return Err(PageTreeError::node_not_found(node_id));
        }

        let view = session.view_mode();
        match session.clipboard_mut().toggle(node_id, mode).cloned() {
            Some(mark) => {
                tracing::debug!("Marked '{}' for {:?}", node_id, mode);
                Self::mark_state(&tree, mark, view)
            }
            None => {
                tracing::debug!("Unmarked '{}'", node_id);
                Ok(MarkState::cleared())
            }
        }
    }

    /// Current mark of `session` with freshly computed paste targets.
    ///
    /// A mark whose page no longer exists is dropped.
    pub async fn current_mark(&self, session: &mut ViewSession) -> Result<MarkState, PageTreeError> {
        let Some(mark) = session.clipboard().current().cloned() else {
            return Ok(MarkState::cleared());
        };
        let tree = self.snapshot(session.site_id()).await?;
        if !tree.contains(&mark.node_id) {
            session.clipboard_mut().clear();
            return Ok(MarkState::cleared());
        }
        Self::mark_state(&tree, mark, session.view_mode())
    }

    /// Paste the marked page onto `target`.
    ///
    /// Cut mode commits the move right away and clears the mark. Copy mode
    /// only validates and returns the confirmation to show; nothing changes
    /// until [`confirm_copy`](Self::confirm_copy).
    pub async fn paste(
        &self,
        session: &mut ViewSession,
        target: PasteTarget,
    ) -> Result<PasteOutcome, PageTreeError> {
        let mark = session
            .clipboard()
            .current()
            .cloned()
            .ok_or(PageTreeError::NoActiveMark)?;
        let site_id = session.site_id().to_string();
        let tree = self.snapshot(&site_id).await?;

        if !tree.contains(&mark.node_id) {
            session.clipboard_mut().clear();
            let err = PageTreeError::stale_target(format!(
                "marked page '{}' no longer exists",
                mark.node_id
            ));
            self.report_failure(&site_id, tree.version, "paste", &err);
            return Err(err);
        }

        match mark.mode {
            MarkMode::Cut => {
                let request = MoveRequest::new(mark.node_id.as_str(), target.node_id(), None);
                let forest = self.move_node(session, request).await?;
                session.clipboard_mut().clear();
                Ok(PasteOutcome::Moved(forest))
            }
            MarkMode::Copy => {
                if let Err(err) = CopyEngine::validate(&tree, &mark.node_id, &target) {
                    self.report_failure(&site_id, tree.version, "paste", &err);
                    return Err(err);
                }
                let default_language = self.registry.default_language(&site_id).unwrap_or_default();
                let title_of = |id: &str| {
                    tree.get(id)
                        .map(|page| page.display_title(&default_language).to_string())
                };
                Ok(PasteOutcome::ConfirmCopy(CopyConfirmation {
                    source_title: title_of(&mark.node_id).unwrap_or_default(),
                    target_title: target.node_id().and_then(title_of),
                    source_id: mark.node_id,
                    target,
                }))
            }
        }
    }

    /// Commit a confirmed copy and clear the mark
    pub async fn confirm_copy(
        &self,
        session: &mut ViewSession,
        confirmation: &CopyConfirmation,
    ) -> Result<Forest, PageTreeError> {
        let marked = session
            .clipboard()
            .current()
            .is_some_and(|m| m.mode == MarkMode::Copy && m.node_id == confirmation.source_id);
        if !marked {
            return Err(PageTreeError::NoActiveMark);
        }

        let copied = self
            .copy_subtree(
                session,
                &confirmation.source_id,
                confirmation.target.clone(),
                true,
            )
            .await;
        // A source removed by another session since paste drops the mark
        if matches!(copied, Ok(_) | Err(PageTreeError::StaleTarget { .. })) {
            session.clipboard_mut().clear();
        }
        copied
    }

    /// Decline a copy confirmation. The tree was never touched and the mark
    /// stays, so the user can pick another target.
    pub fn cancel_copy(&self, confirmation: &CopyConfirmation) {
        tracing::debug!(
            "Copy of '{}' to {} cancelled",
            confirmation.source_id,
            confirmation.target
        );
    }

    // ------------------------------------------------------------------
    // Publishing
    // ------------------------------------------------------------------

    pub async fn set_publish(
        &self,
        site_id: &str,
        node_id: &str,
        language: &str,
        action: PublishAction,
    ) -> Result<TranslationState, PageTreeError> {
        self.check_language(site_id, language)?;

        let (tree, (state, changed)) = self
            .commit(site_id, "publish", |tree| {
                let page = tree
                    .get_mut(node_id)
                    .ok_or_else(|| PageTreeError::node_not_found(node_id))?;
                let before = page.publish_state(language);
                let state = PublishTracker::apply(page, language, action)?;
                let changed = state.state != before;
                Ok(((state, changed), changed))
            })
            .await?;

        if changed {
            self.emit_publish_changed(site_id, tree.version, &state);
        }
        Ok(state)
    }

    /// Store title and slug of one translation
    pub async fn save_translation(
        &self,
        site_id: &str,
        node_id: &str,
        language: &str,
        title: &str,
        slug: &str,
    ) -> Result<TranslationState, PageTreeError> {
        self.check_language(site_id, language)?;

        let (tree, (state, state_changed)) = self
            .commit(site_id, "save translation", |tree| {
                let page = tree
                    .get_mut(node_id)
                    .ok_or_else(|| PageTreeError::node_not_found(node_id))?;
                let before = page.translation(language).cloned();
                let state = PublishTracker::save_content(page, language, title, slug);

                let state_changed =
                    before.as_ref().map(|t| t.publish_state).unwrap_or_default() != state.state;
                let changed = before.as_ref() != page.translation(language);
                Ok(((state, state_changed), changed))
            })
            .await?;

        if state_changed {
            self.emit_publish_changed(site_id, tree.version, &state);
        }
        Ok(state)
    }

    // ------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------

    /// Persist the expand flag of one page
    pub async fn set_expanded(
        &self,
        site_id: &str,
        node_id: &str,
        expanded: bool,
    ) -> Result<(), PageTreeError> {
        let site = self.site(site_id).await?;
        let tree = {
            // Serialized with removals so no flag outlives its page
            let _guard = site.write_lock.lock().await;
            let tree = site.current.read().await.clone();
            if !tree.contains(node_id) {
                return Err(PageTreeError::node_not_found(node_id));
            }
            self.view_state
                .set_expanded(site_id, node_id, expanded)
                .await?;
            tree
        };
        tracing::debug!("Page '{}' expanded = {}", node_id, expanded);

        self.emit(
            site_id,
            tree.version,
            TreeChange::ExpandChanged {
                node_id: node_id.to_string(),
                expanded,
            },
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn site(&self, site_id: &str) -> Result<Arc<SiteTree>, PageTreeError> {
        if let Some(site) = self.sites.read().await.get(site_id) {
            return Ok(site.clone());
        }
        if self.registry.languages(site_id).is_none() {
            return Err(PageTreeError::site_not_found(site_id));
        }

        // Loaded without the map lock so reads of other sites never wait on it
        let tree = match self.trees.load_tree(site_id).await? {
            Some(tree) => {
                tracing::info!(
                    "Loaded tree of site '{}' ({} pages, version {})",
                    site_id,
                    tree.len(),
                    tree.version
                );
                tree
            }
            None => {
                tracing::info!("No stored tree for site '{}', starting empty", site_id);
                PageTree::new(site_id)
            }
        };

        // A concurrent load of the same site may have won; keep its entry
        let mut sites = self.sites.write().await;
        let site = sites
            .entry(site_id.to_string())
            .or_insert_with(|| Arc::new(SiteTree::new(tree)))
            .clone();
        Ok(site)
    }

    /// Run `mutate` against a working copy of the site's tree and, when it
    /// reports a change, persist and publish the result.
    ///
    /// `mutate` returns its value plus whether the tree changed; unchanged
    /// trees are neither written nor re-versioned.
    async fn commit<T, F>(
        &self,
        site_id: &str,
        operation: &str,
        mutate: F,
    ) -> Result<(Arc<PageTree>, T), PageTreeError>
    where
        F: FnOnce(&mut PageTree) -> Result<(T, bool), PageTreeError>,
    {
        let site = self.site(site_id).await?;
        let _guard = site.write_lock.lock().await;
        self.commit_locked(&site, site_id, operation, mutate).await
    }

    /// Body of [`Self::commit`]; the caller holds `site.write_lock`.
    async fn commit_locked<T, F>(
        &self,
        site: &SiteTree,
        site_id: &str,
        operation: &str,
        mutate: F,
    ) -> Result<(Arc<PageTree>, T), PageTreeError>
    where
        F: FnOnce(&mut PageTree) -> Result<(T, bool), PageTreeError>,
    {
        let current = site.current.read().await.clone();
        let mut working = PageTree::clone(&current);

        let (value, changed) = match mutate(&mut working) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.report_failure(site_id, current.version, operation, &err);
                return Err(err);
            }
        };
        if !changed {
            tracing::debug!("{} on site '{}' changed nothing", operation, site_id);
            return Ok((current, value));
        }

        let version = working.bump_version();
        if let Err(err) = self.trees.save_tree(&working).await {
            tracing::warn!(
                "Failed to persist {} on site '{}', keeping version {}: {}",
                operation,
                site_id,
                current.version,
                err
            );
            return Err(err.into());
        }

        let committed = Arc::new(working);
        *site.current.write().await = committed.clone();
        tracing::info!(
            "Committed {} on site '{}' (version {})",
            operation,
            site_id,
            version
        );
        Ok((committed, value))
    }

    async fn render(&self, tree: &PageTree, filter: Option<&str>) -> Result<Forest, PageTreeError> {
        let languages = self
            .registry
            .languages(&tree.site_id)
            .ok_or_else(|| PageTreeError::site_not_found(&tree.site_id))?;
        let default_language = self
            .registry
            .default_language(&tree.site_id)
            .unwrap_or_default();
        let expanded = self.view_state.expanded_nodes(&tree.site_id).await?;
        let filter = filter.and_then(|query| TreeFilter::apply(tree, query));

        Ok(
            ForestBuilder::new(tree, &languages, &default_language, &expanded)
                .with_filter(filter.as_ref())
                .build(),
        )
    }

    fn mark_state(tree: &PageTree, mark: Mark, view: ViewMode) -> Result<MarkState, PageTreeError> {
        let paste_targets = match mark.mode {
            MarkMode::Cut => MoveValidator::cut_targets(tree, &mark.node_id, view)?,
            MarkMode::Copy => CopyEngine::propose_targets(tree, &mark.node_id)?,
        };
        Ok(MarkState {
            mark: Some(mark),
            paste_targets,
        })
    }

    fn check_language(&self, site_id: &str, language: &str) -> Result<(), PageTreeError> {
        if self.registry.languages(site_id).is_none() {
            return Err(PageTreeError::site_not_found(site_id));
        }
        if !self.registry.has_language(site_id, language) {
            return Err(PageTreeError::unknown_language(site_id, language));
        }
        Ok(())
    }

    fn report_failure(&self, site_id: &str, version: u64, operation: &str, err: &PageTreeError) {
        match err {
            PageTreeError::StaleTarget { .. } => {
                tracing::warn!("{} on site '{}' hit a stale target: {}", operation, site_id, err);
                self.emit(
                    site_id,
                    version,
                    TreeChange::ReloadRequired {
                        reason: err.to_string(),
                    },
                );
            }
            err if err.is_user_correctable() => {
                tracing::debug!("{} on site '{}' denied: {}", operation, site_id, err);
            }
            err => {
                tracing::warn!("{} on site '{}' failed: {}", operation, site_id, err);
            }
        }
    }

    fn emit_publish_changed(&self, site_id: &str, version: u64, state: &TranslationState) {
        self.emit(
            site_id,
            version,
            TreeChange::PublishChanged {
                node_id: state.node_id.clone(),
                language: state.language.clone(),
                state: state.state,
            },
        );
    }

    fn emit(&self, site_id: &str, version: u64, change: TreeChange) {
        // No subscribers is not an error
        let _ = self.event_tx.send(DomainEvent {
            site_id: site_id.to_string(),
            version,
            change,
            source_client_id: self.client_id.clone(),
        });
    }
}

fn child_index(tree: &PageTree, parent_id: Option<&str>, id: &str) -> Option<usize> {
    tree.children_of(parent_id)?
        .iter()
        .position(|child| child == id)
}
