//! Event Emission Tests
//!
//! Verifies that committed changes emit exactly the expected domain events,
//! after the change is visible, and that denied requests emit nothing
//! except the reload signal for stale targets.

#[cfg(test)]
mod event_emission_tests {
    use anyhow::Result;
    use pagetree_core::db::{DomainEvent, MemoryStore, TreeChange};
    use pagetree_core::{
        CreatePageParams, MoveRequest, PageTreeService, PublishAction, PublishState,
        StaticSiteRegistry, ViewSession,
    };
    use std::sync::Arc;
    use tokio::sync::broadcast;
    use tokio::time::{timeout, Duration};

    const SITE: &str = "example.com";

    /// Homepage[Second], Top
    async fn create_service() -> Result<PageTreeService> {
        let registry = StaticSiteRegistry::new().with_site(SITE, ["en", "de"]);
        let service = PageTreeService::with_store(Arc::new(MemoryStore::new()), Arc::new(registry));
        for (id, title, parent) in [
            ("homepage", "Homepage", None),
            ("second", "Second", Some("homepage")),
            ("top", "Top", None),
        ] {
            let mut params = CreatePageParams::new("default.html")
                .with_id(id)
                .with_translation("en", title, id);
            params.parent_id = parent.map(str::to_string);
            service.create_page(SITE, params).await?;
        }
        Ok(service)
    }

    async fn next_event(rx: &mut broadcast::Receiver<DomainEvent>) -> DomainEvent {
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("Event should be emitted within 1 second")
            .expect("Should receive event")
    }

    #[tokio::test]
    async fn test_move_emits_node_moved_event() -> Result<()> {
        let service = create_service().await?;
        let session = ViewSession::new(SITE);
        let mut rx = service.subscribe_to_events();

        service
            .move_node(&session, MoveRequest::new("second", None, Some("homepage")))
            .await?;

        let event = next_event(&mut rx).await;
        match &event.change {
            TreeChange::NodeMoved {
                node_id,
                from_parent_id,
                to_parent_id,
                index,
            } => {
                assert_eq!(node_id, "second");
                assert_eq!(from_parent_id.as_deref(), Some("homepage"));
                assert_eq!(*to_parent_id, None);
                assert_eq!(*index, 0);
            }
            other => panic!("Expected NodeMoved, got {:?}", other),
        }

        // Event is emitted after the swap
        let tree = service.snapshot(SITE).await?;
        assert_eq!(tree.version, event.version);
        assert_eq!(tree.roots()[0], "second");
        assert!(rx.try_recv().is_err(), "exactly one event per move");
        Ok(())
    }

    #[tokio::test]
    async fn test_denied_move_emits_nothing() -> Result<()> {
        let service = create_service().await?;
        let mut session = ViewSession::new(SITE);
        let mut rx = service.subscribe_to_events();

        let _ = service
            .move_node(&session, MoveRequest::new("homepage", Some("second"), None))
            .await;
        session.set_filter("top");
        let _ = service
            .move_node(&session, MoveRequest::new("top", Some("homepage"), None))
            .await;

        assert!(rx.try_recv().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_publish_emits_only_on_state_change() -> Result<()> {
        let service = create_service().await?;
        let mut rx = service.subscribe_to_events();

        service
            .set_publish(SITE, "top", "en", PublishAction::Publish)
            .await?;
        let event = next_event(&mut rx).await;
        assert_eq!(
            event.change,
            TreeChange::PublishChanged {
                node_id: "top".to_string(),
                language: "en".to_string(),
                state: PublishState::Published,
            }
        );

        // Publishing again is a no-op
        let version = event.version;
        service
            .set_publish(SITE, "top", "en", PublishAction::Publish)
            .await?;
        assert!(rx.try_recv().is_err());
        assert_eq!(service.snapshot(SITE).await?.version, version);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_expanded_emits_expand_changed() -> Result<()> {
        let service = create_service().await?.with_client("sideframe-1");
        let mut rx = service.subscribe_to_events();

        service.set_expanded(SITE, "homepage", true).await?;

        let event = next_event(&mut rx).await;
        assert_eq!(event.event_type(), "expand:changed");
        assert_eq!(event.source_client_id.as_deref(), Some("sideframe-1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_emits_removed_ids() -> Result<()> {
        let service = create_service().await?;
        let mut session = ViewSession::new(SITE);
        let mut rx = service.subscribe_to_events();

        service.remove_page(&mut session, "homepage").await?;

        let event = next_event(&mut rx).await;
        assert_eq!(
            event.change,
            TreeChange::NodesRemoved {
                node_ids: vec!["homepage".to_string(), "second".to_string()],
            }
        );
        Ok(())
    }
}
