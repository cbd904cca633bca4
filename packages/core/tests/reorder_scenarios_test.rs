//! End-to-end reorder scenarios on the libsql store
//!
//! Group under parent P: [X:10, Y:20, Z:30]. Each test runs one request
//! through `ReorderService` and checks taxis values, the affected-parent
//! set and the audit trail.

#[cfg(test)]
mod reorder_scenarios {
    use anyhow::Result;
    use sitetree_core::db::{DatabaseService, NodeStore, TaxisCalculator, TursoStore};
    use sitetree_core::models::{Direction, NewNode, Node, NodeId, ReorderRequest, SubmitRequest};
    use sitetree_core::services::{
        AllowAll, AuditAction, MemoryAuditSink, PermissionGate, ReorderError, ReorderService,
        StaticPermissions,
    };
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Setup {
        store: Arc<TursoStore>,
        audit: Arc<MemoryAuditSink>,
        service: ReorderService,
        site_id: NodeId,
        parent_id: NodeId,
        x: Node,
        y: Node,
        z: Node,
        _temp_dir: TempDir,
    }

    async fn setup(gate: Arc<dyn PermissionGate>) -> Result<Setup> {
        let temp_dir = TempDir::new()?;
        let db = Arc::new(DatabaseService::new(temp_dir.path().join("test.db")).await?);
        let store = Arc::new(TursoStore::new(db));

        let site = store.create_site("Main").await?;
        let parent = store
            .create_node(NewNode::new(site.id, site.id, "P"))
            .await?;
        let x = store
            .create_node(NewNode::new(site.id, parent.id, "X").with_taxis(10))
            .await?;
        let y = store
            .create_node(NewNode::new(site.id, parent.id, "Y").with_taxis(20))
            .await?;
        let z = store
            .create_node(NewNode::new(site.id, parent.id, "Z").with_taxis(30))
            .await?;

        let audit = Arc::new(MemoryAuditSink::new());
        let service = ReorderService::new(store.clone(), gate, audit.clone());

        Ok(Setup {
            store,
            audit,
            service,
            site_id: site.id,
            parent_id: parent.id,
            x,
            y,
            z,
            _temp_dir: temp_dir,
        })
    }

    async fn taxis_of(s: &Setup, id: NodeId) -> Result<i64> {
        Ok(s.store.get_node(id).await?.map_or(-1, |n| n.taxis))
    }

    /// Current taxis of (X, Y, Z)
    async fn taxis(s: &Setup) -> Result<(i64, i64, i64)> {
        Ok((
            taxis_of(s, s.x.id).await?,
            taxis_of(s, s.y.id).await?,
            taxis_of(s, s.z.id).await?,
        ))
    }

    #[tokio::test]
    async fn scenario_a_move_y_up_once() -> Result<()> {
        let s = setup(Arc::new(AllowAll)).await?;

        let affected = s
            .service
            .submit(&ReorderRequest::new(s.site_id, vec![s.y.id], Direction::Up, 1))
            .await?;

        assert_eq!(taxis(&s).await?, (20, 10, 30));
        assert_eq!(affected.as_slice(), &[s.site_id, s.parent_id]);
        Ok(())
    }

    #[tokio::test]
    async fn scenario_b_move_first_up_three_times() -> Result<()> {
        let s = setup(Arc::new(AllowAll)).await?;

        let affected = s
            .service
            .submit(&ReorderRequest::new(s.site_id, vec![s.x.id], Direction::Up, 3))
            .await?;

        assert_eq!(taxis(&s).await?, (10, 20, 30));
        assert_eq!(affected.as_slice(), &[s.site_id, s.parent_id]);

        let entries = s.audit.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].node_id, s.x.id);
        assert_eq!(entries[0].action, AuditAction::MoveUp);
        assert_eq!(entries[0].action.label(), "Channel order moved up");
        Ok(())
    }

    #[tokio::test]
    async fn scenario_c_batch_down_is_sequential() -> Result<()> {
        let s = setup(Arc::new(AllowAll)).await?;

        let report = s
            .service
            .submit_with_report(&ReorderRequest::new(
                s.site_id,
                vec![s.y.id, s.z.id],
                Direction::Down,
                1,
            ))
            .await?;

        // Y:20<->Z:30, then Z (now 20) swaps with Y (now 30)
        assert_eq!(taxis(&s).await?, (10, 20, 30));
        assert_eq!(report.swaps, 2);
        assert_eq!(report.affected.as_slice(), &[s.site_id, s.parent_id]);

        let audited: Vec<NodeId> = s.audit.entries().await.iter().map(|e| e.node_id).collect();
        assert_eq!(audited, vec![s.y.id, s.z.id]);
        Ok(())
    }

    #[tokio::test]
    async fn scenario_d_missing_node_is_skipped() -> Result<()> {
        let s = setup(Arc::new(AllowAll)).await?;

        let affected = s
            .service
            .submit(&ReorderRequest::new(s.site_id, vec![123_456], Direction::Up, 1))
            .await?;

        assert_eq!(affected.as_slice(), &[s.site_id]);
        assert!(s.audit.is_empty().await);
        assert_eq!(taxis(&s).await?, (10, 20, 30));
        Ok(())
    }

    #[tokio::test]
    async fn scenario_e_unauthorized_changes_nothing() -> Result<()> {
        let s = setup(Arc::new(StaticPermissions::new())).await?;
        let before = s.store.get_children(s.site_id, s.parent_id).await?;

        let err = s
            .service
            .submit(&ReorderRequest::new(
                s.site_id,
                vec![s.y.id, s.z.id],
                Direction::Up,
                2,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, ReorderError::Unauthorized { .. }));
        assert_eq!(s.store.get_children(s.site_id, s.parent_id).await?, before);
        assert!(s.audit.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_wire_request_round_trip() -> Result<()> {
        let s = setup(Arc::new(AllowAll)).await?;
        let body = format!(
            r#"{{"siteId": {}, "channelIds": [{}], "isUp": false, "taxis": 5}}"#,
            s.site_id, s.x.id
        );

        let submitted: SubmitRequest = serde_json::from_str(&body)?;
        let request: ReorderRequest = submitted.into();
        assert_eq!(request.repeat_count, 5);
        let affected = s.service.submit(&request).await?;

        // X moves down past both siblings and stops at the end
        let names: Vec<String> = s
            .store
            .get_children(s.site_id, s.parent_id)
            .await?
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(names, ["Y", "Z", "X"]);
        assert_eq!(serde_json::to_string(&affected)?, format!("[{},{}]", s.site_id, s.parent_id));
        Ok(())
    }

    #[tokio::test]
    async fn test_taxis_stay_unique_after_many_requests() -> Result<()> {
        let s = setup(Arc::new(AllowAll)).await?;

        for (node, direction, times) in [
            (&s.z, Direction::Up, 2),
            (&s.x, Direction::Down, 1),
            (&s.y, Direction::Up, 4),
            (&s.z, Direction::Down, 3),
        ] {
            s.service
                .submit(&ReorderRequest::new(s.site_id, vec![node.id], direction, times))
                .await?;
        }

        let children = s.store.get_children(s.site_id, s.parent_id).await?;
        assert!(TaxisCalculator::duplicate_taxis(children.iter().map(|n| n.taxis)).is_empty());
        let mut values: Vec<i64> = children.iter().map(|n| n.taxis).collect();
        values.sort_unstable();
        assert_eq!(values, vec![10, 20, 30]);
        Ok(())
    }
}
