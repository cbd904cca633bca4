//! Concurrent reorder requests against one sibling group
//!
//! Many requests race on the same siblings. Whatever interleaving happens,
//! every group must keep exactly the taxis values it started with. The same
//! race is run against the in-memory store and a libsql database file.

#[cfg(test)]
mod concurrent_reorder_tests {
    use sitetree_core::config::ReorderConfig;
    use sitetree_core::db::{DatabaseService, MemoryStore, NodeStore, TaxisCalculator, TursoStore};
    use sitetree_core::models::{Direction, NewNode, NodeId, ReorderRequest};
    use sitetree_core::services::{AllowAll, MemoryAuditSink, ReorderError, ReorderService};
    use std::sync::Arc;
    use tempfile::TempDir;

    const SIBLINGS: i64 = 8;

    async fn setup() -> (Arc<MemoryStore>, Arc<ReorderService>, NodeId, Vec<NodeId>) {
        let store = Arc::new(MemoryStore::new());
        let (service, site_id, ids) = populate(store.clone()).await;
        (store, service, site_id, ids)
    }

    /// Same siblings in a libsql database file
    async fn setup_turso() -> (Arc<TursoStore>, Arc<ReorderService>, NodeId, Vec<NodeId>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("concurrent.db"))
            .await
            .unwrap();
        let store = Arc::new(TursoStore::new(Arc::new(db)));
        let (service, site_id, ids) = populate(store.clone()).await;
        (store, service, site_id, ids, temp_dir)
    }

    async fn populate<S: NodeStore + 'static>(
        store: Arc<S>,
    ) -> (Arc<ReorderService>, NodeId, Vec<NodeId>) {
        let site = store.create_site("Main").await.unwrap();

        let mut ids = Vec::new();
        for i in 0..SIBLINGS {
            let node = store
                .create_node(
                    NewNode::new(site.id, site.id, format!("N{}", i)).with_taxis((i + 1) * 10),
                )
                .await
                .unwrap();
            ids.push(node.id);
        }

        // Enough retries that no step ends up Contended
        let config = ReorderConfig {
            max_conflict_retries: 50,
            retry_backoff_base_ms: 1,
            retry_backoff_max_ms: 5,
            ..Default::default()
        };
        let service = Arc::new(ReorderService::with_config(
            store.clone(),
            Arc::new(AllowAll),
            Arc::new(MemoryAuditSink::new()),
            config,
        )
        .unwrap());

        (service, site.id, ids)
    }

    async fn sorted_taxis(store: &dyn NodeStore, site_id: NodeId) -> Vec<i64> {
        let mut values: Vec<i64> = store
            .get_children(site_id, site_id)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.taxis)
            .collect();
        values.sort_unstable();
        values
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_keep_taxis_unique() {
        let (store, service, site_id, ids) = setup().await;
        let expected: Vec<i64> = (1..=SIBLINGS).map(|i| i * 10).collect();

        let mut handles = Vec::new();
        for (i, &node_id) in ids.iter().enumerate() {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                for round in 0..10u32 {
                    let direction = if (i as u32 + round) % 2 == 0 {
                        Direction::Up
                    } else {
                        Direction::Down
                    };
                    service
                        .submit(&ReorderRequest::new(site_id, vec![node_id], direction, 1 + round % 3))
                        .await
                        .unwrap();
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let children = store.get_children(site_id, site_id).await.unwrap();
        assert_eq!(children.len(), SIBLINGS as usize);
        assert!(TaxisCalculator::duplicate_taxis(children.iter().map(|n| n.taxis)).is_empty());
        assert_eq!(sorted_taxis(store.as_ref(), site_id).await, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_on_database_keep_taxis_unique() {
        let (store, service, site_id, ids, _temp_dir) = setup_turso().await;
        let expected: Vec<i64> = (1..=SIBLINGS).map(|i| i * 10).collect();

        let mut handles = Vec::new();
        for (i, &node_id) in ids.iter().enumerate().take(4) {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let mut results = Vec::new();
                for round in 0..6u32 {
                    let direction = if (i as u32 + round) % 2 == 0 {
                        Direction::Up
                    } else {
                        Direction::Down
                    };
                    results.push(
                        service
                            .submit_with_report(&ReorderRequest::new(
                                site_id,
                                vec![node_id],
                                direction,
                                1 + round % 2,
                            ))
                            .await,
                    );
                }
                results
            }));
        }

        for handle in handles {
            for result in handle.await.unwrap() {
                match result {
                    Ok(report) => assert!(report.nodes[0].found),
                    Err(ReorderError::Internal(e)) => panic!("storage error under contention: {}", e),
                    Err(e) => panic!("unexpected error: {}", e),
                }
            }
        }

        let children = store.get_children(site_id, site_id).await.unwrap();
        assert_eq!(children.len(), SIBLINGS as usize);
        assert!(TaxisCalculator::duplicate_taxis(children.iter().map(|n| n.taxis)).is_empty());
        assert_eq!(sorted_taxis(store.as_ref(), site_id).await, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_opposite_moves_of_same_node_race_safely() {
        let (store, service, site_id, ids) = setup().await;
        let middle = ids[SIBLINGS as usize / 2];

        let up = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .submit_with_report(&ReorderRequest::new(site_id, vec![middle], Direction::Up, 3))
                    .await
                    .unwrap()
            })
        };
        let down = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .submit_with_report(&ReorderRequest::new(
                        site_id,
                        vec![middle],
                        Direction::Down,
                        3,
                    ))
                    .await
                    .unwrap()
            })
        };

        let up = up.await.unwrap();
        let down = down.await.unwrap();

        // Every realised swap is one position; the net displacement matches
        let position = store
            .get_children(site_id, site_id)
            .await
            .unwrap()
            .iter()
            .position(|n| n.id == middle)
            .unwrap() as i64;
        let start = SIBLINGS / 2;
        assert_eq!(position, start - up.swaps as i64 + down.swaps as i64);
        assert_eq!(sorted_taxis(store.as_ref(), site_id).await.len(), SIBLINGS as usize);
        assert!(TaxisCalculator::duplicate_taxis(sorted_taxis(store.as_ref(), site_id).await).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_batches_report_site_first() {
        let (_store, service, site_id, ids) = setup().await;

        let mut handles = Vec::new();
        for chunk in ids.chunks(2) {
            let service = service.clone();
            let chunk = chunk.to_vec();
            handles.push(tokio::spawn(async move {
                service
                    .submit(&ReorderRequest::new(site_id, chunk, Direction::Down, 2))
                    .await
                    .unwrap()
            }));
        }

        for handle in handles {
            let affected = handle.await.unwrap();
            assert_eq!(affected.as_slice(), &[site_id]);
        }
    }
}
