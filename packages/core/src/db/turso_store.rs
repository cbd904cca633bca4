//! TursoStore - NodeStore Implementation for the libsql Backend
//!
//! TursoStore wraps [`DatabaseService`] and delegates all SQL to its `db_*`
//! methods. It converts `libsql::Row` values into models and emits domain
//! events after each committed write.
//!
//! # Examples
//!
//! ```rust,no_run
//! use sitetree_core::db::{DatabaseService, NodeStore, TursoStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/sitetree.db")).await?);
//!     let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db));
//!
//!     let node = store.get_node(12).await?;
//!     Ok(())
//! }
//! ```

use crate::db::database::{DatabaseService, DbSwapResult};
use crate::db::events::{DomainEvent, DOMAIN_EVENT_CHANNEL_CAPACITY};
use crate::db::node_store::{NodeStore, SwapOutcome};
use crate::models::{Direction, NewNode, Node, NodeId, Site, ValidationError};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use libsql::Row;
use std::sync::Arc;
use tokio::sync::broadcast;

/// TursoStore implements NodeStore for the libsql backend
pub struct TursoStore {
    /// Underlying database service
    db: Arc<DatabaseService>,

    event_tx: broadcast::Sender<DomainEvent>,
}

impl TursoStore {
    /// Create a new TursoStore wrapper
    pub fn new(db: Arc<DatabaseService>) -> Self {
        let (event_tx, _) = broadcast::channel(DOMAIN_EVENT_CHANNEL_CAPACITY);
        Self { db, event_tx }
    }

    fn emit_event(&self, event: DomainEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Convert a row selected with `NODE_COLUMNS` into a Node
    fn row_to_node(row: &Row) -> Result<Node> {
        Ok(Node {
            id: row.get(0).context("Failed to get id")?,
            site_id: row.get(1).context("Failed to get site_id")?,
            parent_id: row.get(2).context("Failed to get parent_id")?,
            taxis: row.get(3).context("Failed to get taxis")?,
            name: row.get(4).context("Failed to get name")?,
        })
    }

    async fn swap(
        &self,
        direction: Direction,
        site_id: NodeId,
        node_id: NodeId,
        parent_id: NodeId,
        current_taxis: i64,
    ) -> Result<SwapOutcome> {
        let result = self
            .db
            .db_swap_adjacent(direction, site_id, node_id, parent_id, current_taxis)
            .await
            .with_context(|| format!("Failed to swap taxis of node {}", node_id))?;

        Ok(match result {
            DbSwapResult::Swapped(swap) => {
                let neighbor_id = swap.neighbor_id;
                self.emit_event(DomainEvent::TaxisSwapped(swap));
                SwapOutcome::Swapped {
                    parent_id,
                    neighbor_id,
                }
            }
            DbSwapResult::Boundary => SwapOutcome::Boundary { parent_id },
            DbSwapResult::Conflict => SwapOutcome::Conflict,
        })
    }
}

#[async_trait]
impl NodeStore for TursoStore {
    async fn get_site(&self, site_id: NodeId) -> Result<Option<Site>> {
        let Some(row) = self.db.db_get_site(site_id).await? else {
            return Ok(None);
        };
        Ok(Some(Site {
            id: row.get(0).context("Failed to get site id")?,
            name: row.get(1).context("Failed to get site name")?,
        }))
    }

    async fn get_node(&self, node_id: NodeId) -> Result<Option<Node>> {
        match self.db.db_get_node(node_id).await? {
            Some(row) => Ok(Some(Self::row_to_node(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_children(&self, site_id: NodeId, parent_id: NodeId) -> Result<Vec<Node>> {
        let mut rows = self.db.db_get_children(site_id, parent_id).await?;
        let mut children = Vec::new();
        while let Some(row) = rows.next().await? {
            children.push(Self::row_to_node(&row)?);
        }
        Ok(children)
    }

    async fn swap_with_previous(
        &self,
        site_id: NodeId,
        node_id: NodeId,
        parent_id: NodeId,
        current_taxis: i64,
    ) -> Result<SwapOutcome> {
        self.swap(Direction::Up, site_id, node_id, parent_id, current_taxis)
            .await
    }

    async fn swap_with_next(
        &self,
        site_id: NodeId,
        node_id: NodeId,
        parent_id: NodeId,
        current_taxis: i64,
    ) -> Result<SwapOutcome> {
        self.swap(Direction::Down, site_id, node_id, parent_id, current_taxis)
            .await
    }

    async fn create_site(&self, name: &str) -> Result<Site> {
        if name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }

        let site_id = self.db.db_create_site(name).await?;
        let root = self
            .get_node(site_id)
            .await?
            .ok_or_else(|| anyhow!("Root node {} missing after site creation", site_id))?;
        self.emit_event(DomainEvent::NodeCreated { node: root });

        Ok(Site {
            id: site_id,
            name: name.to_string(),
        })
    }

    async fn create_node(&self, new_node: NewNode) -> Result<Node> {
        new_node.validate()?;

        let parent_in_site = self
            .get_node(new_node.parent_id)
            .await?
            .is_some_and(|parent| parent.site_id == new_node.site_id);
        if !parent_in_site {
            return Err(ValidationError::InvalidParent(new_node.parent_id).into());
        }

        let node_id = self
            .db
            .db_insert_node(&new_node)
            .await?
            .ok_or(ValidationError::TaxisExhausted(new_node.parent_id))?;
        let node = self
            .get_node(node_id)
            .await?
            .ok_or_else(|| anyhow!("Node {} missing after insert", node_id))?;
        self.emit_event(DomainEvent::NodeCreated { node: node.clone() });

        Ok(node)
    }

    async fn delete_node(&self, node_id: NodeId) -> Result<bool> {
        let removed = self.db.db_delete_node(node_id).await?;
        if removed {
            self.emit_event(DomainEvent::NodeDeleted { id: node_id });
        }
        Ok(removed)
    }

    fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }
}
