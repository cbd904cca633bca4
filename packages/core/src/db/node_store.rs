//! NodeStore Trait - Storage Abstraction Layer
//!
//! This module defines the `NodeStore` trait that abstracts persistence of
//! site trees. The reorder engine depends only on this trait, so it runs
//! unchanged against the in-process [`MemoryStore`](super::MemoryStore) and
//! the libsql-backed [`TursoStore`](super::TursoStore).
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async; any read or write of a node may
//!    wait on storage
//! 2. **Error Handling**: Uses `anyhow::Result` for flexible error context
//! 3. **Compare-And-Set Swaps**: A swap is applied only if the node still has
//!    the `parent_id`/`taxis` the caller observed; otherwise it reports
//!    [`SwapOutcome::Conflict`] and changes nothing
//!
//! # Examples
//!
//! ```rust,no_run
//! use sitetree_core::db::{MemoryStore, NodeStore};
//! use sitetree_core::models::{Direction, NewNode};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = MemoryStore::new();
//!     let site = store.create_site("Main").await?;
//!     let news = store.create_node(NewNode::new(site.id, site.id, "News")).await?;
//!     let _blog = store.create_node(NewNode::new(site.id, site.id, "Blog")).await?;
//!
//!     // News is first, so moving it up is a boundary no-op
//!     let outcome = store
//!         .swap_adjacent(Direction::Up, site.id, news.id, news.parent_id, news.taxis)
//!         .await?;
//!     assert!(!outcome.is_swapped());
//!     Ok(())
//! }
//! ```

use crate::db::events::DomainEvent;
use crate::models::{Direction, NewNode, Node, NodeId, Site};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Result of one compare-and-set adjacent swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Taxis values were exchanged with `neighbor_id`
    Swapped {
        parent_id: NodeId,
        neighbor_id: NodeId,
    },
    /// No sibling exists on the requested side; nothing changed
    Boundary { parent_id: NodeId },
    /// The node (or its neighbour) no longer matches the observed state;
    /// nothing changed and the caller should re-read and retry
    Conflict,
}

impl SwapOutcome {
    pub fn is_swapped(&self) -> bool {
        matches!(self, SwapOutcome::Swapped { .. })
    }
}

/// Abstraction layer for site tree persistence
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one store is shared by every
/// concurrently running request.
///
/// # Method Categories
///
/// - **Lookups**: `get_site`, `get_node`, `get_children`
/// - **Ordering**: `swap_with_previous`, `swap_with_next`
/// - **Tree management**: `create_site`, `create_node`, `delete_node`
/// - **Events**: `subscribe_to_events`
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Get site by ID
    ///
    /// - `Ok(Some(site))` if the site exists
    /// - `Ok(None)` if it doesn't (not an error)
    async fn get_site(&self, site_id: NodeId) -> Result<Option<Site>>;

    /// Get node by ID, `Ok(None)` if it doesn't exist
    async fn get_node(&self, node_id: NodeId) -> Result<Option<Node>>;

    /// Children of `parent_id` within `site_id`, ordered by `(taxis, id)`
    async fn get_children(&self, site_id: NodeId, parent_id: NodeId) -> Result<Vec<Node>>;

    /// Exchange taxis with the nearest-lower sibling
    ///
    /// # Arguments
    ///
    /// * `site_id` - Site whose siblings are searched
    /// * `node_id` - Node to move
    /// * `parent_id` - Parent the caller observed for the node
    /// * `current_taxis` - Taxis the caller observed for the node
    ///
    /// Both rows are updated as one atomic unit. The swap is applied only if
    /// the node still has `parent_id`/`current_taxis`.
    async fn swap_with_previous(
        &self,
        site_id: NodeId,
        node_id: NodeId,
        parent_id: NodeId,
        current_taxis: i64,
    ) -> Result<SwapOutcome>;

    /// Exchange taxis with the nearest-higher sibling
    ///
    /// Same contract as [`swap_with_previous`](Self::swap_with_previous).
    async fn swap_with_next(
        &self,
        site_id: NodeId,
        node_id: NodeId,
        parent_id: NodeId,
        current_taxis: i64,
    ) -> Result<SwapOutcome>;

    /// Dispatch to `swap_with_previous` (up) or `swap_with_next` (down)
    async fn swap_adjacent(
        &self,
        direction: Direction,
        site_id: NodeId,
        node_id: NodeId,
        parent_id: NodeId,
        current_taxis: i64,
    ) -> Result<SwapOutcome> {
        match direction {
            Direction::Up => {
                self.swap_with_previous(site_id, node_id, parent_id, current_taxis)
                    .await
            }
            Direction::Down => {
                self.swap_with_next(site_id, node_id, parent_id, current_taxis)
                    .await
            }
        }
    }

    /// Create a site together with its root node (root id == site id)
    async fn create_site(&self, name: &str) -> Result<Site>;

    /// Insert a node; `taxis: None` appends after the last sibling
    async fn create_node(&self, node: NewNode) -> Result<Node>;

    /// Delete a single node; returns whether it existed
    async fn delete_node(&self, node_id: NodeId) -> Result<bool>;

    /// Subscribe to domain events emitted after each committed write
    fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent>;
}
