//! Sibling operation queue with retry logic for optimistic concurrency control
//!
//! Each single-step move reads the node's current `parent_id`/`taxis` and asks
//! the store for a compare-and-set swap with the adjacent sibling. If another
//! request changed either row in between, the store reports a conflict and the
//! step is retried from freshly read state, with exponential backoff.
//!
//! # Example
//!
//! ```rust,no_run
//! use sitetree_core::config::ReorderConfig;
//! use sitetree_core::db::{MemoryStore, NodeStore};
//! use sitetree_core::models::Direction;
//! use sitetree_core::operations::SiblingOperationQueue;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store: Arc<dyn NodeStore> = Arc::new(MemoryStore::new());
//! let queue = SiblingOperationQueue::new(store, ReorderConfig::default());
//!
//! // Move node 12 of site 1 one position up (retries up to 5 times on conflict)
//! let outcome = queue.step(1, 12, Direction::Up).await?;
//! println!("moved: {}", outcome.is_moved());
//! # Ok(())
//! # }
//! ```

use crate::config::ReorderConfig;
use crate::db::{NodeStore, SwapOutcome};
use crate::models::{Direction, Node, NodeId};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Result of one single-step move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The node does not exist in the request's site
    Missing,
    /// The node exchanged taxis with `neighbor_id`; `node` is the pre-swap state
    Moved { node: Node, neighbor_id: NodeId },
    /// The node is already first (up) or last (down) among its siblings
    Boundary { node: Node },
    /// Every attempt hit a concurrent update; the step was abandoned
    Contended { node: Node },
}

impl StepOutcome {
    /// Node state observed by the step, `None` if it was missing
    pub fn node(&self) -> Option<&Node> {
        match self {
            StepOutcome::Missing => None,
            StepOutcome::Moved { node, .. }
            | StepOutcome::Boundary { node }
            | StepOutcome::Contended { node } => Some(node),
        }
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.node().map(|node| node.parent_id)
    }

    pub fn is_moved(&self) -> bool {
        matches!(self, StepOutcome::Moved { .. })
    }
}

/// Performs single-step sibling swaps with automatic retry on conflicts
pub struct SiblingOperationQueue {
    store: Arc<dyn NodeStore>,
    config: ReorderConfig,
}

impl SiblingOperationQueue {
    pub fn new(store: Arc<dyn NodeStore>, config: ReorderConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ReorderConfig {
        &self.config
    }

    /// Current state of a node, if it exists and belongs to `site_id`
    pub async fn resolve(&self, site_id: NodeId, node_id: NodeId) -> Result<Option<Node>> {
        let node = self
            .store
            .get_node(node_id)
            .await
            .with_context(|| format!("Failed to read node {}", node_id))?;
        Ok(node.filter(|node| node.site_id == site_id))
    }

    /// Move a node one position within its current sibling group
    ///
    /// # Retry Behavior
    ///
    /// - **Retry on**: `SwapOutcome::Conflict` only
    /// - **Backoff**: Exponential from `retry_backoff_base_ms` (10ms, 20ms, 40ms, ...)
    /// - **Fresh data**: Each attempt re-reads the node and re-resolves its neighbour
    /// - **Exhausted**: Returns `StepOutcome::Contended` without changing anything
    ///
    /// # Errors
    ///
    /// Only storage failures are returned as errors.
    pub async fn step(
        &self,
        site_id: NodeId,
        node_id: NodeId,
        direction: Direction,
    ) -> Result<StepOutcome> {
        let mut attempt = 0;

        loop {
            let Some(node) = self.resolve(site_id, node_id).await? else {
                return Ok(StepOutcome::Missing);
            };

            let outcome = self
                .store
                .swap_adjacent(direction, site_id, node.id, node.parent_id, node.taxis)
                .await?;

            match outcome {
                SwapOutcome::Swapped { neighbor_id, .. } => {
                    if attempt > 0 {
                        tracing::debug!(
                            "Taxis swap succeeded after {} retry(ies) for node {}",
                            attempt,
                            node_id
                        );
                    }
                    return Ok(StepOutcome::Moved { node, neighbor_id });
                }

                SwapOutcome::Boundary { .. } => {
                    tracing::debug!(
                        "Node {} is already at the {:?} boundary of parent {}",
                        node_id,
                        direction,
                        node.parent_id
                    );
                    return Ok(StepOutcome::Boundary { node });
                }

                SwapOutcome::Conflict if attempt < self.config.max_conflict_retries => {
                    tracing::debug!(
                        "Taxis conflict on attempt {}/{} for node {} (taxis {}). Retrying...",
                        attempt + 1,
                        self.config.max_conflict_retries + 1,
                        node_id,
                        node.taxis
                    );
                    tokio::time::sleep(self.config.backoff_for(attempt)).await;
                    attempt += 1;
                }

                SwapOutcome::Conflict => {
                    tracing::warn!(
                        "Max retries ({}) exceeded moving node {}; step abandoned",
                        self.config.max_conflict_retries,
                        node_id
                    );
                    return Ok(StepOutcome::Contended { node });
                }
            }
        }
    }
}
