//! Reorder Service
//!
//! Batch orchestration for sibling reordering. A request names a site, a list
//! of nodes, a direction and a repeat count; each node is moved one position
//! at a time, `repeat_count` times, before the next node starts.
//!
//! # Processing Order
//!
//! 1. Permission gate, once per request (`Capability::Channels`)
//! 2. Site lookup
//! 3. For each node in request order:
//!    - exactly `repeat_count` single-step moves, re-reading the node every step
//!    - its parent at every observed step goes into the affected set
//!    - one audit entry once its steps are done
//!
//! Missing nodes are skipped silently: they contribute no parent and no audit
//! entry. Boundary no-ops are still audited.
//!
//! # Examples
//!
//! ```rust,no_run
//! use sitetree_core::db::{MemoryStore, NodeStore};
//! use sitetree_core::models::{Direction, ReorderRequest};
//! use sitetree_core::services::{AllowAll, ReorderService, TracingAuditSink};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store: Arc<dyn NodeStore> = Arc::new(MemoryStore::new());
//! let service = ReorderService::new(store, Arc::new(AllowAll), Arc::new(TracingAuditSink));
//!
//! let affected = service
//!     .submit(&ReorderRequest::new(1, vec![12, 13], Direction::Up, 2))
//!     .await?;
//! println!("invalidate parents {:?}", affected.as_slice());
//! # Ok(())
//! # }
//! ```

use crate::config::ReorderConfig;
use crate::db::NodeStore;
use crate::models::{AffectedParents, Node, NodeId, ReorderRequest};
use crate::operations::{SiblingOperationQueue, StepOutcome};
use crate::services::audit::{AuditEntry, AuditSink};
use crate::services::error::ReorderError;
use crate::services::permissions::{Capability, PermissionGate};
use std::sync::Arc;

/// What happened to one requested node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeReport {
    pub node_id: NodeId,
    /// Whether the node was found in the site at least once
    pub found: bool,
    pub swaps: u32,
    /// Steps abandoned after exhausting conflict retries
    pub contended_steps: u32,
    pub reached_boundary: bool,
}

impl NodeReport {
    fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            ..Default::default()
        }
    }
}

/// Full result of a reorder request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderReport {
    pub affected: AffectedParents,
    /// Realised swaps across all nodes
    pub swaps: u32,
    pub nodes: Vec<NodeReport>,
}

pub struct ReorderService {
    queue: SiblingOperationQueue,
    store: Arc<dyn NodeStore>,
    gate: Arc<dyn PermissionGate>,
    audit: Arc<dyn AuditSink>,
}

impl ReorderService {
    /// Create a service with the default [`ReorderConfig`]
    pub fn new(
        store: Arc<dyn NodeStore>,
        gate: Arc<dyn PermissionGate>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            queue: SiblingOperationQueue::new(store.clone(), ReorderConfig::default()),
            store,
            gate,
            audit,
        }
    }

    /// Create a service with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns an error if `config.validate()` rejects the configuration.
    pub fn with_config(
        store: Arc<dyn NodeStore>,
        gate: Arc<dyn PermissionGate>,
        audit: Arc<dyn AuditSink>,
        config: ReorderConfig,
    ) -> anyhow::Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid reorder configuration: {}", e))?;

        Ok(Self {
            queue: SiblingOperationQueue::new(store.clone(), config),
            store,
            gate,
            audit,
        })
    }

    pub fn config(&self) -> &ReorderConfig {
        self.queue.config()
    }

    /// Reorder the requested nodes and return the parents to invalidate
    ///
    /// The site id is always the first element of the returned set.
    pub async fn submit(&self, request: &ReorderRequest) -> Result<AffectedParents, ReorderError> {
        Ok(self.submit_with_report(request).await?.affected)
    }

    /// Like [`submit`](Self::submit), with per-node diagnostics
    pub async fn submit_with_report(
        &self,
        request: &ReorderRequest,
    ) -> Result<ReorderReport, ReorderError> {
        let site_id = request.site_id;

        if !self
            .gate
            .has_permission(site_id, Capability::Channels)
            .await?
        {
            tracing::warn!("Reorder denied for site {}", site_id);
            return Err(ReorderError::unauthorized(site_id, Capability::Channels));
        }

        if site_id <= 0 {
            return Err(ReorderError::invalid_request(format!(
                "site id must be positive, got {}",
                site_id
            )));
        }

        if self.store.get_site(site_id).await?.is_none() {
            return Err(ReorderError::site_not_found(site_id));
        }

        let repeat = self.config().effective_repeat(request.repeat_count);
        if repeat < request.repeat_count {
            tracing::warn!(
                "Repeat count {} exceeds limit, clamped to {}",
                request.repeat_count,
                repeat
            );
        }

        let mut affected = AffectedParents::new(site_id);
        let mut reports = Vec::with_capacity(request.node_ids.len());
        let mut total_swaps = 0;

        for &node_id in &request.node_ids {
            let mut report = NodeReport::new(node_id);
            let mut last_seen: Option<Node> = None;

            if repeat == 0 {
                last_seen = self.queue.resolve(site_id, node_id).await?;
                if let Some(node) = &last_seen {
                    affected.insert(node.parent_id);
                }
            }

            for _ in 0..repeat {
                let outcome = self.queue.step(site_id, node_id, request.direction).await?;

                if let Some(parent_id) = outcome.parent_id() {
                    affected.insert(parent_id);
                }

                match outcome {
                    StepOutcome::Missing => break,
                    StepOutcome::Moved { node, .. } => {
                        report.swaps += 1;
                        last_seen = Some(node);
                    }
                    StepOutcome::Contended { node } => {
                        report.contended_steps += 1;
                        last_seen = Some(node);
                    }
                    StepOutcome::Boundary { node } => {
                        report.reached_boundary = true;
                        last_seen = Some(node);
                    }
                }
            }

            match last_seen {
                Some(node) => {
                    report.found = true;
                    self.audit
                        .record(AuditEntry::for_move(site_id, &node, request.direction))
                        .await;
                }
                None => {
                    tracing::debug!("Node {} not found in site {}, skipped", node_id, site_id);
                }
            }

            total_swaps += report.swaps;
            reports.push(report);
        }

        tracing::info!(
            "Reordered {} node(s) {:?} x{} in site {}: {} swap(s), affected parents {:?}",
            request.node_ids.len(),
            request.direction,
            repeat,
            site_id,
            total_swaps,
            affected.as_slice()
        );

        Ok(ReorderReport {
            affected,
            swaps: total_swaps,
            nodes: reports,
        })
    }
}

// Scenario tests in separate module
#[cfg(test)]
#[path = "reorder_service_test.rs"]
mod reorder_service_test;
