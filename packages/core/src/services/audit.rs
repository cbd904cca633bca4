//! Audit trail for reorder requests
//!
//! One entry is recorded per requested node once its moves finish. Entries
//! record intent: a node that hit a boundary on every step is still audited.

use crate::logging::AUDIT_TARGET;
use crate::models::{Direction, Node, NodeId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuditAction {
    MoveUp,
    MoveDown,
}

impl AuditAction {
    /// Human-readable label stored with the entry
    pub fn label(&self) -> &'static str {
        match self {
            AuditAction::MoveUp => "Channel order moved up",
            AuditAction::MoveDown => "Channel order moved down",
        }
    }
}

impl From<Direction> for AuditAction {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => AuditAction::MoveUp,
            Direction::Down => AuditAction::MoveDown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub site_id: NodeId,
    pub node_id: NodeId,
    /// Content group of the entry; always 0 for channel moves
    pub group_id: NodeId,
    pub action: AuditAction,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn for_move(site_id: NodeId, node: &Node, direction: Direction) -> Self {
        Self {
            id: Uuid::new_v4(),
            site_id,
            node_id: node.id,
            group_id: 0,
            action: direction.into(),
            message: format!("Channel: {}", node.name),
            recorded_at: Utc::now(),
        }
    }
}

/// Receives audit entries in processing order
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry);
}

/// Writes entries as structured `tracing` events on [`AUDIT_TARGET`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: AuditEntry) {
        tracing::info!(
            target: AUDIT_TARGET,
            audit_id = %entry.id,
            site_id = entry.site_id,
            node_id = entry.node_id,
            group_id = entry.group_id,
            action = entry.action.label(),
            "{}",
            entry.message
        );
    }
}

/// Keeps entries in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: AuditEntry) {
        self.entries.lock().await.push(entry);
    }
}
