//! Domain Events for node stores
//!
//! This module defines the domain events emitted by a `NodeStore` when data
//! changes. Subscribers (tree-view caches, live views) listen on a tokio
//! broadcast channel without coupling to the storage implementation.
//!
//! # Event Flow
//!
//! 1. The store commits a write (create, delete, taxis swap)
//! 2. A domain event is sent on the broadcast channel
//! 3. Every subscriber receives the event asynchronously
//!
//! Events are only sent after the write has committed, so a subscriber that
//! re-reads the store always observes the change described by the event.

use crate::models::{Node, NodeId};
use serde::{Deserialize, Serialize};

/// Capacity of the per-store broadcast channel
pub const DOMAIN_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Two full siblings exchanged their taxis values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxisSwap {
    pub site_id: NodeId,
    pub parent_id: NodeId,
    /// Node that was asked to move
    pub node_id: NodeId,
    /// Sibling it exchanged positions with
    pub neighbor_id: NodeId,
    /// Taxis of `node_id` after the swap
    pub node_taxis: i64,
    /// Taxis of `neighbor_id` after the swap
    pub neighbor_taxis: i64,
}

/// Domain events emitted by node stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    /// A new node was created
    NodeCreated { node: Node },

    /// A node was deleted
    NodeDeleted { id: NodeId },

    /// Two siblings exchanged taxis values
    TaxisSwapped(TaxisSwap),
}

impl DomainEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &str {
        match self {
            DomainEvent::NodeCreated { .. } => "node:created",
            DomainEvent::NodeDeleted { .. } => "node:deleted",
            DomainEvent::TaxisSwapped(_) => "taxis:swapped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Contract test: `TaxisSwapped` serializes flat with a `type` discriminator
    #[test]
    fn test_taxis_swapped_serialization_contract() {
        let event = DomainEvent::TaxisSwapped(TaxisSwap {
            site_id: 1,
            parent_id: 5,
            node_id: 12,
            neighbor_id: 11,
            node_taxis: 10,
            neighbor_taxis: 20,
        });

        let parsed: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(parsed.get("type").unwrap(), "taxisSwapped");
        assert_eq!(parsed.get("parentId").unwrap(), 5);
        assert_eq!(parsed.get("neighborId").unwrap(), 11);
        assert_eq!(parsed.get("nodeTaxis").unwrap(), 10);
        assert!(
            parsed.get("taxisSwapped").is_none(),
            "Should NOT be nested under the variant key"
        );
        assert_eq!(event.event_type(), "taxis:swapped");
    }

    #[test]
    fn test_event_type_names() {
        assert_eq!(DomainEvent::NodeDeleted { id: 3 }.event_type(), "node:deleted");
        let node = Node {
            id: 3,
            site_id: 1,
            parent_id: 1,
            taxis: 1,
            name: "News".to_string(),
        };
        assert_eq!(
            DomainEvent::NodeCreated { node }.event_type(),
            "node:created"
        );
    }
}
