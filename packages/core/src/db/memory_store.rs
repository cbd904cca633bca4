//! In-process `NodeStore` implementation
//!
//! Keeps sites and nodes in a `HashMap` behind a tokio `RwLock`. A swap holds
//! the write lock across its check-and-write, which makes the two-row update
//! atomic with respect to every other swap on the same store.

use crate::db::events::{DomainEvent, TaxisSwap, DOMAIN_EVENT_CHANNEL_CAPACITY};
use crate::db::node_store::{NodeStore, SwapOutcome};
use crate::db::taxis_ordering::TaxisCalculator;
use crate::models::{Direction, NewNode, Node, NodeId, Site, ValidationError, ROOT_PARENT_ID};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

#[derive(Debug, Default)]
struct MemoryState {
    sites: HashMap<NodeId, Site>,
    nodes: HashMap<NodeId, Node>,
    last_id: NodeId,
}

impl MemoryState {
    fn allocate_id(&mut self) -> NodeId {
        self.last_id += 1;
        self.last_id
    }

    fn siblings(&self, site_id: NodeId, parent_id: NodeId) -> impl Iterator<Item = &Node> {
        self.nodes
            .values()
            .filter(move |node| node.site_id == site_id && node.parent_id == parent_id)
    }
}

pub struct MemoryStore {
    state: RwLock<MemoryState>,
    event_tx: broadcast::Sender<DomainEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(DOMAIN_EVENT_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(MemoryState::default()),
            event_tx,
        }
    }

    /// Ignores send errors (no subscribers is fine)
    fn emit_event(&self, event: DomainEvent) {
        let _ = self.event_tx.send(event);
    }

    async fn swap(
        &self,
        direction: Direction,
        site_id: NodeId,
        node_id: NodeId,
        parent_id: NodeId,
        current_taxis: i64,
    ) -> Result<SwapOutcome> {
        let swap = {
            let mut state = self.state.write().await;

            match state.nodes.get(&node_id) {
                Some(node) if node.parent_id == parent_id && node.taxis == current_taxis => {}
                _ => return Ok(SwapOutcome::Conflict),
            }

            let neighbor = TaxisCalculator::nearest_sibling(
                state
                    .siblings(site_id, parent_id)
                    .filter(|sibling| sibling.id != node_id),
                current_taxis,
                direction,
            )
            .map(|sibling| (sibling.id, sibling.taxis));

            let Some((neighbor_id, neighbor_taxis)) = neighbor else {
                return Ok(SwapOutcome::Boundary { parent_id });
            };

            if let Some(node) = state.nodes.get_mut(&node_id) {
                node.taxis = neighbor_taxis;
            }
            if let Some(neighbor) = state.nodes.get_mut(&neighbor_id) {
                neighbor.taxis = current_taxis;
            }

            TaxisSwap {
                site_id,
                parent_id,
                node_id,
                neighbor_id,
                node_taxis: neighbor_taxis,
                neighbor_taxis: current_taxis,
            }
        };

        let neighbor_id = swap.neighbor_id;
        self.emit_event(DomainEvent::TaxisSwapped(swap));

        Ok(SwapOutcome::Swapped {
            parent_id,
            neighbor_id,
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn get_site(&self, site_id: NodeId) -> Result<Option<Site>> {
        Ok(self.state.read().await.sites.get(&site_id).cloned())
    }

    async fn get_node(&self, node_id: NodeId) -> Result<Option<Node>> {
        Ok(self.state.read().await.nodes.get(&node_id).cloned())
    }

    async fn get_children(&self, site_id: NodeId, parent_id: NodeId) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        let mut children: Vec<Node> = state.siblings(site_id, parent_id).cloned().collect();
        children.sort_by_key(|child| (child.taxis, child.id));
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

        let root = {
            let mut state = self.state.write().await;
            let id = state.allocate_id();
            let root = Node {
                id,
                site_id: id,
                parent_id: ROOT_PARENT_ID,
                taxis: 1,
                name: name.to_string(),
            };
            state.sites.insert(
                id,
                Site {
                    id,
                    name: name.to_string(),
                },
            );
            state.nodes.insert(id, root.clone());
            root
        };

        let site = Site {
            id: root.id,
            name: root.name.clone(),
        };
        self.emit_event(DomainEvent::NodeCreated { node: root });
        Ok(site)
    }

    async fn create_node(&self, new_node: NewNode) -> Result<Node> {
        new_node.validate()?;

        let node = {
            let mut state = self.state.write().await;

            let parent_in_site = state
                .nodes
                .get(&new_node.parent_id)
                .is_some_and(|parent| parent.site_id == new_node.site_id);
            if !parent_in_site {
                return Err(ValidationError::InvalidParent(new_node.parent_id).into());
            }

            let taxis = match new_node.taxis {
                Some(taxis) => taxis,
                None => TaxisCalculator::next_taxis(
                    state
                        .siblings(new_node.site_id, new_node.parent_id)
                        .map(|sibling| sibling.taxis),
                )
                .ok_or(ValidationError::TaxisExhausted(new_node.parent_id))?,
            };

            let node = Node {
                id: state.allocate_id(),
                site_id: new_node.site_id,
                parent_id: new_node.parent_id,
                taxis,
                name: new_node.name,
            };
            state.nodes.insert(node.id, node.clone());
            node
        };

        self.emit_event(DomainEvent::NodeCreated { node: node.clone() });
        Ok(node)
    }

    async fn delete_node(&self, node_id: NodeId) -> Result<bool> {
        let removed = self.state.write().await.nodes.remove(&node_id).is_some();
        if removed {
            self.emit_event(DomainEvent::NodeDeleted { id: node_id });
        }
        Ok(removed)
    }

    fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }
}
