//! Reorder request and result types
//!
//! A reorder request moves a list of nodes up or down within their sibling
//! groups a number of times. The result is the ordered, de-duplicated list of
//! parent ids whose children may have changed order, always led by the site id.

use super::node::NodeId;
use serde::{Deserialize, Serialize};

/// Direction of a move within a sibling group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// Toward lower taxis (earlier position)
    Up,
    /// Toward higher taxis (later position)
    Down,
}

impl Direction {
    pub fn from_is_up(is_up: bool) -> Self {
        if is_up {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

/// A validated reorder request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub site_id: NodeId,
    /// Nodes to move, processed strictly in this order
    pub node_ids: Vec<NodeId>,
    pub direction: Direction,
    /// Number of single-step moves per node
    pub repeat_count: u32,
}

impl ReorderRequest {
    pub fn new(
        site_id: NodeId,
        node_ids: Vec<NodeId>,
        direction: Direction,
        repeat_count: u32,
    ) -> Self {
        Self {
            site_id,
            node_ids,
            direction,
            repeat_count,
        }
    }
}

/// Wire shape submitted by the channel ordering dialog
///
/// ```json
/// { "siteId": 1, "channelIds": [12, 13], "isUp": true, "taxis": 2 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub site_id: NodeId,
    pub channel_ids: Vec<NodeId>,
    pub is_up: bool,
    pub taxis: u32,
}

impl From<SubmitRequest> for ReorderRequest {
    fn from(request: SubmitRequest) -> Self {
        ReorderRequest {
            site_id: request.site_id,
            node_ids: request.channel_ids,
            direction: Direction::from_is_up(request.is_up),
            repeat_count: request.taxis,
        }
    }
}

/// Insertion-ordered, duplicate-free set of parent ids touched by a request.
///
/// The site id is always the first member. Serializes as a plain JSON array;
/// deserializing rejects an empty array or repeated ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<NodeId>", try_from = "Vec<NodeId>")]
pub struct AffectedParents(Vec<NodeId>);

impl AffectedParents {
    pub fn new(site_id: NodeId) -> Self {
        Self(vec![site_id])
    }

    /// Add a parent id; returns false if it was already present
    pub fn insert(&mut self, parent_id: NodeId) -> bool {
        if self.0.contains(&parent_id) {
            return false;
        }
        self.0.push(parent_id);
        true
    }

    pub fn contains(&self, parent_id: NodeId) -> bool {
        self.0.contains(&parent_id)
    }

    pub fn site_id(&self) -> Option<NodeId> {
        self.0.first().copied()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<NodeId> {
        self.0
    }
}

impl TryFrom<Vec<NodeId>> for AffectedParents {
    type Error = String;

    fn try_from(ids: Vec<NodeId>) -> Result<Self, Self::Error> {
        let Some((&site_id, rest)) = ids.split_first() else {
            return Err("affected parents must start with the site id".to_string());
        };

        let mut parents = Self::new(site_id);
        for &parent_id in rest {
            if !parents.insert(parent_id) {
                return Err(format!("duplicate parent id {}", parent_id));
            }
        }
        Ok(parents)
    }
}

impl From<AffectedParents> for Vec<NodeId> {
    fn from(parents: AffectedParents) -> Self {
        parents.0
    }
}
