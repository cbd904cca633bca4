//! Node Data Structures
//!
//! This module defines the `Node` struct stored in a site's tree and the
//! `Site` that owns each tree.
//!
//! # Architecture
//!
//! - **Site root**: Every site has a root node whose `id` equals the site id and
//!   whose `parent_id` is [`ROOT_PARENT_ID`]
//! - **Sibling group**: Nodes sharing one `parent_id` within a site
//! - **Taxis**: Integer order value, unique within a sibling group, lower sorts first
//!
//! # Examples
//!
//! ```rust
//! use sitetree_core::models::NewNode;
//!
//! // Append "News" under the root of site 1 (taxis assigned by the store)
//! let news = NewNode::new(1, 1, "News");
//!
//! // Insert with an explicit taxis value
//! let archive = NewNode::new(1, 1, "Archive").with_taxis(40);
//! assert_eq!(archive.taxis, Some(40));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a node (and of a site, whose root node shares its id)
pub type NodeId = i64;

/// Parent id of a site root node; it has no further ancestor
pub const ROOT_PARENT_ID: NodeId = 0;

/// Validation errors for node creation
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid node ID: {0}")]
    InvalidId(NodeId),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(NodeId),

    #[error("Invalid taxis value: {0}")]
    InvalidTaxis(i64),

    #[error("No taxis left to append under parent {0}")]
    TaxisExhausted(NodeId),
}

/// A site owning one node tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: NodeId,
    pub name: String,
}

/// One element of a site tree (e.g. a CMS channel).
///
/// # Fields
///
/// - `id`: Stable unique identifier, immutable
/// - `site_id`: Site owning the node
/// - `parent_id`: Parent node id, or [`ROOT_PARENT_ID`] for the site root
/// - `taxis`: Order value among full siblings
/// - `name`: Display name, used in audit messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub site_id: NodeId,
    pub parent_id: NodeId,
    pub taxis: i64,
    pub name: String,
}

/// Parameters for inserting a node into a site tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNode {
    pub site_id: NodeId,
    pub parent_id: NodeId,
    pub name: String,
    /// Explicit taxis; `None` appends after the last sibling
    pub taxis: Option<i64>,
}

impl NewNode {
    pub fn new(site_id: NodeId, parent_id: NodeId, name: impl Into<String>) -> Self {
        Self {
            site_id,
            parent_id,
            name: name.into(),
            taxis: None,
        }
    }

    pub fn with_taxis(mut self, taxis: i64) -> Self {
        self.taxis = Some(taxis);
        self
    }

    /// Validate before handing to a store
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.site_id <= 0 {
            return Err(ValidationError::InvalidId(self.site_id));
        }
        if self.parent_id <= 0 {
            return Err(ValidationError::InvalidParent(self.parent_id));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()));
        }
        if let Some(taxis) = self.taxis {
            if taxis < 0 {
                return Err(ValidationError::InvalidTaxis(taxis));
            }
        }
        Ok(())
    }
}
