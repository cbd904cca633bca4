//! Data Models
//!
//! This module contains the core data structures used throughout Sitetree:
//!
//! - `Node` / `Site` - Tree elements and the site owning them
//! - `ReorderRequest` / `AffectedParents` - Input and output of a reorder
//!
//! Ordering among siblings is carried by the integer `taxis` field.

mod node;
mod reorder;

pub use node::{NewNode, Node, NodeId, Site, ValidationError, ROOT_PARENT_ID};
pub use reorder::{AffectedParents, Direction, ReorderRequest, SubmitRequest};
