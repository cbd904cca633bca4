//! Permission gate consulted once per request

use crate::models::NodeId;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Capabilities a caller can hold on a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// Manage channel structure, including sibling order
    Channels,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Channels => write!(f, "channels"),
        }
    }
}

/// Answers whether the current caller holds a capability on a site
#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn has_permission(&self, site_id: NodeId, capability: Capability) -> Result<bool>;
}

/// Grants everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl PermissionGate for AllowAll {
    async fn has_permission(&self, _site_id: NodeId, _capability: Capability) -> Result<bool> {
        Ok(true)
    }
}

/// Fixed set of `(site, capability)` grants
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    grants: HashSet<(NodeId, Capability)>,
}

impl StaticPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, site_id: NodeId, capability: Capability) -> Self {
        self.grants.insert((site_id, capability));
        self
    }
}

#[async_trait]
impl PermissionGate for StaticPermissions {
    async fn has_permission(&self, site_id: NodeId, capability: Capability) -> Result<bool> {
        Ok(self.grants.contains(&(site_id, capability)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_permissions_scoped_to_site() {
        let gate = StaticPermissions::new().grant(1, Capability::Channels);

        assert!(gate.has_permission(1, Capability::Channels).await.unwrap());
        assert!(!gate.has_permission(2, Capability::Channels).await.unwrap());
    }

    #[tokio::test]
    async fn test_allow_all() {
        assert!(AllowAll.has_permission(77, Capability::Channels).await.unwrap());
    }
}
