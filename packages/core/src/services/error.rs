//! Service Layer Error Types
//!
//! Request-level failures of the reorder service. Storage trouble below this
//! layer travels as `anyhow::Error` and surfaces here as `Internal`.

use crate::models::NodeId;
use crate::services::permissions::Capability;
use thiserror::Error;

/// Reorder request errors
#[derive(Error, Debug)]
pub enum ReorderError {
    /// Caller lacks the capability on this site
    #[error("Permission denied: {capability} on site {site_id}")]
    Unauthorized {
        site_id: NodeId,
        capability: Capability,
    },

    /// Site does not exist
    #[error("Site not found: {site_id}")]
    SiteNotFound { site_id: NodeId },

    /// Malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Storage or collaborator failure
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ReorderError {
    /// Create an unauthorized error
    pub fn unauthorized(site_id: NodeId, capability: Capability) -> Self {
        Self::Unauthorized {
            site_id,
            capability,
        }
    }

    /// Create a site not found error
    pub fn site_not_found(site_id: NodeId) -> Self {
        Self::SiteNotFound { site_id }
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// HTTP-equivalent status for callers that expose the service over a wire
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 401,
            Self::SiteNotFound { .. } => 404,
            Self::InvalidRequest(_) => 400,
            Self::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ReorderError::unauthorized(1, Capability::Channels).status_code(),
            401
        );
        assert_eq!(ReorderError::site_not_found(9).status_code(), 404);
        assert_eq!(ReorderError::invalid_request("bad").status_code(), 400);
        assert_eq!(
            ReorderError::from(anyhow::anyhow!("disk gone")).status_code(),
            500
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ReorderError::unauthorized(3, Capability::Channels);
        assert_eq!(err.to_string(), "Permission denied: channels on site 3");

        let err = ReorderError::site_not_found(9);
        assert_eq!(err.to_string(), "Site not found: 9");
    }
}
