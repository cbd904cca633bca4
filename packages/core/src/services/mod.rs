//! Business Services
//!
//! This module contains the reorder service and the collaborators it is
//! built from:
//!
//! - `ReorderService` - Batch/repeat orchestration of sibling moves
//! - `PermissionGate` - Capability check, once per request
//! - `AuditSink` - One entry per processed node
//!
//! Collaborators are injected as trait objects so the service can run
//! against in-memory fakes in tests.

pub mod audit;
pub mod error;
pub mod permissions;
pub mod reorder_service;

pub use audit::{AuditAction, AuditEntry, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use error::ReorderError;
pub use permissions::{AllowAll, Capability, PermissionGate, StaticPermissions};
pub use reorder_service::{NodeReport, ReorderReport, ReorderService};
