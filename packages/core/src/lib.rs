//! Sitetree Core Reordering Engine
//!
//! This crate moves nodes of a site tree up or down among their siblings and
//! reports which parents need their cached child lists invalidated.
//!
//! # Architecture
//!
//! - **Taxis ordering**: Siblings sort by an integer `taxis`, unique per parent
//! - **Adjacent swaps**: A move exchanges taxis with the nearest sibling on one side
//! - **Optimistic concurrency**: Swaps are compare-and-set guarded and retried on conflict
//! - **libsql/Turso**: Embedded SQLite-compatible storage, or an in-memory store
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, Site, ReorderRequest, etc.)
//! - [`db`] - `NodeStore` trait with in-memory and libsql implementations
//! - [`operations`] - Single-step moves with conflict retry
//! - [`services`] - `ReorderService` with permission and audit collaborators
//! - [`config`] - Engine limits and retry tuning
//! - [`logging`] - Tracing subscriber setup

pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod operations;
pub mod services;

// Re-export commonly used types
pub use config::ReorderConfig;
pub use models::*;
pub use services::*;
