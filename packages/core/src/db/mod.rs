//! Database Layer
//!
//! This module handles persistence of site trees:
//!
//! - `NodeStore` trait: the storage seam used by the reorder engine
//! - `MemoryStore`: in-process store for tests and embedded use
//! - `DatabaseService` + `TursoStore`: libsql (SQLite-compatible) file store
//! - Domain events broadcast after every committed write
//! - Taxis helpers for neighbour lookup and integrity checks

mod database;
mod error;
pub mod events;
mod memory_store;
mod node_store;
pub mod taxis_ordering;
mod turso_store;

pub use database::{DatabaseService, DbSwapResult};
pub use error::DatabaseError;
pub use events::{DomainEvent, TaxisSwap};
pub use memory_store::MemoryStore;
pub use node_store::{NodeStore, SwapOutcome};
pub use taxis_ordering::TaxisCalculator;
pub use turso_store::TursoStore;
