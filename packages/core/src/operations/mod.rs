//! Node Operations
//!
//! Single-step sibling moves with conflict retry. Batch orchestration over
//! many nodes lives in [`ReorderService`](crate::services::ReorderService).

pub mod sibling_queue;

pub use sibling_queue::{SiblingOperationQueue, StepOutcome};
