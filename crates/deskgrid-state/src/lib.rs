//! deskgrid-state — embedded directory store for deskgrid.
//!
//! Backed by [redb](https://docs.rs/redb). Holds the employee and workspace
//! records the allocator reads and persists, plus post-allocation feedback.
//! Values are JSON in redb `&[u8]` columns; feedback keys are composite
//! (`{workspace_id}:{employee_id}:{rfc3339_nanos}`) so a prefix scan finds
//! all feedback for one workspace.
//!
//! `StateStore` is `Clone + Send + Sync` (an `Arc<Database>` inside).

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::StateStore;
