//! deskgrid-core — shared data model for the workspace allocation engine.
//!
//! Employees, workspaces, requests, scores and feedback, plus the time
//! window and preference types they are built from and the TOML
//! configuration consumed by the scorer and allocator.

pub mod config;
pub mod error;
pub mod preferences;
pub mod types;
pub mod window;

pub use config::{AllocatorSettings, DeskgridConfig, ScoringWeights};
pub use error::{ValidationError, ValidationResult};
pub use preferences::{PreferenceKey, PreferenceValue, Preferences};
pub use types::*;
pub use window::{ScheduleEntry, SlotState, TimeWindow};
