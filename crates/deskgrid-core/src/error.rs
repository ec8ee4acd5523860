//! Validation errors for deskgrid domain records.

use thiserror::Error;

/// Result type alias for validation checks.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A record or configuration value failed a structural check.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("workspace {0} has zero capacity")]
    ZeroCapacity(String),

    #[error("workspace {id} holds {occupants} occupants but capacity is {capacity}")]
    OverCapacity {
        id: String,
        occupants: usize,
        capacity: u32,
    },

    #[error("time window ends at or before its start")]
    EmptyWindow,

    #[error("priority {0} is outside 0..=10")]
    Priority(u8),

    #[error("{field} rating {value} is outside 1..=5")]
    Rating { field: &'static str, value: u8 },

    #[error("invalid scoring weight {name} = {value}")]
    Weight { name: &'static str, value: f64 },

    #[error("all scoring weights are zero")]
    ZeroWeights,
}
