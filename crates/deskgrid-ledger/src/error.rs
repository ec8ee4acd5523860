//! Occupancy ledger error types.

use deskgrid_core::ValidationError;
use thiserror::Error;

/// Errors raised by ledger operations.
///
/// A refused reservation is not an error; `reserve` reports it as `false`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("workspace not found: {0}")]
    UnknownWorkspace(String),

    #[error("workspace already registered: {0}")]
    DuplicateWorkspace(String),

    #[error("invalid workspace: {0}")]
    InvalidWorkspace(#[from] ValidationError),

    /// Occupancy exceeded capacity under the lock. Indicates a ledger bug.
    #[error("invariant violated on {workspace}: {occupants} occupants, capacity {capacity}")]
    InvariantViolation {
        workspace: String,
        occupants: usize,
        capacity: u32,
    },
}

impl LedgerError {
    /// Fatal errors must abort the caller rather than be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LedgerError::InvariantViolation { .. })
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
