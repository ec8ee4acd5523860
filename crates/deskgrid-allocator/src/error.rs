//! Allocator error types.

use deskgrid_core::ValidationError;
use deskgrid_ledger::LedgerError;
use deskgrid_placement::NoCandidates;
use thiserror::Error;

/// Errors that end an allocation attempt in `REJECTED`.
#[derive(Debug, Error)]
pub enum AllocatorError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),

    #[error("unknown employee: {0}")]
    UnknownEmployee(String),

    #[error(transparent)]
    NoCandidates(#[from] NoCandidates),

    #[error("allocation failed for {employee_id}: all {attempted} candidates refused")]
    AllocationFailed { employee_id: String, attempted: usize },

    #[error("request for {0} cancelled before reservation")]
    Cancelled(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("directory error: {0}")]
    Directory(#[from] anyhow::Error),

    #[error("allocation task failed: {0}")]
    Task(String),
}

impl AllocatorError {
    /// The caller may relax or simply resubmit the request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AllocatorError::NoCandidates(_) | AllocatorError::AllocationFailed { .. }
        )
    }

    /// The ledger's occupancy invariant broke; the process should stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AllocatorError::Ledger(e) if e.is_fatal())
    }
}

pub type AllocatorResult<T> = Result<T, AllocatorError>;
