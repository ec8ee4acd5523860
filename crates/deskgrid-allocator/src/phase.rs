//! Request phases.
//!
//! ```text
//! PENDING ─▶ FILTERED ─▶ SCORED ─▶ RESERVING ─▶ ALLOCATED
//!    │          │          │           │
//!    └──────────┴──────────┴───────────┴──────▶ REJECTED
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestPhase {
    Pending,
    Filtered,
    Scored,
    Reserving,
    Allocated,
    Rejected,
}

impl RequestPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestPhase::Allocated | RequestPhase::Rejected)
    }

    pub fn can_transition_to(self, next: RequestPhase) -> bool {
        use RequestPhase::*;
        match (self, next) {
            (Pending, Filtered)
            | (Filtered, Scored)
            | (Scored, Reserving)
            | (Reserving, Allocated) => true,
            (from, Rejected) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Tracks one request through its phases.
#[derive(Debug)]
pub(crate) struct PhaseTracker<'a> {
    employee_id: &'a str,
    phase: RequestPhase,
}

impl<'a> PhaseTracker<'a> {
    pub(crate) fn new(employee_id: &'a str) -> Self {
        Self {
            employee_id,
            phase: RequestPhase::Pending,
        }
    }

    pub(crate) fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub(crate) fn advance(&mut self, next: RequestPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal request transition {:?} -> {:?}",
            self.phase,
            next
        );
        debug!(employee = %self.employee_id, from = ?self.phase, to = ?next, "request phase");
        self.phase = next;
    }
}
