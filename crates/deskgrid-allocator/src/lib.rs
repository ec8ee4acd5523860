//! deskgrid-allocator — turns workspace requests into committed reservations.
//!
//! [`Allocator`] drives a request through filtering, scoring, and a
//! best-first reservation loop against the shared [`OccupancyLedger`].
//! Records are loaded from and written back to a [`Directory`].
//!
//! [`OccupancyLedger`]: deskgrid_ledger::OccupancyLedger

pub mod allocator;
pub mod directory;
pub mod error;
pub mod phase;
pub mod submit;

pub use allocator::{Allocation, Allocator};
pub use directory::{load_ledger, Directory};
pub use error::{AllocatorError, AllocatorResult};
pub use phase::RequestPhase;
pub use submit::{submit_all, Submission};
