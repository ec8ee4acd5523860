//! deskgrid-ledger — the occupancy ledger.
//!
//! Owns every `Workspace`'s mutable state. All occupancy changes go through
//! [`OccupancyLedger`], which serializes mutations per workspace:
//!
//! ```text
//! OccupancyLedger
//!   └── RwLock<HashMap<workspace_id, Arc<Mutex<Workspace>>>>
//!         ├── W1 ── reserve / release / block_window / set_*  (serialized)
//!         └── W2 ── ...                                        (in parallel)
//! ```

pub mod error;
pub mod ledger;

pub use error::{LedgerError, LedgerResult};
pub use ledger::OccupancyLedger;
