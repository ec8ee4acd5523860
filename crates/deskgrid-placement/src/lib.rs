//! deskgrid-placement — which workspace should a request get?
//!
//! Pure functions over workspace snapshots. Nothing here mutates state;
//! the allocator feeds the ranked list to the occupancy ledger.
//!
//! # Components
//!
//! - **`filter`** — Candidate filter (type, status, capacity, location, window)
//! - **`scorer`** — Scoring function and deterministic ranking

pub mod filter;
pub mod scorer;

pub use filter::{Exclusion, NoCandidates, filter_candidates, filter_candidates_broadened};
pub use scorer::{RankedCandidate, Scorer, level_fit, rank_candidates, rank_order};
