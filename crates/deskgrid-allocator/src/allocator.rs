//! The allocation pipeline.
//!
//! validate → load employee → filter → rank → reserve (best first) → commit.
//!
//! Filtering and scoring run against a ledger snapshot, so a candidate may
//! be taken by a concurrent request before we reach it. The ledger's
//! `reserve` is the only authority on admission; when it refuses we move to
//! the next-ranked candidate.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use deskgrid_core::{
    AllocationScore, AllocatorSettings, DeskgridConfig, Employee, EmployeeId, TimeWindow,
    WorkspaceId, WorkspaceRequest,
};
use deskgrid_ledger::{LedgerError, OccupancyLedger};
use deskgrid_placement::{filter_candidates, filter_candidates_broadened, rank_candidates, Scorer};

use crate::directory::Directory;
use crate::error::{AllocatorError, AllocatorResult};
use crate::phase::{PhaseTracker, RequestPhase};

/// A committed allocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub workspace_id: WorkspaceId,
    pub employee_id: EmployeeId,
    pub window: TimeWindow,
    /// Score of the workspace that was committed.
    pub score: AllocationScore,
    /// Number of candidates that passed the filter.
    pub candidates: usize,
    /// Number of `reserve` calls made, including the successful one.
    pub attempts: usize,
    /// The location constraint was dropped to find candidates.
    pub broadened: bool,
    pub phase: RequestPhase,
}

/// Places employees into workspaces.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct Allocator<D> {
    directory: D,
    ledger: OccupancyLedger,
    scorer: Scorer,
    settings: AllocatorSettings,
}

impl<D: Directory> Allocator<D> {
    pub fn new(directory: D, ledger: OccupancyLedger, config: &DeskgridConfig) -> Self {
        Self {
            directory,
            ledger,
            scorer: Scorer::from_config(config),
            settings: config.allocator.clone(),
        }
    }

    pub fn ledger(&self) -> &OccupancyLedger {
        &self.ledger
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Allocate a workspace for `request`.
    pub fn allocate(&self, request: &WorkspaceRequest) -> AllocatorResult<Allocation> {
        self.allocate_with_cancel(request, &CancellationToken::new())
    }

    /// Like [`allocate`](Self::allocate), checking `cancel` before each
    /// reservation attempt. Once a reservation is committed the request is
    /// no longer cancellable; undo it with [`release`](Self::release).
    pub fn allocate_with_cancel(
        &self,
        request: &WorkspaceRequest,
        cancel: &CancellationToken,
    ) -> AllocatorResult<Allocation> {
        let mut tracker = PhaseTracker::new(&request.employee_id);
        let result = self.run(request, cancel, &mut tracker);

        match &result {
            Ok(allocation) => info!(
                employee = %allocation.employee_id,
                workspace = %allocation.workspace_id,
                score = allocation.score.score,
                attempts = allocation.attempts,
                broadened = allocation.broadened,
                "workspace allocated"
            ),
            Err(e) => {
                tracker.advance(RequestPhase::Rejected);
                if e.is_fatal() {
                    error!(employee = %request.employee_id, error = %e, "allocation aborted");
                } else {
                    warn!(employee = %request.employee_id, error = %e, "allocation rejected");
                }
            }
        }
        result
    }

    fn run(
        &self,
        request: &WorkspaceRequest,
        cancel: &CancellationToken,
        tracker: &mut PhaseTracker<'_>,
    ) -> AllocatorResult<Allocation> {
        request.validate()?;

        let mut employee = self
            .directory
            .load_employee(&request.employee_id)?
            .ok_or_else(|| AllocatorError::UnknownEmployee(request.employee_id.clone()))?;

        let snapshot = self.ledger.list();
        let (candidates, broadened) = match filter_candidates(request, &snapshot) {
            Ok(candidates) => (candidates, false),
            Err(none) if self.settings.broaden_location && request.location.is_some() => {
                info!(
                    employee = %request.employee_id,
                    exclusions = ?none.exclusions,
                    "no candidates within location constraint, broadening"
                );
                (filter_candidates_broadened(request, &snapshot)?, true)
            }
            Err(none) => return Err(none.into()),
        };
        tracker.advance(RequestPhase::Filtered);

        let ranked = rank_candidates(&self.scorer, &employee, request, &candidates);
        tracker.advance(RequestPhase::Scored);

        tracker.advance(RequestPhase::Reserving);
        let window = request.window();
        let mut attempts = 0;
        for candidate in &ranked {
            if cancel.is_cancelled() {
                return Err(AllocatorError::Cancelled(request.employee_id.clone()));
            }
            attempts += 1;

            let workspace_id = candidate.workspace_id();
            match self.ledger.reserve(workspace_id, &employee.id, &window) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(workspace = %workspace_id, "candidate taken, trying next");
                    continue;
                }
                Err(LedgerError::UnknownWorkspace(id)) => {
                    debug!(workspace = %id, "candidate deregistered, trying next");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            self.commit(&mut employee, workspace_id)?;
            tracker.advance(RequestPhase::Allocated);

            return Ok(Allocation {
                workspace_id: workspace_id.to_string(),
                employee_id: employee.id.clone(),
                window,
                score: candidate.score.clone(),
                candidates: ranked.len(),
                attempts,
                broadened,
                phase: tracker.phase(),
            });
        }

        Err(AllocatorError::AllocationFailed {
            employee_id: request.employee_id.clone(),
            attempted: attempts,
        })
    }

    /// Persist a fresh reservation. On failure the reservation is undone.
    fn commit(&self, employee: &mut Employee, workspace_id: &str) -> AllocatorResult<()> {
        employee.workspace_history.push(workspace_id.to_string());

        let persisted = self
            .persist_workspace(workspace_id)
            .and_then(|()| Ok(self.directory.persist_employee(employee)?));

        if let Err(e) = persisted {
            employee.workspace_history.pop();
            warn!(
                workspace = %workspace_id,
                employee = %employee.id,
                error = %e,
                "persist failed, rolling back reservation"
            );
            if let Err(rollback) = self.ledger.release(workspace_id, &employee.id) {
                error!(workspace = %workspace_id, error = %rollback, "could not roll back reservation");
                return Err(e);
            }
            // The workspace record may already carry the occupant.
            if let Err(restore) = self.persist_workspace(workspace_id) {
                error!(workspace = %workspace_id, error = %restore, "could not restore workspace record");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Write the workspace's current ledger state to the directory.
    ///
    /// The write happens under the workspace's ledger lock, so concurrent
    /// writers for one workspace land in mutation order and the last record
    /// written is always the newest.
    fn persist_workspace(&self, workspace_id: &str) -> AllocatorResult<()> {
        self.ledger
            .with_workspace(workspace_id, |ws| self.directory.persist_workspace(ws))??;
        Ok(())
    }

    /// Vacate `employee_id` from `workspace_id` and persist the workspace.
    /// Returns whether the employee was an occupant.
    pub fn release(&self, workspace_id: &str, employee_id: &str) -> AllocatorResult<bool> {
        let removed = self.ledger.release(workspace_id, employee_id)?;
        if removed {
            self.persist_workspace(workspace_id)?;
        }
        Ok(removed)
    }
}
