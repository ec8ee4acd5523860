//! Candidate filter — structural eligibility of workspaces for a request.
//!
//! A workspace survives when its type matches the request, it is not in
//! maintenance or on hold, it has a free seat, it satisfies the request's
//! location constraint, and the requested window does not overlap any busy
//! interval in its schedule. Input order is preserved.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use deskgrid_core::{Workspace, WorkspaceRequest, WorkspaceStatus, WorkspaceType};

/// Why a workspace was dropped by the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Exclusion {
    WrongType,
    Maintenance,
    Held,
    Full,
    Location,
    WindowBusy,
}

/// The filter left nothing to score.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no {workspace_type} candidates among {considered} workspaces")]
pub struct NoCandidates {
    pub workspace_type: WorkspaceType,
    pub considered: usize,
    /// How many workspaces each rule removed.
    pub exclusions: BTreeMap<Exclusion, usize>,
}

fn exclusion(
    request: &WorkspaceRequest,
    ws: &Workspace,
    respect_location: bool,
) -> Option<Exclusion> {
    if ws.workspace_type != request.workspace_type {
        return Some(Exclusion::WrongType);
    }
    match ws.status {
        WorkspaceStatus::Maintenance => return Some(Exclusion::Maintenance),
        WorkspaceStatus::Reserved => return Some(Exclusion::Held),
        WorkspaceStatus::Available | WorkspaceStatus::Occupied => {}
    }
    if ws.is_full() {
        return Some(Exclusion::Full);
    }
    if respect_location
        && request
            .location
            .as_ref()
            .is_some_and(|loc| !loc.admits(ws))
    {
        return Some(Exclusion::Location);
    }
    if !ws.is_window_free(&request.window()) {
        return Some(Exclusion::WindowBusy);
    }
    None
}

fn filter<'a>(
    request: &WorkspaceRequest,
    workspaces: &'a [Workspace],
    respect_location: bool,
) -> Result<Vec<&'a Workspace>, NoCandidates> {
    let mut exclusions: BTreeMap<Exclusion, usize> = BTreeMap::new();
    let mut candidates = Vec::new();

    for ws in workspaces {
        match exclusion(request, ws, respect_location) {
            Some(reason) => *exclusions.entry(reason).or_insert(0) += 1,
            None => candidates.push(ws),
        }
    }

    debug!(
        employee = %request.employee_id,
        workspace_type = %request.workspace_type,
        considered = workspaces.len(),
        candidates = candidates.len(),
        ?exclusions,
        "candidate filter applied"
    );

    if candidates.is_empty() {
        return Err(NoCandidates {
            workspace_type: request.workspace_type,
            considered: workspaces.len(),
            exclusions,
        });
    }
    Ok(candidates)
}

/// Workspaces structurally eligible for `request`.
pub fn filter_candidates<'a>(
    request: &WorkspaceRequest,
    workspaces: &'a [Workspace],
) -> Result<Vec<&'a Workspace>, NoCandidates> {
    filter(request, workspaces, true)
}

/// Like [`filter_candidates`] but ignores the request's location constraint.
pub fn filter_candidates_broadened<'a>(
    request: &WorkspaceRequest,
    workspaces: &'a [Workspace],
) -> Result<Vec<&'a Workspace>, NoCandidates> {
    filter(request, workspaces, false)
}
