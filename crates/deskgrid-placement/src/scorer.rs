//! Workspace scoring for allocation decisions.
//!
//! Evaluates a candidate workspace for a request using a weighted
//! combination of:
//! - **Level fit**: leadership toward cabins/offices, everyone else toward desks
//! - **Preference match**: fraction of preference entries the workspace satisfies
//! - **Proximity**: co-location with the department's designated zone
//! - **Priority boost**: linear in the request priority
//! - **Capacity slack**: mild penalty for seating one person in a large room
//!
//! Every factor lies in `[0, 1]`; the weighted sum is clamped to `[0, 1]`.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use deskgrid_core::preferences::merge;
use deskgrid_core::{
    AllocationScore, DeskgridConfig, Employee, EmployeeLevel, PreferenceKey, ScoringWeights,
    Workspace, WorkspaceRequest, WorkspaceType,
};

pub const LEVEL_FIT: &str = "level_fit";
pub const PREFERENCE_MATCH: &str = "preference_match";
pub const PROXIMITY: &str = "proximity";
pub const PRIORITY_BOOST: &str = "priority_boost";
pub const CAPACITY_SLACK: &str = "capacity_slack";

/// Neutral sub-score when a factor has nothing to judge.
const NEUTRAL: f64 = 0.5;

/// Pure scoring function parameterized by weights and department zones.
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    weights: ScoringWeights,
    /// Department tag → designated zone.
    zones: BTreeMap<String, String>,
}

impl Scorer {
    pub fn new(weights: ScoringWeights, zones: BTreeMap<String, String>) -> Self {
        Self { weights, zones }
    }

    pub fn from_config(config: &DeskgridConfig) -> Self {
        Self::new(config.scoring.clone(), config.zones.clone())
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score one workspace for one request.
    pub fn score(
        &self,
        employee: &Employee,
        workspace: &Workspace,
        request: &WorkspaceRequest,
    ) -> AllocationScore {
        let level_fit = level_fit(employee.level, workspace.workspace_type);
        let preference_match = preference_match(employee, workspace, request);
        let proximity = self.proximity(employee, workspace);
        let max_priority = WorkspaceRequest::MAX_PRIORITY;
        let priority_boost = f64::from(request.priority.min(max_priority)) / f64::from(max_priority);
        let capacity_slack = capacity_slack(workspace);

        let w = &self.weights;
        let score = (w.level_fit * level_fit
            + w.preference_match * preference_match
            + w.proximity * proximity
            + w.priority_boost * priority_boost
            + w.capacity_slack * capacity_slack)
            .clamp(0.0, 1.0);

        AllocationScore {
            workspace_id: workspace.id.clone(),
            score,
            factors: BTreeMap::from([
                (LEVEL_FIT.to_string(), level_fit),
                (PREFERENCE_MATCH.to_string(), preference_match),
                (PROXIMITY.to_string(), proximity),
                (PRIORITY_BOOST.to_string(), priority_boost),
                (CAPACITY_SLACK.to_string(), capacity_slack),
            ]),
        }
    }

    fn proximity(&self, employee: &Employee, workspace: &Workspace) -> f64 {
        match self.zones.get(employee.department.as_str()) {
            Some(zone) if *zone == workspace.zone => 1.0,
            Some(_) => 0.0,
            None => NEUTRAL,
        }
    }
}

/// How well a workspace type suits an employee level.
pub fn level_fit(level: EmployeeLevel, ty: WorkspaceType) -> f64 {
    use EmployeeLevel::*;
    use WorkspaceType::*;

    match (level, ty) {
        (_, MeetingRoom | ConferenceHall | CollaborationSpace | BreakoutArea) => 1.0,
        (L1 | L2, PrivateOffice | ManagerialCabin) => 1.0,
        (L1 | L2, FixedWorkstation | HotDesk) => 0.3,
        (L3, FixedWorkstation) => 1.0,
        (L3, HotDesk) => 0.8,
        (L3, PrivateOffice) => 0.6,
        (L3, ManagerialCabin) => 0.3,
        (L4, FixedWorkstation) => 1.0,
        (L4, HotDesk) => 0.8,
        (L5, HotDesk) => 1.0,
        (L5, FixedWorkstation) => 0.8,
        (L4 | L5, PrivateOffice | ManagerialCabin) => 0.2,
    }
}

/// Fraction of the merged preference entries the workspace satisfies.
fn preference_match(
    employee: &Employee,
    workspace: &Workspace,
    request: &WorkspaceRequest,
) -> f64 {
    let prefs = merge(&employee.preferences, &request.preferences);
    if prefs.is_empty() {
        return NEUTRAL;
    }
    let satisfied = prefs
        .iter()
        .filter(|(key, value)| workspace.satisfies(&PreferenceKey::parse(key), value))
        .count();
    satisfied as f64 / prefs.len() as f64
}

/// `sqrt(1 / free_slots)`: 1.0 for the last free seat, decaying slowly.
fn capacity_slack(workspace: &Workspace) -> f64 {
    let free = workspace.free_slots().max(1);
    (1.0 / f64::from(free)).sqrt()
}

/// A scored candidate, carrying what the tie-breakers need.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub score: AllocationScore,
    pub occupancy: usize,
}

impl RankedCandidate {
    pub fn workspace_id(&self) -> &str {
        &self.score.workspace_id
    }
}

/// Score descending, then occupancy ascending, then workspace ID ascending.
pub fn rank_order(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.score
        .score
        .total_cmp(&a.score.score)
        .then_with(|| a.occupancy.cmp(&b.occupancy))
        .then_with(|| a.score.workspace_id.cmp(&b.score.workspace_id))
}

/// Score all candidates and return them best first.
pub fn rank_candidates(
    scorer: &Scorer,
    employee: &Employee,
    request: &WorkspaceRequest,
    candidates: &[&Workspace],
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .map(|ws| RankedCandidate {
            score: scorer.score(employee, ws, request),
            occupancy: ws.occupancy(),
        })
        .collect();
    ranked.sort_by(rank_order);
    ranked
}
