//! Domain types shared across deskgrid crates.
//!
//! Field names and enum tags are the serialization contract: they match the
//! wire names used by the directory service exactly.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::preferences::{PreferenceKey, PreferenceValue, Preferences};
use crate::window::{ScheduleEntry, TimeWindow, is_window_free};

/// Unique identifier for an employee.
pub type EmployeeId = String;

/// Unique identifier for a workspace.
pub type WorkspaceId = String;

// ── Enumerations ───────────────────────────────────────────────────

/// Hierarchical level, `L1` (executive) through `L5` (junior).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EmployeeLevel {
    L1,
    L2,
    L3,
    L4,
    L5,
}

impl EmployeeLevel {
    /// Executives and managers.
    pub fn is_leadership(self) -> bool {
        matches!(self, EmployeeLevel::L1 | EmployeeLevel::L2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Engineering,
    Product,
    Hr,
    Sales,
    Marketing,
    Operations,
}

impl Department {
    pub fn as_str(self) -> &'static str {
        match self {
            Department::Engineering => "engineering",
            Department::Product => "product",
            Department::Hr => "hr",
            Department::Sales => "sales",
            Department::Marketing => "marketing",
            Department::Operations => "operations",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceType {
    PrivateOffice,
    ManagerialCabin,
    FixedWorkstation,
    HotDesk,
    MeetingRoom,
    ConferenceHall,
    CollaborationSpace,
    BreakoutArea,
}

impl WorkspaceType {
    pub const ALL: [WorkspaceType; 8] = [
        WorkspaceType::PrivateOffice,
        WorkspaceType::ManagerialCabin,
        WorkspaceType::FixedWorkstation,
        WorkspaceType::HotDesk,
        WorkspaceType::MeetingRoom,
        WorkspaceType::ConferenceHall,
        WorkspaceType::CollaborationSpace,
        WorkspaceType::BreakoutArea,
    ];

    /// Types that seat exactly one person regardless of declared capacity.
    pub fn is_single_occupant(self) -> bool {
        matches!(
            self,
            WorkspaceType::PrivateOffice
                | WorkspaceType::ManagerialCabin
                | WorkspaceType::FixedWorkstation
                | WorkspaceType::HotDesk
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkspaceType::PrivateOffice => "private_office",
            WorkspaceType::ManagerialCabin => "managerial_cabin",
            WorkspaceType::FixedWorkstation => "fixed_workstation",
            WorkspaceType::HotDesk => "hot_desk",
            WorkspaceType::MeetingRoom => "meeting_room",
            WorkspaceType::ConferenceHall => "conference_hall",
            WorkspaceType::CollaborationSpace => "collaboration_space",
            WorkspaceType::BreakoutArea => "breakout_area",
        }
    }
}

impl fmt::Display for WorkspaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkspaceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkspaceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown workspace type: {s}"))
    }
}

/// Lifecycle status of a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    #[default]
    Available,
    Occupied,
    /// Operator hold: no new occupants are admitted.
    Reserved,
    Maintenance,
}

impl WorkspaceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkspaceStatus::Available => "available",
            WorkspaceStatus::Occupied => "occupied",
            WorkspaceStatus::Reserved => "reserved",
            WorkspaceStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for WorkspaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Employee ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub level: EmployeeLevel,
    pub department: Department,
    #[serde(default)]
    pub preferences: Preferences,
    pub join_date: DateTime<Utc>,
    /// Workspace IDs previously assigned, oldest first.
    #[serde(default)]
    pub workspace_history: Vec<WorkspaceId>,
}

// ── Workspace ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    #[serde(rename = "type")]
    pub workspace_type: WorkspaceType,
    pub capacity: u32,
    pub floor: i32,
    pub zone: String,
    #[serde(default)]
    pub facilities: BTreeSet<String>,
    #[serde(default)]
    pub current_occupants: Vec<EmployeeId>,
    #[serde(default)]
    pub availability_schedule: Vec<ScheduleEntry>,
    #[serde(default)]
    pub status: WorkspaceStatus,
}

impl Workspace {
    /// Seats actually admitted: 1 for single-occupant types, else `capacity`.
    pub fn effective_capacity(&self) -> u32 {
        if self.workspace_type.is_single_occupant() {
            self.capacity.min(1)
        } else {
            self.capacity
        }
    }

    pub fn occupancy(&self) -> usize {
        self.current_occupants.len()
    }

    pub fn free_slots(&self) -> u32 {
        let occupied = u32::try_from(self.occupancy()).unwrap_or(u32::MAX);
        self.effective_capacity().saturating_sub(occupied)
    }

    pub fn is_full(&self) -> bool {
        self.free_slots() == 0
    }

    pub fn has_occupant(&self, employee_id: &str) -> bool {
        self.current_occupants.iter().any(|o| o == employee_id)
    }

    pub fn is_window_free(&self, window: &TimeWindow) -> bool {
        is_window_free(&self.availability_schedule, window)
    }

    /// Status implied by occupancy. Operator states (`reserved`,
    /// `maintenance`) are sticky and returned unchanged.
    pub fn derived_status(&self) -> WorkspaceStatus {
        match self.status {
            WorkspaceStatus::Reserved | WorkspaceStatus::Maintenance => self.status,
            WorkspaceStatus::Available | WorkspaceStatus::Occupied if self.is_full() => {
                WorkspaceStatus::Occupied
            }
            _ => WorkspaceStatus::Available,
        }
    }

    /// Check capacity and the occupancy invariant against the effective
    /// capacity.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.capacity == 0 {
            return Err(ValidationError::ZeroCapacity(self.id.clone()));
        }
        if self.occupancy() > self.effective_capacity() as usize {
            return Err(ValidationError::OverCapacity {
                id: self.id.clone(),
                occupants: self.occupancy(),
                capacity: self.effective_capacity(),
            });
        }
        for entry in &self.availability_schedule {
            entry.window.validate()?;
        }
        Ok(())
    }

    /// Whether this workspace satisfies one preference entry.
    pub fn satisfies(&self, key: &PreferenceKey, value: &PreferenceValue) -> bool {
        match (key, value) {
            (PreferenceKey::Floor, PreferenceValue::Number(n)) => i64::from(self.floor) == *n,
            (PreferenceKey::Zone, PreferenceValue::Text(z)) => self.zone == *z,
            (PreferenceKey::Floor | PreferenceKey::Zone, _) => false,
            (PreferenceKey::Facility(tag), PreferenceValue::Flag(wanted)) => {
                self.facilities.contains(tag) == *wanted
            }
            (PreferenceKey::Facility(_), PreferenceValue::Text(tag)) => self.facilities.contains(tag),
            (PreferenceKey::Facility(tag), PreferenceValue::Number(_)) => {
                self.facilities.contains(tag)
            }
        }
    }
}

// ── Request ────────────────────────────────────────────────────────

/// Hard location constraint applied by the candidate filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

impl LocationConstraint {
    pub fn admits(&self, workspace: &Workspace) -> bool {
        self.floor.is_none_or(|f| workspace.floor == f)
            && self.zone.as_ref().is_none_or(|z| workspace.zone == *z)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceRequest {
    pub employee_id: EmployeeId,
    pub workspace_type: WorkspaceType,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// 0–10, higher is more urgent.
    #[serde(default)]
    pub priority: u8,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationConstraint>,
}

impl WorkspaceRequest {
    pub const MAX_PRIORITY: u8 = 10;

    pub fn new(
        employee_id: impl Into<EmployeeId>,
        workspace_type: WorkspaceType,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            workspace_type,
            start_time,
            end_time: None,
            priority: 0,
            preferences: Preferences::new(),
            location: None,
        }
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        if self.priority > Self::MAX_PRIORITY {
            return Err(ValidationError::Priority(self.priority));
        }
        self.window().validate()
    }
}

// ── Scoring output ─────────────────────────────────────────────────

/// Fitness of one workspace for one request, with its explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationScore {
    pub workspace_id: WorkspaceId,
    /// Weighted score in `[0, 1]`.
    pub score: f64,
    /// Unweighted sub-score per factor, each in `[0, 1]`.
    pub factors: std::collections::BTreeMap<String, f64>,
}

// ── Feedback ───────────────────────────────────────────────────────

/// Post-allocation ratings, each on a 1–5 scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackMetrics {
    pub comfort: u8,
    pub accessibility: u8,
    pub noise_level: u8,
    pub overall_satisfaction: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl FeedbackMetrics {
    pub fn validate(&self) -> ValidationResult<()> {
        let ratings = [
            ("comfort", self.comfort),
            ("accessibility", self.accessibility),
            ("noise_level", self.noise_level),
            ("overall_satisfaction", self.overall_satisfaction),
        ];
        for (field, value) in ratings {
            if !(1..=5).contains(&value) {
                return Err(ValidationError::Rating { field, value });
            }
        }
        Ok(())
    }
}

/// Feedback attached to a completed allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub workspace_id: WorkspaceId,
    pub employee_id: EmployeeId,
    pub submitted_at: DateTime<Utc>,
    pub metrics: FeedbackMetrics,
}

impl FeedbackRecord {
    /// Build the composite key for the feedback table.
    ///
    /// The timestamp is RFC 3339 with nanoseconds, so keys sort
    /// chronologically and sub-second submissions stay distinct.
    pub fn table_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.workspace_id,
            self.employee_id,
            self.submitted_at.to_rfc3339_opts(SecondsFormat::Nanos, true)
        )
    }
}
