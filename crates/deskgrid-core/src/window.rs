//! Time windows and availability schedules.
//!
//! Windows are half-open `[start, end)`. A window without an end is
//! unbounded and overlaps everything that starts after it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};

/// A requested or scheduled time interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// A bounded window. Fails if `end` is not after `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> ValidationResult<Self> {
        let window = Self {
            start,
            end: Some(end),
        };
        window.validate()?;
        Ok(window)
    }

    /// A window with no end.
    pub fn open_ended(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        match self.end {
            Some(end) if end <= self.start => Err(ValidationError::EmptyWindow),
            _ => Ok(()),
        }
    }

    pub fn is_open_ended(&self) -> bool {
        self.end.is_none()
    }

    /// True if the two windows share at least one instant.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        let starts_before_other_ends = other.end.is_none_or(|end| self.start < end);
        let other_starts_before_self_ends = self.end.is_none_or(|end| other.start < end);
        starts_before_other_ends && other_starts_before_self_ends
    }

    /// True if `instant` falls inside the window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && self.end.is_none_or(|end| instant < end)
    }
}

/// Free/busy marker for a scheduled interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Free,
    Busy,
}

/// One interval in a workspace's availability schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(flatten)]
    pub window: TimeWindow,
    pub state: SlotState,
}

impl ScheduleEntry {
    pub fn busy(window: TimeWindow) -> Self {
        Self {
            window,
            state: SlotState::Busy,
        }
    }

    pub fn free(window: TimeWindow) -> Self {
        Self {
            window,
            state: SlotState::Free,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state == SlotState::Busy
    }
}

/// True if `window` collides with no busy entry of `schedule`.
pub fn is_window_free(schedule: &[ScheduleEntry], window: &TimeWindow) -> bool {
    !schedule
        .iter()
        .any(|entry| entry.is_busy() && entry.window.overlaps(window))
}
