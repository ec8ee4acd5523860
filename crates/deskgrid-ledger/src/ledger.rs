//! OccupancyLedger — authoritative in-memory workspace state.
//!
//! Each workspace sits behind its own `Mutex` inside a lock table keyed by
//! workspace ID. The table's `RwLock` is held only long enough to clone the
//! slot handle, so operations on different workspaces never contend, and
//! two `reserve` calls on the same workspace serialize on its mutex.
//!
//! Every mutating critical section is check-then-commit and never waits on
//! anything but the slot mutex.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use deskgrid_core::{ScheduleEntry, TimeWindow, Workspace, WorkspaceId, WorkspaceStatus};

use crate::error::{LedgerError, LedgerResult};

type Slot = Arc<Mutex<Workspace>>;

/// Why an admission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refusal {
    Maintenance,
    Held,
    Full,
    WindowBusy,
    AlreadyOccupant,
}

fn admission_check(
    ws: &Workspace,
    employee_id: Option<&str>,
    window: &TimeWindow,
) -> Result<(), Refusal> {
    match ws.status {
        WorkspaceStatus::Maintenance => return Err(Refusal::Maintenance),
        WorkspaceStatus::Reserved => return Err(Refusal::Held),
        WorkspaceStatus::Available | WorkspaceStatus::Occupied => {}
    }
    if employee_id.is_some_and(|id| ws.has_occupant(id)) {
        return Err(Refusal::AlreadyOccupant);
    }
    if ws.is_full() {
        return Err(Refusal::Full);
    }
    if !ws.is_window_free(window) {
        return Err(Refusal::WindowBusy);
    }
    Ok(())
}

/// Thread-safe occupancy ledger. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct OccupancyLedger {
    slots: Arc<RwLock<HashMap<WorkspaceId, Slot>>>,
}

impl OccupancyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from a workspace snapshot (e.g. `list_workspaces()`).
    pub fn from_workspaces(workspaces: impl IntoIterator<Item = Workspace>) -> LedgerResult<Self> {
        let ledger = Self::new();
        for ws in workspaces {
            ledger.register(ws)?;
        }
        Ok(ledger)
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    /// Take ownership of a workspace. Its status is normalized against its
    /// current occupancy.
    pub fn register(&self, mut workspace: Workspace) -> LedgerResult<()> {
        workspace.validate()?;
        workspace.status = workspace.derived_status();

        let mut slots = self.slots.write();
        if slots.contains_key(&workspace.id) {
            return Err(LedgerError::DuplicateWorkspace(workspace.id));
        }
        debug!(workspace = %workspace.id, status = ?workspace.status, "workspace registered");
        slots.insert(workspace.id.clone(), Arc::new(Mutex::new(workspace)));
        Ok(())
    }

    /// Drop a workspace from the ledger, returning its final state.
    pub fn deregister(&self, workspace_id: &str) -> LedgerResult<Workspace> {
        let slot = self
            .slots
            .write()
            .remove(workspace_id)
            .ok_or_else(|| LedgerError::UnknownWorkspace(workspace_id.to_string()))?;
        let ws = slot.lock().clone();
        debug!(workspace = %workspace_id, "workspace deregistered");
        Ok(ws)
    }

    fn slot(&self, workspace_id: &str) -> LedgerResult<Slot> {
        self.slots
            .read()
            .get(workspace_id)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownWorkspace(workspace_id.to_string()))
    }

    /// Atomically admit `employee_id` into the workspace for `window`.
    ///
    /// Returns `Ok(false)` when the workspace cannot take the occupant right
    /// now (full, busy window, held, in maintenance, or already seated).
    pub fn reserve(
        &self,
        workspace_id: &str,
        employee_id: &str,
        window: &TimeWindow,
    ) -> LedgerResult<bool> {
        let slot = self.slot(workspace_id)?;
        let mut ws = slot.lock();

        if let Err(refusal) = admission_check(&ws, Some(employee_id), window) {
            debug!(
                workspace = %workspace_id,
                employee = %employee_id,
                ?refusal,
                "reservation refused"
            );
            return Ok(false);
        }

        ws.current_occupants.push(employee_id.to_string());
        if ws.occupancy() > ws.effective_capacity() as usize {
            let violation = LedgerError::InvariantViolation {
                workspace: ws.id.clone(),
                occupants: ws.occupancy(),
                capacity: ws.effective_capacity(),
            };
            ws.current_occupants.pop();
            error!(error = %violation, "occupancy invariant violated");
            return Err(violation);
        }
        ws.status = ws.derived_status();

        info!(
            workspace = %workspace_id,
            employee = %employee_id,
            occupants = ws.occupancy(),
            status = ?ws.status,
            "reservation committed"
        );
        Ok(true)
    }

    /// Remove an occupant. Returns whether they were present.
    pub fn release(&self, workspace_id: &str, employee_id: &str) -> LedgerResult<bool> {
        let slot = self.slot(workspace_id)?;
        let mut ws = slot.lock();

        let before = ws.occupancy();
        ws.current_occupants.retain(|o| o != employee_id);
        let removed = ws.occupancy() < before;
        ws.status = ws.derived_status();

        if removed {
            info!(workspace = %workspace_id, employee = %employee_id, status = ?ws.status, "occupant released");
        } else {
            warn!(workspace = %workspace_id, employee = %employee_id, "release of non-occupant");
        }
        Ok(removed)
    }

    /// Whether a new occupant could be admitted for `window` right now.
    pub fn query_availability(&self, workspace_id: &str, window: &TimeWindow) -> LedgerResult<bool> {
        let slot = self.slot(workspace_id)?;
        let ws = slot.lock();
        Ok(admission_check(&ws, None, window).is_ok())
    }

    /// Mark `window` busy in the workspace's availability schedule.
    pub fn block_window(&self, workspace_id: &str, window: TimeWindow) -> LedgerResult<()> {
        window.validate()?;
        let slot = self.slot(workspace_id)?;
        let mut ws = slot.lock();
        ws.availability_schedule.push(ScheduleEntry::busy(window));
        debug!(workspace = %workspace_id, start = %window.start, "window blocked");
        Ok(())
    }

    /// Enter or leave maintenance.
    pub fn set_maintenance(&self, workspace_id: &str, on: bool) -> LedgerResult<WorkspaceStatus> {
        self.set_operator_status(workspace_id, WorkspaceStatus::Maintenance, on)
    }

    /// Place or lift an operator hold (`reserved`).
    pub fn set_hold(&self, workspace_id: &str, on: bool) -> LedgerResult<WorkspaceStatus> {
        self.set_operator_status(workspace_id, WorkspaceStatus::Reserved, on)
    }

    fn set_operator_status(
        &self,
        workspace_id: &str,
        operator_status: WorkspaceStatus,
        on: bool,
    ) -> LedgerResult<WorkspaceStatus> {
        let slot = self.slot(workspace_id)?;
        let mut ws = slot.lock();
        if on {
            ws.status = operator_status;
        } else if ws.status == operator_status {
            ws.status = WorkspaceStatus::Available;
            ws.status = ws.derived_status();
        }
        info!(workspace = %workspace_id, status = ?ws.status, "operator status changed");
        Ok(ws.status)
    }

    /// Run `f` against a workspace while holding its lock.
    ///
    /// Mutations on that workspace wait until `f` returns, so anything `f`
    /// writes out reflects the latest state and writes are ordered.
    pub fn with_workspace<R>(
        &self,
        workspace_id: &str,
        f: impl FnOnce(&Workspace) -> R,
    ) -> LedgerResult<R> {
        let slot = self.slot(workspace_id)?;
        let ws = slot.lock();
        Ok(f(&ws))
    }

    /// Copy of one workspace's current state.
    pub fn snapshot(&self, workspace_id: &str) -> LedgerResult<Workspace> {
        let slot = self.slot(workspace_id)?;
        let ws = slot.lock().clone();
        Ok(ws)
    }

    /// Copies of every workspace, ordered by ID.
    ///
    /// Each workspace is copied under its own lock, so the list is not a
    /// single atomic cut across workspaces.
    pub fn list(&self) -> Vec<Workspace> {
        let slots: Vec<Slot> = self.slots.read().values().cloned().collect();
        let mut workspaces: Vec<Workspace> = slots.iter().map(|s| s.lock().clone()).collect();
        workspaces.sort_by(|a, b| a.id.cmp(&b.id));
        workspaces
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Barrier;
    use std::thread;

    use chrono::{TimeZone, Utc};
    use deskgrid_core::{ValidationError, WorkspaceType};

    use super::*;

    fn make_workspace(id: &str, ty: WorkspaceType, capacity: u32) -> Workspace {
        Workspace {
            id: id.to_string(),
            workspace_type: ty,
            capacity,
            floor: 3,
            zone: "eng-3".to_string(),
            facilities: BTreeSet::new(),
            current_occupants: Vec::new(),
            availability_schedule: Vec::new(),
            status: WorkspaceStatus::Available,
        }
    }

    fn window(start_hour: u32, end_hour: u32) -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2024, 1, 1, start_hour, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, end_hour, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn ledger_with(workspaces: Vec<Workspace>) -> OccupancyLedger {
        OccupancyLedger::from_workspaces(workspaces).unwrap()
    }

    #[test]
    fn reserve_then_release_single_occupant() {
        let ledger = ledger_with(vec![make_workspace("W1", WorkspaceType::PrivateOffice, 1)]);

        assert!(ledger.reserve("W1", "E1", &window(9, 17)).unwrap());
        let ws = ledger.snapshot("W1").unwrap();
        assert_eq!(ws.current_occupants, vec!["E1".to_string()]);
        assert_eq!(ws.status, WorkspaceStatus::Occupied);

        assert!(ledger.release("W1", "E1").unwrap());
        let ws = ledger.snapshot("W1").unwrap();
        assert!(ws.current_occupants.is_empty());
        assert_eq!(ws.status, WorkspaceStatus::Available);
    }

    #[test]
    fn full_workspace_refuses_without_error() {
        let ledger = ledger_with(vec![make_workspace("W1", WorkspaceType::HotDesk, 1)]);

        assert!(ledger.reserve("W1", "E1", &window(9, 17)).unwrap());
        assert!(!ledger.reserve("W1", "E2", &window(9, 17)).unwrap());
        assert_eq!(ledger.snapshot("W1").unwrap().occupancy(), 1);
    }

    #[test]
    fn single_occupant_type_ignores_declared_capacity() {
        let ledger = ledger_with(vec![make_workspace("W1", WorkspaceType::PrivateOffice, 3)]);

        assert!(ledger.reserve("W1", "E1", &window(9, 17)).unwrap());
        assert!(!ledger.reserve("W1", "E2", &window(9, 17)).unwrap());
    }

    #[test]
    fn shared_room_fills_to_capacity() {
        let ledger = ledger_with(vec![make_workspace("M1", WorkspaceType::MeetingRoom, 2)]);

        assert!(ledger.reserve("M1", "E1", &window(9, 10)).unwrap());
        assert_eq!(ledger.snapshot("M1").unwrap().status, WorkspaceStatus::Available);

        assert!(ledger.reserve("M1", "E2", &window(9, 10)).unwrap());
        assert_eq!(ledger.snapshot("M1").unwrap().status, WorkspaceStatus::Occupied);

        assert!(!ledger.reserve("M1", "E3", &window(9, 10)).unwrap());
    }

    #[test]
    fn same_employee_cannot_be_seated_twice() {
        let ledger = ledger_with(vec![make_workspace("M1", WorkspaceType::MeetingRoom, 4)]);

        assert!(ledger.reserve("M1", "E1", &window(9, 10)).unwrap());
        assert!(!ledger.reserve("M1", "E1", &window(9, 10)).unwrap());
        assert_eq!(ledger.snapshot("M1").unwrap().occupancy(), 1);
    }

    #[test]
    fn busy_window_refuses() {
        let ledger = ledger_with(vec![make_workspace("W1", WorkspaceType::HotDesk, 1)]);
        ledger.block_window("W1", window(12, 14)).unwrap();

        assert!(!ledger.query_availability("W1", &window(13, 15)).unwrap());
        assert!(!ledger.reserve("W1", "E1", &window(13, 15)).unwrap());
        assert!(ledger.query_availability("W1", &window(9, 12)).unwrap());
        assert!(ledger.reserve("W1", "E1", &window(9, 12)).unwrap());
    }

    #[test]
    fn maintenance_and_hold_block_admission() {
        let ledger = ledger_with(vec![
            make_workspace("W1", WorkspaceType::HotDesk, 1),
            make_workspace("W2", WorkspaceType::HotDesk, 1),
        ]);

        assert_eq!(ledger.set_maintenance("W1", true).unwrap(), WorkspaceStatus::Maintenance);
        assert_eq!(ledger.set_hold("W2", true).unwrap(), WorkspaceStatus::Reserved);
        assert!(!ledger.reserve("W1", "E1", &window(9, 10)).unwrap());
        assert!(!ledger.reserve("W2", "E1", &window(9, 10)).unwrap());

        assert_eq!(ledger.set_maintenance("W1", false).unwrap(), WorkspaceStatus::Available);
        assert!(ledger.reserve("W1", "E1", &window(9, 10)).unwrap());
    }

    #[test]
    fn lifting_maintenance_does_not_clear_hold() {
        let ledger = ledger_with(vec![make_workspace("W1", WorkspaceType::HotDesk, 1)]);

        ledger.set_hold("W1", true).unwrap();
        assert_eq!(ledger.set_maintenance("W1", false).unwrap(), WorkspaceStatus::Reserved);
    }

    #[test]
    fn release_keeps_maintenance() {
        let ledger = ledger_with(vec![make_workspace("W1", WorkspaceType::HotDesk, 1)]);
        ledger.reserve("W1", "E1", &window(9, 10)).unwrap();
        ledger.set_maintenance("W1", true).unwrap();

        assert!(ledger.release("W1", "E1").unwrap());
        assert_eq!(ledger.snapshot("W1").unwrap().status, WorkspaceStatus::Maintenance);
    }

    #[test]
    fn release_of_stranger_is_false() {
        let ledger = ledger_with(vec![make_workspace("W1", WorkspaceType::HotDesk, 1)]);
        assert!(!ledger.release("W1", "E9").unwrap());
    }

    #[test]
    fn unknown_workspace_is_an_error() {
        let ledger = OccupancyLedger::new();
        assert_eq!(
            ledger.reserve("nope", "E1", &window(9, 10)),
            Err(LedgerError::UnknownWorkspace("nope".to_string()))
        );
        assert!(ledger.release("nope", "E1").is_err());
        assert!(ledger.snapshot("nope").is_err());
    }

    #[test]
    fn register_validates() {
        let ledger = OccupancyLedger::new();

        let zero = make_workspace("W0", WorkspaceType::HotDesk, 0);
        assert_eq!(
            ledger.register(zero),
            Err(LedgerError::InvalidWorkspace(ValidationError::ZeroCapacity("W0".to_string())))
        );

        let mut crowded = make_workspace("M1", WorkspaceType::MeetingRoom, 1);
        crowded.current_occupants = vec!["E1".to_string(), "E2".to_string()];
        assert!(matches!(ledger.register(crowded), Err(LedgerError::InvalidWorkspace(_))));

        // Declared capacity does not widen a single-occupant type.
        let mut shared_office = make_workspace("P1", WorkspaceType::PrivateOffice, 3);
        shared_office.current_occupants = vec!["E1".to_string(), "E2".to_string()];
        assert_eq!(
            ledger.register(shared_office),
            Err(LedgerError::InvalidWorkspace(ValidationError::OverCapacity {
                id: "P1".to_string(),
                occupants: 2,
                capacity: 1,
            }))
        );
        assert!(ledger.snapshot("P1").is_err());

        ledger.register(make_workspace("W1", WorkspaceType::HotDesk, 1)).unwrap();
        assert_eq!(
            ledger.register(make_workspace("W1", WorkspaceType::HotDesk, 1)),
            Err(LedgerError::DuplicateWorkspace("W1".to_string()))
        );
    }

    #[test]
    fn register_normalizes_status() {
        let mut ws = make_workspace("W1", WorkspaceType::HotDesk, 1);
        ws.current_occupants.push("E1".to_string());
        ws.status = WorkspaceStatus::Available;
        let ledger = ledger_with(vec![ws]);

        assert_eq!(ledger.snapshot("W1").unwrap().status, WorkspaceStatus::Occupied);
    }

    #[test]
    fn with_workspace_holds_the_slot() {
        let ledger = ledger_with(vec![make_workspace("M1", WorkspaceType::MeetingRoom, 4)]);
        let (tx, rx) = std::sync::mpsc::channel();

        let seen = ledger
            .with_workspace("M1", |ws| {
                let other = ledger.clone();
                let slot_window = window(9, 17);
                let handle = thread::spawn(move || {
                    let admitted = other.reserve("M1", "E2", &slot_window).unwrap();
                    tx.send(admitted).unwrap();
                });
                // The reserve cannot land while the slot is held.
                assert!(rx.recv_timeout(std::time::Duration::from_millis(100)).is_err());
                (ws.occupancy(), handle)
            })
            .unwrap();

        let (occupancy, handle) = seen;
        assert_eq!(occupancy, 0);
        handle.join().unwrap();
        assert!(rx.recv().unwrap());
        assert_eq!(ledger.snapshot("M1").unwrap().current_occupants, vec!["E2"]);
        assert!(ledger.with_workspace("nope", |_| ()).is_err());
    }

    #[test]
    fn list_is_sorted_by_id() {
        let ledger = ledger_with(vec![
            make_workspace("W3", WorkspaceType::HotDesk, 1),
            make_workspace("W1", WorkspaceType::HotDesk, 1),
            make_workspace("W2", WorkspaceType::HotDesk, 1),
        ]);

        let ids: Vec<String> = ledger.list().into_iter().map(|w| w.id).collect();
        assert_eq!(ids, vec!["W1", "W2", "W3"]);
    }

    #[test]
    fn deregister_returns_final_state() {
        let ledger = ledger_with(vec![make_workspace("W1", WorkspaceType::HotDesk, 1)]);
        ledger.reserve("W1", "E1", &window(9, 10)).unwrap();

        let ws = ledger.deregister("W1").unwrap();
        assert_eq!(ws.occupancy(), 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn concurrent_reserve_on_last_slot_admits_one() {
        let ledger = ledger_with(vec![make_workspace("W1", WorkspaceType::PrivateOffice, 1)]);
        let barrier = Arc::new(Barrier::new(8));
        let mut handles = vec![];

        for i in 0..8 {
            let ledger = ledger.clone();
            let barrier = barrier.clone();
            handles.push(thread::spawn(move || {
                barrier.wait();
                ledger.reserve("W1", &format!("E{i}"), &window(9, 17)).unwrap()
            }));
        }

        let admitted = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
        assert_eq!(admitted, 1);
        assert_eq!(ledger.snapshot("W1").unwrap().occupancy(), 1);
    }

    #[test]
    fn concurrent_reserve_never_exceeds_capacity() {
        let ledger = ledger_with(vec![make_workspace("H1", WorkspaceType::ConferenceHall, 5)]);
        let mut handles = vec![];

        for i in 0..32 {
            let ledger = ledger.clone();
            handles.push(thread::spawn(move || {
                ledger.reserve("H1", &format!("E{i}"), &window(9, 17)).unwrap()
            }));
        }

        let admitted = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
        let ws = ledger.snapshot("H1").unwrap();
        assert_eq!(admitted, 5);
        assert_eq!(ws.occupancy(), 5);
        assert_eq!(ws.status, WorkspaceStatus::Occupied);
    }
}
