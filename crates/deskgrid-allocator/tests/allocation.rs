//! End-to-end allocation against a redb-backed directory.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{DateTime, TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use deskgrid_allocator::{load_ledger, submit_all, Allocator, AllocatorError, Directory};
use deskgrid_core::{
    Department, DeskgridConfig, Employee, EmployeeLevel, PreferenceValue, Workspace,
    WorkspaceRequest, WorkspaceStatus, WorkspaceType,
};
use deskgrid_placement::filter_candidates;
use deskgrid_state::StateStore;

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, hour, 0, 0).unwrap()
}

fn employee(id: &str, level: EmployeeLevel) -> Employee {
    Employee {
        id: id.to_string(),
        name: format!("Employee {id}"),
        level,
        department: Department::Engineering,
        preferences: Default::default(),
        join_date: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        workspace_history: Vec::new(),
    }
}

fn workspace(id: &str, ty: WorkspaceType, capacity: u32, floor: i32) -> Workspace {
    Workspace {
        id: id.to_string(),
        workspace_type: ty,
        capacity,
        floor,
        zone: "eng-north".to_string(),
        facilities: BTreeSet::new(),
        current_occupants: Vec::new(),
        availability_schedule: Vec::new(),
        status: WorkspaceStatus::Available,
    }
}

fn seeded(employees: &[Employee], workspaces: &[Workspace]) -> Allocator<StateStore> {
    let store = StateStore::open_in_memory().unwrap();
    store.import(employees, workspaces).unwrap();
    let ledger = load_ledger(&store).unwrap();
    Allocator::new(store, ledger, &DeskgridConfig::default())
}

fn request(employee_id: &str, ty: WorkspaceType) -> WorkspaceRequest {
    let mut req = WorkspaceRequest::new(employee_id, ty, at(9));
    req.end_time = Some(at(17));
    req
}

#[test]
fn private_office_allocated_and_released() {
    let mut w1 = workspace("W1", WorkspaceType::PrivateOffice, 1, 3);
    w1.zone = "eng-3".to_string();
    w1.facilities.insert("window".to_string());
    let alloc = seeded(&[employee("E1", EmployeeLevel::L2)], &[w1]);

    let req = WorkspaceRequest::new(
        "E1",
        WorkspaceType::PrivateOffice,
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
    );
    let allocation = alloc.allocate(&req).unwrap();
    assert_eq!(allocation.workspace_id, "W1");
    assert!(allocation.score.score > 0.0);
    assert!(allocation.score.score <= 1.0);

    let stored = alloc.directory().get_workspace("W1").unwrap().unwrap();
    assert_eq!(stored.status, WorkspaceStatus::Occupied);
    assert_eq!(stored.current_occupants, vec!["E1"]);
    let e1 = alloc.directory().get_employee("E1").unwrap().unwrap();
    assert_eq!(e1.workspace_history.last().map(String::as_str), Some("W1"));

    assert!(alloc.release("W1", "E1").unwrap());
    let stored = alloc.directory().get_workspace("W1").unwrap().unwrap();
    assert_eq!(stored.status, WorkspaceStatus::Available);
    assert!(stored.current_occupants.is_empty());
}

#[test]
fn missing_type_is_no_candidates() {
    let alloc = seeded(
        &[employee("E1", EmployeeLevel::L3)],
        &[workspace("W1", WorkspaceType::PrivateOffice, 1, 3)],
    );

    let err = alloc
        .allocate(&request("E1", WorkspaceType::ConferenceHall))
        .unwrap_err();
    assert!(matches!(err, AllocatorError::NoCandidates(_)));
    assert!(alloc.ledger().snapshot("W1").unwrap().current_occupants.is_empty());
}

#[test]
fn allocation_is_a_filtered_candidate() {
    let mut busy = workspace("D1", WorkspaceType::HotDesk, 1, 2);
    busy.status = WorkspaceStatus::Maintenance;
    let workspaces = vec![
        busy,
        workspace("D2", WorkspaceType::HotDesk, 1, 2),
        workspace("M1", WorkspaceType::MeetingRoom, 8, 2),
        workspace("D3", WorkspaceType::HotDesk, 1, 4),
    ];
    let alloc = seeded(&[employee("E1", EmployeeLevel::L5)], &workspaces);
    let req = request("E1", WorkspaceType::HotDesk);

    let before = alloc.ledger().list();
    let eligible: HashSet<String> = filter_candidates(&req, &before)
        .unwrap()
        .into_iter()
        .map(|w| w.id.clone())
        .collect();

    let allocation = alloc.allocate(&req).unwrap();
    assert!(eligible.contains(&allocation.workspace_id));
    assert_eq!(allocation.candidates, eligible.len());
}

#[test]
fn identical_state_gives_identical_result() {
    let employees = [employee("E1", EmployeeLevel::L4)];
    let workspaces = [
        workspace("D3", WorkspaceType::FixedWorkstation, 1, 1),
        workspace("D1", WorkspaceType::FixedWorkstation, 1, 1),
        workspace("D2", WorkspaceType::FixedWorkstation, 1, 1),
    ];

    let first = seeded(&employees, &workspaces)
        .allocate(&request("E1", WorkspaceType::FixedWorkstation))
        .unwrap();
    let second = seeded(&employees, &workspaces)
        .allocate(&request("E1", WorkspaceType::FixedWorkstation))
        .unwrap();

    assert_eq!(first.workspace_id, second.workspace_id);
    assert_eq!(first.score, second.score);
    // Equal scores and occupancy fall back to the lowest ID.
    assert_eq!(first.workspace_id, "D1");
}

#[test]
fn preferred_facility_wins() {
    let mut standing = workspace("D9", WorkspaceType::HotDesk, 1, 2);
    standing.facilities.insert("standing_desk".to_string());
    let alloc = seeded(
        &[employee("E1", EmployeeLevel::L5)],
        &[workspace("D1", WorkspaceType::HotDesk, 1, 2), standing],
    );

    let mut req = request("E1", WorkspaceType::HotDesk);
    req.preferences
        .insert("standing_desk".to_string(), PreferenceValue::Flag(true));

    assert_eq!(alloc.allocate(&req).unwrap().workspace_id, "D9");
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deskgrid.redb");
    {
        let store = StateStore::open(&path).unwrap();
        store
            .import(
                &[employee("E1", EmployeeLevel::L2)],
                &[workspace("C1", WorkspaceType::ManagerialCabin, 1, 6)],
            )
            .unwrap();
        let ledger = load_ledger(&store).unwrap();
        let alloc = Allocator::new(store, ledger, &DeskgridConfig::default());
        alloc
            .allocate(&request("E1", WorkspaceType::ManagerialCabin))
            .unwrap();
    }

    let store = StateStore::open(&path).unwrap();
    let ledger = load_ledger(&store).unwrap();
    let c1 = ledger.snapshot("C1").unwrap();
    assert_eq!(c1.current_occupants, vec!["E1"]);
    assert_eq!(c1.status, WorkspaceStatus::Occupied);
    assert_eq!(
        Directory::load_employee(&store, "E1")
            .unwrap()
            .unwrap()
            .workspace_history,
        vec!["C1"]
    );
}

#[test]
fn threads_racing_for_one_desk() {
    let employees: Vec<Employee> = (0..8)
        .map(|i| employee(&format!("E{i}"), EmployeeLevel::L5))
        .collect();
    let alloc = Arc::new(seeded(
        &employees,
        &[workspace("D1", WorkspaceType::HotDesk, 1, 1)],
    ));
    let barrier = Arc::new(Barrier::new(employees.len()));

    let handles: Vec<_> = employees
        .iter()
        .map(|e| {
            let alloc = Arc::clone(&alloc);
            let barrier = Arc::clone(&barrier);
            let req = request(&e.id, WorkspaceType::HotDesk);
            thread::spawn(move || {
                barrier.wait();
                alloc.allocate(&req)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(err.is_retryable(), "unexpected error: {err}");
    }

    let d1 = alloc.ledger().snapshot("D1").unwrap();
    assert_eq!(d1.current_occupants.len(), 1);
    assert_eq!(alloc.directory().get_workspace("D1").unwrap().unwrap(), d1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn batch_fills_every_seat_once() {
    let employees: Vec<Employee> = (0..12)
        .map(|i| employee(&format!("E{i:02}"), EmployeeLevel::L4))
        .collect();
    let workspaces = [
        workspace("D1", WorkspaceType::HotDesk, 1, 1),
        workspace("D2", WorkspaceType::HotDesk, 1, 1),
        workspace("D3", WorkspaceType::HotDesk, 1, 2),
        workspace("M1", WorkspaceType::MeetingRoom, 6, 2),
    ];
    let alloc = Arc::new(seeded(&employees, &workspaces));

    let requests = employees
        .iter()
        .map(|e| request(&e.id, WorkspaceType::HotDesk))
        .collect();
    let submissions = submit_all(Arc::clone(&alloc), requests, CancellationToken::new()).await;

    assert_eq!(submissions.len(), 12);
    let seated: Vec<&str> = submissions
        .iter()
        .filter_map(|s| s.result.as_ref().ok())
        .map(|a| a.workspace_id.as_str())
        .collect();
    assert_eq!(seated.len(), 3);
    assert_eq!(seated.iter().collect::<HashSet<_>>().len(), 3);

    for ws in alloc.ledger().list() {
        assert!(ws.occupancy() <= ws.effective_capacity() as usize);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_batch_reserves_nothing() {
    let employees: Vec<Employee> = (0..4)
        .map(|i| employee(&format!("E{i}"), EmployeeLevel::L3))
        .collect();
    let alloc = Arc::new(seeded(
        &employees,
        &[workspace("M1", WorkspaceType::MeetingRoom, 10, 1)],
    ));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let requests = employees
        .iter()
        .map(|e| request(&e.id, WorkspaceType::MeetingRoom))
        .collect();
    let submissions = submit_all(Arc::clone(&alloc), requests, cancel).await;

    assert!(submissions
        .iter()
        .all(|s| matches!(s.result, Err(AllocatorError::Cancelled(_)))));
    assert!(alloc.ledger().snapshot("M1").unwrap().current_occupants.is_empty());
}
