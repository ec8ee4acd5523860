//! The directory seam — where employees and workspaces come from and go to.
//!
//! The allocator never owns durable storage. It asks a [`Directory`] for the
//! requesting employee and hands back mutated records after a commit.

use anyhow::Context;

use deskgrid_core::{Employee, Workspace};
use deskgrid_ledger::OccupancyLedger;
use deskgrid_state::StateStore;

use crate::error::AllocatorResult;

/// External record source and sink.
pub trait Directory: Send + Sync {
    fn load_employee(&self, employee_id: &str) -> anyhow::Result<Option<Employee>>;

    /// Snapshot of every workspace, ordered by ID.
    fn list_workspaces(&self) -> anyhow::Result<Vec<Workspace>>;

    fn persist_workspace(&self, workspace: &Workspace) -> anyhow::Result<()>;

    fn persist_employee(&self, employee: &Employee) -> anyhow::Result<()>;
}

impl Directory for StateStore {
    fn load_employee(&self, employee_id: &str) -> anyhow::Result<Option<Employee>> {
        self.get_employee(employee_id)
            .with_context(|| format!("loading employee {employee_id}"))
    }

    fn list_workspaces(&self) -> anyhow::Result<Vec<Workspace>> {
        Ok(StateStore::list_workspaces(self)?)
    }

    fn persist_workspace(&self, workspace: &Workspace) -> anyhow::Result<()> {
        self.put_workspace(workspace)
            .with_context(|| format!("persisting workspace {}", workspace.id))
    }

    fn persist_employee(&self, employee: &Employee) -> anyhow::Result<()> {
        self.put_employee(employee)
            .with_context(|| format!("persisting employee {}", employee.id))
    }
}

/// Build a ledger seeded from the directory's workspace snapshot.
pub fn load_ledger(directory: &impl Directory) -> AllocatorResult<OccupancyLedger> {
    let workspaces = directory.list_workspaces()?;
    Ok(OccupancyLedger::from_workspaces(workspaces)?)
}
