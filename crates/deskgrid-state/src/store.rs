//! StateStore — redb-backed directory persistence for deskgrid.
//!
//! Typed CRUD over employees, workspaces and feedback. The store supports
//! both on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use deskgrid_core::{Employee, FeedbackRecord, Workspace};

use crate::error::{StateError, StateResult};
use crate::tables::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        for table in [EMPLOYEES, WORKSPACES, FEEDBACK] {
            txn.open_table(table).map_err(map_err!(Table))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Generic JSON table access ──────────────────────────────────

    fn put_json<T: Serialize>(&self, table: JsonTable, key: &str, record: &T) -> StateResult<()> {
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut t = txn.open_table(table).map_err(map_err!(Table))?;
            t.insert(key, value.as_slice()).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let t = txn.open_table(table).map_err(map_err!(Table))?;
        match t.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let record = serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// All records whose key starts with `prefix` (empty prefix = all), in key order.
    fn scan_json<T: DeserializeOwned>(&self, table: JsonTable, prefix: &str) -> StateResult<Vec<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let t = txn.open_table(table).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in t.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(prefix) {
                let record = serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                results.push(record);
            }
        }
        Ok(results)
    }

    fn delete_key(&self, table: JsonTable, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut t = txn.open_table(table).map_err(map_err!(Table))?;
            existed = t.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }

    // ── Employees ──────────────────────────────────────────────────

    /// Insert or update an employee.
    pub fn put_employee(&self, employee: &Employee) -> StateResult<()> {
        self.put_json(EMPLOYEES, &employee.id, employee)?;
        debug!(employee = %employee.id, "employee stored");
        Ok(())
    }

    pub fn get_employee(&self, employee_id: &str) -> StateResult<Option<Employee>> {
        self.get_json(EMPLOYEES, employee_id)
    }

    /// List all employees, ordered by ID.
    pub fn list_employees(&self) -> StateResult<Vec<Employee>> {
        self.scan_json(EMPLOYEES, "")
    }

    /// Delete an employee. Returns true if it existed.
    pub fn delete_employee(&self, employee_id: &str) -> StateResult<bool> {
        self.delete_key(EMPLOYEES, employee_id)
    }

    // ── Workspaces ─────────────────────────────────────────────────

    /// Insert or update a workspace. Structurally invalid records are rejected.
    pub fn put_workspace(&self, workspace: &Workspace) -> StateResult<()> {
        workspace.validate()?;
        self.put_json(WORKSPACES, &workspace.id, workspace)?;
        debug!(workspace = %workspace.id, status = ?workspace.status, "workspace stored");
        Ok(())
    }

    pub fn get_workspace(&self, workspace_id: &str) -> StateResult<Option<Workspace>> {
        self.get_json(WORKSPACES, workspace_id)
    }

    /// List all workspaces, ordered by ID.
    pub fn list_workspaces(&self) -> StateResult<Vec<Workspace>> {
        self.scan_json(WORKSPACES, "")
    }

    /// Delete a workspace. Returns true if it existed.
    pub fn delete_workspace(&self, workspace_id: &str) -> StateResult<bool> {
        self.delete_key(WORKSPACES, workspace_id)
    }

    /// Store a batch of employees and workspaces in a single transaction.
    ///
    /// Nothing is written if any workspace fails validation.
    pub fn import(&self, employees: &[Employee], workspaces: &[Workspace]) -> StateResult<()> {
        for ws in workspaces {
            ws.validate()?;
        }
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut t = txn.open_table(EMPLOYEES).map_err(map_err!(Table))?;
            for e in employees {
                let value = serde_json::to_vec(e).map_err(map_err!(Serialize))?;
                t.insert(e.id.as_str(), value.as_slice()).map_err(map_err!(Write))?;
            }
        }
        {
            let mut t = txn.open_table(WORKSPACES).map_err(map_err!(Table))?;
            for ws in workspaces {
                let value = serde_json::to_vec(ws).map_err(map_err!(Serialize))?;
                t.insert(ws.id.as_str(), value.as_slice()).map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            employees = employees.len(),
            workspaces = workspaces.len(),
            "directory imported"
        );
        Ok(())
    }

    // ── Feedback ───────────────────────────────────────────────────

    /// Record validated feedback for a completed allocation.
    pub fn put_feedback(&self, record: &FeedbackRecord) -> StateResult<()> {
        record.metrics.validate()?;
        let key = record.table_key();
        self.put_json(FEEDBACK, &key, record)?;
        debug!(%key, "feedback stored");
        Ok(())
    }

    /// All feedback recorded against one workspace.
    pub fn list_feedback_for_workspace(&self, workspace_id: &str) -> StateResult<Vec<FeedbackRecord>> {
        self.scan_json(FEEDBACK, &format!("{workspace_id}:"))
    }
}
