//! redb table definitions for the deskgrid state store.
//!
//! Every table maps `&str` keys to JSON-serialized records.

use redb::TableDefinition;

pub type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Employees keyed by `{employee_id}`.
pub const EMPLOYEES: JsonTable = TableDefinition::new("employees");

/// Workspaces keyed by `{workspace_id}`.
pub const WORKSPACES: JsonTable = TableDefinition::new("workspaces");

/// Feedback keyed by `{workspace_id}:{employee_id}:{rfc3339_nanos}`.
pub const FEEDBACK: JsonTable = TableDefinition::new("feedback");
