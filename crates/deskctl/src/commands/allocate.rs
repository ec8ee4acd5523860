use chrono::{DateTime, Utc};
use clap::Args;

use deskgrid_allocator::Allocation;
use deskgrid_core::{LocationConstraint, PreferenceValue, WorkspaceRequest, WorkspaceType};

use super::Context;

#[derive(Debug, Args)]
pub struct AllocateArgs {
    #[arg(long)]
    pub employee: String,

    /// Workspace type, e.g. hot_desk or private_office.
    #[arg(long = "type")]
    pub workspace_type: WorkspaceType,

    /// RFC 3339 start time (default: now).
    #[arg(long)]
    pub start: Option<DateTime<Utc>>,

    /// RFC 3339 end time (default: open-ended).
    #[arg(long)]
    pub end: Option<DateTime<Utc>>,

    /// 0–10, higher is more urgent.
    #[arg(long, default_value = "0")]
    pub priority: u8,

    /// Only consider workspaces on this floor.
    #[arg(long)]
    pub floor: Option<i32>,

    /// Only consider workspaces in this zone.
    #[arg(long)]
    pub zone: Option<String>,

    /// Soft preference as key=value, e.g. `window=true` or `floor=3`. Repeatable.
    #[arg(long = "pref", value_parser = parse_preference)]
    pub preferences: Vec<(String, PreferenceValue)>,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

impl AllocateArgs {
    fn into_request(self) -> WorkspaceRequest {
        let mut request = WorkspaceRequest::new(
            self.employee,
            self.workspace_type,
            self.start.unwrap_or_else(Utc::now),
        );
        request.end_time = self.end;
        request.priority = self.priority;
        request.preferences = self.preferences.into_iter().collect();
        if self.floor.is_some() || self.zone.is_some() {
            request.location = Some(LocationConstraint {
                floor: self.floor,
                zone: self.zone,
            });
        }
        request
    }
}

fn parse_preference(raw: &str) -> Result<(String, PreferenceValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    if key.is_empty() {
        return Err(format!("empty preference key in `{raw}`"));
    }
    Ok((key.to_string(), PreferenceValue::parse_loose(value)))
}

pub fn allocate(ctx: Context, args: AllocateArgs) -> anyhow::Result<()> {
    let format = args.format.clone();
    let request = args.into_request();
    let allocator = ctx.into_allocator()?;

    let allocation = allocator.allocate(&request)?;
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&allocation)?);
    } else {
        print_allocation(&allocation);
    }
    Ok(())
}

pub(crate) fn print_allocation(allocation: &Allocation) {
    println!(
        "✓ {} → {} (score {:.3}, {} of {} candidates tried{})",
        allocation.employee_id,
        allocation.workspace_id,
        allocation.score.score,
        allocation.attempts,
        allocation.candidates,
        if allocation.broadened { ", location broadened" } else { "" }
    );
    for (factor, value) in &allocation.score.factors {
        println!("    {factor:<18} {value:.3}");
    }
}

pub fn release(ctx: Context, workspace_id: &str, employee_id: &str) -> anyhow::Result<()> {
    let allocator = ctx.into_allocator()?;
    if allocator.release(workspace_id, employee_id)? {
        println!("✓ Released {employee_id} from {workspace_id}");
    } else {
        println!("{employee_id} does not occupy {workspace_id}; nothing to release");
    }
    Ok(())
}
