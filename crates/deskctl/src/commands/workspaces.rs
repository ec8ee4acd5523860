use deskgrid_core::Workspace;
use deskgrid_ledger::OccupancyLedger;

use super::{persist_from_ledger, Context};

pub fn list(ctx: &Context, format: &str) -> anyhow::Result<()> {
    let workspaces = ctx.store.list_workspaces()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&workspaces)?);
        return Ok(());
    }

    if workspaces.is_empty() {
        println!("No workspaces. Seed some with `deskctl seed <file.json>`.");
        return Ok(());
    }
    println!(
        "{:<10} {:<20} {:>5} {:<12} {:>9}  {}",
        "ID", "TYPE", "FLOOR", "ZONE", "OCCUPANCY", "STATUS"
    );
    for ws in &workspaces {
        println!(
            "{:<10} {:<20} {:>5} {:<12} {:>9}  {}",
            ws.id,
            ws.workspace_type,
            ws.floor,
            ws.zone,
            occupancy(ws),
            ws.status
        );
    }
    Ok(())
}

fn occupancy(ws: &Workspace) -> String {
    format!("{}/{}", ws.occupancy(), ws.effective_capacity())
}

pub fn set_maintenance(ctx: &Context, workspace_id: &str, on: bool) -> anyhow::Result<()> {
    let ledger = OccupancyLedger::from_workspaces(ctx.store.list_workspaces()?)?;
    let status = ledger.set_maintenance(workspace_id, on)?;
    persist_from_ledger(&ctx.store, &ledger, workspace_id)?;
    println!("✓ {workspace_id} is now {status}");
    Ok(())
}

pub fn set_hold(ctx: &Context, workspace_id: &str, on: bool) -> anyhow::Result<()> {
    let ledger = OccupancyLedger::from_workspaces(ctx.store.list_workspaces()?)?;
    let status = ledger.set_hold(workspace_id, on)?;
    persist_from_ledger(&ctx.store, &ledger, workspace_id)?;
    println!("✓ {workspace_id} is now {status}");
    Ok(())
}
