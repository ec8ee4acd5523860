use chrono::Utc;
use clap::Args;

use deskgrid_core::{FeedbackMetrics, FeedbackRecord};

use super::Context;

#[derive(Debug, Args)]
pub struct FeedbackArgs {
    #[arg(long)]
    pub workspace: String,
    #[arg(long)]
    pub employee: String,
    /// 1–5
    #[arg(long)]
    pub comfort: u8,
    /// 1–5
    #[arg(long)]
    pub accessibility: u8,
    /// 1–5
    #[arg(long)]
    pub noise_level: u8,
    /// 1–5
    #[arg(long)]
    pub overall: u8,
    #[arg(long)]
    pub comments: Option<String>,
}

pub fn record(ctx: &Context, args: FeedbackArgs) -> anyhow::Result<()> {
    if ctx.store.get_workspace(&args.workspace)?.is_none() {
        anyhow::bail!("unknown workspace: {}", args.workspace);
    }
    if ctx.store.get_employee(&args.employee)?.is_none() {
        anyhow::bail!("unknown employee: {}", args.employee);
    }

    let record = FeedbackRecord {
        workspace_id: args.workspace,
        employee_id: args.employee,
        submitted_at: Utc::now(),
        metrics: FeedbackMetrics {
            comfort: args.comfort,
            accessibility: args.accessibility,
            noise_level: args.noise_level,
            overall_satisfaction: args.overall,
            comments: args.comments,
        },
    };
    ctx.store.put_feedback(&record)?;

    let history = ctx.store.list_feedback_for_workspace(&record.workspace_id)?;
    println!(
        "✓ Feedback recorded for {} ({} entries on file)",
        record.workspace_id,
        history.len()
    );
    Ok(())
}
