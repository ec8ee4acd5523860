use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use deskgrid_allocator::{submit_all, Allocation, Submission};
use deskgrid_core::WorkspaceRequest;

use super::allocate::print_allocation;
use super::Context;

#[derive(Serialize)]
struct Outcome<'a> {
    employee_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    allocation: Option<&'a Allocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    retryable: bool,
}

impl<'a> From<&'a Submission> for Outcome<'a> {
    fn from(s: &'a Submission) -> Self {
        match &s.result {
            Ok(allocation) => Outcome {
                employee_id: &s.request.employee_id,
                allocation: Some(allocation),
                error: None,
                retryable: false,
            },
            Err(e) => Outcome {
                employee_id: &s.request.employee_id,
                allocation: None,
                error: Some(e.to_string()),
                retryable: e.is_retryable(),
            },
        }
    }
}

pub async fn simulate(ctx: Context, file: &Path, format: &str) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let requests: Vec<WorkspaceRequest> = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", file.display()))?;

    let allocator = Arc::new(ctx.into_allocator()?);
    let cancel = CancellationToken::new();

    // Ctrl-C stops requests that have not reserved yet.
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling pending requests");
                cancel.cancel();
            }
        })
    };

    info!(requests = requests.len(), "submitting batch");
    let submissions = submit_all(Arc::clone(&allocator), requests, cancel).await;
    watcher.abort();

    if format == "json" {
        let outcomes: Vec<Outcome<'_>> = submissions.iter().map(Outcome::from).collect();
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(());
    }

    for submission in &submissions {
        match &submission.result {
            Ok(allocation) => print_allocation(allocation),
            Err(e) => println!("✗ {}: {e}", submission.request.employee_id),
        }
    }
    let allocated = submissions.iter().filter(|s| s.result.is_ok()).count();
    println!("\n{allocated}/{} requests allocated", submissions.len());
    Ok(())
}
