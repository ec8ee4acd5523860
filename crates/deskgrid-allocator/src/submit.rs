//! Concurrent submission of many requests against one allocator.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use deskgrid_core::WorkspaceRequest;

use crate::allocator::{Allocation, Allocator};
use crate::directory::Directory;
use crate::error::{AllocatorError, AllocatorResult};

/// Outcome of one submitted request.
#[derive(Debug)]
pub struct Submission {
    pub request: WorkspaceRequest,
    pub result: AllocatorResult<Allocation>,
}

/// Run every request on the blocking pool at once.
///
/// Results come back in submission order. Cancelling `cancel` stops requests
/// that have not yet reserved a workspace.
pub async fn submit_all<D>(
    allocator: Arc<Allocator<D>>,
    requests: Vec<WorkspaceRequest>,
    cancel: CancellationToken,
) -> Vec<Submission>
where
    D: Directory + 'static,
{
    let total = requests.len();
    let handles: Vec<(WorkspaceRequest, JoinHandle<AllocatorResult<Allocation>>)> = requests
        .into_iter()
        .map(|request| {
            let allocator = Arc::clone(&allocator);
            let cancel = cancel.clone();
            let task_request = request.clone();
            let handle = tokio::task::spawn_blocking(move || {
                allocator.allocate_with_cancel(&task_request, &cancel)
            });
            (request, handle)
        })
        .collect();

    let mut submissions = Vec::with_capacity(total);
    for (request, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(AllocatorError::Task(e.to_string())),
        };
        submissions.push(Submission { request, result });
    }

    let allocated = submissions.iter().filter(|s| s.result.is_ok()).count();
    info!(total, allocated, rejected = total - allocated, "batch complete");
    submissions
}
