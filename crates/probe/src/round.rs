//! Execution of one probe round.

use crate::job::JobSet;
use detectors::Detector;
use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundResult {
    /// Indices of jobs whose health flipped, ascending
    pub changed: Vec<usize>,

    /// Number of per-job tasks that reported
    pub completed: usize,
}

impl RoundResult {
    /// True when at least one job changed status
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }
}

/// Run every job's detector concurrently and record status transitions.
///
/// Each job is probed by its own future, which holds the only mutable
/// borrow of that job, so no per-job locking is needed. The call returns
/// once every job has reported.
pub async fn run_round(jobs: &mut JobSet, detector: &dyn Detector, timeout: Duration) -> RoundResult {
    let expected = jobs.len();
    let mut tasks: FuturesUnordered<_> = jobs
        .iter_mut()
        .enumerate()
        .map(|(index, job)| async move {
            let detection = detector.detect(job.kind, &job.target, timeout).await;

            match &detection.error {
                Some(error) => warn!(
                    job = %job.name,
                    info = %detection.info,
                    error = %error,
                    "Detection failed"
                ),
                None => info!(
                    job = %job.name,
                    info = %detection.info,
                    check = %job.kind,
                    target = %job.target,
                    "Detection finished"
                ),
            }

            job.last_info = detection.info;
            let changed = job.last_healthy != detection.healthy;
            if changed {
                job.last_healthy = detection.healthy;
            }
            (index, changed)
        })
        .collect();

    let mut result = RoundResult::default();
    while let Some((index, changed)) = tasks.next().await {
        result.completed += 1;
        if changed {
            result.changed.push(index);
        }
    }
    debug_assert_eq!(result.completed, expected);

    // Arrival order is arbitrary
    result.changed.sort_unstable();
    result
}
