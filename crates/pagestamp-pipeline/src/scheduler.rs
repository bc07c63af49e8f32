// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded task scheduler.
//
// Work items are launched in input order onto the blocking thread pool, with
// a counting semaphore limiting how many run at once. `run` returns after
// every launched item has finished, or at the first failure.

use std::collections::HashMap;
use std::sync::Arc;

use pagestamp_core::error::{PagestampError, Result};
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, instrument};

type Job = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// One schedulable unit of work: a label for logs and a blocking closure.
pub struct WorkItem {
    label: String,
    job: Job,
}

impl WorkItem {
    pub fn new(label: impl Into<String>, job: impl FnOnce() -> Result<()> + Send + 'static) -> Self {
        Self {
            label: label.into(),
            job: Box::new(job),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkItem").field("label", &self.label).finish()
    }
}

/// Run `items` with at most `max_concurrency` in flight (0 is treated as 1,
/// anything above the semaphore's permit limit as that limit).
///
/// Fail-fast: the first error is returned as soon as it is observed and no
/// further items are launched. Items already running are not interrupted;
/// their outcome is ignored.
#[instrument(skip(items), fields(items = items.len()))]
pub async fn run(items: Vec<WorkItem>, max_concurrency: usize) -> Result<()> {
    let semaphore = Arc::new(Semaphore::new(max_concurrency.clamp(1, Semaphore::MAX_PERMITS)));
    let mut tasks: JoinSet<Result<()>> = JoinSet::new();
    let mut labels: HashMap<Id, String> = HashMap::new();

    for WorkItem { label, job } in items {
        let permit = loop {
            // Finished tasks are settled before a new permit is taken so a
            // failure stops the launch loop.
            tokio::select! {
                biased;
                Some(done) = tasks.join_next_with_id(), if !tasks.is_empty() => {
                    settle(done, &mut labels)?;
                }
                permit = semaphore.clone().acquire_owned() => {
                    break permit.map_err(|_| PagestampError::TaskPanicked(label.clone()))?;
                }
            }
        };

        debug!(task = %label, "launching");
        let handle = tasks.spawn_blocking(move || {
            let _permit = permit;
            job()
        });
        labels.insert(handle.id(), label);
    }

    while let Some(done) = tasks.join_next_with_id().await {
        settle(done, &mut labels)?;
    }
    Ok(())
}

fn settle(
    done: std::result::Result<(Id, Result<()>), JoinError>,
    labels: &mut HashMap<Id, String>,
) -> Result<()> {
    match done {
        Ok((id, result)) => {
            labels.remove(&id);
            result
        }
        Err(err) => {
            let label = labels.remove(&err.id()).unwrap_or_default();
            Err(PagestampError::TaskPanicked(label))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Items that sleep for `delays` ms each, recording peak concurrency and
    /// completion count.
    fn tracked(delays: &[u64]) -> (Vec<WorkItem>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let items = delays
            .iter()
            .enumerate()
            .map(|(i, &ms)| {
                let (active, peak, finished) = (active.clone(), peak.clone(), finished.clone());
                WorkItem::new(format!("item{i}"), move || {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(ms));
                    active.fetch_sub(1, Ordering::SeqCst);
                    finished.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();
        (items, peak, finished)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn never_exceeds_limit() {
        for limit in [1, 2, 3, 8] {
            let (items, peak, finished) = tracked(&[15; 12]);
            run(items, limit).await.unwrap();
            assert!(peak.load(Ordering::SeqCst) <= limit, "limit {limit}");
            assert_eq!(finished.load(Ordering::SeqCst), 12);
        }
    }

    #[tokio::test]
    async fn uses_available_parallelism() {
        let (items, peak, _) = tracked(&[50; 4]);
        run(items, 4).await.unwrap();
        assert!(peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn returns_only_after_every_item_completes() {
        // Completion order is the reverse of launch order.
        let (items, _, finished) = tracked(&[60, 40, 20, 1]);
        run(items, 4).await.unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn zero_limit_runs_serially() {
        let (items, peak, finished) = tracked(&[5; 5]);
        run(items, 0).await.unwrap();
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(finished.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn launches_in_input_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let items = (0..6)
            .map(|i| {
                let order = order.clone();
                WorkItem::new(format!("{i}"), move || {
                    order.lock().unwrap().push(i);
                    Ok(())
                })
            })
            .collect();
        run(items, 1).await.unwrap();
        assert_eq!(*order.lock().unwrap(), [0, 1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn first_failure_stops_launching() {
        let launched = Arc::new(AtomicUsize::new(0));
        let items = (0..10)
            .map(|i| {
                let launched = launched.clone();
                WorkItem::new(format!("{i}"), move || {
                    launched.fetch_add(1, Ordering::SeqCst);
                    if i == 1 {
                        Err(PagestampError::tool("convert", "exit status 1"))
                    } else {
                        std::thread::sleep(Duration::from_millis(20));
                        Ok(())
                    }
                })
            })
            .collect();

        let err = run(items, 1).await.unwrap_err();
        assert!(matches!(err, PagestampError::ToolInvocation { .. }));
        assert!(launched.load(Ordering::SeqCst) < 10);
    }

    #[tokio::test]
    async fn panic_is_reported_with_label() {
        let items = vec![WorkItem::new("boom", || panic!("task exploded"))];
        let err = run(items, 2).await.unwrap_err();
        assert!(matches!(err, PagestampError::TaskPanicked(ref label) if label == "boom"));
    }

    #[tokio::test]
    async fn oversized_limit_is_capped() {
        let (items, _, finished) = tracked(&[1; 3]);
        run(items, usize::MAX).await.unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        run(Vec::new(), 3).await.unwrap();
    }
}
