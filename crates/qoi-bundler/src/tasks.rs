//! Structured concurrency for the per-target build group.

use std::future::Future;

use futures::future::{BoxFuture, FutureExt, join_all};
use tracing::{debug, error};

use crate::{Error, Result};

/// A set of labelled tasks that run concurrently and are awaited together.
///
/// Tasks are polled on the caller's task. [`TaskGroup::join`] waits for every
/// task, even after one fails, and reports all failures.
#[derive(Default)]
pub struct TaskGroup<'a> {
    tasks: Vec<(&'static str, BoxFuture<'a, Result<()>>)>,
}

impl<'a> TaskGroup<'a> {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn spawn<F>(&mut self, label: &'static str, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'a,
    {
        self.tasks.push((label, task.boxed()));
    }

    pub async fn join(self) -> Result<()> {
        let (labels, futures): (Vec<_>, Vec<_>) = self.tasks.into_iter().unzip();
        let results = join_all(futures).await;

        let mut errors = Vec::new();
        for (label, result) in labels.into_iter().zip(results) {
            match result {
                Ok(()) => debug!(task = label, "task finished"),
                Err(err) => {
                    error!(task = label, error = %err, "task failed");
                    errors.push(err);
                }
            }
        }
        Error::aggregate(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn empty_group_succeeds() {
        assert!(TaskGroup::new().join().await.is_ok());
    }

    #[tokio::test]
    async fn every_task_runs_even_when_one_fails() {
        let finished = AtomicUsize::new(0);
        let mut group = TaskGroup::new();
        group.spawn("fail", async { Err(Error::Engine("boom".into())) });
        group.spawn("ok", async {
            tokio::task::yield_now().await;
            finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        group.spawn("fail-too", async { Err(Error::Hook("late".into())) });

        let err = group.join().await.unwrap_err();
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(err.leaves().len(), 2);
    }
}
