// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use rayon::ThreadPool;
use std::time::Instant;
use std::{sync::Arc, time::Duration};
use tokio::{sync::Semaphore, time::sleep};
use tracing::{error, warn};

/// When to complain about a job that is still running.
#[derive(Debug, Clone, Copy)]
pub struct TaskTimeouts {
    pub warn_after: Duration,
    pub error_after: Duration,
}

impl Default for TaskTimeouts {
    fn default() -> Self {
        Self {
            warn_after: Duration::from_secs(10),
            error_after: Duration::from_secs(30),
        }
    }
}

/// Runs CPU bound jobs on a rayon pool while bounding the number of jobs in flight.
#[derive(Debug, Clone)]
pub struct TaskPool {
    semaphore: Arc<Semaphore>,
    thread_pool: Arc<ThreadPool>,
}

impl TaskPool {
    pub fn new(threads: usize, max_tasks: usize) -> Result<TaskPool> {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("Failed to build thread pool")?;

        Ok(Self {
            thread_pool: Arc::new(thread_pool),
            semaphore: Arc::new(Semaphore::new(max_tasks)),
        })
    }

    /// Run `op` on the pool and return its output along with how long it ran.
    pub async fn spawn<OP, T: Send + 'static>(
        &self,
        task_name: String,
        timeouts: TaskTimeouts,
        op: OP,
    ) -> Result<(T, Duration)>
    where
        OP: FnOnce() -> T + Send + 'static,
    {
        // Limit the requests and get them to block
        let _permit = self
            .semaphore
            .acquire()
            .await
            .with_context(|| format!("Task pool closed before '{}' could start", task_name))?;

        // Warn of long running jobs
        let name = task_name.clone();
        let warning_handle = tokio::spawn(async move {
            sleep(timeouts.warn_after).await;
            warn!(
                "Job '{}' has been running for more than {:?}",
                name, timeouts.warn_after
            );
            sleep(timeouts.error_after.saturating_sub(timeouts.warn_after)).await;
            error!(
                "Job '{}' has been running for more than {:?}",
                name, timeouts.error_after
            );
        });

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.thread_pool.spawn(move || {
            let start = Instant::now();
            let t = op();
            // oneshot send is sync so this is fine on a rayon thread.
            // The output may hold secret shares and is dropped unlogged.
            if tx.send((t, start.elapsed())).is_err() {
                error!("Receiver dropped before the task pool could return a result");
            }
        });

        let output = rx.await;
        warning_handle.abort();

        output.with_context(|| format!("Job '{}' panicked before returning", task_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_returns_output_and_duration() -> Result<()> {
        let pool = TaskPool::new(2, 4)?;
        let (out, duration) = pool
            .spawn("sum".to_string(), TaskTimeouts::default(), || {
                std::thread::sleep(Duration::from_millis(5));
                (1..=10u64).sum::<u64>()
            })
            .await?;
        assert_eq!(out, 55);
        assert!(duration >= Duration::from_millis(5));
        Ok(())
    }

    #[tokio::test]
    async fn test_many_jobs_with_one_permit() -> Result<()> {
        let pool = TaskPool::new(2, 1)?;
        let mut handles = vec![];
        for i in 0..8u64 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                pool.spawn(format!("job-{i}"), TaskTimeouts::default(), move || i * i)
                    .await
            }));
        }
        let mut total = 0;
        for handle in handles {
            total += handle.await??.0;
        }
        assert_eq!(total, 140);
        Ok(())
    }

    #[tokio::test]
    async fn test_output_needs_no_debug() -> Result<()> {
        // Job outputs carry secret shares, which do not print their contents.
        struct Opaque(u64);
        let pool = TaskPool::new(1, 1)?;
        let (out, _) = pool
            .spawn("opaque".to_string(), TaskTimeouts::default(), || Opaque(9))
            .await?;
        assert_eq!(out.0, 9);
        Ok(())
    }
}
