// /////////////////////////////////////////////////////////////////////////////
// dagflow
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Local Scheduler
//!
//! An in-process [`Scheduler`] backed by two token pools -- CPU and GPU --
//! scoped to a single run. Jobs are plain blocking closures (a stage's
//! `process` call); each one is handed to `tokio::task::spawn_blocking`
//! only once its requested tokens have been acquired, so the scheduler
//! itself provides the backpressure the executor's dispatch loop relies on.

use async_trait::async_trait;
use dagflow_domain::error::EngineError;
use dagflow_domain::repositories::scheduler::{JobHandle, Scheduler};
use dagflow_domain::value_objects::NodeResources;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

pub struct LocalScheduler<Out: Send + 'static> {
    max_cpu: u32,
    max_gpu: u32,
    cpu_tokens: Arc<Semaphore>,
    gpu_tokens: Arc<Semaphore>,
    next_job_id: AtomicU64,
    tasks: Mutex<JoinSet<(JobHandle, Result<Out, EngineError>)>>,
}

impl<Out: Send + 'static> LocalScheduler<Out> {
    pub fn new(max_cpu: u32, max_gpu: u32) -> Self {
        let max_cpu = max_cpu.max(1);
        Self {
            max_cpu,
            max_gpu,
            cpu_tokens: Arc::new(Semaphore::new(max_cpu as usize)),
            gpu_tokens: Arc::new(Semaphore::new(max_gpu as usize)),
            next_job_id: AtomicU64::new(0),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn cpu_tokens_available(&self) -> usize {
        self.cpu_tokens.available_permits()
    }

    pub fn gpu_tokens_available(&self) -> usize {
        self.gpu_tokens.available_permits()
    }
}

#[async_trait]
impl<Out: Send + 'static> Scheduler<Out> for LocalScheduler<Out> {
    async fn submit(
        &self,
        node_id: String,
        resources: NodeResources,
        work: Box<dyn FnOnce() -> Result<Out, EngineError> + Send>,
    ) -> Result<JobHandle, EngineError> {
        if resources.cpu > self.max_cpu {
            return Err(EngineError::SchedulerError(format!(
                "node '{node_id}' requests {} cpu token(s), pool capacity is {}",
                resources.cpu, self.max_cpu
            )));
        }
        if resources.gpu > self.max_gpu {
            return Err(EngineError::SchedulerError(format!(
                "node '{node_id}' requests {} gpu token(s), pool capacity is {}",
                resources.gpu, self.max_gpu
            )));
        }

        let cpu_permit = if resources.cpu > 0 {
            Some(
                self.cpu_tokens
                    .clone()
                    .acquire_many_owned(resources.cpu)
                    .await
                    .map_err(|_| EngineError::SchedulerError("cpu token pool closed".into()))?,
            )
        } else {
            None
        };
        let gpu_permit = if resources.gpu > 0 {
            Some(
                self.gpu_tokens
                    .clone()
                    .acquire_many_owned(resources.gpu)
                    .await
                    .map_err(|_| EngineError::SchedulerError("gpu token pool closed".into()))?,
            )
        } else {
            None
        };

        let job_id = self.next_job_id.fetch_add(1, Ordering::SeqCst);
        let handle = JobHandle { node_id: node_id.clone(), job_id, attempt: 0 };
        let handle_for_task = handle.clone();

        let mut tasks = self.tasks.lock().await;
        tasks.spawn_blocking(move || {
            let result = work();
            drop(cpu_permit);
            drop(gpu_permit);
            (handle_for_task, result)
        });

        Ok(handle)
    }

    async fn wait_any(&self) -> Result<(JobHandle, Result<Out, EngineError>), EngineError> {
        let mut tasks = self.tasks.lock().await;
        match tasks.join_next().await {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(join_err)) => Err(EngineError::SchedulerError(format!("job panicked: {join_err}"))),
            None => Err(EngineError::SchedulerError("no outstanding jobs".into())),
        }
    }

    async fn shutdown(&self) {
        let mut tasks = self.tasks.lock().await;
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submits_and_waits_for_a_single_job() {
        let scheduler: LocalScheduler<i64> = LocalScheduler::new(2, 0);
        let resources = NodeResources::cpu_only(1);
        scheduler
            .submit("n1".to_string(), resources, Box::new(|| Ok(42)))
            .await
            .unwrap();

        let (handle, result) = scheduler.wait_any().await.unwrap();
        assert_eq!(handle.node_id, "n1");
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn respects_cpu_token_limit() {
        let scheduler: LocalScheduler<()> = LocalScheduler::new(1, 0);
        assert_eq!(scheduler.cpu_tokens_available(), 1);

        let resources = NodeResources::cpu_only(1);
        scheduler
            .submit("blocker".to_string(), resources, Box::new(|| Ok(())))
            .await
            .unwrap();

        let (_, _) = scheduler.wait_any().await.unwrap();
        assert_eq!(scheduler.cpu_tokens_available(), 1);
    }

    #[tokio::test]
    async fn rejects_a_request_exceeding_pool_capacity() {
        let scheduler: LocalScheduler<()> = LocalScheduler::new(1, 0);
        let resources = NodeResources::new(0, 1, 1);

        let err = scheduler.submit("needs-gpu".to_string(), resources, Box::new(|| Ok(()))).await.unwrap_err();
        assert!(matches!(err, EngineError::SchedulerError(_)));
    }

    #[tokio::test]
    async fn single_cpu_token_serializes_two_jobs() {
        let scheduler: Arc<LocalScheduler<()>> = Arc::new(LocalScheduler::new(1, 0));
        let tau = std::time::Duration::from_millis(50);
        let resources = NodeResources::cpu_only(1);

        let started = std::time::Instant::now();
        for n in 0..2 {
            scheduler
                .submit(format!("job{n}"), resources, Box::new(move || {
                    std::thread::sleep(tau);
                    Ok(())
                }))
                .await
                .unwrap();
        }
        scheduler.wait_any().await.unwrap();
        scheduler.wait_any().await.unwrap();

        assert!(started.elapsed() >= tau * 2);
    }
}
