//! Flush Queues
//!
//! Three queues drain in a fixed order on every tick: pre-flush jobs (watch
//! callbacks that must observe state before rendering), render jobs, then
//! post-flush jobs (work that must observe the rendered result).
//!
//! # De-duplication
//!
//! A job is queued at most once. While its queue is draining, a job that is
//! still waiting further down the current batch is not queued again. A job
//! that allows recursion may re-queue itself while it is running; it then
//! runs once more in a follow-up batch of the same phase.
//!
//! # Ticks
//!
//! There is no microtask loop to hook into, so the host marks the end of each
//! tick by calling [`flush_jobs`]. Queues are per thread.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::config;
use crate::error::{call_with_error_handling, handle_error, ErrorContext, WatchError};

use super::job::{Job, JobId};

/// Which queue a job goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// Runs before the render queue.
    Pre,
    /// Component render jobs and legacy watchers.
    Render,
    /// Runs after the render queue.
    Post,
}

impl QueueKind {
    /// All queues in drain order.
    pub const ALL: [QueueKind; 3] = [QueueKind::Pre, QueueKind::Render, QueueKind::Post];

    fn index(self) -> usize {
        match self {
            Self::Pre => 0,
            Self::Render => 1,
            Self::Post => 2,
        }
    }
}

#[derive(Default)]
struct JobQueue {
    /// Jobs waiting for the next batch.
    pending: Vec<Job>,
    /// The batch currently draining.
    active: Vec<Job>,
    /// Position of the running job within `active`.
    index: usize,
    draining: bool,
}

impl JobQueue {
    fn enqueue(&mut self, job: Job) -> bool {
        if self.draining {
            let start = if job.allows_recurse() {
                self.index + 1
            } else {
                self.index
            };
            if self.active.iter().skip(start).any(|queued| *queued == job) {
                return false;
            }
        }

        if self.pending.contains(&job) {
            return false;
        }

        self.pending.push(job);
        true
    }
}

#[derive(Default)]
struct SchedulerState {
    queues: [JobQueue; 3],
    flushing: bool,
}

impl SchedulerState {
    fn queue_mut(&mut self, kind: QueueKind) -> &mut JobQueue {
        &mut self.queues[kind.index()]
    }
}

thread_local! {
    static SCHEDULER: RefCell<SchedulerState> = RefCell::new(SchedulerState::default());
}

fn with_state<R>(f: impl FnOnce(&mut SchedulerState) -> R) -> R {
    SCHEDULER.with(|state| f(&mut state.borrow_mut()))
}

/// Queue a job to run before the render queue.
pub fn queue_pre_flush_cb(job: &Job) {
    enqueue(QueueKind::Pre, job);
}

/// Queue a job on the render queue.
pub fn queue_job(job: &Job) {
    enqueue(QueueKind::Render, job);
}

/// Queue a job to run after the render queue.
pub fn queue_post_flush_cb(job: &Job) {
    enqueue(QueueKind::Post, job);
}

fn enqueue(kind: QueueKind, job: &Job) {
    let queued = with_state(|state| state.queue_mut(kind).enqueue(job.clone()));
    if queued {
        tracing::trace!(queue = ?kind, job = %job.id(), "job queued");
    } else {
        tracing::debug!(queue = ?kind, job = %job.id(), "job already queued");
    }
}

/// Number of jobs waiting in a queue.
pub fn pending_jobs(kind: QueueKind) -> usize {
    with_state(|state| state.queue_mut(kind).pending.len())
}

/// Whether any queue has jobs waiting.
pub fn has_pending_jobs() -> bool {
    with_state(|state| state.queues.iter().any(|queue| !queue.pending.is_empty()))
}

/// Whether a flush is in progress on this thread.
pub fn is_flushing() -> bool {
    with_state(|state| state.flushing)
}

/// End the current tick: drain the pre, render, and post queues in order,
/// repeating until no queue has work left.
///
/// Calling this while a flush is already running is a no-op; anything queued
/// meanwhile is picked up by the running flush.
pub fn flush_jobs() {
    let started = with_state(|state| !std::mem::replace(&mut state.flushing, true));
    if !started {
        return;
    }
    let _guard = FlushGuard;

    let limit = config::recursion_limit();
    let mut counts: HashMap<JobId, usize> = HashMap::new();

    while has_pending_jobs() {
        for kind in QueueKind::ALL {
            drain(kind, &mut counts, limit);
        }
    }
}

fn drain(kind: QueueKind, counts: &mut HashMap<JobId, usize>, limit: usize) {
    loop {
        let batch = with_state(|state| {
            let queue = state.queue_mut(kind);
            if queue.pending.is_empty() {
                return None;
            }
            queue.active = std::mem::take(&mut queue.pending);
            queue.index = 0;
            queue.draining = true;
            Some(queue.active.len())
        });
        let Some(len) = batch else {
            break;
        };
        tracing::trace!(queue = ?kind, jobs = len, "draining queue");

        for index in 0..len {
            let job = with_state(|state| {
                let queue = state.queue_mut(kind);
                queue.index = index;
                queue.active[index].clone()
            });

            if exceeds_recursion_limit(&job, counts, limit) {
                continue;
            }
            call_with_error_handling(ErrorContext::Scheduler, || job.run());
        }

        with_state(|state| {
            let queue = state.queue_mut(kind);
            queue.active.clear();
            queue.index = 0;
            queue.draining = false;
        });
    }
}

fn exceeds_recursion_limit(job: &Job, counts: &mut HashMap<JobId, usize>, limit: usize) -> bool {
    let count = counts.entry(job.id()).or_insert(0);
    *count += 1;
    if *count <= limit {
        return false;
    }

    if *count == limit + 1 {
        handle_error(WatchError::RecursionLimit {
            job: job.id().raw(),
            limit,
        });
    }
    true
}

/// Resets the flush flags even if draining unwinds.
struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        with_state(|state| {
            state.flushing = false;
            for queue in state.queues.iter_mut() {
                queue.active.clear();
                queue.index = 0;
                queue.draining = false;
            }
        });
    }
}
