//! Tick Scheduler
//!
//! Watchers that do not flush synchronously are batched: a dependency change
//! queues the watcher's job instead of running it, and the job runs once when
//! the host ends the tick with [`flush_jobs`]. Several mutations within one
//! tick therefore cost one run per job, and that run sees the final state.

mod job;
mod queue;

pub use job::{Job, JobId};
pub use queue::{
    flush_jobs, has_pending_jobs, is_flushing, pending_jobs, queue_job, queue_post_flush_cb,
    queue_pre_flush_cb, QueueKind,
};
