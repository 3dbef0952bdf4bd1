//! Scheduler Jobs
//!
//! A `Job` is a shareable zero-argument task. Queues de-duplicate jobs by
//! identity, so cloning a job and queueing both clones still runs it once.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
    /// Generate a new unique job ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

struct JobInner {
    id: JobId,
    allow_recurse: AtomicBool,
    task: Box<dyn Fn() + Send + Sync>,
}

/// A queued unit of work.
#[derive(Clone)]
pub struct Job {
    inner: Arc<JobInner>,
}

impl Job {
    /// Create a job from a task.
    pub fn new<F>(task: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(JobInner {
                id: JobId::new(),
                allow_recurse: AtomicBool::new(false),
                task: Box::new(task),
            }),
        }
    }

    /// Get the job's unique ID.
    pub fn id(&self) -> JobId {
        self.inner.id
    }

    /// Whether the job may re-queue itself while its own queue is draining.
    pub fn allows_recurse(&self) -> bool {
        self.inner.allow_recurse.load(Ordering::SeqCst)
    }

    /// Allow or forbid self re-queueing while the job's queue drains.
    pub fn set_allow_recurse(&self, allow: bool) {
        self.inner.allow_recurse.store(allow, Ordering::SeqCst);
    }

    /// Run the task now.
    pub fn run(&self) {
        (self.inner.task)();
    }
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Job {}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.inner.id)
            .field("allow_recurse", &self.allows_recurse())
            .finish()
    }
}
