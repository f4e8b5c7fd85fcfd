//! Jobs: one tracked asynchronous dispatcher request each.
//!
//! A job is a one-shot promise. The dispatch path creates it Pending; the
//! demultiplexer completes it exactly once when the matching response (or a
//! connection failure) arrives. Any number of tasks holding handles to the
//! same job may wait on or read it; after the terminal transition every
//! reader observes the same state.

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;
use tokio::time::{Duration, Instant};

use hvx_protocol::{CorrelationId, JobCategory, ResultCode};

use crate::error::{Error, Result};
use crate::registry::{Handle, ObjectBase, ObjectKind, SdkObject, TypedObject, private};

/// Where a job's outcome comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOrigin {
    /// Round trip through the dispatcher, correlated by id.
    Remote(CorrelationId),
    /// Computed locally, complete at creation. Indistinguishable from a
    /// remote job to callers, except for latency.
    Local,
}

/// Lifecycle of a job. The terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Completed,
    Cancelled,
}

struct JobState {
    status: JobStatus,
    code: ResultCode,
    payload: Value,
    progress: u32,
}

/// One outstanding asynchronous request.
pub struct Job {
    base: ObjectBase,
    category: JobCategory,
    origin: JobOrigin,
    state: Mutex<JobState>,
    done: Notify,
}

impl Job {
    /// New pending job for a command in flight.
    pub fn pending(category: JobCategory, correlation: CorrelationId) -> Self {
        Self {
            base: ObjectBase::new(ObjectKind::Job),
            category,
            origin: JobOrigin::Remote(correlation),
            state: Mutex::new(JobState {
                status: JobStatus::Pending,
                code: ResultCode::Failure,
                payload: Value::Null,
                progress: 0,
            }),
            done: Notify::new(),
        }
    }

    /// Job with a locally computed outcome, complete at birth. Used for
    /// operations that need no round trip and for dispatch paths that fail
    /// before anything leaves the process.
    pub fn local(category: JobCategory, code: ResultCode, payload: Value) -> Self {
        Self {
            base: ObjectBase::new(ObjectKind::Job),
            category,
            origin: JobOrigin::Local,
            state: Mutex::new(JobState {
                status: JobStatus::Completed,
                code,
                payload,
                progress: 100,
            }),
            done: Notify::new(),
        }
    }

    pub fn category(&self) -> JobCategory {
        self.category
    }

    pub fn origin(&self) -> JobOrigin {
        self.origin
    }

    /// Correlation id of the request this job tracks; `None` for local jobs.
    pub fn correlation(&self) -> Option<CorrelationId> {
        match self.origin {
            JobOrigin::Remote(id) => Some(id),
            JobOrigin::Local => None,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.lock().status
    }

    /// Return code of a finished job; `NoData` while still pending.
    pub fn return_code(&self) -> Result<ResultCode> {
        let state = self.state.lock();
        match state.status {
            JobStatus::Pending => Err(Error::NoData),
            _ => Ok(state.code),
        }
    }

    /// Result payload of a finished job; `NoData` while still pending.
    pub fn payload(&self) -> Result<Value> {
        let state = self.state.lock();
        match state.status {
            JobStatus::Pending => Err(Error::NoData),
            _ => Ok(state.payload.clone()),
        }
    }

    /// Completion percentage. Coarse: 0 at creation, 100 at the terminal
    /// transition, intermediate values only when the dispatcher reports
    /// progress.
    pub fn progress(&self) -> u32 {
        self.state.lock().progress
    }

    /// Records a progress report. Ignored once the job is terminal, whose
    /// progress is always 100.
    pub(crate) fn set_progress(&self, percent: u32) {
        let mut state = self.state.lock();
        if state.status == JobStatus::Pending {
            state.progress = percent.min(99);
        }
    }

    /// Records the outcome and wakes every waiter.
    ///
    /// Only the first terminal transition takes effect. A duplicate or late
    /// delivery is dropped: the job's observable state never changes again.
    pub fn complete(&self, code: ResultCode, payload: Value) {
        self.finish(JobStatus::Completed, code, payload);
    }

    /// Terminal transition for an acknowledged cancellation. Caller-side
    /// timeouts never take this path; cancellation is a dispatcher-confirmed
    /// event.
    pub fn cancelled(&self, code: ResultCode) {
        self.finish(JobStatus::Cancelled, code, Value::Null);
    }

    fn finish(&self, status: JobStatus, code: ResultCode, payload: Value) {
        {
            let mut state = self.state.lock();
            if state.status != JobStatus::Pending {
                tracing::debug!(handle = %self.base.handle(), "duplicate job completion dropped");
                return;
            }
            state.status = status;
            state.code = code;
            state.payload = payload;
            state.progress = 100;
        }
        self.done.notify_waiters();
    }

    /// Suspends the calling task until the job reaches a terminal state.
    ///
    /// Blocks only the caller; safe from any number of tasks holding
    /// handles to the same job. A timeout stops the wait and nothing else:
    /// the job stays pending and remote work is unaffected.
    pub async fn wait(&self, timeout: Duration) -> Result<JobStatus> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register the waiter before checking state, so a completion
            // racing with the check still wakes us.
            let notified = self.done.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let status = self.status();
            if status != JobStatus::Pending {
                return Ok(status);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::Timeout(format!(
                    "job {} still pending",
                    self.base.handle()
                )));
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep(remaining) => {}
            }
        }
    }
}

impl private::Sealed for Job {}

impl SdkObject for Job {
    fn handle(&self) -> Handle {
        self.base.handle()
    }

    fn kind(&self) -> ObjectKind {
        self.base.kind()
    }
}

impl TypedObject for Job {
    const KIND: ObjectKind = ObjectKind::Job;
}
