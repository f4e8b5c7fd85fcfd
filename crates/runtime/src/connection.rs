//! Dispatch façade and response demultiplexer.
//!
//! Every outgoing operation becomes a trackable [`Job`]; every inbound
//! packet is routed back by correlation id. The demultiplexer runs on its
//! own task and handles:
//! - responses, completing the matching job exactly once
//! - questions, which go into the connection's [`QuestionBook`]
//! - notification events (progress, acknowledged cancellations)
//! - the terminal close, after which no job is left pending
//!
//! # Message Flow
//!
//! 1. Caller invokes an operation on a façade object
//! 2. The command is serialized and submitted; the transport assigns a
//!    correlation id
//! 3. A pending job is published and recorded under that id; the caller
//!    gets its handle immediately
//! 4. The demultiplexer later receives the response and completes the job
//! 5. The caller reads the outcome by polling or waiting on the handle

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use hvx_protocol::{
    AnswerParams, CorrelationId, Inbound, JobCategory, Notification, Question, Response,
    ResultCode,
};

use crate::job::Job;
use crate::object_ref::ObjRef;
use crate::questions::{QuestionBook, QuestionEvent};
use crate::transport::{Transport, TransportParts};

/// Notification surfaced to subscribers of a connection.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// The dispatcher raised an interactive question.
    Question(ObjRef<QuestionEvent>),
    /// Plain notification event, forwarded opaquely.
    Notification { topic: String, params: Value },
    /// The link went down; every pending job has been failed.
    Closed,
}

/// Client end of the dispatcher link.
pub struct Connection {
    transport: Arc<dyn Transport>,
    /// Jobs awaiting a response, keyed by correlation id. Weak: releasing
    /// every handle to a pending job must destroy it, and a late response
    /// for its id is then discarded rather than resurrecting anything.
    pending: Mutex<HashMap<CorrelationId, Weak<Job>>>,
    questions: QuestionBook,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ConnectionEvent>>>,
    closed: AtomicBool,
    /// Taken by `run()`; the demultiplexer runs once.
    inbound_rx: Mutex<Option<mpsc::UnboundedReceiver<Inbound>>>,
}

impl Connection {
    pub fn new(parts: TransportParts) -> Arc<Self> {
        Arc::new(Self {
            transport: parts.sender,
            pending: Mutex::new(HashMap::new()),
            questions: QuestionBook::new(),
            subscribers: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            inbound_rx: Mutex::new(Some(parts.inbound_rx)),
        })
    }

    /// True once the terminal close has been processed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Questions raised on this connection and not yet answered.
    pub fn questions(&self) -> &QuestionBook {
        &self.questions
    }

    /// Subscribes to questions and notifications delivered by this
    /// connection. Dropped receivers are pruned on the next delivery.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ConnectionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Submits a command and returns the job tracking it.
    ///
    /// Never blocks and never fails: a refused or unserializable send comes
    /// back as an already-completed local job carrying the failure code, so
    /// callers observe one shape everywhere.
    pub fn dispatch<P: Serialize>(&self, category: JobCategory, params: P) -> ObjRef<Job> {
        let params = match serde_json::to_value(params) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(?category, %err, "dispatch params failed to serialize");
                return ObjRef::publish(Job::local(
                    category,
                    ResultCode::InvalidArgument,
                    Value::Null,
                ));
            }
        };

        if self.is_closed() {
            return ObjRef::publish(Job::local(category, ResultCode::NotConnected, Value::Null));
        }

        // The pending lock is held across the send so the demultiplexer
        // cannot observe a response before its job is recorded.
        let mut pending = self.pending.lock();
        match self.transport.send_command(category.method(), params) {
            Ok(id) => {
                let job = ObjRef::publish(Job::pending(category, id));
                pending.insert(id, Arc::downgrade(job.as_arc()));
                tracing::debug!(%id, ?category, "command dispatched");
                job
            }
            Err(err) => {
                tracing::debug!(?category, %err, "dispatch refused, returning failed local job");
                ObjRef::publish(Job::local(category, err.result_code(), Value::Null))
            }
        }
    }

    /// Answers an interactive question.
    ///
    /// The question is unregistered before anything is sent, so a repeated
    /// answer for the same id is a no-op. The returned job is already
    /// `Success`: submitting an answer has no further client-visible
    /// failure mode, and remote acknowledgment is not awaited.
    pub fn answer(&self, request_id: &str, answer: Value) -> ObjRef<Job> {
        if self.questions.unregister(request_id).is_none() {
            tracing::debug!(request_id, "answer for an unknown question id (no-op)");
        }

        let params = AnswerParams {
            request_id: request_id.to_owned(),
            answer,
        };
        match serde_json::to_value(&params)
            .map_err(crate::error::Error::from)
            .and_then(|value| {
                self.transport
                    .send_command(JobCategory::ServerAnswer.method(), value)
            }) {
            Ok(id) => tracing::debug!(%id, request_id, "answer submitted"),
            Err(err) => tracing::debug!(request_id, %err, "answer not delivered"),
        }

        ObjRef::publish(Job::local(
            JobCategory::ServerAnswer,
            ResultCode::Success,
            Value::Null,
        ))
    }

    /// Runs the demultiplexer until the link closes. Call once, from its
    /// own task.
    pub async fn run(self: Arc<Self>) {
        let mut rx = match self.inbound_rx.lock().take() {
            Some(rx) => rx,
            None => {
                tracing::warn!("connection demultiplexer started twice");
                return;
            }
        };

        while let Some(packet) = rx.recv().await {
            match packet {
                Inbound::Response(response) => self.on_response(response),
                Inbound::Question(question) => self.on_question(question),
                Inbound::Event(event) => self.on_notification(event),
                Inbound::Closed => break,
            }
        }

        // Either an explicit close notification or the stream ending counts
        // as connection teardown.
        self.on_closed();
    }

    fn on_response(&self, response: Response) {
        let entry = self.pending.lock().remove(&response.id);
        match entry.and_then(|weak| weak.upgrade()) {
            Some(job) => job.complete(response.code, response.params),
            None => {
                tracing::debug!(id = %response.id, "response for a released or unknown job discarded");
            }
        }
    }

    fn on_question(&self, question: Question) {
        let q = ObjRef::publish(QuestionEvent::new(
            question.request_id,
            question.issuer,
            question.params,
        ));
        self.questions.register(q.clone());
        self.broadcast(ConnectionEvent::Question(q));
    }

    fn on_notification(&self, event: Notification) {
        match event.topic.as_str() {
            "job.progress" => self.on_progress(&event.params),
            "job.cancelled" => self.on_cancelled(&event.params),
            _ => {}
        }
        self.broadcast(ConnectionEvent::Notification {
            topic: event.topic,
            params: event.params,
        });
    }

    fn on_progress(&self, params: &Value) {
        let id = params.get("id").and_then(Value::as_u64).map(CorrelationId);
        let percent = params.get("percent").and_then(Value::as_u64);
        if let (Some(id), Some(percent)) = (id, percent) {
            if let Some(job) = self.pending.lock().get(&id).and_then(Weak::upgrade) {
                job.set_progress(percent as u32);
            }
        }
    }

    /// The dispatcher confirmed a cancellation: the target job leaves the
    /// pending map and becomes Cancelled.
    fn on_cancelled(&self, params: &Value) {
        let Some(id) = params.get("id").and_then(Value::as_u64).map(CorrelationId) else {
            tracing::debug!("cancellation event without a job id ignored");
            return;
        };
        let entry = self.pending.lock().remove(&id);
        match entry.and_then(|weak| weak.upgrade()) {
            Some(job) => job.cancelled(ResultCode::Failure),
            None => tracing::debug!(%id, "cancellation for a released or unknown job discarded"),
        }
    }

    /// Terminal close: every pending job completes with a connection
    /// failure so no caller waits forever, and pending questions are purged
    /// so none is answered against a dead link.
    fn on_closed(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let drained: Vec<(CorrelationId, Weak<Job>)> = self.pending.lock().drain().collect();
        let mut failed = 0usize;
        for (_, weak) in drained {
            if let Some(job) = weak.upgrade() {
                job.complete(ResultCode::NotConnected, Value::Null);
                failed += 1;
            }
        }
        if failed > 0 {
            tracing::debug!(failed, "failed pending jobs on connection close");
        }
        self.questions.purge_all();
        self.broadcast(ConnectionEvent::Closed);
    }

    fn broadcast(&self, event: ConnectionEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
