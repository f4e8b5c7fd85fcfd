//! Dispatcher session object.
//!
//! `Server` is the root of the SDK object graph: it owns the connection,
//! authenticates the session, and is where questions are read and answered.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use hvx_protocol::{CancelParams, JobCategory, LoginParams, ResultCode};
use hvx_runtime::registry::private;
use hvx_runtime::{
    Connection, ConnectionEvent, Handle, Job, ObjRef, ObjectBase, ObjectKind, QuestionEvent,
    SdkObject, TransportParts, TypedObject,
};

/// Session with the dispatcher.
pub struct Server {
    base: ObjectBase,
    connection: Arc<Connection>,
    credentials: Mutex<Option<LoginParams>>,
}

impl Server {
    /// Builds the session object over an established link and spawns its
    /// demultiplexer task.
    pub fn connect(parts: TransportParts) -> ObjRef<Server> {
        let connection = Connection::new(parts);
        tokio::spawn(Arc::clone(&connection).run());
        ObjRef::publish(Server {
            base: ObjectBase::new(ObjectKind::Server),
            connection,
            credentials: Mutex::new(None),
        })
    }

    /// The underlying connection, for objects dispatching through this
    /// session.
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Subscribes to questions and notifications on this session.
    pub fn events(&self) -> mpsc::UnboundedReceiver<ConnectionEvent> {
        self.connection.subscribe()
    }

    /// Authenticates against the dispatcher. Credentials are cached so a
    /// later [`relogin`](Server::relogin) needs no round trip.
    pub fn login(&self, user: &str, password: &str) -> ObjRef<Job> {
        if user.is_empty() {
            return ObjRef::publish(Job::local(
                JobCategory::ServerLogin,
                ResultCode::InvalidArgument,
                Value::Null,
            ));
        }
        let params = LoginParams {
            user: user.to_owned(),
            password: password.to_owned(),
        };
        *self.credentials.lock() = Some(params.clone());
        self.connection.dispatch(JobCategory::ServerLogin, params)
    }

    /// Re-authentication from cached credentials.
    ///
    /// No round trip: the returned job is complete with a locally computed
    /// code, and callers cannot tell it from a remote job except by
    /// latency. `InvalidArgument` when no credentials are cached.
    pub fn relogin(&self) -> ObjRef<Job> {
        let job = match self.credentials.lock().as_ref() {
            Some(creds) => Job::local(
                JobCategory::ServerRelogin,
                ResultCode::Success,
                json!({"user": creds.user}),
            ),
            None => Job::local(
                JobCategory::ServerRelogin,
                ResultCode::InvalidArgument,
                Value::Null,
            ),
        };
        ObjRef::publish(job)
    }

    /// Ends the session. Cached credentials are forgotten immediately; the
    /// dispatcher confirms through the returned job.
    pub fn logoff(&self) -> ObjRef<Job> {
        self.credentials.lock().take();
        self.connection
            .dispatch(JobCategory::ServerLogoff, Value::Null)
    }

    /// Submits an answer against a pending question's request id.
    ///
    /// Fire-and-forget: the question is unregistered on submission and the
    /// returned job is already `Success`. Answering an id that is no longer
    /// registered is a no-op.
    pub fn answer_question(&self, request_id: &str, answer: Value) -> ObjRef<Job> {
        self.connection.answer(request_id, answer)
    }

    /// Pending questions on this session.
    pub fn questions(&self) -> Vec<ObjRef<QuestionEvent>> {
        self.connection.questions().list()
    }

    /// Pending questions raised on behalf of one issuer.
    pub fn questions_of(&self, issuer: &str) -> Vec<ObjRef<QuestionEvent>> {
        self.connection.questions().by_issuer(issuer)
    }

    /// Requests cancellation of an outstanding job.
    ///
    /// Cancellation is its own round trip: the target job transitions only
    /// when the dispatcher acknowledges. A job that never went remote has
    /// nothing to cancel.
    pub fn cancel(&self, job: &ObjRef<Job>) -> ObjRef<Job> {
        match job.correlation() {
            Some(id) => self
                .connection
                .dispatch(JobCategory::JobCancel, CancelParams { id }),
            None => ObjRef::publish(Job::local(
                JobCategory::JobCancel,
                ResultCode::InvalidArgument,
                Value::Null,
            )),
        }
    }
}

impl private::Sealed for Server {}

impl SdkObject for Server {
    fn handle(&self) -> Handle {
        self.base.handle()
    }

    fn kind(&self) -> ObjectKind {
        self.base.kind()
    }
}

impl TypedObject for Server {
    const KIND: ObjectKind = ObjectKind::Server;
}
