//! Pending interactive questions, keyed by the dispatcher's request id.
//!
//! A question lives here from the moment the dispatcher raises it until the
//! caller submits an answer or the owning connection is torn down. The
//! registry is the only owner: once unregistered, a repeated answer for the
//! same id is a harmless no-op.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::Result;
use crate::object_ref::ObjRef;
use crate::registry::{Handle, ObjectBase, ObjectKind, SdkObject, TypedObject, private};

/// An interactive prompt raised by the dispatcher mid-operation.
pub struct QuestionEvent {
    base: ObjectBase,
    request_id: String,
    issuer: String,
    params: Value,
}

impl QuestionEvent {
    pub fn new(request_id: String, issuer: String, params: Value) -> Self {
        Self {
            base: ObjectBase::new(ObjectKind::Question),
            request_id,
            issuer,
            params,
        }
    }

    /// Id the answer must be submitted against.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Identity of the object the question concerns.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn params(&self) -> &Value {
        &self.params
    }
}

impl private::Sealed for QuestionEvent {}

impl SdkObject for QuestionEvent {
    fn handle(&self) -> Handle {
        self.base.handle()
    }

    fn kind(&self) -> ObjectKind {
        self.base.kind()
    }

    fn to_text(&self) -> Result<String> {
        serde_json::to_string(&self.params).map_err(Into::into)
    }
}

impl TypedObject for QuestionEvent {
    const KIND: ObjectKind = ObjectKind::Question;
}

/// Registry of in-flight questions for one connection.
pub struct QuestionBook {
    entries: Mutex<HashMap<String, ObjRef<QuestionEvent>>>,
}

impl Default for QuestionBook {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionBook {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Stores a question raised by the dispatcher. A duplicate request id
    /// overwrites the stale entry: a dispatcher anomaly worth a log line,
    /// not corrupted state.
    pub fn register(&self, question: ObjRef<QuestionEvent>) {
        let request_id = question.request_id().to_owned();
        if self.entries.lock().insert(request_id, question).is_some() {
            tracing::warn!("duplicate question registration overwrote a pending entry");
        }
    }

    /// Forgets a question the instant an answer is submitted for it,
    /// regardless of remote acknowledgment. Unknown ids are a no-op.
    pub fn unregister(&self, request_id: &str) -> Option<ObjRef<QuestionEvent>> {
        self.entries.lock().remove(request_id)
    }

    /// Drops every pending question so none is answered against a dead
    /// connection.
    pub fn purge_all(&self) {
        let mut entries = self.entries.lock();
        if !entries.is_empty() {
            tracing::debug!(count = entries.len(), "purging pending questions");
        }
        entries.clear();
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.entries.lock().contains_key(request_id)
    }

    /// Every pending question, in no particular order.
    pub fn list(&self) -> Vec<ObjRef<QuestionEvent>> {
        self.entries.lock().values().cloned().collect()
    }

    /// Pending questions raised on behalf of one issuer.
    pub fn by_issuer(&self, issuer: &str) -> Vec<ObjRef<QuestionEvent>> {
        self.entries
            .lock()
            .values()
            .filter(|q| q.issuer() == issuer)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn register(book: &QuestionBook, id: &str, issuer: &str) {
        book.register(ObjRef::publish(QuestionEvent::new(
            id.into(),
            issuer.into(),
            json!({"text": "continue?"}),
        )));
    }

    #[test]
    fn unregister_twice_is_a_no_op() {
        let book = QuestionBook::new();
        register(&book, "r1", "vm-1");
        assert!(book.unregister("r1").is_some());
        assert!(book.unregister("r1").is_none());
        assert!(!book.contains("r1"));
    }

    #[test]
    fn duplicate_registration_overwrites() {
        let book = QuestionBook::new();
        register(&book, "r2", "vm-1");
        let first = book.list().pop().unwrap().handle();
        register(&book, "r2", "vm-2");
        let entries = book.list();
        assert_eq!(entries.len(), 1);
        assert_ne!(entries[0].handle(), first);
        assert_eq!(entries[0].issuer(), "vm-2");
    }

    #[test]
    fn purge_drops_everything() {
        let book = QuestionBook::new();
        register(&book, "r3", "vm-1");
        register(&book, "r4", "vm-2");
        book.purge_all();
        assert!(book.list().is_empty());
    }

    #[test]
    fn filter_by_issuer() {
        let book = QuestionBook::new();
        register(&book, "r5", "vm-1");
        register(&book, "r6", "vm-2");
        register(&book, "r7", "vm-2");
        assert_eq!(book.by_issuer("vm-2").len(), 2);
        assert_eq!(book.by_issuer("vm-3").len(), 0);
    }

    #[test]
    fn question_serializes_its_payload() {
        let q = QuestionEvent::new("r8".into(), "vm-1".into(), json!({"text": "eject?"}));
        let text = q.to_text().unwrap();
        assert!(text.contains("eject?"));
    }
}
