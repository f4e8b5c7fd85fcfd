//! Virtual machine object: an opaque configuration document plus the
//! operations that edit and run it.

use std::sync::Arc;

use serde_json::json;

use hvx_protocol::JobCategory;
use hvx_runtime::registry::private;
use hvx_runtime::{
    Error, Handle, Job, ObjRef, ObjectBase, ObjectKind, Result, SdkObject, TypedObject,
};

use crate::document::ConfigDocument;
use crate::server::Server;

/// A virtual machine known to the dispatcher.
///
/// Holds a strong reference to its [`Server`]: a VM handle keeps the
/// session it was opened on alive.
pub struct Vm {
    base: ObjectBase,
    server: ObjRef<Server>,
    ident: String,
    document: Arc<dyn ConfigDocument>,
}

impl Vm {
    /// Opens a VM object on a session.
    ///
    /// The identity is the dispatcher-side name the VM's commands are
    /// addressed to; an empty identity is rejected before anything is
    /// registered.
    pub fn open(
        server: &ObjRef<Server>,
        ident: &str,
        document: Arc<dyn ConfigDocument>,
    ) -> Result<ObjRef<Vm>> {
        if ident.is_empty() {
            return Err(Error::InvalidArgument("vm identity is empty".into()));
        }
        Ok(ObjRef::publish(Vm {
            base: ObjectBase::new(ObjectKind::Vm),
            server: server.clone(),
            ident: ident.to_owned(),
            document,
        }))
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn server(&self) -> &ObjRef<Server> {
        &self.server
    }

    /// Opens an edit transaction on the dispatcher side.
    pub fn begin_edit(&self) -> ObjRef<Job> {
        self.server
            .connection()
            .dispatch(JobCategory::VmBeginEdit, json!({"vm": self.ident}))
    }

    /// Commits the edited configuration.
    ///
    /// The document is serialized to text and forwarded opaquely; a
    /// document that refuses to serialize surfaces as an already-failed
    /// job, like any other dispatch failure.
    pub fn commit(&self) -> ObjRef<Job> {
        let config = match self.document.to_text() {
            Ok(text) => text,
            Err(err) => {
                tracing::debug!(vm = %self.ident, %err, "commit aborted: document not serializable");
                return ObjRef::publish(Job::local(
                    JobCategory::VmCommit,
                    err.result_code(),
                    serde_json::Value::Null,
                ));
            }
        };
        self.server
            .connection()
            .dispatch(JobCategory::VmCommit, json!({"vm": self.ident, "config": config}))
    }

    pub fn start(&self) -> ObjRef<Job> {
        self.server
            .connection()
            .dispatch(JobCategory::VmStart, json!({"vm": self.ident}))
    }

    pub fn stop(&self) -> ObjRef<Job> {
        self.server
            .connection()
            .dispatch(JobCategory::VmStop, json!({"vm": self.ident}))
    }
}

impl private::Sealed for Vm {}

impl SdkObject for Vm {
    fn handle(&self) -> Handle {
        self.base.handle()
    }

    fn kind(&self) -> ObjectKind {
        self.base.kind()
    }

    fn to_text(&self) -> Result<String> {
        self.document.to_text()
    }

    fn from_text(&self, text: &str) -> Result<()> {
        self.document.from_text(text)
    }
}

impl TypedObject for Vm {
    const KIND: ObjectKind = ObjectKind::Vm;
}
