//! HVX SDK - client bindings for the HVX virtualization dispatcher.
//!
//! External callers manipulate virtual machines and host configuration
//! through opaque, reference-counted handles; the real work happens in a
//! separate dispatcher process reached over a connection. Every operation
//! returns a [`Job`] handle immediately and completes asynchronously.
//!
//! # Quick tour
//!
//! ```ignore
//! use hvx::{Server, Vm, TextDocument};
//! use std::sync::Arc;
//!
//! let server = Server::connect(parts);
//! let login = server.login("root", "secret");
//! login.wait(timeout).await?;
//!
//! let vm = Vm::open(&server, "vm-1", Arc::new(TextDocument::new("<vm/>")))?;
//! let commit = vm.commit();
//! ```

pub mod document;
pub mod server;
pub mod vm;

pub use document::{ConfigDocument, TextDocument};
pub use server::Server;
pub use vm::Vm;

// The protocol and runtime layers are part of the public contract.
pub use hvx_protocol as protocol;
pub use hvx_runtime::{
    Connection, ConnectionEvent, Error, Handle, Job, JobOrigin, JobStatus, Loopback,
    LoopbackHarness, ObjRef, ObjectKind, QuestionEvent, Result, SdkObject, Transport,
    TransportParts, registry,
};
