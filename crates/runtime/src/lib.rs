//! HVX Runtime - handle identity and asynchronous job correlation
//!
//! This crate provides the low-level runtime every SDK-visible object rests
//! on:
//!
//! - **Handle registry**: resolving opaque numeric handles to live objects
//!   from any thread
//! - **Typed references**: scope-owning [`ObjRef`] wrappers that manage the
//!   object lifetime across copy and drop
//! - **Jobs**: one-shot promises tracking each outstanding dispatcher
//!   request by correlation id
//! - **Connection**: the dispatch façade and the demultiplexer that routes
//!   responses, questions, and events back to their callers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   hvx-sdk   │  Caller-facing objects (Server, Vm)
//! └──────┬──────┘
//! ┌──────▼──────┐
//! │ hvx-runtime │  This crate
//! │  ┌────────┐ │
//! │  │Registry│ │  handle -> object resolution
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Jobs   │ │  correlation id -> outcome
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Conn   │ │  dispatch + demultiplex
//! │  └────────┘ │
//! └──────┬──────┘
//!        │ Transport trait
//! ┌──────▼──────┐
//! │  dispatcher │  Separate process (framing/crypto out of scope)
//! └─────────────┘
//! ```

pub mod connection;
pub mod error;
pub mod job;
pub mod object_ref;
pub mod questions;
pub mod registry;
pub mod transport;

// Re-export key types at crate root
pub use connection::{Connection, ConnectionEvent};
pub use error::{Error, Result};
pub use job::{Job, JobOrigin, JobStatus};
pub use object_ref::ObjRef;
pub use questions::{QuestionBook, QuestionEvent};
pub use registry::{
    Handle, HandleRegistry, ObjectBase, ObjectKind, SdkObject, TypedObject, registry,
};
pub use transport::{Loopback, LoopbackHarness, Transport, TransportParts};
