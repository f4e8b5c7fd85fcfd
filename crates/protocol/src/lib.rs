//! Wire types for the HVX dispatcher protocol.
//!
//! This crate contains the serde-serializable types exchanged with the
//! dispatcher process: result codes, job categories, and the
//! command/response/question message shapes.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization/deserialization
//! - **1:1 with protocol**: Match what crosses the connection
//! - **Stable**: Changes only when the wire protocol changes
//!
//! Higher-level APIs are built on top of these types in `hvx-runtime` and
//! `hvx-sdk`.

pub mod message;
pub mod params;
pub mod result;

pub use message::*;
pub use params::*;
pub use result::*;
