//! Transport seam: how serialized commands leave the process.
//!
//! Framing, encryption, and socket I/O live outside this repository. The
//! runtime consumes the link through two halves: a sender that assigns a
//! correlation id to each submitted command, and an inbound stream of
//! response/question/event packets ending in a terminal close.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::sync::mpsc;

use hvx_protocol::{Command, CorrelationId, Inbound};

use crate::error::{Error, Result};

/// Outbound half of the dispatcher link.
pub trait Transport: Send + Sync {
    /// Submits a serialized command and returns the correlation id its
    /// response will carry. Fails with `NotConnected` once the link is
    /// down; nothing is partially sent.
    fn send_command(&self, method: &str, params: Value) -> Result<CorrelationId>;
}

/// Pieces a [`Connection`](crate::Connection) is built from.
pub struct TransportParts {
    pub sender: Arc<dyn Transport>,
    pub inbound_rx: mpsc::UnboundedReceiver<Inbound>,
}

/// In-process transport for tests and embedders without a real link.
///
/// Commands are queued for a harness to inspect; the harness feeds inbound
/// packets back. Dropping the harness's command receiver makes the link
/// report `NotConnected`, and dropping (or closing) its inbound sender ends
/// the connection's demultiplexer.
pub struct Loopback {
    next_id: AtomicU64,
    commands_tx: mpsc::UnboundedSender<Command>,
}

/// Harness ends of a [`Loopback`] pair.
pub struct LoopbackHarness {
    /// Commands the client submitted, in order.
    pub commands: mpsc::UnboundedReceiver<Command>,
    /// Feed for response/question/event packets.
    pub inbound: mpsc::UnboundedSender<Inbound>,
}

impl Loopback {
    /// Builds the pair: transport parts for the connection plus the harness
    /// ends.
    pub fn channel() -> (TransportParts, LoopbackHarness) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let parts = TransportParts {
            sender: Arc::new(Loopback {
                next_id: AtomicU64::new(1),
                commands_tx,
            }),
            inbound_rx,
        };
        let harness = LoopbackHarness {
            commands: commands_rx,
            inbound: inbound_tx,
        };
        (parts, harness)
    }
}

impl Transport for Loopback {
    fn send_command(&self, method: &str, params: Value) -> Result<CorrelationId> {
        let id = CorrelationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let command = Command {
            id,
            method: method.to_owned(),
            params,
        };
        self.commands_tx
            .send(command)
            .map_err(|_| Error::NotConnected)?;
        Ok(id)
    }
}

impl LoopbackHarness {
    /// Delivers the terminal close notification.
    pub fn close(&self) {
        let _ = self.inbound.send(Inbound::Closed);
    }
}
