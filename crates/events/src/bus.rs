//! Publish/subscribe abstraction (mechanics only).
//!
//! The bus is the transport for post-commit notifications. It is intentionally
//! lightweight:
//!
//! - **Transport-agnostic**: in-memory channels here; a broker later without
//!   touching the ledger.
//! - **Best-effort, at-least-once**: a movement is already persisted in the
//!   movement ledger before it is published, so a lost or duplicated
//!   notification never loses data — consumers re-read through the query API
//!   and must tolerate duplicates.
//! - **No persistence**: the movement ledger is the source of truth; the bus
//!   only distributes "something committed" signals.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to a notification stream.
///
/// Each subscription receives a copy of every message published after it was
/// created (broadcast semantics). Intended for single-threaded consumption;
/// hand out one subscription per consumer thread.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Domain-agnostic notification bus.
///
/// `publish()` runs on the committing thread after the atomic commit has
/// completed; implementations must not block it for long. A publish failure is
/// surfaced to the publisher but never undoes the commit — the movement is
/// already durable and observers can catch up through the query API.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
