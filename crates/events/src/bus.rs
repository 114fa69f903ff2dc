//! Event publishing/subscription abstraction (mechanics only).
//!
//! This module provides the **event bus pattern** used for post-commit
//! notifications: a command queues messages while it runs, and the pipeline
//! publishes them only after its transaction has committed.
//!
//! ## Design Philosophy
//!
//! The bus is intentionally **lightweight** and makes minimal assumptions:
//!
//! - **Transport-agnostic**: works with in-memory channels, message queues, etc.
//! - **Best-effort fan-out**: a disconnected subscriber is dropped, not an error
//! - **No persistence**: the entity store is the source of truth; notifications
//!   are hints, and consumers must tolerate missing or duplicated ones
//!
//! Consumers that act on notifications must therefore re-check state instead of
//! trusting the message alone (e.g. a "job created" hint wakes a worker, which
//! then queries for due jobs as usual).

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to a message stream.
///
/// Each subscription gets a copy of every message published to the bus
/// (broadcast semantics). Subscriptions are designed for single-threaded
/// consumption; give each consumer thread its own.
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

/// Domain-agnostic message bus (pub/sub abstraction).
///
/// Publishing happens strictly after the state change the message describes
/// has been committed, so a subscriber never observes a notification for work
/// that was rolled back. The inverse does not hold: a crash between commit and
/// publish loses the notification, which is why consumers poll as well.
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
