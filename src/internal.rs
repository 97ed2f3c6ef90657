//! # Summary
//!
//! This module abstracts over internal connections between sub-threads of
//! a single peer.
//!
//! The peer inbox is unbounded: a send can only fail if the peer thread has
//! exited, which is a logic error, so `Tx::send` calls `expect` internally.
//! The outbound token queue is bounded, and enqueueing never waits.

use tokio::sync::mpsc;

/// Intra-peer receiving channel.
#[derive(Debug)]
pub struct Rx<T>(mpsc::UnboundedReceiver<T>);

/// Intra-peer transmission channel. All clones send to the same receiving end.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
#[derive(Debug)]
pub struct Tx<T>(mpsc::UnboundedSender<T>);

/// Create a new pair of linked receiving and transmitting channels.
pub fn new<T>() -> (Rx<T>, Tx<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Rx(rx), Tx(tx))
}

impl<T> Tx<T> {
    /// Force a message through the channel.
    /// Panics if the receiving end has been dropped.
    pub fn send(&self, message: T) {
        self.0.send(message).ok().expect("[INTERNAL ERROR]: receiver dropped");
    }
}

impl<T> Rx<T> {
    pub async fn recv(&mut self) -> Option<T> {
        self.0.recv().await
    }
}

/// Bounded queue feeding a dedicated sender.
#[derive(Debug)]
pub struct Queue<T>(mpsc::Sender<T>);

/// Draining end of a `Queue`.
#[derive(Debug)]
pub struct Drain<T>(mpsc::Receiver<T>);

pub fn bounded<T>(capacity: usize) -> (Drain<T>, Queue<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (Drain(rx), Queue(tx))
}

impl<T> Queue<T> {
    /// Enqueues without waiting. Hands the message back if the queue is
    /// full or the draining end is gone.
    pub fn push(&self, message: T) -> Result<(), T> {
        self.0.try_send(message).map_err(|error| match error {
            mpsc::error::TrySendError::Full(message) => message,
            mpsc::error::TrySendError::Closed(message) => message,
        })
    }
}

impl<T> Drain<T> {
    pub async fn recv(&mut self) -> Option<T> {
        self.0.recv().await
    }
}
