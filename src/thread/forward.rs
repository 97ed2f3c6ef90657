//! # Summary
//!
//! The dedicated sender draining a peer's outbound queue. The peer thread
//! enqueues and moves on; this thread performs the actual remote calls one
//! at a time, in order.
//!
//! A failed token forward is logged and the token is dropped. There is no
//! retry and no regeneration, so the ring stalls permanently.

use crate::internal::Drain;
use crate::message::{Message, Method, Token};
use crate::transport;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Out {
    /// Hand the token to the successor
    Token { to: String, token: Token },

    /// One-way notification to the coordinator
    Finished { to: String, id: usize },
}

pub struct Forward {
    id: usize,
    rx: Drain<Out>,
}

impl Forward {
    pub fn new(id: usize, rx: Drain<Out>) -> Self {
        Forward { id, rx }
    }

    pub async fn run(mut self) {
        while let Some(out) = self.rx.recv().await {
            trace!("{}: sending {:?}", self.id, out);
            match out {
            | Out::Token { to, token } => {
                if let Err(error) = transport::call(&to, Method::ReceiveToken, token.into()).await {
                    error!("{}: failed to forward token to {}: {}", self.id, to, error);
                }
            }
            | Out::Finished { to, id } => {
                if let Err(error) = transport::call(&to, Method::NotifyFinished, Message::finished(id)).await {
                    error!("{}: failed to notify coordinator at {}: {}", self.id, to, error);
                }
            }
            }
        }
    }
}
