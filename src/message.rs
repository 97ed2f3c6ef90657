//! # Summary
//!
//! This module defines everything that crosses the wire between peers.
//!
//! Every remote call carries the same `Message` shape regardless of method;
//! fields a method does not use are left zeroed. The in-memory `Token` is
//! the typed view of a `Message` riding a `ReceiveToken` call, with the
//! fairness sentinel lifted into an `Option`.

use serde_derive::{Deserialize, Serialize};

/// Wire encoding of an unset timestamp.
pub const UNSET: i64 = -1;

/// Remote operations exposed by every peer.
#[derive(Serialize, Deserialize)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    /// Core hop transition
    ReceiveToken,

    /// Configure ring topology
    SetSuccessor,

    /// Mark a requester as finished (coordinator only)
    NotifyFinished,

    /// Decide whether this peer wants the critical section
    ConfigureRequesting,

    /// Originate a fresh token at this peer
    StartToken,
}

/// Superset payload shared by all methods.
#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub id: usize,
    pub address: String,
    pub clock: u64,
    pub req_timestamp: i64,
    pub requester_count: usize,
}

impl Default for Message {
    fn default() -> Self {
        Message {
            id: 0,
            address: String::new(),
            clock: 0,
            req_timestamp: UNSET,
            requester_count: 0,
        }
    }
}

impl Message {
    pub fn successor(address: impl Into<String>) -> Self {
        Message { address: address.into(), ..Default::default() }
    }

    pub fn finished(id: usize) -> Self {
        Message { id, ..Default::default() }
    }

    pub fn requesting(requester_count: usize) -> Self {
        Message { requester_count, ..Default::default() }
    }
}

/// A single remote call.
#[derive(Serialize, Deserialize)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub message: Message,
}

/// The circulating capability. Only its current carrier may act on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// Peer that last forwarded the token
    pub holder: usize,

    /// Logical clock stamped by the holder
    pub clock: u64,

    /// Oldest outstanding request seen this lap
    pub fairness: Option<u64>,
}

impl From<Token> for Message {
    fn from(token: Token) -> Self {
        Message {
            id: token.holder,
            clock: token.clock,
            req_timestamp: token.fairness.map_or(UNSET, |ts| ts as i64),
            ..Default::default()
        }
    }
}

impl From<&Message> for Token {
    fn from(message: &Message) -> Self {
        Token {
            holder: message.id,
            clock: message.clock,
            fairness: if message.req_timestamp < 0 {
                None
            } else {
                Some(message.req_timestamp as u64)
            },
        }
    }
}
