//! # Summary
//!
//! This module implements the per-peer token state machine without any I/O.
//!
//! The fairness field riding on the token is a single scalar, so each lap
//! only the oldest outstanding request survives propagation. A younger
//! requester keeps re-asserting its timestamp every lap until it becomes the
//! oldest. With one requester this converges within two laps; with several,
//! only the oldest is guaranteed progress per lap.

use crate::message::Token;

/// Lamport-style logical clock.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Clock(u64);

impl Clock {
    #[inline]
    pub fn now(&self) -> u64 {
        self.0
    }

    /// Advances past a received timestamp.
    #[inline]
    pub fn witness(&mut self, received: u64) -> u64 {
        self.0 = std::cmp::max(self.0, received) + 1;
        self.0
    }

    /// Local event.
    #[inline]
    pub fn tick(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

/// Outstanding interest in the critical section.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Request {
    pub wants: bool,
    pub timestamp: Option<u64>,
}

/// Externally observable state of a peer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Requesting,
    InCriticalSection,
}

/// Outcome of evaluating an incoming token.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Forward this token to the successor.
    Relay(Token),

    /// Request survived a full lap: run the critical section, then call `Peer::exit`.
    Enter,
}

/// Protocol state owned by a single peer.
#[derive(Clone, Debug)]
pub struct Peer {
    id: usize,
    clock: Clock,
    request: Request,
    in_section: bool,
}

impl Peer {
    pub fn new(id: usize) -> Self {
        Peer {
            id,
            clock: Clock::default(),
            request: Request::default(),
            in_section: false,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn clock(&self) -> u64 {
        self.clock.now()
    }

    pub fn request(&self) -> Request {
        self.request
    }

    pub fn phase(&self) -> Phase {
        if self.in_section {
            Phase::InCriticalSection
        } else if self.request.wants {
            Phase::Requesting
        } else {
            Phase::Idle
        }
    }

    /// Peers with an ID below `threshold` request the critical section this run.
    pub fn configure(&mut self, threshold: usize) -> bool {
        self.request.wants = self.id < threshold;
        self.request.wants
    }

    /// Creates a fresh token with no outstanding request recorded.
    pub fn originate(&mut self) -> Token {
        let clock = self.clock.tick();
        Token {
            holder: self.id,
            clock,
            fairness: None,
        }
    }

    /// Core hop transition.
    pub fn receive(&mut self, incoming: Token) -> Verdict {
        assert!(!self.in_section, "[INTERNAL ERROR]: token received inside critical section");
        self.clock.witness(incoming.clock);

        let mut fairness = incoming.fairness;

        if self.request.wants {
            let mine = *self.request.timestamp.get_or_insert(self.clock.now());
            match incoming.fairness {
            | None => fairness = Some(mine),
            | Some(theirs) if theirs == mine => {
                self.in_section = true;
                return Verdict::Enter
            }
            | Some(theirs) if mine < theirs => fairness = Some(mine),
            | Some(_) => (),
            }
        }

        Verdict::Relay(self.stamp(fairness))
    }

    /// Leaves the critical section and returns the token to forward.
    /// Both the local timestamp and the token's fairness field are cleared.
    pub fn exit(&mut self) -> Token {
        assert!(self.in_section, "[INTERNAL ERROR]: exit outside critical section");
        self.in_section = false;
        self.clock.tick();
        self.request = Request::default();
        self.stamp(None)
    }

    fn stamp(&self, fairness: Option<u64>) -> Token {
        Token {
            holder: self.id,
            clock: self.clock.now() + 1,
            fairness,
        }
    }
}
