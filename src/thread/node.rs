//! # Summary
//!
//! This module defines the peer thread: the single consumer of every
//! inbound call. Handlers never touch peer state directly; they enqueue an
//! `Envelope` and wait for the acknowledgement, so the clock and request
//! fields are mutated by exactly one task.

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::time;

use crate::config::Event;
use crate::internal::{Queue, Rx};
use crate::message::{Method, Request, Token};
use crate::shared::Shared;
use crate::state;
use crate::thread::forward::Out;

/// Operations the peer thread serializes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum In {
    Token(Token),
    Successor(String),
    Requesting(usize),
    Finished(usize),
    Start,
}

impl From<Request> for In {
    fn from(request: Request) -> Self {
        let message = request.message;
        match request.method {
        | Method::ReceiveToken => In::Token(Token::from(&message)),
        | Method::SetSuccessor => In::Successor(message.address),
        | Method::ConfigureRequesting => In::Requesting(message.requester_count),
        | Method::NotifyFinished => In::Finished(message.id),
        | Method::StartToken => In::Start,
        }
    }
}

/// Simulated work per peer.
#[derive(Copy, Clone, Debug)]
pub struct Pacing {
    /// Processing time per hop
    pub hop_delay: Duration,

    /// Critical-section duration
    pub section: Duration,
}

/// An inbound call paired with its acknowledgement.
#[derive(Debug)]
pub struct Envelope {
    pub message: In,
    pub reply: oneshot::Sender<()>,
}

pub struct Node {
    /// Protocol state
    state: state::Peer,

    /// Address of the next peer in the ring
    successor: Option<String>,

    /// Intra-peer receiving channel
    rx: Rx<Envelope>,

    /// Outbound queue drained by the forward thread
    outbound: Queue<Out>,

    /// FinishedSet, present only on the coordinator
    finished: Option<Shared>,

    /// Coordinator address for finished notifications
    notify: Option<String>,

    pacing: Pacing,

    observer: Option<mpsc::UnboundedSender<Event>>,
}

impl Node {
    pub fn new(
        id: usize,
        rx: Rx<Envelope>,
        outbound: Queue<Out>,
        finished: Option<Shared>,
        notify: Option<String>,
        pacing: Pacing,
        observer: Option<mpsc::UnboundedSender<Event>>,
    ) -> Self {
        Node {
            state: state::Peer::new(id),
            successor: None,
            rx,
            outbound,
            finished,
            notify,
            pacing,
            observer,
        }
    }

    pub async fn run(mut self) {
        while let Some(Envelope { message, reply }) = self.rx.recv().await {
            trace!("{}: received {:?}", self.state.id(), message);
            match message {
            | In::Token(token) => self.respond_token(token).await,
            | In::Successor(address) => self.respond_successor(address),
            | In::Requesting(threshold) => self.respond_requesting(threshold),
            | In::Finished(id) => self.respond_finished(id),
            | In::Start => self.respond_start(),
            }
            // Caller may have hung up
            reply.send(()).ok();
        }
        debug!("{}: peer thread exiting", self.state.id());
    }

    fn id(&self) -> usize {
        self.state.id()
    }

    fn observe(&self, event: Event) {
        if let Some(observer) = &self.observer {
            observer.send(event).ok();
        }
    }

    async fn respond_token(&mut self, token: Token) {
        info!("{}: received token from {}", self.id(), token.holder);
        self.observe(Event::Received { id: self.id(), token });
        time::sleep(self.pacing.hop_delay).await;
        debug!("{}: {:?} at clock {}", self.id(), self.state.phase(), self.state.clock());

        let outgoing = match self.state.receive(token) {
        | state::Verdict::Relay(outgoing) => {
            if let Some(timestamp) = self.state.request().timestamp {
                debug!("{}: requesting at timestamp {}", self.id(), timestamp);
            }
            outgoing
        }
        | state::Verdict::Enter => {
            self.critical_section().await;
            let outgoing = self.state.exit();
            self.notify_finished();
            outgoing
        }
        };

        self.forward(outgoing);
    }

    async fn critical_section(&self) {
        let id = self.id();
        info!("{}: entering critical section", id);
        self.observe(Event::Entered { id, clock: self.state.clock(), at: Instant::now() });
        time::sleep(self.pacing.section).await;
        self.observe(Event::Exited { id, clock: self.state.clock(), at: Instant::now() });
        info!("{}: completed critical section", id);
    }

    fn notify_finished(&self) {
        match &self.notify {
        | Some(address) => self.push(Out::Finished { to: address.clone(), id: self.id() }),
        | None => warn!("{}: no coordinator to notify", self.id()),
        }
    }

    fn respond_successor(&mut self, address: String) {
        info!("{}: successor set to {}", self.id(), address);
        self.successor = Some(address);
    }

    fn respond_requesting(&mut self, threshold: usize) {
        if self.state.configure(threshold) {
            info!("{}: will request the critical section", self.id());
        } else {
            info!("{}: will not request the critical section", self.id());
        }
        if let Some(finished) = &self.finished {
            debug!("{}: tracking {} requesters", self.id(), threshold);
            finished.write().rearm(threshold);
        }
    }

    fn respond_finished(&self, id: usize) {
        match &self.finished {
        | None => warn!("{}: ignoring finished notification from {}: not the coordinator", self.id(), id),
        | Some(finished) => {
            let mut finished = finished.write();
            if finished.mark(id) {
                debug!("{}: requester {} finished ({}/{})", self.id(), id, finished.finished(), finished.len());
            } else {
                warn!("{}: no slot for requester {}", self.id(), id);
            }
        }
        }
    }

    fn respond_start(&mut self) {
        let token = self.state.originate();
        info!("{}: originating token at clock {}", self.id(), token.clock);
        self.forward(token);
    }

    /// Hands the token to the forward thread without waiting for delivery.
    /// Without a successor the token is dropped and the ring stalls.
    fn forward(&self, token: Token) {
        match &self.successor {
        | Some(address) => self.push(Out::Token { to: address.clone(), token }),
        | None => error!("{}: no successor configured, dropping token", self.id()),
        }
    }

    fn push(&self, out: Out) {
        if let Err(out) = self.outbound.push(out) {
            error!("{}: outbound queue unavailable, dropping {:?}", self.id(), out);
        }
    }
}
