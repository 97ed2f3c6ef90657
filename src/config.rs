use std::time::{Duration, Instant};

use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};

use crate::error::Error;
use crate::internal;
use crate::message::Token;
use crate::shared::Shared;
use crate::thread;

/// Instrumentation published by a running peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Token arrived, before evaluation
    Received { id: usize, token: Token },

    /// Critical section started
    Entered { id: usize, clock: u64, at: Instant },

    /// Critical section finished
    Exited { id: usize, clock: u64, at: Instant },

    /// Every requester finished (coordinator only)
    Completed(Duration),
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Unique peer ID
    id: usize,

    /// Address to listen on for remote calls
    address: String,

    /// Whether this peer owns the FinishedSet
    coordinator: bool,

    /// Coordinator address for finished notifications
    notify: Option<String>,

    /// Simulated processing time per hop
    hop_delay: Duration,

    /// Simulated critical-section duration
    section: Duration,

    /// Termination detector polling period
    poll: Duration,

    /// Outbound queue capacity
    outbound: usize,

    observer: Option<mpsc::UnboundedSender<Event>>,
}

/// A running peer.
#[derive(Debug)]
pub struct Handle {
    pub id: usize,

    /// Bound listener address
    pub address: String,

    /// Elapsed time of the last completed run (coordinator only)
    pub completion: watch::Receiver<Option<Duration>>,
}

impl Handle {
    /// Waits for the coordinator to report completion. Returns `None` on
    /// peers that are not the coordinator.
    pub async fn completed(&mut self) -> Option<Duration> {
        loop {
            if let Some(elapsed) = *self.completion.borrow_and_update() {
                return Some(elapsed)
            }
            if self.completion.changed().await.is_err() {
                return None
            }
        }
    }
}

impl Config {
    pub fn new(id: usize, address: impl Into<String>) -> Self {
        Config {
            id,
            address: address.into(),
            coordinator: false,
            notify: None,
            hop_delay: Duration::from_millis(1000),
            section: Duration::from_millis(2000),
            poll: Duration::from_millis(10),
            outbound: 16,
            observer: None,
        }
    }

    pub fn coordinator(mut self, coordinator: bool) -> Self {
        self.coordinator = coordinator;
        self
    }

    pub fn with_notify(mut self, address: impl Into<String>) -> Self {
        self.notify = Some(address.into());
        self
    }

    pub fn with_hop_delay(mut self, hop_delay: Duration) -> Self {
        self.hop_delay = hop_delay;
        self
    }

    pub fn with_section(mut self, section: Duration) -> Self {
        self.section = section;
        self
    }

    /// Panics if `poll` is zero.
    pub fn with_poll(mut self, poll: Duration) -> Self {
        assert!(poll > Duration::from_millis(0), "polling period must be non-zero");
        self.poll = poll;
        self
    }

    /// Panics if `outbound` is zero.
    pub fn with_outbound(mut self, outbound: usize) -> Self {
        assert!(outbound > 0, "outbound queue capacity must be non-zero");
        self.outbound = outbound;
        self
    }

    pub fn with_observer(mut self, observer: mpsc::UnboundedSender<Event>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Binds the listener and starts every sub-thread of this peer.
    /// Failing to bind is the only error.
    pub async fn spawn(self) -> Result<Handle, Error> {
        let listener = TcpListener::bind(&self.address).await?;
        let address = listener.local_addr()?.to_string();
        info!("{}: listening on {}", self.id, address);

        let (inbox_rx, inbox_tx) = internal::new();
        let (drain, queue) = internal::bounded(self.outbound);
        let (completion_tx, completion_rx) = watch::channel(None);

        let finished = if self.coordinator {
            let finished = Shared::new(0);
            let coordinator = thread::coordinator::Coordinator::new(
                self.id,
                finished.clone(),
                self.poll,
                completion_tx,
                self.observer.clone(),
            );
            tokio::spawn(coordinator.run());
            Some(finished)
        } else {
            None
        };

        let notify = match (&self.notify, self.coordinator) {
        | (Some(notify), _) => Some(notify.clone()),
        | (None, true) => Some(address.clone()),
        | (None, false) => None,
        };

        let node = thread::node::Node::new(
            self.id,
            inbox_rx,
            queue,
            finished,
            notify,
            thread::node::Pacing { hop_delay: self.hop_delay, section: self.section },
            self.observer,
        );

        tokio::spawn(node.run());
        tokio::spawn(thread::forward::Forward::new(self.id, drain).run());
        tokio::spawn(thread::server::listen(self.id, listener, inbox_tx));

        Ok(Handle {
            id: self.id,
            address,
            completion: completion_rx,
        })
    }

    /// Runs this peer until the process exits.
    pub async fn run(self) -> Result<(), Error> {
        let _handle = self.spawn().await?;
        futures::future::pending::<()>().await;
        Ok(())
    }
}
