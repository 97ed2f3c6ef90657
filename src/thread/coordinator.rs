//! # Summary
//!
//! Termination detector. Polls the FinishedSet until every requester has
//! exited the critical section, then reports the elapsed wall-clock time
//! since the run was armed. Each armed run is reported once.

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tokio::time;

use crate::config::Event;
use crate::shared::Shared;

pub struct Coordinator {
    id: usize,
    finished: Shared,
    poll: Duration,
    completion: watch::Sender<Option<Duration>>,
    observer: Option<mpsc::UnboundedSender<Event>>,
}

impl Coordinator {
    pub fn new(
        id: usize,
        finished: Shared,
        poll: Duration,
        completion: watch::Sender<Option<Duration>>,
        observer: Option<mpsc::UnboundedSender<Event>>,
    ) -> Self {
        Coordinator { id, finished, poll, completion, observer }
    }

    pub async fn run(self) {
        let mut interval = time::interval(self.poll);
        let mut reported: Option<Instant> = None;
        loop {
            interval.tick().await;
            let (complete, started, count) = {
                let set = self.finished.read();
                (set.is_complete(), set.started(), set.len())
            };
            if !complete || reported == Some(started) {
                continue
            }
            let elapsed = started.elapsed();
            info!("{}: all {} requesters finished", self.id, count);
            println!("Time taken for all nodes to exit the critical section: {:?}", elapsed);
            // Nobody may be watching
            self.completion.send(Some(elapsed)).ok();
            if let Some(observer) = &self.observer {
                observer.send(Event::Completed(elapsed)).ok();
            }
            reported = Some(started);
        }
    }
}
