use std::time::{Duration, Instant};

use fairring::discovery::{self, PeerTable};
use fairring::message::{Message, Method, Token};
use fairring::{bootstrap, transport, Config, Error, Event, Handle};
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(10);

struct Ring {
    handles: Vec<Handle>,
    table: PeerTable,
    events: mpsc::UnboundedReceiver<Event>,
}

/// Spawns `count` peers on ephemeral loopback ports. Peer 0 coordinates.
async fn ring(count: usize, hop_delay: Duration, section: Duration) -> Ring {
    let (tx, events) = mpsc::unbounded_channel();
    let coordinator = Config::new(0, "127.0.0.1:0")
        .coordinator(true)
        .with_hop_delay(hop_delay)
        .with_section(section)
        .with_poll(Duration::from_millis(5))
        .with_observer(tx.clone())
        .spawn()
        .await
        .unwrap();
    let notify = coordinator.address.clone();
    let mut handles = vec![coordinator];
    for id in 1..count {
        let handle = Config::new(id, "127.0.0.1:0")
            .with_notify(notify.clone())
            .with_hop_delay(hop_delay)
            .with_section(section)
            .with_observer(tx.clone())
            .spawn()
            .await
            .unwrap();
        handles.push(handle);
    }
    let table = handles.iter()
        .map(|handle| (handle.id, handle.address.clone()))
        .collect();
    Ring { handles, table, events }
}

async fn next(events: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event stream closed")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn three_peer_single_requester_trace() {
    let Ring { table, mut events, .. } = ring(3, Duration::from_millis(1), Duration::from_millis(5)).await;

    bootstrap::connect(&table).await.unwrap();
    for (id, threshold) in vec![(0, 0), (1, 2), (2, 0)] {
        let address = table.address(id).unwrap();
        transport::call(address, Method::ConfigureRequesting, Message::requesting(threshold)).await.unwrap();
    }
    bootstrap::start(&table, 0).await.unwrap();

    let expected = vec![
        (1, Token { holder: 0, clock: 1, fairness: None }),
        (2, Token { holder: 1, clock: 3, fairness: Some(2) }),
        (0, Token { holder: 2, clock: 5, fairness: Some(2) }),
        (1, Token { holder: 0, clock: 7, fairness: Some(2) }),
    ];
    for (id, token) in expected {
        assert_eq!(next(&mut events).await, Event::Received { id, token });
    }

    match next(&mut events).await {
    | Event::Entered { id, .. } => assert_eq!(id, 1),
    | other => panic!("expected entry, got {:?}", other),
    }
    match next(&mut events).await {
    | Event::Exited { id, .. } => assert_eq!(id, 1),
    | other => panic!("expected exit, got {:?}", other),
    }

    // Fairness field is cleared on the hop that entered
    assert_eq!(
        next(&mut events).await,
        Event::Received { id: 2, token: Token { holder: 1, clock: 10, fairness: None } },
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_requester_enters_exactly_once() {
    let Ring { mut handles, table, mut events } = ring(4, Duration::from_millis(1), Duration::from_millis(5)).await;

    bootstrap::wire(&table, 1, 0).await.unwrap();

    let elapsed = timeout(WAIT, handles[0].completed())
        .await
        .expect("coordinator never reported");
    assert!(elapsed.is_some());

    // Let the token keep circulating for several more laps
    let mut entries = 0;
    let mut hops = 0;
    while hops < 4 * 6 {
        match next(&mut events).await {
        | Event::Entered { id, .. } => {
            assert_eq!(id, 0);
            entries += 1;
        }
        | Event::Received { .. } => hops += 1,
        | _ => (),
        }
    }
    assert_eq!(entries, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn critical_sections_never_overlap() {
    let section = Duration::from_millis(20);
    let Ring { mut handles, table, mut events } = ring(4, Duration::from_millis(1), section).await;

    bootstrap::wire(&table, 4, 0).await.unwrap();

    let elapsed = timeout(WAIT, handles[0].completed())
        .await
        .expect("coordinator never reported")
        .expect("peer 0 is the coordinator");
    assert!(elapsed >= section * 4);

    let mut intervals = Vec::new();
    let mut open = None;
    while intervals.len() < 4 {
        match next(&mut events).await {
        | Event::Entered { id, at, .. } => {
            assert!(open.is_none(), "peer {} entered while another peer was inside", id);
            open = Some((id, at));
        }
        | Event::Exited { id, at, .. } => {
            let (entered, since) = open.take().expect("exit without entry");
            assert_eq!(entered, id);
            intervals.push((id, since, at));
        }
        | _ => (),
        }
    }

    for pair in intervals.windows(2) {
        assert!(pair[0].2 <= pair[1].1);
    }
    let mut ids: Vec<usize> = intervals.iter().map(|(id, _, _)| *id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 2, 3]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn configuration_waits_for_token_hop() {
    let hop_delay = Duration::from_millis(400);
    let Ring { table, mut events, .. } = ring(2, hop_delay, Duration::from_millis(1)).await;

    bootstrap::connect(&table).await.unwrap();
    bootstrap::start(&table, 0).await.unwrap();

    assert_eq!(
        next(&mut events).await,
        Event::Received { id: 1, token: Token { holder: 0, clock: 1, fairness: None } },
    );

    // Peer 1 holds the token for the whole hop delay
    let address = table.address(1).unwrap();
    let sent = Instant::now();
    transport::call(address, Method::ConfigureRequesting, Message::requesting(2)).await.unwrap();
    assert!(sent.elapsed() >= hop_delay / 2, "configuration applied in {:?}", sent.elapsed());

    // The hop in flight was evaluated while peer 1 was still idle
    assert_eq!(
        next(&mut events).await,
        Event::Received { id: 0, token: Token { holder: 1, clock: 3, fairness: None } },
    );
    assert_eq!(
        next(&mut events).await,
        Event::Received { id: 1, token: Token { holder: 0, clock: 5, fairness: None } },
    );

    // The following visit stamps the new request
    assert_eq!(
        next(&mut events).await,
        Event::Received { id: 0, token: Token { holder: 1, clock: 7, fairness: Some(6) } },
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn zero_requesters_never_complete() {
    let Ring { mut handles, table, .. } = ring(3, Duration::from_millis(1), Duration::from_millis(1)).await;

    bootstrap::wire(&table, 0, 0).await.unwrap();

    let waited = timeout(Duration::from_millis(300), handles[0].completed()).await;
    assert!(waited.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unreachable_successor_stalls_ring() {
    let Ring { table, mut events, .. } = ring(2, Duration::from_millis(1), Duration::from_millis(1)).await;

    // Reserve a port, then free it so nothing is listening there
    let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_address = dead.local_addr().unwrap().to_string();
    drop(dead);

    let origin = table.address(0).unwrap();
    transport::call(origin, Method::SetSuccessor, Message::successor(dead_address)).await.unwrap();
    bootstrap::start(&table, 0).await.unwrap();

    let quiet = timeout(Duration::from_millis(300), events.recv()).await;
    assert!(quiet.is_err(), "token should never reach another peer");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn wired_ring_visits_every_peer() {
    let Ring { table, mut events, .. } = ring(5, Duration::from_millis(1), Duration::from_millis(1)).await;

    assert!(discovery::is_single_cycle(&table.ring()));
    bootstrap::wire(&table, 0, 2).await.unwrap();

    let mut order = Vec::new();
    while order.len() < 10 {
        if let Event::Received { id, token } = next(&mut events).await {
            assert_eq!(id, (token.holder + 1) % 5);
            order.push(id);
        }
    }
    assert_eq!(order, vec![3, 4, 0, 1, 2, 3, 4, 0, 1, 2]);
}

#[tokio::test]
async fn calling_a_closed_port_fails_to_connect() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);

    match transport::call(&address, Method::StartToken, Message::default()).await {
    | Err(Error::Connect { address: failed, .. }) => assert_eq!(failed, address),
    | other => panic!("expected connect error, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn non_coordinator_ignores_finished_notifications() {
    let Ring { table, .. } = ring(2, Duration::from_millis(1), Duration::from_millis(1)).await;
    let address = table.address(1).unwrap();
    let reply = transport::call(address, Method::NotifyFinished, Message::finished(0)).await.unwrap();
    assert_eq!(reply, Message::default());
}

#[tokio::test]
async fn wiring_an_empty_table_fails_to_start() {
    match bootstrap::wire(&PeerTable::default(), 1, 0).await {
    | Err(Error::UnknownPeer(0)) => (),
    | other => panic!("expected unknown peer, got {:?}", other),
    }
}
