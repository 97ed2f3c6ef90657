//! # Summary
//!
//! Ring wiring. Runs once before the protocol starts: every peer learns its
//! successor, every peer learns whether it requests this run, and one
//! peer is told to originate the token.

use crate::discovery::PeerTable;
use crate::error::Error;
use crate::message::{Message, Method};
use crate::transport;

/// Points each peer at the next ID in the ring.
pub async fn connect(table: &PeerTable) -> Result<(), Error> {
    if table.is_empty() {
        warn!("peer table is empty, ring will not form");
    }
    for (id, successor) in table.ring() {
        let address = table.address(id).ok_or(Error::UnknownPeer(id))?;
        let next = table.address(successor).ok_or(Error::UnknownPeer(successor))?;
        debug!("setting successor of {} to {}", id, successor);
        transport::call(address, Method::SetSuccessor, Message::successor(next)).await?;
    }
    Ok(())
}

/// Peers with an ID below `requesters` will request the critical section.
pub async fn configure(table: &PeerTable, requesters: usize) -> Result<(), Error> {
    for id in table.ids() {
        let address = table.address(id).ok_or(Error::UnknownPeer(id))?;
        transport::call(address, Method::ConfigureRequesting, Message::requesting(requesters)).await?;
    }
    Ok(())
}

/// Tells `origin` to create the token and pass it on.
pub async fn start(table: &PeerTable, origin: usize) -> Result<(), Error> {
    let address = table.address(origin).ok_or(Error::UnknownPeer(origin))?;
    info!("starting token at {}", origin);
    transport::call(address, Method::StartToken, Message::default()).await?;
    Ok(())
}

/// Connects, configures and starts the ring.
pub async fn wire(table: &PeerTable, requesters: usize, origin: usize) -> Result<(), Error> {
    connect(table).await?;
    configure(table, requesters).await?;
    start(table, origin).await
}
