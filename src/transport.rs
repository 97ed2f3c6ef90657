//! # Summary
//!
//! Synchronous point-to-point remote calls between peers.
//!
//! Every call dials a fresh connection, sends a single `Request`, waits for
//! a single reply and closes the connection. There is no pooling or reuse.

use tokio::net::TcpStream;

use crate::error::Error;
use crate::message::{Message, Method, Request};
use crate::socket;

/// Invokes `method` on the peer listening at `address`.
pub async fn call(address: &str, method: Method, message: Message) -> Result<Message, Error> {
    let stream = TcpStream::connect(address)
        .await
        .map_err(|source| Error::Connect { address: address.to_string(), source })?;

    let (mut rx, mut tx) = socket::split::<Message, Request>(stream);
    let request = Request { method, message };
    trace!("calling {:?} on {}", method, address);
    tx.send(&request).await?;

    match rx.recv().await {
    | Some(reply) => reply,
    | None => Err(Error::Closed(method)),
    }
}
