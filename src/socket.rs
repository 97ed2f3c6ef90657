//! # Summary
//!
//! This module abstracts over TCP connections between peers.
//!
//! Wraps `tokio-util`'s length-delimited codec around a TCP stream and
//! `bincode`-encodes each frame, so both ends exchange Rust structs
//! with minimal boilerplate.

use std::marker::PhantomData;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

use crate::error::Error;

/// Receiving half. Expects length-delimited, bincode-encoded `T`.
pub struct Rx<T> {
    inner: FramedRead<OwnedReadHalf, LengthDelimitedCodec>,
    _marker: PhantomData<T>,
}

/// Transmitting half. Sends length-delimited, bincode-encoded `T`.
pub struct Tx<T> {
    inner: FramedWrite<OwnedWriteHalf, LengthDelimitedCodec>,
    _marker: PhantomData<T>,
}

/// Split a `TcpStream` into a pair of typed receiving and transmitting halves.
pub fn split<R, T>(stream: TcpStream) -> (Rx<R>, Tx<T>)
where R: serde::de::DeserializeOwned,
      T: serde::Serialize,
{
    let (rx, tx) = stream.into_split();
    let rx = FramedRead::new(rx, LengthDelimitedCodec::new());
    let tx = FramedWrite::new(tx, LengthDelimitedCodec::new());
    (
        Rx { inner: rx, _marker: PhantomData },
        Tx { inner: tx, _marker: PhantomData },
    )
}

impl<R: serde::de::DeserializeOwned> Rx<R> {
    /// Next decoded frame, or `None` once the peer hangs up.
    pub async fn recv(&mut self) -> Option<Result<R, Error>> {
        let frame = self.inner.next().await?;
        Some(frame
            .map_err(Error::from)
            .and_then(|bytes| bincode::deserialize(&bytes).map_err(Error::from)))
    }
}

impl<T: serde::Serialize> Tx<T> {
    pub async fn send(&mut self, item: &T) -> Result<(), Error> {
        let bytes = bincode::serialize(item)?;
        self.inner.send(Bytes::from(bytes)).await?;
        Ok(())
    }
}
