//! # Summary
//!
//! Accept loop and per-connection handlers. Each accepted connection is
//! served by its own task, which decodes requests, hands them to the peer
//! thread and replies once the peer thread acknowledges.

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use crate::error::Error;
use crate::internal::Tx;
use crate::message::{Message, Request};
use crate::socket;
use crate::thread::node::{Envelope, In};

pub async fn listen(id: usize, listener: TcpListener, inbox: Tx<Envelope>) {
    loop {
        let (stream, remote) = match listener.accept().await {
        | Ok(accepted) => accepted,
        | Err(error) => {
            error!("{}: accept error: {}", id, error);
            continue
        }
        };
        trace!("{}: accepted connection from {}", id, remote);
        let inbox = inbox.clone();
        tokio::spawn(async move {
            if let Err(error) = serve(stream, inbox).await {
                warn!("{}: connection from {} failed: {}", id, remote, error);
            }
        });
    }
}

async fn serve(stream: TcpStream, inbox: Tx<Envelope>) -> Result<(), Error> {
    let (mut rx, mut tx) = socket::split::<Request, Message>(stream);
    while let Some(request) = rx.recv().await {
        let request = request?;
        let method = request.method;
        let (reply, acknowledged) = oneshot::channel();
        inbox.send(Envelope { message: In::from(request), reply });
        acknowledged.await.map_err(|_| Error::Closed(method))?;
        tx.send(&Message::default()).await?;
    }
    Ok(())
}
