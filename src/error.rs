use thiserror::Error;

use crate::message::Method;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not connect to {address}: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },

    #[error("transport failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode or decode message: {0}")]
    Codec(#[from] bincode::Error),

    #[error("connection closed before reply to {0:?}")]
    Closed(Method),

    #[error("no address known for peer {0}")]
    UnknownPeer(usize),

    #[error("could not read discovery document: {0}")]
    Discovery(String),
}
