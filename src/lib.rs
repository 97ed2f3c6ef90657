#[macro_use] extern crate derivative;
#[macro_use] extern crate log;

pub mod bootstrap;
mod config;
pub mod discovery;
mod error;
mod internal;
pub mod logging;
pub mod message;
mod shared;
mod socket;
pub mod state;
mod thread;
pub mod transport;

pub use crate::config::{Config, Event, Handle};
pub use crate::error::Error;
pub use crate::shared::FinishedSet;
