//! # Summary
//!
//! This module contains the sub-threads every peer runs. `node` owns the
//! protocol state and is the only task that mutates it; the others talk
//! to it through channels.

/// Termination detector (coordinator only).
pub(crate) mod coordinator;

/// Outbound sender.
pub(crate) mod forward;

/// Protocol state machine.
pub(crate) mod node;

/// Listener and connection handlers.
pub(crate) mod server;
