//! # Summary
//!
//! Peer discovery. The discovery document is a JSON object mapping decimal
//! peer IDs to `host:port` strings:
//!
//! ```json
//! { "0": "127.0.0.1:8000", "1": "127.0.0.1:8001", "2": "127.0.0.1:8002" }
//! ```
//!
//! The ring is the ascending-ID cycle over every entry. A missing or
//! malformed document is logged and yields an empty table, which wires
//! into a broken ring.

use std::collections::BTreeMap;
use std::iter::FromIterator;
use std::path::Path;

use bimap::BiMap;
use hashbrown::{HashMap as Map, HashSet as Set};

use crate::error::Error;

/// Bidirectional mapping between peer IDs and addresses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeerTable(BiMap<usize, String>);

impl PeerTable {
    /// Reads the document at `path`, logging and returning an empty table on failure.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        match Self::read(path.as_ref()) {
        | Ok(table) => table,
        | Err(error) => {
            error!("{}", error);
            PeerTable::default()
        }
        }
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path)
            .map_err(|error| Error::Discovery(format!("{}: {}", path.display(), error)))?;
        Self::parse(&document)
    }

    /// Parses a document. Two IDs sharing an address is an error.
    pub fn parse(document: &str) -> Result<Self, Error> {
        let entries = serde_json::from_str::<BTreeMap<usize, String>>(document)
            .map_err(|error| Error::Discovery(error.to_string()))?;
        let mut table = PeerTable::default();
        for (id, address) in entries {
            table.insert(id, address)?;
        }
        Ok(table)
    }

    /// Adds a peer. An ID or address already present keeps its first
    /// entry; the duplicate is logged and returned as an error.
    pub fn insert(&mut self, id: usize, address: impl Into<String>) -> Result<(), Error> {
        let address = address.into();
        match self.0.insert_no_overwrite(id, address) {
        | Ok(()) => Ok(()),
        | Err((id, address)) => {
            let existing = self.0.get_by_right(&address).copied();
            let error = match existing {
            | Some(existing) => format!("peer {} reuses address {} of peer {}", id, address, existing),
            | None => format!("peer {} listed twice", id),
            };
            error!("{}", error);
            Err(Error::Discovery(error))
        }
        }
    }

    pub fn address(&self, id: usize) -> Option<&str> {
        self.0.get_by_left(&id).map(String::as_str)
    }

    /// Peer IDs in ascending order.
    pub fn ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self.0.left_values().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(id, successor)` pairs forming the ascending-ID cycle.
    pub fn ring(&self) -> Vec<(usize, usize)> {
        let ids = self.ids();
        ids.iter()
            .enumerate()
            .map(|(index, id)| (*id, ids[(index + 1) % ids.len()]))
            .collect()
    }
}

/// Duplicates are logged and skipped, keeping the first entry.
impl FromIterator<(usize, String)> for PeerTable {
    fn from_iter<I: IntoIterator<Item = (usize, String)>>(iter: I) -> Self {
        let mut table = PeerTable::default();
        for (id, address) in iter {
            table.insert(id, address).ok();
        }
        table
    }
}

/// True if following successors from any peer visits every peer exactly
/// once before returning to the start.
pub fn is_single_cycle(successors: &[(usize, usize)]) -> bool {
    let next: Map<usize, usize> = successors.iter().copied().collect();
    if next.is_empty() || next.len() != successors.len() {
        return false
    }
    let start = successors[0].0;
    let mut seen = Set::with_capacity(next.len());
    let mut at = start;
    loop {
        if !seen.insert(at) {
            return false
        }
        at = match next.get(&at) {
        | Some(successor) => *successor,
        | None => return false,
        };
        if at == start {
            return seen.len() == next.len()
        }
    }
}
