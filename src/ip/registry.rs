//! Address assignment table.
//!
//! Tracks which integer-encoded addresses of one network are issued and to
//! which port. Entries are kept ordered so the allocator can report them
//! lowest first.

use std::collections::BTreeMap;

/// Issued addresses of a single network
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssignmentTable {
    /// Address -> assignee (port name)
    assigned: BTreeMap<u32, String>,
}

impl AssignmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `address` for `assignee`, replacing any previous holder
    pub fn insert(&mut self, address: u32, assignee: &str) -> Option<String> {
        self.assigned.insert(address, assignee.to_string())
    }

    pub fn contains(&self, address: u32) -> bool {
        self.assigned.contains_key(&address)
    }

    /// Get the assignee that holds a given address
    pub fn assignee(&self, address: u32) -> Option<&str> {
        self.assigned.get(&address).map(String::as_str)
    }

    pub fn remove(&mut self, address: u32) -> Option<String> {
        self.assigned.remove(&address)
    }

    pub fn clear(&mut self) {
        self.assigned.clear();
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// All issued addresses, ascending
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.assigned.iter().map(|(address, assignee)| (*address, assignee.as_str()))
    }
}
