//! Handle table: wire handles assigned in reference order.
//!
//! Handles start at [`BASE_WIRE_HANDLE`] in every epoch; `TC_RESET` starts a
//! new epoch. Keys cover everything the protocol shares by handle: graph
//! nodes by identity, class descriptors by name and descriptor type strings
//! by content.

use std::collections::HashMap;

use crate::constants::BASE_WIRE_HANDLE;
use crate::graph::ObjId;

/// What a handle stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HandleKey {
    Node(ObjId),
    Class(String),
    /// A field type signature string inside a class descriptor.
    TypeString(String),
}

#[derive(Debug, Default)]
pub struct HandleTable {
    map: HashMap<HandleKey, u32>,
}

impl HandleTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next handle to `key` and return it.
    pub fn assign(&mut self, key: HandleKey) -> u32 {
        #[allow(clippy::cast_possible_truncation)] // table never approaches 2^32 entries
        let handle = BASE_WIRE_HANDLE + self.map.len() as u32;
        self.map.insert(key, handle);
        handle
    }

    #[must_use]
    pub fn lookup(&self, key: &HandleKey) -> Option<u32> {
        self.map.get(key).copied()
    }

    /// Forget every handle; the next one assigned is the base handle again.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_from_base() {
        let mut t = HandleTable::new();
        assert_eq!(t.assign(HandleKey::Class("A".into())), 0x7E_0000);
        assert_eq!(t.assign(HandleKey::TypeString("LA;".into())), 0x7E_0001);
        assert_eq!(t.lookup(&HandleKey::Class("A".into())), Some(0x7E_0000));
        assert_eq!(t.lookup(&HandleKey::Class("B".into())), None);
    }

    #[test]
    fn clear_restarts_epoch() {
        let mut t = HandleTable::new();
        t.assign(HandleKey::Class("A".into()));
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.assign(HandleKey::Class("B".into())), BASE_WIRE_HANDLE);
    }
}
