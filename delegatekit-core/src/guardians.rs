//! Guardian membership: a presence set plus an enumerable list.
//!
//! Enumeration order is not stable across removals, since removal swaps the last
//! entry into the vacated slot.

use std::collections::HashSet;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Set of guardian identities with O(1) membership and index-based enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianSet {
    members: HashSet<Address>,
    list: Vec<Address>,
}

impl GuardianSet {
    /// Returns `true` if `who` is a guardian.
    #[must_use]
    pub fn contains(&self, who: &Address) -> bool {
        self.members.contains(who)
    }

    /// Adds a guardian. Returns `false` if it was already a member.
    pub fn insert(&mut self, guardian: Address) -> bool {
        if !self.members.insert(guardian) {
            return false;
        }
        self.list.push(guardian);
        true
    }

    /// Removes a guardian. Returns `false` if it was not a member.
    pub fn remove(&mut self, guardian: &Address) -> bool {
        if !self.members.remove(guardian) {
            return false;
        }
        if let Some(index) = self.list.iter().position(|g| g == guardian) {
            self.list.swap_remove(index);
        }
        true
    }

    /// Number of guardians.
    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if there are no guardians.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Guardian at position `index` of the enumerable list.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Address> {
        self.list.get(index).copied()
    }

    /// Guardians in enumeration order.
    #[must_use]
    pub fn as_slice(&self) -> &[Address] {
        &self.list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guardian(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut set = GuardianSet::default();
        assert!(set.insert(guardian(1)));
        assert!(!set.insert(guardian(1)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.as_slice(), &[guardian(1)]);
    }

    #[test]
    fn test_remove_swaps_last_into_slot() {
        let mut set = GuardianSet::default();
        for byte in 1..=4 {
            set.insert(guardian(byte));
        }

        assert!(set.remove(&guardian(2)));
        assert_eq!(
            set.as_slice(),
            &[guardian(1), guardian(4), guardian(3)]
        );
        assert!(!set.contains(&guardian(2)));
        assert!(!set.remove(&guardian(2)));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_list_matches_membership() {
        let mut set = GuardianSet::default();
        set.insert(guardian(7));
        set.insert(guardian(8));
        set.remove(&guardian(7));
        set.insert(guardian(7));

        assert_eq!(set.len(), 2);
        for index in 0..set.len() {
            assert!(set.contains(&set.get(index).unwrap()));
        }
        assert_eq!(set.get(2), None);
    }
}
