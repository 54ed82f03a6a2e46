//! String containers: [`StrongSet`] and [`WeakSet`].

use crate::atom::Atom;
use std::collections::{HashMap, HashSet};

/// A set of atoms deduplicated by value equality, each strongly retained by
/// the set itself — every atom ever returned by [`StrongSet::get`] stays
/// alive for at least as long as the set does.
pub(crate) struct StrongSet {
    entries: HashSet<Atom>,
}

impl StrongSet {
    pub(crate) fn new() -> Self {
        StrongSet {
            entries: HashSet::new(),
        }
    }

    /// Return the atom equal to `bytes`, inserting a fresh one if this is
    /// the first time `bytes` has been seen.
    pub(crate) fn get(&mut self, bytes: &[u8]) -> Atom {
        if let Some(existing) = self.entries.get(bytes) {
            return existing.clone();
        }
        let atom = Atom::owned_uninterned(bytes);
        self.entries.insert(atom.clone());
        atom
    }

    /// Probe-only lookup; does not insert.
    pub(crate) fn find(&self, bytes: &[u8]) -> Option<Atom> {
        self.entries.get(bytes).cloned()
    }
}

/// A set of weak references to atoms: lookup compares by value equality,
/// but the set does not keep its entries alive. A slot whose atom has since
/// been dropped is a "hole" — the next insertion with byte-equal content
/// reuses it transparently (`HashMap::insert` with the same key already
/// overwrites a hole; no separate hole-scanning pass is needed).
pub(crate) struct WeakSet {
    slots: HashMap<Box<[u8]>, crate::atom::WeakAtom>,
}

impl WeakSet {
    pub(crate) fn new() -> Self {
        WeakSet {
            slots: HashMap::new(),
        }
    }

    /// Three outcomes, matching spec.md §4.4:
    /// 1. No entry collides: insert a new owned atom, bind it as the slot's
    ///    sole weak observer.
    /// 2. A live equal entry exists: return a fresh strong reference to it.
    /// 3. A slot exists whose observer is invalidated: reuse it.
    pub(crate) fn get(&mut self, bytes: &[u8]) -> Atom {
        if let Some(weak) = self.slots.get(bytes) {
            if let Some(atom) = weak.upgrade() {
                return atom;
            }
        }
        let atom = Atom::owned_uninterned(bytes);
        if let Some(weak) = atom.downgrade() {
            self.slots.insert(bytes.into(), weak);
        }
        atom
    }

    /// Probe-only lookup; does not insert and does not disturb a hole.
    pub(crate) fn find(&self, bytes: &[u8]) -> Option<Atom> {
        self.slots.get(bytes).and_then(|weak| weak.upgrade())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_set_dedups_by_value() {
        let mut set = StrongSet::new();
        let a = set.get(b"hello");
        let b = set.get(b"hello");
        assert!(a.equals(&b));
        assert!(set.find(b"hello").is_some());
        assert!(set.find(b"missing").is_none());
    }

    #[test]
    fn weak_set_returns_same_object_while_alive() {
        let mut set = WeakSet::new();
        let a = set.get(b"sym");
        let b = set.get(b"sym");
        assert!(a.equals(&b));
    }

    #[test]
    fn weak_set_reuses_slot_after_drop() {
        let mut set = WeakSet::new();
        {
            let a = set.get(b"sym");
            assert!(set.find(b"sym").is_some());
            drop(a);
        }
        // The only strong reference is gone; the slot is now a hole.
        assert!(set.find(b"sym").is_none());
        // A matching insertion reuses the hole and yields a live entry again.
        let b = set.get(b"sym");
        assert!(set.find(b"sym").is_some());
        assert_eq!(b.as_bytes(), b"sym");
    }

    #[test]
    fn weak_set_distinguishes_unrelated_keys() {
        let mut set = WeakSet::new();
        let _a = set.get(b"one");
        assert!(set.find(b"two").is_none());
    }
}
