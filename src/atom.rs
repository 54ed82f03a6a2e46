//! The interned-string substrate: [`Atom`] and its weak counterpart
//! [`WeakAtom`].
//!
//! `Atom` is an immutable byte string carrying a precomputed hash. It has
//! two backing representations that share one read layout (`AtomData`):
//! heap-allocated and reference-counted (`Repr::Owned`), or statically
//! allocated (`Repr::Static`, used for the empty-string singleton and any
//! other compile-time-constant atom). A third, non-owning "lookup probe"
//! representation exists only as a plain `&[u8]` used transiently by
//! [`crate::intern`] — it never becomes an `Atom` value.

use crate::hash::fnv1a32;
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// Fields shared by every provenance of an [`Atom`]. `hash` is always
/// `fnv1a32` of `bytes`.
struct AtomData {
    hash: u32,
    bytes: AtomBytes,
}

enum AtomBytes {
    Owned(Box<[u8]>),
    Static(&'static [u8]),
}

impl AtomBytes {
    fn as_slice(&self) -> &[u8] {
        match self {
            AtomBytes::Owned(b) => b,
            AtomBytes::Static(b) => b,
        }
    }
}

const fn const_atom_data(bytes: &'static [u8]) -> AtomData {
    AtomData {
        hash: fnv1a32(bytes),
        bytes: AtomBytes::Static(bytes),
    }
}

static EMPTY_DATA: AtomData = const_atom_data(b"");

#[derive(Clone)]
enum Repr {
    Owned(Arc<AtomData>),
    Static(&'static AtomData),
}

/// An interned (or, for [`Atom::owned_uninterned`], merely owned) immutable
/// byte string with a precomputed [`fnv1a32`](crate::hash::fnv1a32) hash.
///
/// Cloning an `Atom` is cheap: it either bumps an atomic reference count or
/// copies a `'static` reference, never the underlying bytes.
#[derive(Clone)]
pub struct Atom(Repr);

impl Atom {
    /// The shared empty-atom singleton. Never allocates, never retained or
    /// released (it is a `'static` value), mirroring the "NUL-terminated
    /// empty string" fast path of the provenance this type is distilled
    /// from.
    pub fn empty() -> Atom {
        Atom(Repr::Static(&EMPTY_DATA))
    }

    /// Build a fresh, non-deduplicated atom over a copy of `bytes`. Used for
    /// comment text (which the parser never interns) and as the allocation
    /// primitive [`crate::intern::StrongSet`] and [`crate::intern::WeakSet`]
    /// call on a cache miss.
    pub(crate) fn owned_uninterned(bytes: &[u8]) -> Atom {
        if bytes.is_empty() {
            return Atom::empty();
        }
        Atom(Repr::Owned(Arc::new(AtomData {
            hash: fnv1a32(bytes),
            bytes: AtomBytes::Owned(bytes.into()),
        })))
    }

    /// The atom's byte content.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.0 {
            Repr::Owned(a) => a.bytes.as_slice(),
            Repr::Static(a) => a.bytes.as_slice(),
        }
    }

    /// The atom's content as UTF-8, if it happens to be valid UTF-8. `sat`
    /// source bytes are not required to be UTF-8 (see spec.md's Non-goals),
    /// so this can return `None`.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }

    /// The atom's precomputed FNV-1a32 hash.
    pub fn hash_value(&self) -> u32 {
        match &self.0 {
            Repr::Owned(a) => a.hash,
            Repr::Static(a) => a.hash,
        }
    }

    /// Byte length.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// True for the empty atom.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Hash pre-check short-circuits most negatives; full equality falls
    /// back to a byte compare.
    pub fn equals(&self, other: &Atom) -> bool {
        self.hash_value() == other.hash_value() && self.as_bytes() == other.as_bytes()
    }

    /// True if `self`'s bytes end with `suffix`.
    pub fn ends_with(&self, suffix: &[u8]) -> bool {
        self.as_bytes().ends_with(suffix)
    }

    /// A weak observer of this atom. Returns `None` for the static
    /// provenance: constant atoms are never destroyed, so binding a weak
    /// reference to one would be meaningless (spec.md §3: "Constant and
    /// View strings are never bound").
    pub(crate) fn downgrade(&self) -> Option<WeakAtom> {
        match &self.0 {
            Repr::Owned(a) => Some(WeakAtom(Arc::downgrade(a))),
            Repr::Static(_) => None,
        }
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}
impl Eq for Atom {}

impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash the raw bytes (not the precomputed fnv1a32 value) so that an
        // `Atom` and a borrowed `&[u8]` probe of equal content hash
        // identically under `std::collections::HashSet`/`HashMap`'s own
        // hasher, which is required for `Borrow<[u8]>`-based lookups below.
        self.as_bytes().hash(state);
    }
}

impl Borrow<[u8]> for Atom {
    fn borrow(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "Atom({:?})", s),
            None => write!(f, "Atom({:?})", self.as_bytes()),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => f.write_str(s),
            None => write!(f, "{}", String::from_utf8_lossy(self.as_bytes())),
        }
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Atom {
        Atom::owned_uninterned(s.as_bytes())
    }
}

impl From<String> for Atom {
    fn from(s: String) -> Atom {
        Atom::owned_uninterned(s.as_bytes())
    }
}

/// An observer of an [`Atom`]'s heap-allocated provenance that becomes
/// unable to upgrade once the atom's last strong reference is dropped.
///
/// Backed by `std::sync::Weak`, which already gives the O(1)
/// "is the target still alive" check spec.md asks for via a hand-rolled
/// back-pointer: a `Weak` that fails to upgrade *is* the invalidated
/// observer, with no extra bookkeeping required.
pub(crate) struct WeakAtom(Weak<AtomData>);

impl WeakAtom {
    pub(crate) fn upgrade(&self) -> Option<Atom> {
        self.0.upgrade().map(Repr::Owned).map(Atom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equals_is_hash_then_byte_compare() {
        let a = Atom::owned_uninterned(b"hello");
        let b = Atom::owned_uninterned(b"hello");
        let c = Atom::owned_uninterned(b"world");
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
        assert_eq!(a.hash_value(), b.hash_value());
    }

    #[test]
    fn empty_atom_is_shared_and_const() {
        let a = Atom::empty();
        let b = Atom::owned_uninterned(b"");
        assert!(a.equals(&b));
        assert_eq!(a.len(), 0);
        assert!(a.is_empty());
    }

    #[test]
    fn static_atoms_cannot_be_downgraded() {
        assert!(Atom::empty().downgrade().is_none());
    }

    #[test]
    fn weak_observer_dies_with_its_atom() {
        let owner = Atom::owned_uninterned(b"x");
        let weak = owner.downgrade().unwrap();
        assert!(weak.upgrade().is_some());
        drop(owner);
        // Property (spec.md §8 #5): a weak observer's `self` is null iff its
        // bound string has been released.
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn ends_with_checks_suffix_bytes() {
        let a = Atom::owned_uninterned(b"user:");
        assert!(a.ends_with(b":"));
        assert!(!a.ends_with(b";"));
    }

    #[test]
    fn display_renders_utf8_content() {
        let a = Atom::owned_uninterned("héllo".as_bytes());
        assert_eq!(a.to_string(), "héllo");
    }
}
