//! Secondary index: class name → identities
//!
//! Enables instances-of-class queries without scanning the whole arena.
//! Subtype closure is not indexed; it is computed per query by walking the
//! catalog's hierarchy and unioning exact-class buckets, which keeps the
//! index cheap to maintain under mid-run reclassification.

use recast_core::{Identity, TypeName};
use rustc_hash::FxHashSet;
use std::collections::HashMap;

/// Exact class name → set of identities.
#[derive(Debug, Default)]
pub struct ClassIndex {
    index: HashMap<TypeName, FxHashSet<Identity>>,
}

impl ClassIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
        }
    }

    /// Add an identity under a class.
    pub fn insert(&mut self, class: TypeName, id: Identity) {
        self.index.entry(class).or_default().insert(id);
    }

    /// Remove an identity from a class bucket.
    ///
    /// If the bucket becomes empty, removes the class entry entirely to
    /// avoid accumulating empty sets.
    pub fn remove(&mut self, class: &TypeName, id: Identity) {
        if let Some(ids) = self.index.get_mut(class) {
            ids.remove(&id);
            if ids.is_empty() {
                self.index.remove(class);
            }
        }
    }

    /// Move an identity between class buckets.
    ///
    /// Both halves happen before control returns, so queries never observe
    /// the identity in neither (or both) buckets.
    pub fn reclassify(&mut self, old_class: &TypeName, new_class: TypeName, id: Identity) {
        self.remove(old_class, id);
        self.insert(new_class, id);
    }

    /// All identities under an exact class, or None when the bucket is empty.
    pub fn get(&self, class: &TypeName) -> Option<&FxHashSet<Identity>> {
        self.index.get(class)
    }

    /// Number of non-empty class buckets.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the index has no buckets.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
