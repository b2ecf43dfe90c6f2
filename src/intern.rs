//! Global string interner for class and method names.
//!
//! Class and method names are looked up constantly during resolution, so
//! they are interned once and passed around as cheap `InternedString`
//! handles. Two handles for the same text share one allocation, which
//! makes equality a pointer comparison in the common case.
//!
//! # Thread Safety
//!
//! The interner is a process-global table behind an `RwLock`. Interning
//! takes the write lock only when the string is new.

use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// A handle to an interned string.
///
/// Clones are reference-count bumps. Handles produced by [`intern`] for
/// equal text are pointer-identical.
#[derive(Clone)]
pub struct InternedString(Arc<str>);

impl InternedString {
    /// Get the underlying string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the string is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for InternedString {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Interned handles are pointer-identical; the content check only
        // runs for handles that did not come from the same interner entry.
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for InternedString {}

impl Hash for InternedString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialOrd for InternedString {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InternedString {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Debug for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl AsRef<str> for InternedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Global Interner
// =============================================================================

/// Global interner table.
static INTERNER: OnceLock<RwLock<FxHashSet<Arc<str>>>> = OnceLock::new();

fn table() -> &'static RwLock<FxHashSet<Arc<str>>> {
    INTERNER.get_or_init(|| RwLock::new(FxHashSet::default()))
}

/// Intern a string, returning a shared handle.
pub fn intern(s: &str) -> InternedString {
    // Fast path: already interned.
    if let Some(existing) = table().read().get(s) {
        return InternedString(existing.clone());
    }

    let mut strings = table().write();
    // Re-check under the write lock in case another thread won the race.
    if let Some(existing) = strings.get(s) {
        return InternedString(existing.clone());
    }
    let arc: Arc<str> = Arc::from(s);
    strings.insert(arc.clone());
    InternedString(arc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_deduplicates() {
        let a = intern("speak");
        let b = intern("speak");
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_intern_distinct() {
        let a = intern("speak");
        let b = intern("fetch");
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "speak");
        assert_eq!(b.as_str(), "fetch");
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = intern("alpha");
        let b = intern("beta");
        assert!(a < b);
    }

    #[test]
    fn test_intern_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| intern("shared_name")))
            .collect();
        let first = intern("shared_name");
        for h in handles {
            assert_eq!(h.join().unwrap(), first);
        }
    }
}
