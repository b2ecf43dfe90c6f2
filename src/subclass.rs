//! O(1) subclass testing via ancestor bitmaps.
//!
//! Walking a linearization answers `is_subclass` in O(depth). For repeated
//! checks that is wasteful: each class's ancestor set is fixed once the
//! hierarchy is frozen, so it can be precomputed as a bit set over the
//! dense class ids. A subclass test is then a single bit probe.
//!
//! # Memory Layout
//!
//! ```text
//! AncestorBitmap
//! ├── inline: u64        - bits for ClassId 0..63
//! └── spill: Vec<u64>    - allocated only for hierarchies past 64 classes
//! ```
//!
//! The root bit (0) is set in every bitmap: everything is a subclass of
//! `object`.

use crate::hierarchy::Hierarchy;
use crate::mro::{ClassId, MroError};

/// Bits held inline before spilling to the heap.
const INLINE_BITS: usize = 64;

// =============================================================================
// Ancestor Bitmap
// =============================================================================

/// Bit set over dense class ids; bit `b` means "subclass of `ClassId(b)`".
///
/// Membership is reflexive: a class's own bit is always set.
#[derive(Debug, Clone, Default)]
pub struct AncestorBitmap {
    /// Bits for the first 64 classes.
    inline: u64,
    /// Bits for classes past the inline range, lazily allocated.
    spill: Vec<u64>,
}

impl AncestorBitmap {
    /// Create an empty bitmap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bit for a class.
    pub fn set(&mut self, id: ClassId) {
        let bit = id.raw() as usize;
        if bit < INLINE_BITS {
            self.inline |= 1u64 << bit;
        } else {
            let word = (bit - INLINE_BITS) / 64;
            if word >= self.spill.len() {
                self.spill.resize(word + 1, 0);
            }
            self.spill[word] |= 1u64 << ((bit - INLINE_BITS) % 64);
        }
    }

    /// Check the bit for a class.
    #[inline]
    pub fn contains(&self, id: ClassId) -> bool {
        let bit = id.raw() as usize;
        if bit < INLINE_BITS {
            (self.inline & (1u64 << bit)) != 0
        } else {
            let word = (bit - INLINE_BITS) / 64;
            match self.spill.get(word) {
                Some(&w) => (w & (1u64 << ((bit - INLINE_BITS) % 64))) != 0,
                None => false,
            }
        }
    }

    /// Number of bits set.
    pub fn count(&self) -> usize {
        self.inline.count_ones() as usize
            + self
                .spill
                .iter()
                .map(|w| w.count_ones() as usize)
                .sum::<usize>()
    }
}

// =============================================================================
// Subclass Table
// =============================================================================

/// Precomputed subclass relation for one hierarchy.
#[derive(Debug)]
pub struct SubclassTable {
    /// One bitmap per class, indexed by `ClassId`.
    bitmaps: Vec<AncestorBitmap>,
}

impl SubclassTable {
    /// Build the table by linearizing every class.
    ///
    /// The ancestor set of a class is exactly the membership of its
    /// linearization, so construction doubles as full validation of the
    /// hierarchy and leaves the linearization cache warm. Fails if any
    /// class is cyclic or inconsistent.
    pub fn new(hierarchy: &Hierarchy) -> Result<Self, MroError> {
        let mut bitmaps = Vec::with_capacity(hierarchy.len());
        for node in hierarchy.classes() {
            let mro = hierarchy.linearize(node.id())?;
            let mut bitmap = AncestorBitmap::new();
            for &ancestor in mro.iter() {
                bitmap.set(ancestor);
            }
            bitmaps.push(bitmap);
        }
        Ok(Self { bitmaps })
    }

    /// Check whether `sub` is `ancestor` or derives from it.
    ///
    /// # Panics
    ///
    /// Panics if `sub` is not a class of the hierarchy this table was
    /// built from.
    #[inline]
    pub fn is_subclass(&self, sub: ClassId, ancestor: ClassId) -> bool {
        self.bitmaps[sub.index()].contains(ancestor)
    }

    /// Check whether `sub` derives from any of `ancestors`.
    pub fn is_subclass_of_any(&self, sub: ClassId, ancestors: &[ClassId]) -> bool {
        ancestors.iter().any(|&a| self.is_subclass(sub, a))
    }

    /// Number of ancestors of `sub`, itself and the root included.
    pub fn ancestor_count(&self, sub: ClassId) -> usize {
        self.bitmaps[sub.index()].count()
    }
}

// =============================================================================
// Tests
// =============================================================================
